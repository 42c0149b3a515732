use crate::error::ScheduleError;
use crate::ids::{RelationId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Precedence semantics between a predecessor and a successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationType {
    /// Finish-to-Start
    #[default]
    FS,
    /// Start-to-Start
    SS,
    /// Finish-to-Finish
    FF,
    /// Start-to-Finish
    SF,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::FS => "FS",
            RelationType::SS => "SS",
            RelationType::FF => "FF",
            RelationType::SF => "SF",
        }
    }

    /// FF and SF bind the successor's finish rather than its start.
    pub fn binds_finish(&self) -> bool {
        matches!(self, RelationType::FF | RelationType::SF)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FS" => Ok(RelationType::FS),
            "SS" => Ok(RelationType::SS),
            "FF" => Ok(RelationType::FF),
            "SF" => Ok(RelationType::SF),
            other => Err(ScheduleError::invalid_value(format!(
                "unknown relation type '{other}' (expected FS, SS, FF or SF)"
            ))),
        }
    }
}

/// Directed precedence edge. Lag is wall-clock seconds; negative values are leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub(crate) id: RelationId,
    pub(crate) predecessor: TaskId,
    pub(crate) successor: TaskId,
    pub(crate) relation_type: RelationType,
    pub(crate) lag: i64,
}

impl Relation {
    pub fn id(&self) -> RelationId {
        self.id
    }

    pub fn predecessor(&self) -> TaskId {
        self.predecessor
    }

    pub fn successor(&self) -> TaskId {
        self.successor
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn lag(&self) -> i64 {
        self.lag
    }

    /// True when the edge joins `a` and `b` in either direction.
    pub fn links(&self, a: TaskId, b: TaskId) -> bool {
        (self.predecessor == a && self.successor == b) || (self.predecessor == b && self.successor == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_types_parse_case_insensitively() {
        assert_eq!("ss".parse::<RelationType>().unwrap(), RelationType::SS);
        assert!("XX".parse::<RelationType>().is_err());
        assert!(RelationType::SF.binds_finish());
        assert!(!RelationType::SS.binds_finish());
    }
}
