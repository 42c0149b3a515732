use crate::ids::{AssignmentId, CalendarId, ResourceId, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// People or equipment whose time constrains the schedule.
    #[default]
    Work,
    /// Consumables; costed but never constrain working time.
    Material,
}

/// Someone or something that can be assigned to tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub(crate) id: ResourceId,
    pub(crate) name: String,
    pub(crate) kind: ResourceKind,
    /// Cost rate per working hour. Non-negative.
    pub(crate) cost_per_hour: f64,
    /// `None` means the project calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) calendar: Option<CalendarId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) note: String,
    pub(crate) assignments: Vec<AssignmentId>,
}

impl Resource {
    pub(crate) fn new(id: ResourceId, name: impl Into<String>, kind: ResourceKind, cost_per_hour: f64) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            cost_per_hour,
            calendar: None,
            note: String::new(),
            assignments: Vec::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn cost_per_hour(&self) -> f64 {
        self.cost_per_hour
    }

    pub fn calendar(&self) -> Option<CalendarId> {
        self.calendar
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn assignments(&self) -> &[AssignmentId] {
        &self.assignments
    }
}

/// Allocation of one resource to one task; 100 units is full time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub(crate) id: AssignmentId,
    pub(crate) task: TaskId,
    pub(crate) resource: ResourceId,
    pub(crate) units: u32,
}

impl Assignment {
    pub fn id(&self) -> AssignmentId {
        self.id
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn units(&self) -> u32 {
        self.units
    }
}
