use crate::error::ScheduleResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scheduler behaviour switches. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Stop a run at the first constraint conflict and keep the previous schedule.
    pub abort_on_conflict: bool,
    /// Order leaves by priority and keep Work resources from overlapping.
    pub priority_scheduling: bool,
    /// Run a pass after every unbatched mutation.
    pub auto_reschedule: bool,
    /// How many days a working-time search may scan before giving up.
    pub max_calendar_scan_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            abort_on_conflict: false,
            priority_scheduling: false,
            auto_reschedule: true,
            max_calendar_scan_days: 3_660,
        }
    }
}

impl SchedulerConfig {
    pub fn from_json_str(json: &str) -> ScheduleResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ScheduleResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
