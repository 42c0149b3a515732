//! Field checks applied before a value is stored.

use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::TaskId;
use crate::task::{Constraint, Task, TaskSpec, TaskType};
use crate::time::TimeValue;

pub const MAX_UNITS: u32 = 10_000;

pub fn validate_percent_complete(task: TaskId, percent: u8) -> ScheduleResult<()> {
    if percent > 100 {
        return Err(ScheduleError::invalid_value(format!(
            "task {task} has invalid percent_complete {percent} (must be between 0 and 100)"
        )));
    }
    Ok(())
}

pub fn validate_duration(task: &Task, seconds: i64) -> ScheduleResult<()> {
    if seconds < 0 {
        return Err(ScheduleError::invalid_value(format!(
            "task {} has negative duration {seconds}",
            task.id()
        )));
    }
    if task.is_milestone() && seconds > 0 {
        return Err(ScheduleError::invalid_value(format!(
            "milestone {} cannot have a duration",
            task.id()
        )));
    }
    Ok(())
}

pub fn validate_work(task: &Task, seconds: i64) -> ScheduleResult<()> {
    if seconds < 0 {
        return Err(ScheduleError::invalid_value(format!(
            "task {} has negative work {seconds}",
            task.id()
        )));
    }
    if task.is_milestone() && seconds > 0 {
        return Err(ScheduleError::invalid_value(format!(
            "milestone {} cannot carry work",
            task.id()
        )));
    }
    Ok(())
}

pub fn validate_spec(spec: &TaskSpec) -> ScheduleResult<()> {
    if spec.name.trim().is_empty() {
        return Err(ScheduleError::invalid_value("task name must not be empty"));
    }
    if spec.task_type == TaskType::Normal {
        if spec.duration < 0 {
            return Err(ScheduleError::invalid_value(format!(
                "task '{}' has negative duration {}",
                spec.name, spec.duration
            )));
        }
        if let Some(work) = spec.work {
            if work < 0 {
                return Err(ScheduleError::invalid_value(format!(
                    "task '{}' has negative work {work}",
                    spec.name
                )));
            }
        }
    }
    validate_constraint(&spec.constraint)
}

pub fn validate_constraint(constraint: &Constraint) -> ScheduleResult<()> {
    if constraint.kind.has_anchor() && !constraint.anchor.is_valid() {
        return Err(ScheduleError::invalid_value(format!(
            "constraint {} requires a valid anchor time",
            constraint.kind.as_str()
        )));
    }
    Ok(())
}

pub fn validate_units(units: u32) -> ScheduleResult<()> {
    if units == 0 || units > MAX_UNITS {
        return Err(ScheduleError::invalid_value(format!(
            "assignment units {units} must be between 1 and {MAX_UNITS}"
        )));
    }
    Ok(())
}

pub fn validate_cost_per_hour(cost: f64) -> ScheduleResult<()> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(ScheduleError::invalid_value(format!(
            "cost per hour {cost} must be a non-negative number"
        )));
    }
    Ok(())
}

pub fn validate_project_start(start: TimeValue) -> ScheduleResult<()> {
    if !start.is_valid() {
        return Err(ScheduleError::invalid_value("project start is not a valid time"));
    }
    Ok(())
}
