//! Error types for scheduling operations.

use crate::ids::{AssignmentId, CalendarId, DayId, RelationId, ResourceId, TaskId};
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Why `add_predecessor` refused a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationFailure {
    /// A relation already links the two tasks, in either direction.
    Duplicate,
    /// SF/FF cannot be mixed with other relation types on the same task.
    IncompatibleType,
    /// SF/FF cannot be added to a task constrained to start no earlier than a date.
    ConstraintIncompatible,
    /// An SF predecessor starting on the project start would force a negative offset.
    StartsAtProjectStart,
}

impl RelationFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationFailure::Duplicate => "a relation already exists between these tasks",
            RelationFailure::IncompatibleType => {
                "SF and FF relations cannot be combined with other relation types"
            }
            RelationFailure::ConstraintIncompatible => {
                "SF and FF relations are not allowed on a task with a start-no-earlier-than constraint"
            }
            RelationFailure::StartsAtProjectStart => {
                "an SF predecessor cannot start on the project start date"
            }
        }
    }
}

impl std::fmt::Display for RelationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("relation {predecessor} -> {successor} rejected: {reason}")]
    RelationFailed {
        predecessor: TaskId,
        successor: TaskId,
        reason: RelationFailure,
    },

    #[error("relation {predecessor} -> {successor} would create a dependency cycle")]
    CyclicDependency {
        predecessor: TaskId,
        successor: TaskId,
    },

    #[error("calendar {calendar} resolves no day type for {date}")]
    NoDefaultCalendar { calendar: CalendarId, date: NaiveDate },

    #[error("invalid time string '{0}'")]
    InvalidTimeString(String),

    #[error("scheduling conflict on task {task}: {reason}")]
    SchedulingConflict { task: TaskId, reason: String },

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("relation {0} not found")]
    RelationNotFound(RelationId),

    #[error("no relation between tasks {predecessor} and {successor}")]
    NoRelationBetween {
        predecessor: TaskId,
        successor: TaskId,
    },

    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("assignment {0} not found")]
    AssignmentNotFound(AssignmentId),

    #[error("calendar {0} not found")]
    CalendarNotFound(CalendarId),

    #[error("day type {0} not found")]
    DayNotFound(DayId),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),
}

impl ScheduleError {
    pub(crate) fn invalid_value(message: impl Into<String>) -> Self {
        ScheduleError::InvalidValue(message.into())
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        ScheduleError::InvalidOperation(message.into())
    }

    /// Structural errors are raised before the project is touched.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ScheduleError::RelationFailed { .. } | ScheduleError::CyclicDependency { .. }
        )
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
