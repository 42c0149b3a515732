pub mod calculations;
pub mod calendar;
pub mod config;
pub mod cost;
pub mod error;
pub mod events;
pub mod graph;
pub mod ids;
pub mod metadata;
pub mod project;
pub mod relation;
pub mod report;
pub mod resource;
pub mod schedule;
pub mod task;
pub mod task_validation;
pub mod time;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use calendar::{CalendarConfig, CalendarSet, Interval, WorkingTime};
pub use config::SchedulerConfig;
pub use error::{RelationFailure, ScheduleError, ScheduleResult};
pub use events::ProjectEvent;
pub use ids::{AssignmentId, CalendarId, DayId, EntityRef, RelationId, ResourceId, TaskId};
pub use metadata::ProjectMetadata;
pub use project::{BatchGuard, Project};
pub use relation::{Relation, RelationType};
pub use report::ScheduleReport;
pub use resource::{Assignment, Resource, ResourceKind};
pub use schedule::{RefreshSummary, ScheduleConflict};
pub use task::{Constraint, ConstraintType, SchedulingMode, Task, TaskSpec, TaskType};
pub use time::{TimeUnit, TimeValue, time_from_string, time_to_string};
