use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::{AssignmentId, RelationId, TaskId};
use crate::time::{SECONDS_PER_DAY, TimeValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Normal,
    Milestone,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Normal => "normal",
            TaskType::Milestone => "milestone",
        }
    }
}

/// Which of work, duration and units stays put when the others change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    #[default]
    FixedWork,
    FixedDuration,
    FixedUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    #[default]
    Asap,
    Alap,
    StartNoEarlierThan,
    MustStartOn,
    FinishNoLaterThan,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintType::Asap => "asap",
            ConstraintType::Alap => "alap",
            ConstraintType::StartNoEarlierThan => "snet",
            ConstraintType::MustStartOn => "mso",
            ConstraintType::FinishNoLaterThan => "fnlt",
        }
    }

    pub fn has_anchor(&self) -> bool {
        matches!(
            self,
            ConstraintType::StartNoEarlierThan
                | ConstraintType::MustStartOn
                | ConstraintType::FinishNoLaterThan
        )
    }
}

impl FromStr for ConstraintType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asap" => Ok(ConstraintType::Asap),
            "alap" => Ok(ConstraintType::Alap),
            "snet" | "start_no_earlier_than" => Ok(ConstraintType::StartNoEarlierThan),
            "mso" | "must_start_on" => Ok(ConstraintType::MustStartOn),
            "fnlt" | "finish_no_later_than" => Ok(ConstraintType::FinishNoLaterThan),
            other => Err(ScheduleError::invalid_value(format!(
                "unknown constraint type '{other}'"
            ))),
        }
    }
}

/// Placement constraint. The anchor is ignored for `Asap` and `Alap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintType,
    #[serde(default)]
    pub anchor: TimeValue,
}

impl Constraint {
    pub fn asap() -> Self {
        Self::default()
    }

    pub fn alap() -> Self {
        Self {
            kind: ConstraintType::Alap,
            anchor: TimeValue::MIN,
        }
    }

    pub fn start_no_earlier_than(anchor: TimeValue) -> Self {
        Self {
            kind: ConstraintType::StartNoEarlierThan,
            anchor,
        }
    }

    pub fn must_start_on(anchor: TimeValue) -> Self {
        Self {
            kind: ConstraintType::MustStartOn,
            anchor,
        }
    }

    pub fn finish_no_later_than(anchor: TimeValue) -> Self {
        Self {
            kind: ConstraintType::FinishNoLaterThan,
            anchor,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.has_anchor() {
            write!(f, "{} {}", self.kind.as_str(), self.anchor)
        } else {
            f.write_str(self.kind.as_str())
        }
    }
}

/// Computed scheduling fields, written only by a scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskSchedule {
    pub start: TimeValue,
    pub finish: TimeValue,
    pub work_start: TimeValue,
    pub latest_start: TimeValue,
    pub latest_finish: TimeValue,
    /// Seconds, never negative.
    pub slack: i64,
    pub critical: bool,
    /// False until the first successful scheduling run covering the task.
    pub scheduled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) note: String,
    pub(crate) task_type: TaskType,
    pub(crate) mode: SchedulingMode,
    pub(crate) work: i64,
    pub(crate) duration: i64,
    pub(crate) percent_complete: u8,
    pub(crate) priority: i32,
    pub(crate) constraint: Constraint,
    pub(crate) parent: Option<TaskId>,
    pub(crate) children: Vec<TaskId>,
    pub(crate) predecessors: Vec<RelationId>,
    pub(crate) successors: Vec<RelationId>,
    pub(crate) assignments: Vec<AssignmentId>,
    pub(crate) schedule: TaskSchedule,
    pub(crate) cost: f64,
    pub(crate) cost_cached: bool,
}

impl Task {
    pub(crate) fn from_spec(id: TaskId, parent: Option<TaskId>, spec: TaskSpec) -> Self {
        let (duration, work) = match spec.task_type {
            TaskType::Milestone => (0, 0),
            TaskType::Normal => (spec.duration, spec.work.unwrap_or(spec.duration)),
        };
        Self {
            id,
            name: spec.name,
            note: spec.note,
            task_type: spec.task_type,
            mode: spec.mode,
            work,
            duration,
            percent_complete: 0,
            priority: spec.priority,
            constraint: spec.constraint,
            parent,
            children: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            assignments: Vec::new(),
            schedule: TaskSchedule::default(),
            cost: 0.0,
            cost_cached: false,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn is_milestone(&self) -> bool {
        self.task_type == TaskType::Milestone
    }

    pub fn scheduling_mode(&self) -> SchedulingMode {
        self.mode
    }

    /// Effort in working seconds.
    pub fn work(&self) -> i64 {
        self.work
    }

    /// Working seconds between start and finish.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn percent_complete(&self) -> u8 {
        self.percent_complete
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    pub fn is_summary(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn predecessors(&self) -> &[RelationId] {
        &self.predecessors
    }

    pub fn successors(&self) -> &[RelationId] {
        &self.successors
    }

    pub fn assignments(&self) -> &[AssignmentId] {
        &self.assignments
    }

    pub fn schedule(&self) -> &TaskSchedule {
        &self.schedule
    }

    pub fn start(&self) -> TimeValue {
        self.schedule.start
    }

    pub fn finish(&self) -> TimeValue {
        self.schedule.finish
    }

    pub fn work_start(&self) -> TimeValue {
        self.schedule.work_start
    }

    pub fn latest_start(&self) -> TimeValue {
        self.schedule.latest_start
    }

    pub fn latest_finish(&self) -> TimeValue {
        self.schedule.latest_finish
    }

    pub fn slack(&self) -> i64 {
        self.schedule.slack
    }

    pub fn is_critical(&self) -> bool {
        self.schedule.critical
    }

    /// The cached cost, if still valid. Use [`crate::Project::task_cost`] to compute it.
    pub fn cached_cost(&self) -> Option<f64> {
        self.cost_cached.then_some(self.cost)
    }
}

/// Builder for new tasks. Durations are working seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub mode: SchedulingMode,
    #[serde(default = "TaskSpec::default_duration")]
    pub duration: i64,
    #[serde(default)]
    pub work: Option<i64>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub constraint: Constraint,
}

impl TaskSpec {
    fn default_duration() -> i64 {
        SECONDS_PER_DAY
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            note: String::new(),
            task_type: TaskType::Normal,
            mode: SchedulingMode::default(),
            duration: Self::default_duration(),
            work: None,
            priority: 0,
            constraint: Constraint::default(),
        }
    }

    pub fn milestone(name: impl Into<String>) -> Self {
        Self {
            task_type: TaskType::Milestone,
            duration: 0,
            ..Self::new(name)
        }
    }

    pub fn duration(mut self, seconds: i64) -> Self {
        self.duration = seconds;
        self
    }

    /// Whole working days of the root calendar's `Work` day (24 working hours each).
    pub fn duration_days(self, days: i64) -> Self {
        self.duration(days * SECONDS_PER_DAY)
    }

    pub fn work(mut self, seconds: i64) -> Self {
        self.work = Some(seconds);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn mode(mut self, mode: SchedulingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestone_spec_has_no_duration() {
        let task = Task::from_spec(TaskId::from_raw(20), None, TaskSpec::milestone("gate").duration(5));
        assert!(task.is_milestone());
        assert_eq!(task.duration(), 0);
        assert_eq!(task.work(), 0);
    }

    #[test]
    fn work_defaults_to_duration() {
        let task = Task::from_spec(TaskId::from_raw(20), None, TaskSpec::new("dig").duration_days(2));
        assert_eq!(task.work(), 2 * SECONDS_PER_DAY);
        assert_eq!(task.cached_cost(), None);
    }

    #[test]
    fn constraint_names_parse() {
        assert_eq!("SNET".parse::<ConstraintType>().unwrap(), ConstraintType::StartNoEarlierThan);
        assert!("sometime".parse::<ConstraintType>().is_err());
    }
}
