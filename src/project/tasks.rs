use super::Project;
use crate::error::{ScheduleError, ScheduleResult};
use crate::events::ProjectEvent;
use crate::ids::TaskId;
use crate::resource::ResourceKind;
use crate::task::{Constraint, SchedulingMode, TaskType};
use crate::task_validation;

/// Which quantity the caller just changed; drives the scheduling-mode rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModeTrigger {
    Work,
    Duration,
    Assignments,
}

impl Project {
    fn field_changed(&mut self, task: TaskId, field: &'static str) {
        self.emit(ProjectEvent::TaskFieldChanged { task, field });
    }

    pub fn set_task_name(&mut self, task: TaskId, name: impl Into<String>) -> ScheduleResult<()> {
        self.task_mut(task)?.name = name.into();
        self.field_changed(task, "name");
        self.mark_dirty();
        Ok(())
    }

    pub fn set_task_note(&mut self, task: TaskId, note: impl Into<String>) -> ScheduleResult<()> {
        self.task_mut(task)?.note = note.into();
        self.field_changed(task, "note");
        self.mark_dirty();
        Ok(())
    }

    pub fn set_percent_complete(&mut self, task: TaskId, percent: u8) -> ScheduleResult<()> {
        task_validation::validate_percent_complete(task, percent)?;
        self.task_mut(task)?.percent_complete = percent;
        self.field_changed(task, "percent_complete");
        self.mark_dirty();
        Ok(())
    }

    pub fn set_priority(&mut self, task: TaskId, priority: i32) -> ScheduleResult<()> {
        self.task_mut(task)?.priority = priority;
        self.field_changed(task, "priority");
        self.schedule_changed(Some(task))
    }

    /// Turning a task into a milestone zeroes its duration and work.
    /// A summary task cannot become a milestone.
    pub fn set_task_type(&mut self, task: TaskId, task_type: TaskType) -> ScheduleResult<()> {
        let record = self.task_mut(task)?;
        if record.task_type == task_type {
            return Ok(());
        }
        if task_type == TaskType::Milestone && record.is_summary() {
            return Err(ScheduleError::invalid_operation(format!(
                "summary task {task} cannot be a milestone"
            )));
        }
        record.task_type = task_type;
        if task_type == TaskType::Milestone {
            record.duration = 0;
            record.work = 0;
        }
        self.field_changed(task, "type");
        self.invalidate_cost(task);
        self.schedule_changed(Some(task))
    }

    pub fn set_scheduling_mode(&mut self, task: TaskId, mode: SchedulingMode) -> ScheduleResult<()> {
        self.task_mut(task)?.mode = mode;
        self.field_changed(task, "sched");
        self.mark_dirty();
        Ok(())
    }

    pub fn set_duration(&mut self, task: TaskId, seconds: i64) -> ScheduleResult<()> {
        task_validation::validate_duration(self.task(task)?, seconds)?;
        self.task_mut(task)?.duration = seconds;
        self.field_changed(task, "duration");
        self.apply_scheduling_mode(task, ModeTrigger::Duration)?;
        self.invalidate_cost(task);
        self.schedule_changed(Some(task))
    }

    pub fn set_work(&mut self, task: TaskId, seconds: i64) -> ScheduleResult<()> {
        task_validation::validate_work(self.task(task)?, seconds)?;
        self.task_mut(task)?.work = seconds;
        self.field_changed(task, "work");
        self.apply_scheduling_mode(task, ModeTrigger::Work)?;
        self.invalidate_cost(task);
        self.schedule_changed(Some(task))
    }

    pub fn set_constraint(&mut self, task: TaskId, constraint: Constraint) -> ScheduleResult<()> {
        task_validation::validate_constraint(&constraint)?;
        self.task_mut(task)?.constraint = constraint;
        self.field_changed(task, "constraint");
        self.schedule_changed(Some(task))
    }

    /// Sum of the units of the task's Work assignments; 100 when it has none.
    pub fn total_units(&self, task: TaskId) -> ScheduleResult<u32> {
        let mut total = 0u32;
        for assignment_id in self.task(task)?.assignments() {
            let assignment = self.assignment(*assignment_id)?;
            if self.resource(assignment.resource)?.kind == ResourceKind::Work {
                total = total.saturating_add(assignment.units);
            }
        }
        Ok(if total == 0 { 100 } else { total })
    }

    /// Keeps work, duration and units consistent after one of them changed.
    pub(crate) fn apply_scheduling_mode(&mut self, task: TaskId, trigger: ModeTrigger) -> ScheduleResult<()> {
        let record = self.task(task)?;
        if record.is_milestone() || record.is_summary() {
            return Ok(());
        }
        let units = i64::from(self.total_units(task)?);
        let derive_duration = match (record.mode, trigger) {
            (SchedulingMode::FixedWork, ModeTrigger::Duration) => false,
            (SchedulingMode::FixedWork, _) => true,
            (SchedulingMode::FixedDuration, ModeTrigger::Work) => return Ok(()),
            (SchedulingMode::FixedDuration, _) => false,
            (SchedulingMode::FixedUnits, ModeTrigger::Work) => true,
            (SchedulingMode::FixedUnits, _) => false,
        };

        let record = self.task_mut(task)?;
        if derive_duration {
            let duration = record.work * 100 / units;
            if duration != record.duration {
                record.duration = duration;
                self.field_changed(task, "duration");
            }
        } else {
            let work = record.duration * units / 100;
            if work != record.work {
                record.work = work;
                self.field_changed(task, "work");
            }
        }
        Ok(())
    }
}
