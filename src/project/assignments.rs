use super::Project;
use super::tasks::ModeTrigger;
use crate::error::{ScheduleError, ScheduleResult};
use crate::events::ProjectEvent;
use crate::ids::{AssignmentId, CalendarId, EntityRef, ResourceId, TaskId};
use crate::resource::{Assignment, Resource, ResourceKind};
use crate::task_validation;
use tracing::info;

impl Project {
    pub fn add_resource(
        &mut self,
        name: impl Into<String>,
        kind: ResourceKind,
        cost_per_hour: f64,
    ) -> ScheduleResult<ResourceId> {
        task_validation::validate_cost_per_hour(cost_per_hour)?;
        let id = self.ids.resource();
        self.resources
            .insert(id, Resource::new(id, name, kind, cost_per_hour));
        self.mark_dirty();
        Ok(id)
    }

    fn resource_mut(&mut self, id: ResourceId) -> ScheduleResult<&mut Resource> {
        self.resources
            .get_mut(&id)
            .ok_or(ScheduleError::ResourceNotFound(id))
    }

    fn resource_changed(&mut self, resource: ResourceId, field: &'static str) {
        self.emit(ProjectEvent::ResourceFieldChanged { resource, field });
    }

    fn assigned_tasks(&self, resource: ResourceId) -> Vec<TaskId> {
        self.resource_assignments(resource)
            .map(Assignment::task)
            .collect()
    }

    pub fn set_resource_name(&mut self, resource: ResourceId, name: impl Into<String>) -> ScheduleResult<()> {
        self.resource_mut(resource)?.name = name.into();
        self.resource_changed(resource, "name");
        self.mark_dirty();
        Ok(())
    }

    pub fn set_resource_note(&mut self, resource: ResourceId, note: impl Into<String>) -> ScheduleResult<()> {
        self.resource_mut(resource)?.note = note.into();
        self.resource_changed(resource, "note");
        self.mark_dirty();
        Ok(())
    }

    pub fn set_resource_cost(&mut self, resource: ResourceId, cost_per_hour: f64) -> ScheduleResult<()> {
        task_validation::validate_cost_per_hour(cost_per_hour)?;
        self.resource_mut(resource)?.cost_per_hour = cost_per_hour;
        self.resource_changed(resource, "cost");
        for task in self.assigned_tasks(resource) {
            self.invalidate_cost(task);
        }
        self.mark_dirty();
        Ok(())
    }

    /// Work resources constrain working time, so the kind matters to the schedule.
    pub fn set_resource_kind(&mut self, resource: ResourceId, kind: ResourceKind) -> ScheduleResult<()> {
        self.resource_mut(resource)?.kind = kind;
        self.resource_changed(resource, "type");
        for task in self.assigned_tasks(resource) {
            self.apply_scheduling_mode(task, ModeTrigger::Assignments)?;
            self.invalidate_cost(task);
        }
        self.schedule_changed(None)
    }

    /// `None` makes the resource follow the project calendar.
    pub fn set_resource_calendar(
        &mut self,
        resource: ResourceId,
        calendar: Option<CalendarId>,
    ) -> ScheduleResult<()> {
        if let Some(id) = calendar {
            self.calendars.calendar(id)?;
        }
        self.resource_mut(resource)?.calendar = calendar;
        self.resource_changed(resource, "calendar");
        self.schedule_changed(None)
    }

    pub fn remove_resource(&mut self, resource: ResourceId) -> ScheduleResult<()> {
        let assignments = self.resource(resource)?.assignments.clone();
        for assignment in assignments {
            let task = self.detach_assignment(assignment)?.task;
            self.apply_scheduling_mode(task, ModeTrigger::Assignments)?;
        }
        self.emit(ProjectEvent::Removed(EntityRef::Resource(resource)));
        self.resources.remove(&resource);
        self.ids.release(EntityRef::Resource(resource));
        info!(%resource, "resource removed");
        self.schedule_changed(None)
    }

    /// Assigns `resource` to the leaf task `task` at `units` percent.
    pub fn assign(&mut self, task: TaskId, resource: ResourceId, units: u32) -> ScheduleResult<AssignmentId> {
        task_validation::validate_units(units)?;
        self.resource(resource)?;
        let record = self.task(task)?;
        if task == self.root || record.is_summary() {
            return Err(ScheduleError::invalid_operation(format!(
                "task {task} is a summary task and cannot take assignments"
            )));
        }
        if self.task_assignments(task).any(|a| a.resource == resource) {
            return Err(ScheduleError::invalid_operation(format!(
                "resource {resource} is already assigned to task {task}"
            )));
        }

        let id = self.ids.assignment();
        self.assignments.insert(
            id,
            Assignment {
                id,
                task,
                resource,
                units,
            },
        );
        self.task_mut(task)?.assignments.push(id);
        self.resource_mut(resource)?.assignments.push(id);
        self.emit(ProjectEvent::AssignmentAdded {
            assignment: id,
            task,
            resource,
        });
        self.apply_scheduling_mode(task, ModeTrigger::Assignments)?;
        self.invalidate_cost(task);
        self.schedule_changed(None)?;
        Ok(id)
    }

    pub fn unassign(&mut self, task: TaskId, resource: ResourceId) -> ScheduleResult<()> {
        let assignment = self
            .task_assignments(task)
            .find(|a| a.resource == resource)
            .map(Assignment::id)
            .ok_or_else(|| {
                ScheduleError::invalid_operation(format!(
                    "resource {resource} is not assigned to task {task}"
                ))
            })?;
        self.remove_assignment(assignment)
    }

    pub fn remove_assignment(&mut self, assignment: AssignmentId) -> ScheduleResult<()> {
        let task = self.detach_assignment(assignment)?.task;
        self.apply_scheduling_mode(task, ModeTrigger::Assignments)?;
        self.schedule_changed(None)
    }

    pub fn set_assignment_units(&mut self, assignment: AssignmentId, units: u32) -> ScheduleResult<()> {
        task_validation::validate_units(units)?;
        let record = self
            .assignments
            .get_mut(&assignment)
            .ok_or(ScheduleError::AssignmentNotFound(assignment))?;
        record.units = units;
        let task = record.task;
        self.apply_scheduling_mode(task, ModeTrigger::Assignments)?;
        self.invalidate_cost(task);
        self.schedule_changed(Some(task))
    }

    /// Drops the assignment from both sides and the arena, without rescheduling.
    pub(crate) fn detach_assignment(&mut self, assignment: AssignmentId) -> ScheduleResult<Assignment> {
        let record = self
            .assignments
            .remove(&assignment)
            .ok_or(ScheduleError::AssignmentNotFound(assignment))?;
        if let Some(task) = self.tasks.get_mut(&record.task) {
            task.assignments.retain(|id| *id != assignment);
        }
        if let Some(resource) = self.resources.get_mut(&record.resource) {
            resource.assignments.retain(|id| *id != assignment);
        }
        self.emit(ProjectEvent::AssignmentRemoved {
            assignment,
            task: record.task,
            resource: record.resource,
        });
        self.emit(ProjectEvent::Removed(EntityRef::Assignment(assignment)));
        self.ids.release(EntityRef::Assignment(assignment));
        self.invalidate_cost(record.task);
        Ok(record)
    }

    /// Assignments held by `task`.
    pub fn task_assignments(&self, task: TaskId) -> impl Iterator<Item = &Assignment> {
        self.get_task(task)
            .map(|record| record.assignments.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.assignments.get(id))
    }

    pub fn resource_assignments(&self, resource: ResourceId) -> impl Iterator<Item = &Assignment> {
        self.resources
            .get(&resource)
            .map(|record| record.assignments.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.assignments.get(id))
    }
}
