//! The project arena: every task, relation, resource, assignment and calendar
//! lives here, addressed by id.
//!
//! Mutators follow one pattern: validate, apply, emit the matching
//! [`ProjectEvent`], then mark the schedule stale. Outside a batch the scheduling
//! pass runs before the mutator returns.

mod assignments;
mod calendars;
mod relations;
mod tasks;
mod wbs;

use crate::calendar::{CalendarSet, WorkingTime};
use crate::config::SchedulerConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::events::{EventBus, ProjectEvent};
use crate::ids::{AssignmentId, CalendarId, IdTable, RelationId, ResourceId, TaskId};
use crate::metadata::ProjectMetadata;
use crate::relation::Relation;
use crate::resource::{Assignment, Resource, ResourceKind};
use crate::schedule::{self, RefreshSummary};
use crate::task::{Task, TaskSpec};
use crate::task_validation;
use crate::time::TimeValue;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::mpsc::Receiver;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Project {
    pub(crate) metadata: ProjectMetadata,
    pub(crate) config: SchedulerConfig,
    pub(crate) ids: IdTable,
    pub(crate) root: TaskId,
    pub(crate) tasks: BTreeMap<TaskId, Task>,
    pub(crate) relations: BTreeMap<RelationId, Relation>,
    pub(crate) resources: BTreeMap<ResourceId, Resource>,
    pub(crate) assignments: BTreeMap<AssignmentId, Assignment>,
    pub(crate) calendars: CalendarSet,
    pub(crate) calendar: CalendarId,
    pub(crate) events: EventBus,
    batch_depth: u32,
    needs_reschedule: bool,
    dirty: bool,
    last_summary: Option<RefreshSummary>,
}

impl Default for Project {
    fn default() -> Self {
        Self::with_config(ProjectMetadata::default(), SchedulerConfig::default())
    }
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(metadata: ProjectMetadata) -> Self {
        Self::with_config(metadata, SchedulerConfig::default())
    }

    pub fn with_config(metadata: ProjectMetadata, config: SchedulerConfig) -> Self {
        let mut ids = IdTable::default();
        let root = ids.task();
        let calendar = ids.calendar();
        let root_task = Task::from_spec(root, None, TaskSpec::new(metadata.name.clone()).duration(0));
        Self {
            metadata,
            config,
            ids,
            root,
            tasks: BTreeMap::from([(root, root_task)]),
            relations: BTreeMap::new(),
            resources: BTreeMap::new(),
            assignments: BTreeMap::new(),
            calendars: CalendarSet::new(calendar),
            calendar,
            events: EventBus::default(),
            batch_depth: 0,
            needs_reschedule: false,
            dirty: false,
            last_summary: None,
        }
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SchedulerConfig) -> ScheduleResult<()> {
        self.config = config;
        self.schedule_changed(None)
    }

    pub fn project_start(&self) -> TimeValue {
        self.metadata.project_start
    }

    pub fn set_project_start(&mut self, start: TimeValue) -> ScheduleResult<()> {
        task_validation::validate_project_start(start)?;
        self.metadata.project_start = start;
        self.schedule_changed(None)
    }

    pub fn set_metadata(&mut self, metadata: ProjectMetadata) -> ScheduleResult<()> {
        task_validation::validate_project_start(metadata.project_start)?;
        let root = self.root;
        if let Some(task) = self.tasks.get_mut(&root) {
            task.name = metadata.name.clone();
        }
        self.metadata = metadata;
        self.schedule_changed(None)
    }

    pub fn ids(&self) -> &IdTable {
        &self.ids
    }

    /// The invisible summary task that owns the top level of the WBS.
    pub fn root(&self) -> TaskId {
        self.root
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task(&self, id: TaskId) -> ScheduleResult<&Task> {
        self.get_task(id).ok_or(ScheduleError::TaskNotFound(id))
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> ScheduleResult<&mut Task> {
        self.tasks.get_mut(&id).ok_or(ScheduleError::TaskNotFound(id))
    }

    /// All tasks except the root, in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        let root = self.root;
        self.tasks.values().filter(move |task| task.id != root)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len() - 1
    }

    pub fn find_task(&self, name: &str) -> Option<TaskId> {
        self.tasks().find(|task| task.name == name).map(Task::id)
    }

    pub fn relation(&self, id: RelationId) -> ScheduleResult<&Relation> {
        self.relations
            .get(&id)
            .ok_or(ScheduleError::RelationNotFound(id))
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn resource(&self, id: ResourceId) -> ScheduleResult<&Resource> {
        self.resources
            .get(&id)
            .ok_or(ScheduleError::ResourceNotFound(id))
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn find_resource(&self, name: &str) -> Option<ResourceId> {
        self.resources
            .values()
            .find(|resource| resource.name == name)
            .map(Resource::id)
    }

    pub fn assignment(&self, id: AssignmentId) -> ScheduleResult<&Assignment> {
        self.assignments
            .get(&id)
            .ok_or(ScheduleError::AssignmentNotFound(id))
    }

    pub fn calendars(&self) -> &CalendarSet {
        &self.calendars
    }

    /// Calendar used by tasks without Work resources and by resources without their own.
    pub fn project_calendar(&self) -> CalendarId {
        self.calendar
    }

    /// Working time of the project calendar.
    pub fn working_time(&self) -> WorkingTime<'_> {
        WorkingTime::new(&self.calendars, self.calendar, self.config.max_calendar_scan_days)
    }

    /// Union of the calendars of the task's Work resources, or the project calendar.
    pub fn working_time_for(&self, task: TaskId) -> ScheduleResult<WorkingTime<'_>> {
        let mut calendars = Vec::new();
        for assignment_id in self.task(task)?.assignments() {
            let assignment = self.assignment(*assignment_id)?;
            let resource = self.resource(assignment.resource)?;
            if resource.kind == ResourceKind::Work {
                calendars.push(resource.calendar.unwrap_or(self.calendar));
            }
        }
        if calendars.is_empty() {
            calendars.push(self.calendar);
        }
        Ok(WorkingTime::union(
            &self.calendars,
            calendars,
            self.config.max_calendar_scan_days,
        ))
    }

    pub fn subscribe(&mut self) -> Receiver<ProjectEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&mut self, event: ProjectEvent) {
        self.events.emit(event);
    }

    pub fn needs_reschedule(&self) -> bool {
        self.needs_reschedule
    }

    /// True once anything changed since the last [`Project::mark_clean`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_batched(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn last_summary(&self) -> Option<&RefreshSummary> {
        self.last_summary.as_ref()
    }

    fn touch(&mut self) {
        self.dirty = true;
        if !self.needs_reschedule {
            self.needs_reschedule = true;
            self.emit(ProjectEvent::NeedsRescheduleChanged(true));
        }
    }

    /// Marks the schedule stale and, outside a batch, recomputes it.
    ///
    /// With an `origin` task (field setters) a conflict on that task comes back
    /// as [`ScheduleError::SchedulingConflict`]; the new value stays applied.
    /// Structural changes pass `None` and only log conflicts.
    pub(crate) fn schedule_changed(&mut self, origin: Option<TaskId>) -> ScheduleResult<()> {
        self.touch();
        if self.batch_depth > 0 || !self.config.auto_reschedule {
            return Ok(());
        }
        match self.reschedule_now() {
            Ok(summary) => {
                let Some(task) = origin else {
                    return Ok(());
                };
                match summary.conflicts.iter().find(|conflict| conflict.task == task) {
                    Some(conflict) => Err(ScheduleError::SchedulingConflict {
                        task,
                        reason: conflict.reason.clone(),
                    }),
                    None => Ok(()),
                }
            }
            Err(err) if origin.is_none() => {
                warn!(%err, "scheduling pass after structural change failed");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Runs the full scheduling pass now, regardless of batching.
    pub fn reschedule_now(&mut self) -> ScheduleResult<RefreshSummary> {
        let summary = schedule::run(self)?;
        info!(
            tasks = summary.task_count,
            critical = summary.critical_count,
            conflicts = summary.conflicts.len(),
            "schedule recomputed"
        );
        if self.needs_reschedule {
            self.needs_reschedule = false;
            self.emit(ProjectEvent::NeedsRescheduleChanged(false));
        }
        self.emit(ProjectEvent::Rescheduled {
            critical_count: summary.critical_count,
        });
        self.last_summary = Some(summary.clone());
        Ok(summary)
    }

    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Closes one batch level. The outermost close runs the pass when needed.
    pub fn end_batch(&mut self) -> ScheduleResult<Option<RefreshSummary>> {
        if self.batch_depth == 0 {
            return Err(ScheduleError::invalid_operation(
                "end_batch called without a matching begin_batch",
            ));
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 && self.needs_reschedule && self.config.auto_reschedule {
            return self.reschedule_now().map(Some);
        }
        Ok(None)
    }

    /// Scoped batch: the pass is deferred until the guard is dropped or finished.
    pub fn batch(&mut self) -> BatchGuard<'_> {
        self.begin_batch();
        BatchGuard {
            project: self,
            finished: false,
        }
    }
}

pub struct BatchGuard<'a> {
    project: &'a mut Project,
    finished: bool,
}

impl BatchGuard<'_> {
    /// Ends the batch and reports the result of the deferred pass.
    pub fn finish(mut self) -> ScheduleResult<Option<RefreshSummary>> {
        self.finished = true;
        self.project.end_batch()
    }
}

impl Deref for BatchGuard<'_> {
    type Target = Project;

    fn deref(&self) -> &Project {
        self.project
    }
}

impl DerefMut for BatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Project {
        self.project
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.project.end_batch() {
            warn!(%err, "deferred scheduling pass failed");
        }
    }
}
