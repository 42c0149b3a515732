//! The CPM passes. Both work on a scratch [`ScheduleTable`] keyed by leaf task;
//! nothing is written back to the project until the run commits.

pub mod backward_pass;
pub mod forward_pass;
pub mod leveling;

pub use backward_pass::BackwardPass;
pub use forward_pass::ForwardPass;
pub use leveling::ResourceLeveling;

use crate::error::ScheduleResult;
use crate::ids::{ResourceId, TaskId};
use crate::project::Project;
use crate::relation::Relation;
use crate::resource::ResourceKind;
use crate::task::TaskSchedule;
use crate::time::TimeValue;
use std::collections::HashMap;

pub type ScheduleTable = HashMap<TaskId, TaskSchedule>;

/// Predecessor relations of `leaf` and of every ancestor; a summary's
/// relations bind each of its leaves.
pub(crate) fn incoming_relations(project: &Project, leaf: TaskId) -> ScheduleResult<Vec<Relation>> {
    let mut relations: Vec<Relation> = project.predecessor_relations(leaf).copied().collect();
    for ancestor in project.ancestors(leaf)? {
        relations.extend(project.predecessor_relations(ancestor).copied());
    }
    Ok(relations)
}

pub(crate) fn outgoing_relations(project: &Project, leaf: TaskId) -> ScheduleResult<Vec<Relation>> {
    let mut relations: Vec<Relation> = project.successor_relations(leaf).copied().collect();
    for ancestor in project.ancestors(leaf)? {
        relations.extend(project.successor_relations(ancestor).copied());
    }
    Ok(relations)
}

/// `(start, finish)` of `task` as currently held in the table: the task itself
/// for a leaf, min start and max finish over its leaves for a summary.
pub(crate) fn early_span(
    project: &Project,
    table: &ScheduleTable,
    task: TaskId,
) -> ScheduleResult<Option<(TimeValue, TimeValue)>> {
    let mut span: Option<(TimeValue, TimeValue)> = None;
    for leaf in project.leaf_descendants(task)? {
        if let Some(entry) = table.get(&leaf) {
            span = Some(match span {
                Some((start, finish)) => (start.min(entry.start), finish.max(entry.finish)),
                None => (entry.start, entry.finish),
            });
        }
    }
    Ok(span)
}

/// `(latest_start, latest_finish)` counterpart of [`early_span`].
pub(crate) fn late_span(
    project: &Project,
    table: &ScheduleTable,
    task: TaskId,
) -> ScheduleResult<Option<(TimeValue, TimeValue)>> {
    let mut span: Option<(TimeValue, TimeValue)> = None;
    for leaf in project.leaf_descendants(task)? {
        if let Some(entry) = table.get(&leaf) {
            span = Some(match span {
                Some((start, finish)) => (
                    start.min(entry.latest_start),
                    finish.max(entry.latest_finish),
                ),
                None => (entry.latest_start, entry.latest_finish),
            });
        }
    }
    Ok(span)
}

/// Work resources assigned to `task`.
pub(crate) fn work_resources(project: &Project, task: TaskId) -> ScheduleResult<Vec<ResourceId>> {
    let mut resources = Vec::new();
    for assignment in project.task_assignments(task) {
        if project.resource(assignment.resource())?.kind() == ResourceKind::Work {
            resources.push(assignment.resource());
        }
    }
    Ok(resources)
}
