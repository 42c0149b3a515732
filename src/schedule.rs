//! One scheduling run: order the leaves, run the passes into a scratch table,
//! place ALAP tasks, then commit leaves and roll summaries up.

use crate::calculations::{BackwardPass, ForwardPass, ResourceLeveling, ScheduleTable};
use crate::error::{ScheduleError, ScheduleResult};
use crate::graph::ScheduleDag;
use crate::ids::TaskId;
use crate::project::Project;
use crate::task::{ConstraintType, TaskSchedule};
use crate::time::TimeValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A constraint the run could not honour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub task: TaskId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub task_count: usize,
    pub critical_count: usize,
    /// Critical leaves ordered by start, then id.
    pub critical_path: Vec<TaskId>,
    pub project_finish: Option<TimeValue>,
    pub conflicts: Vec<ScheduleConflict>,
}

impl RefreshSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("critical={}", self.critical_count));
        if let Some(finish) = self.project_finish {
            parts.push(format!("finish={}", finish));
        }
        if !self.conflicts.is_empty() {
            parts.push(format!("conflicts={}", self.conflicts.len()));
        }
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_path={}", chain));
        }
        parts.join(", ")
    }
}

pub(crate) fn run(project: &mut Project) -> ScheduleResult<RefreshSummary> {
    let dag = ScheduleDag::build(project)?;
    let order = if project.config.priority_scheduling {
        dag.priority_order(project)?
    } else {
        dag.topological_order()?
    };

    let mut table: ScheduleTable = order
        .iter()
        .filter_map(|id| project.get_task(*id).map(|task| (*id, task.schedule)))
        .collect();

    let mut conflicts = forward(project, &order, &mut table, &HashMap::new())?;
    let horizon = order
        .iter()
        .filter_map(|id| table.get(id).map(|entry| entry.finish))
        .max()
        .unwrap_or(project.metadata.project_start);
    BackwardPass::new(project, &order).execute(&mut table, horizon)?;

    let pinned: HashMap<TaskId, TimeValue> = order
        .iter()
        .filter(|id| {
            project
                .get_task(**id)
                .is_some_and(|task| task.constraint().kind == ConstraintType::Alap)
        })
        .filter_map(|id| table.get(id).map(|entry| (*id, entry.latest_start)))
        .collect();
    if !pinned.is_empty() {
        for conflict in forward(project, &order, &mut table, &pinned)? {
            if !conflicts.contains(&conflict) {
                conflicts.push(conflict);
            }
        }
        BackwardPass::new(project, &order).execute(&mut table, horizon)?;
    }

    if project.config.abort_on_conflict {
        if let Some(conflict) = conflicts.first() {
            return Err(ScheduleError::SchedulingConflict {
                task: conflict.task,
                reason: conflict.reason.clone(),
            });
        }
    }

    commit(project, &table)?;
    Ok(summarize(project, &order, conflicts))
}

fn forward(
    project: &Project,
    order: &[TaskId],
    table: &mut ScheduleTable,
    pinned: &HashMap<TaskId, TimeValue>,
) -> ScheduleResult<Vec<ScheduleConflict>> {
    let pass = ForwardPass::new(project, order);
    if project.config.priority_scheduling {
        let mut leveling = ResourceLeveling::new();
        pass.execute(table, pinned, Some(&mut leveling))
    } else {
        pass.execute(table, pinned, None)
    }
}

fn commit(project: &mut Project, table: &ScheduleTable) -> ScheduleResult<()> {
    for (id, entry) in table {
        project.task_mut(*id)?.schedule = *entry;
    }

    let root = project.root;
    for id in project.post_order(root)? {
        let children = project.task(id)?.children.clone();
        if children.is_empty() {
            continue;
        }
        let mut rollup: Option<TaskSchedule> = None;
        let mut work = 0i64;
        for child in &children {
            let record = project.task(*child)?;
            work += record.work;
            let child_schedule = record.schedule;
            rollup = Some(match rollup {
                None => child_schedule,
                Some(acc) => TaskSchedule {
                    start: acc.start.min(child_schedule.start),
                    finish: acc.finish.max(child_schedule.finish),
                    work_start: acc.work_start.min(child_schedule.work_start),
                    latest_start: acc.latest_start.min(child_schedule.latest_start),
                    latest_finish: acc.latest_finish.max(child_schedule.latest_finish),
                    slack: acc.slack.min(child_schedule.slack),
                    critical: acc.critical || child_schedule.critical,
                    scheduled: acc.scheduled || child_schedule.scheduled,
                },
            });
        }
        let Some(schedule) = rollup else {
            continue;
        };
        let duration = project
            .working_time()
            .working_seconds_between(schedule.start, schedule.finish)?;
        let summary = project.task_mut(id)?;
        summary.schedule = schedule;
        summary.work = work;
        summary.duration = duration;
    }
    Ok(())
}

fn summarize(project: &Project, order: &[TaskId], conflicts: Vec<ScheduleConflict>) -> RefreshSummary {
    let mut critical_path: Vec<(TimeValue, TaskId)> = order
        .iter()
        .filter_map(|id| project.get_task(*id))
        .filter(|task| task.is_critical())
        .map(|task| (task.start(), task.id()))
        .collect();
    critical_path.sort();
    let project_finish = order
        .iter()
        .filter_map(|id| project.get_task(*id).map(|task| task.finish()))
        .max();

    RefreshSummary {
        task_count: project.task_count(),
        critical_count: critical_path.len(),
        critical_path: critical_path.into_iter().map(|(_, id)| id).collect(),
        project_finish,
        conflicts,
    }
}

impl Project {
    /// Critical leaf tasks of the committed schedule, ordered by start.
    pub fn critical_path(&self) -> Vec<TaskId> {
        let mut path: Vec<(TimeValue, TaskId)> = self
            .leaves()
            .into_iter()
            .filter_map(|id| self.get_task(id))
            .filter(|task| task.schedule().scheduled && task.is_critical())
            .map(|task| (task.start(), task.id()))
            .collect();
        path.sort();
        path.into_iter().map(|(_, id)| id).collect()
    }
}
