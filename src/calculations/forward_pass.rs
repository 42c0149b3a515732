use super::{ResourceLeveling, ScheduleTable, early_span, incoming_relations, work_resources};
use crate::error::ScheduleResult;
use crate::ids::TaskId;
use crate::project::Project;
use crate::relation::RelationType;
use crate::schedule::ScheduleConflict;
use crate::task::ConstraintType;
use crate::time::TimeValue;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Earliest start/finish for every leaf, visiting leaves in dependency order.
pub struct ForwardPass<'a> {
    project: &'a Project,
    order: &'a [TaskId],
}

impl<'a> ForwardPass<'a> {
    pub fn new(project: &'a Project, order: &'a [TaskId]) -> Self {
        Self { project, order }
    }

    /// `pinned` holds start floors (ALAP placement); `leveling` enables the
    /// resource busy-until check. Returns the conflicts found on the way.
    pub fn execute(
        &self,
        table: &mut ScheduleTable,
        pinned: &HashMap<TaskId, TimeValue>,
        mut leveling: Option<&mut ResourceLeveling>,
    ) -> ScheduleResult<Vec<ScheduleConflict>> {
        let project_start = self.project.project_start();
        let mut conflicts = Vec::new();

        for &task_id in self.order {
            let task = self.project.task(task_id)?;
            let working_time = self.project.working_time_for(task_id)?;
            let duration = task.duration();

            // Lower bound from predecessor relations
            let mut relation_bound: Option<TimeValue> = None;
            for relation in incoming_relations(self.project, task_id)? {
                let Some((pred_start, pred_finish)) =
                    early_span(self.project, table, relation.predecessor())?
                else {
                    continue;
                };
                let lag = relation.lag();
                let bound = match relation.relation_type() {
                    RelationType::FS => pred_finish.offset(lag),
                    RelationType::SS => pred_start.offset(lag),
                    RelationType::FF => working_time.sub_working_time(pred_finish.offset(lag), duration)?,
                    RelationType::SF => working_time.sub_working_time(pred_start.offset(lag), duration)?,
                };
                relation_bound = Some(relation_bound.map_or(bound, |current| current.max(bound)));
            }
            let mut earliest = relation_bound.map_or(project_start, |bound| bound.max(project_start));

            let constraint = task.constraint();
            let mut fixed_start = false;
            match constraint.kind {
                ConstraintType::StartNoEarlierThan => earliest = earliest.max(constraint.anchor),
                ConstraintType::MustStartOn => match relation_bound {
                    Some(bound) if constraint.anchor < bound => {
                        let reason = format!(
                            "must start on {} but predecessors allow {} at the earliest",
                            constraint.anchor, bound
                        );
                        warn!(task = %task_id, %reason, "scheduling conflict");
                        conflicts.push(ScheduleConflict {
                            task: task_id,
                            reason,
                        });
                        // Keep the last valid schedule; never-scheduled tasks fall back to ASAP.
                        if table.get(&task_id).is_some_and(|entry| entry.scheduled) {
                            continue;
                        }
                    }
                    _ => {
                        earliest = constraint.anchor;
                        fixed_start = true;
                    }
                },
                _ => {}
            }

            if let Some(pin) = pinned.get(&task_id) {
                earliest = earliest.max(*pin);
            }

            let resources = work_resources(self.project, task_id)?;
            if !fixed_start {
                if let Some(free) = leveling
                    .as_deref()
                    .and_then(|levels| levels.available_from(&resources))
                {
                    earliest = earliest.max(free);
                }
            }

            let (start, finish, work_start) = if duration == 0 {
                (earliest, earliest, earliest)
            } else {
                let start = working_time.next_working_instant(earliest)?;
                let finish = working_time.add_working_time(start, duration)?;
                let work_start = working_time.next_working_instant(start)?.min(finish);
                (start, finish, work_start)
            };

            if constraint.kind == ConstraintType::FinishNoLaterThan && finish > constraint.anchor {
                let reason = format!(
                    "finishes {} but must finish no later than {}",
                    finish, constraint.anchor
                );
                warn!(task = %task_id, %reason, "scheduling conflict");
                conflicts.push(ScheduleConflict {
                    task: task_id,
                    reason,
                });
            }

            if let Some(levels) = leveling.as_deref_mut() {
                levels.reserve(&resources, finish);
            }

            let entry = table.entry(task_id).or_default();
            entry.start = start;
            entry.finish = finish;
            entry.work_start = work_start;
            entry.scheduled = true;
            debug!(task = %task_id, %start, %finish, "forward pass");
        }

        Ok(conflicts)
    }
}
