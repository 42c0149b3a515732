use super::{ScheduleTable, late_span, outgoing_relations};
use crate::error::ScheduleResult;
use crate::ids::TaskId;
use crate::project::Project;
use crate::relation::RelationType;
use crate::task::ConstraintType;
use crate::time::TimeValue;
use tracing::debug;

/// Latest start/finish, slack and criticality, visiting leaves in reverse order.
pub struct BackwardPass<'a> {
    project: &'a Project,
    order: &'a [TaskId],
}

impl<'a> BackwardPass<'a> {
    pub fn new(project: &'a Project, order: &'a [TaskId]) -> Self {
        Self { project, order }
    }

    /// Tasks without successors finish no later than `horizon`.
    pub fn execute(&self, table: &mut ScheduleTable, horizon: TimeValue) -> ScheduleResult<()> {
        for &task_id in self.order.iter().rev() {
            let task = self.project.task(task_id)?;
            let working_time = self.project.working_time_for(task_id)?;
            let duration = task.duration();

            // Upper bound from successor relations
            let mut latest_finish = horizon;
            for relation in outgoing_relations(self.project, task_id)? {
                let Some((succ_latest_start, succ_latest_finish)) =
                    late_span(self.project, table, relation.successor())?
                else {
                    continue;
                };
                let lag = relation.lag();
                let bound = match relation.relation_type() {
                    RelationType::FS => succ_latest_start.offset(-lag),
                    RelationType::SS => {
                        working_time.add_working_time(succ_latest_start.offset(-lag), duration)?
                    }
                    RelationType::FF => succ_latest_finish.offset(-lag),
                    RelationType::SF => {
                        working_time.add_working_time(succ_latest_finish.offset(-lag), duration)?
                    }
                };
                latest_finish = latest_finish.min(bound);
            }

            let constraint = task.constraint();
            if constraint.kind == ConstraintType::FinishNoLaterThan {
                latest_finish = latest_finish.min(constraint.anchor);
            }

            let aligned = working_time.prev_working_instant(latest_finish)?;
            let (latest_start, latest_finish) = if duration == 0 {
                // A milestone may sit on a non-working instant; never pull it before its own start.
                let start = table.get(&task_id).map_or(aligned, |entry| entry.start);
                let latest = aligned.max(latest_finish.min(start));
                (latest, latest)
            } else {
                (working_time.sub_working_time(aligned, duration)?, aligned)
            };

            let entry = table.entry(task_id).or_default();
            entry.latest_finish = latest_finish;
            entry.latest_start = latest_start;
            entry.slack = (latest_start.seconds() - entry.start.seconds()).max(0);
            entry.critical = entry.slack == 0;
            debug!(
                task = %task_id,
                %latest_start,
                %latest_finish,
                slack = entry.slack,
                "backward pass"
            );
        }
        Ok(())
    }
}
