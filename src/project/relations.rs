use super::Project;
use crate::error::{RelationFailure, ScheduleError, ScheduleResult};
use crate::events::ProjectEvent;
use crate::graph::schedule_dag::ScheduleDag;
use crate::ids::{EntityRef, RelationId, TaskId};
use crate::relation::{Relation, RelationType};
use crate::task::ConstraintType;
use crate::time::TimeUnit;
use tracing::info;

impl Project {
    /// Makes `predecessor` a predecessor of `task`.
    ///
    /// Every check runs before the graph is touched; on error nothing changes.
    pub fn add_predecessor(
        &mut self,
        task: TaskId,
        predecessor: TaskId,
        relation_type: RelationType,
        lag: i64,
    ) -> ScheduleResult<RelationId> {
        self.check_relation(task, predecessor, relation_type)?;

        let id = self.ids.relation();
        self.relations.insert(
            id,
            Relation {
                id,
                predecessor,
                successor: task,
                relation_type,
                lag,
            },
        );
        self.task_mut(task)?.predecessors.push(id);
        self.task_mut(predecessor)?.successors.push(id);
        self.emit(ProjectEvent::RelationAdded {
            relation: id,
            predecessor,
            successor: task,
        });
        info!(%predecessor, successor = %task, %relation_type, lag, "relation added");
        self.schedule_changed(None)?;
        Ok(id)
    }

    fn check_relation(
        &self,
        task: TaskId,
        predecessor: TaskId,
        relation_type: RelationType,
    ) -> ScheduleResult<()> {
        let successor = self.task(task)?;
        let pred = self.task(predecessor)?;
        if task == predecessor || task == self.root || predecessor == self.root {
            return Err(ScheduleError::CyclicDependency {
                predecessor,
                successor: task,
            });
        }
        let failed = |reason| ScheduleError::RelationFailed {
            predecessor,
            successor: task,
            reason,
        };

        if self.has_relation(task, predecessor) {
            return Err(failed(RelationFailure::Duplicate));
        }

        if relation_type.binds_finish() {
            let mixed = self
                .predecessor_relations(task)
                .any(|existing| existing.relation_type != relation_type);
            if mixed {
                return Err(failed(RelationFailure::IncompatibleType));
            }
            if successor.constraint.kind == ConstraintType::StartNoEarlierThan {
                return Err(failed(RelationFailure::ConstraintIncompatible));
            }
        }

        if relation_type == RelationType::SF {
            let project_day = self.metadata.project_start.align_prev(TimeUnit::Day);
            let work_start = if pred.schedule.scheduled {
                pred.schedule.work_start
            } else {
                self.metadata.project_start
            };
            if work_start.align_prev(TimeUnit::Day) == project_day {
                return Err(failed(RelationFailure::StartsAtProjectStart));
            }
        }

        if ScheduleDag::would_create_cycle(self, predecessor, task)? {
            return Err(ScheduleError::CyclicDependency {
                predecessor,
                successor: task,
            });
        }
        Ok(())
    }

    /// Unlinks the relation `predecessor -> task`.
    pub fn remove_predecessor(&mut self, task: TaskId, predecessor: TaskId) -> ScheduleResult<()> {
        let relation = self
            .find_relation(predecessor, task)
            .map(Relation::id)
            .ok_or(ScheduleError::NoRelationBetween {
                predecessor,
                successor: task,
            })?;
        self.remove_relation(relation)
    }

    pub fn remove_relation(&mut self, relation: RelationId) -> ScheduleResult<()> {
        let record = self.detach_relation(relation)?;
        info!(
            predecessor = %record.predecessor,
            successor = %record.successor,
            "relation removed"
        );
        self.schedule_changed(None)
    }

    /// Drops the relation from both endpoints and the arena, without rescheduling.
    pub(crate) fn detach_relation(&mut self, relation: RelationId) -> ScheduleResult<Relation> {
        let record = self
            .relations
            .remove(&relation)
            .ok_or(ScheduleError::RelationNotFound(relation))?;
        if let Some(task) = self.tasks.get_mut(&record.successor) {
            task.predecessors.retain(|id| *id != relation);
        }
        if let Some(task) = self.tasks.get_mut(&record.predecessor) {
            task.successors.retain(|id| *id != relation);
        }
        self.emit(ProjectEvent::RelationRemoved {
            relation,
            predecessor: record.predecessor,
            successor: record.successor,
        });
        self.emit(ProjectEvent::Removed(EntityRef::Relation(relation)));
        self.ids.release(EntityRef::Relation(relation));
        Ok(record)
    }

    /// Lag in wall-clock seconds; negative values are leads.
    pub fn set_relation_lag(&mut self, relation: RelationId, lag: i64) -> ScheduleResult<()> {
        let record = self
            .relations
            .get_mut(&relation)
            .ok_or(ScheduleError::RelationNotFound(relation))?;
        record.lag = lag;
        let successor = record.successor;
        self.schedule_changed(Some(successor))
    }

    /// True when a relation joins the two tasks in either direction.
    pub fn has_relation(&self, a: TaskId, b: TaskId) -> bool {
        self.get_task(a).is_some_and(|task| {
            task.predecessors
                .iter()
                .chain(task.successors.iter())
                .filter_map(|id| self.relations.get(id))
                .any(|relation| relation.links(a, b))
        })
    }

    pub fn find_relation(&self, predecessor: TaskId, successor: TaskId) -> Option<&Relation> {
        self.predecessor_relations(successor)
            .find(|relation| relation.predecessor == predecessor)
    }

    /// Relations in which `task` is the successor.
    pub fn predecessor_relations(&self, task: TaskId) -> impl Iterator<Item = &Relation> {
        self.get_task(task)
            .map(|record| record.predecessors.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.relations.get(id))
    }

    /// Relations in which `task` is the predecessor.
    pub fn successor_relations(&self, task: TaskId) -> impl Iterator<Item = &Relation> {
        self.get_task(task)
            .map(|record| record.successors.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.relations.get(id))
    }
}
