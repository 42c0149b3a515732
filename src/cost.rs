//! Cost aggregation with a per-task cache.
//!
//! A leaf costs the sum of `units / 100 * duration_hours * cost_per_hour` over its
//! assignments; a summary costs the sum of its children. Invalidation walks from a
//! task up to the root and never down, so sibling subtrees keep their caches.

use crate::error::ScheduleResult;
use crate::ids::TaskId;
use crate::project::Project;
use crate::time::SECONDS_PER_HOUR;

impl Project {
    /// Cost of `task`, computed on demand and cached.
    pub fn task_cost(&mut self, task: TaskId) -> ScheduleResult<f64> {
        if let Some(cost) = self.task(task)?.cached_cost() {
            return Ok(cost);
        }

        let record = self.task(task)?;
        let cost = if record.is_summary() {
            let children = record.children().to_vec();
            let mut total = 0.0;
            for child in children {
                total += self.task_cost(child)?;
            }
            total
        } else {
            let hours = record.duration() as f64 / SECONDS_PER_HOUR as f64;
            let mut total = 0.0;
            for assignment in self.task_assignments(task) {
                let rate = self.resource(assignment.resource())?.cost_per_hour();
                total += f64::from(assignment.units()) / 100.0 * hours * rate;
            }
            total
        };

        let record = self.task_mut(task)?;
        record.cost = cost;
        record.cost_cached = true;
        Ok(cost)
    }

    /// Total cost of the project.
    pub fn project_cost(&mut self) -> ScheduleResult<f64> {
        self.task_cost(self.root)
    }

    /// Drops the cached cost of `task` and of every ancestor.
    pub fn invalidate_cost(&mut self, task: TaskId) {
        let mut current = Some(task);
        while let Some(id) = current {
            match self.tasks.get_mut(&id) {
                Some(record) => {
                    record.cost_cached = false;
                    current = record.parent;
                }
                None => break,
            }
        }
    }
}
