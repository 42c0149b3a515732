use super::Project;
use super::tasks::ModeTrigger;
use crate::error::{ScheduleError, ScheduleResult};
use crate::events::ProjectEvent;
use crate::graph::schedule_dag::ScheduleDag;
use crate::ids::{EntityRef, TaskId};
use crate::task::{Task, TaskSpec, TaskType};
use crate::task_validation;
use tracing::{debug, info};

impl Project {
    /// Appends a task at the top level of the WBS.
    pub fn add_task(&mut self, spec: TaskSpec) -> ScheduleResult<TaskId> {
        self.insert_child(self.root, None, spec)
    }

    /// Inserts a new task under `parent`, at `position` among its siblings
    /// (appended when `None` or past the end).
    pub fn insert_child(
        &mut self,
        parent: TaskId,
        position: Option<usize>,
        spec: TaskSpec,
    ) -> ScheduleResult<TaskId> {
        task_validation::validate_spec(&spec)?;
        self.task(parent)?;

        let trigger = if spec.work.is_some() {
            ModeTrigger::Work
        } else {
            ModeTrigger::Duration
        };
        let id = self.ids.task();
        self.tasks.insert(id, Task::from_spec(id, Some(parent), spec));
        self.adopt(parent, id, position)?;
        self.apply_scheduling_mode(id, trigger)?;
        debug!(task = %id, parent = %parent, "task inserted");
        self.schedule_changed(None)?;
        Ok(id)
    }

    /// Links `child` under `parent`, turning `parent` into a summary task if needed.
    fn adopt(&mut self, parent: TaskId, child: TaskId, position: Option<usize>) -> ScheduleResult<()> {
        let root = self.root;
        let (was_leaf, was_milestone) = {
            let record = self.task(parent)?;
            (!record.is_summary(), record.is_milestone())
        };

        if parent != root && was_leaf {
            let assignments = self.task(parent)?.assignments.clone();
            for assignment in assignments {
                self.detach_assignment(assignment)?;
            }
        }
        if was_milestone {
            self.task_mut(parent)?.task_type = TaskType::Normal;
            self.emit(ProjectEvent::TaskFieldChanged {
                task: parent,
                field: "type",
            });
        }

        let siblings = &mut self.task_mut(parent)?.children;
        let index = position.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, child);
        self.task_mut(child)?.parent = Some(parent);
        self.emit(ProjectEvent::ChildAdded { parent, child });
        self.invalidate_cost(parent);
        Ok(())
    }

    fn disown(&mut self, child: TaskId) -> ScheduleResult<Option<TaskId>> {
        let Some(parent) = self.task(child)?.parent else {
            return Ok(None);
        };
        self.task_mut(parent)?.children.retain(|id| *id != child);
        self.task_mut(child)?.parent = None;
        self.emit(ProjectEvent::ChildRemoved { parent, child });
        self.invalidate_cost(parent);
        Ok(Some(parent))
    }

    /// Removes `task` and its whole subtree, children first.
    ///
    /// Each node loses its relations and assignments before it is detached,
    /// so no edge ever points at a removed task. Returns the removed ids.
    pub fn remove_subtree(&mut self, task: TaskId) -> ScheduleResult<Vec<TaskId>> {
        if task == self.root {
            return Err(ScheduleError::invalid_operation("the root task cannot be removed"));
        }
        let order = self.post_order(task)?;
        for id in &order {
            let record = self.task(*id)?;
            let relations: Vec<_> = record
                .predecessors
                .iter()
                .chain(record.successors.iter())
                .copied()
                .collect();
            let assignments = record.assignments.clone();

            for relation in relations {
                if self.relations.contains_key(&relation) {
                    self.detach_relation(relation)?;
                }
            }
            for assignment in assignments {
                self.detach_assignment(assignment)?;
            }
            self.disown(*id)?;
            self.emit(ProjectEvent::Removed(EntityRef::Task(*id)));
            self.tasks.remove(id);
            self.ids.release(EntityRef::Task(*id));
        }
        info!(task = %task, removed = order.len(), "task subtree removed");
        self.schedule_changed(None)?;
        Ok(order)
    }

    pub fn remove_task(&mut self, task: TaskId) -> ScheduleResult<Vec<TaskId>> {
        self.remove_subtree(task)
    }

    /// Moves `task` (with its subtree) under `new_parent`.
    ///
    /// Rejected without side effects when it would move the root, move a task
    /// into its own subtree, or create a dependency cycle.
    pub fn reattach(
        &mut self,
        task: TaskId,
        new_parent: TaskId,
        position: Option<usize>,
    ) -> ScheduleResult<()> {
        if task == self.root {
            return Err(ScheduleError::invalid_operation("the root task cannot be moved"));
        }
        self.task(new_parent)?;
        if task == new_parent || self.is_ancestor(task, new_parent)? {
            return Err(ScheduleError::invalid_operation(format!(
                "task {new_parent} is inside the subtree of {task}"
            )));
        }

        // Dry run: summary relations expand to leaves, so a move can close a cycle.
        let old_parent = self.task(task)?.parent;
        let old_position = old_parent
            .and_then(|parent| self.tasks[&parent].children.iter().position(|id| *id == task));
        self.relink(task, old_parent, new_parent);
        let check = ScheduleDag::build(self).and_then(|dag| dag.topological_order().map(|_| ()));
        self.unlink_for_revert(task, new_parent, old_parent, old_position);
        check?;

        self.disown(task)?;
        self.adopt(new_parent, task, position)?;
        info!(task = %task, parent = %new_parent, "task reattached");
        self.schedule_changed(None)
    }

    fn relink(&mut self, task: TaskId, old_parent: Option<TaskId>, new_parent: TaskId) {
        if let Some(parent) = old_parent.and_then(|id| self.tasks.get_mut(&id)) {
            parent.children.retain(|id| *id != task);
        }
        if let Some(parent) = self.tasks.get_mut(&new_parent) {
            parent.children.push(task);
        }
        if let Some(record) = self.tasks.get_mut(&task) {
            record.parent = Some(new_parent);
        }
    }

    fn unlink_for_revert(
        &mut self,
        task: TaskId,
        new_parent: TaskId,
        old_parent: Option<TaskId>,
        old_position: Option<usize>,
    ) {
        if let Some(parent) = self.tasks.get_mut(&new_parent) {
            parent.children.retain(|id| *id != task);
        }
        if let Some(parent) = old_parent.and_then(|id| self.tasks.get_mut(&id)) {
            let index = old_position.unwrap_or(parent.children.len()).min(parent.children.len());
            parent.children.insert(index, task);
        }
        if let Some(record) = self.tasks.get_mut(&task) {
            record.parent = old_parent;
        }
    }

    /// `task`'s parent, grandparent, ... up to and including the root.
    pub fn ancestors(&self, task: TaskId) -> ScheduleResult<Vec<TaskId>> {
        let mut chain = Vec::new();
        let mut current = self.task(task)?.parent;
        while let Some(id) = current {
            chain.push(id);
            current = self.task(id)?.parent;
        }
        Ok(chain)
    }

    pub fn is_ancestor(&self, ancestor: TaskId, task: TaskId) -> ScheduleResult<bool> {
        Ok(self.ancestors(task)?.contains(&ancestor))
    }

    /// Subtree of `task` in post-order (children before parents, `task` last).
    pub fn post_order(&self, task: TaskId) -> ScheduleResult<Vec<TaskId>> {
        let mut order = Vec::new();
        let mut stack = vec![(task, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.task(id)?.children.iter().rev() {
                stack.push((*child, false));
            }
        }
        Ok(order)
    }

    /// Subtree of `task` in outline order (parents before children, `task` first).
    pub fn pre_order(&self, task: TaskId) -> ScheduleResult<Vec<TaskId>> {
        let mut order = Vec::new();
        let mut stack = vec![task];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.task(id)?.children.iter().rev().copied());
        }
        Ok(order)
    }

    /// Leaves of the subtree rooted at `task`; a leaf is its own only leaf.
    pub fn leaf_descendants(&self, task: TaskId) -> ScheduleResult<Vec<TaskId>> {
        let mut leaves = Vec::new();
        for id in self.post_order(task)? {
            if !self.task(id)?.is_summary() {
                leaves.push(id);
            }
        }
        Ok(leaves)
    }

    /// Every leaf task in WBS order, excluding the root.
    pub fn leaves(&self) -> Vec<TaskId> {
        let root = self.root;
        self.leaf_descendants(root)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| *id != root)
            .collect()
    }

    /// Outline number such as `2.1.3`.
    pub fn wbs_id(&self, task: TaskId) -> ScheduleResult<String> {
        let mut parts = Vec::new();
        let mut current = task;
        while let Some(parent) = self.task(current)?.parent {
            let index = self
                .task(parent)?
                .children
                .iter()
                .position(|id| *id == current)
                .unwrap_or(0);
            parts.push((index + 1).to_string());
            current = parent;
        }
        parts.reverse();
        Ok(parts.join("."))
    }
}
