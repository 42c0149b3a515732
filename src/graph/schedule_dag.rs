use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::{RelationId, TaskId};
use crate::project::Project;
use petgraph::Direction;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Precedence graph over leaf tasks.
///
/// A relation touching a summary task stands for an edge between every leaf
/// below its predecessor and every leaf below its successor.
pub struct ScheduleDag {
    pub graph: DiGraph<TaskId, RelationId>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl ScheduleDag {
    pub fn build(project: &Project) -> ScheduleResult<Self> {
        let mut graph: DiGraph<TaskId, RelationId> = DiGraph::new();
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::new();

        // Add nodes first
        for leaf in project.leaves() {
            let node_ix = graph.add_node(leaf);
            id_to_index.insert(leaf, node_ix);
        }

        // Add edges: every leaf of pred -> every leaf of succ
        for relation in project.relations() {
            let from = project.leaf_descendants(relation.predecessor())?;
            let to = project.leaf_descendants(relation.successor())?;
            for u in &from {
                for v in &to {
                    if let (Some(&u_ix), Some(&v_ix)) = (id_to_index.get(u), id_to_index.get(v)) {
                        graph.add_edge(u_ix, v_ix, relation.id());
                    }
                }
            }
        }

        Ok(Self { graph, id_to_index })
    }

    /// Whether adding `predecessor -> successor` would close a cycle.
    pub fn would_create_cycle(
        project: &Project,
        predecessor: TaskId,
        successor: TaskId,
    ) -> ScheduleResult<bool> {
        let from = project.leaf_descendants(predecessor)?;
        let to = project.leaf_descendants(successor)?;
        let from_set: HashSet<TaskId> = from.iter().copied().collect();
        // Overlapping leaves means one task contains the other.
        if to.iter().any(|leaf| from_set.contains(leaf)) {
            return Ok(true);
        }

        let dag = Self::build(project)?;
        for v in &to {
            for u in &from {
                if let (Some(&v_ix), Some(&u_ix)) = (dag.id_to_index.get(v), dag.id_to_index.get(u)) {
                    if has_path_connecting(&dag.graph, v_ix, u_ix, None) {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    fn cycle_error(&self, node: NodeIndex) -> ScheduleError {
        let task = self.graph[node];
        let predecessor = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .next()
            .map(|ix| self.graph[ix])
            .unwrap_or(task);
        ScheduleError::CyclicDependency {
            predecessor,
            successor: task,
        }
    }

    /// Leaves with every predecessor before its successors.
    pub fn topological_order(&self) -> ScheduleResult<Vec<TaskId>> {
        let order = toposort(&self.graph, None).map_err(|cycle| self.cycle_error(cycle.node_id()))?;
        Ok(order.into_iter().map(|ix| self.graph[ix]).collect())
    }

    /// Topological order where, among ready leaves, higher priority goes first
    /// and ties go to the lower id.
    pub fn priority_order(&self, project: &Project) -> ScheduleResult<Vec<TaskId>> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|ix| (ix, self.graph.neighbors_directed(ix, Direction::Incoming).count()))
            .collect();

        let key = |ix: NodeIndex| {
            let task = self.graph[ix];
            let priority = project.get_task(task).map(|t| t.priority()).unwrap_or(0);
            (priority, Reverse(task), ix)
        };

        let mut ready: BinaryHeap<(i32, Reverse<TaskId>, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(ix, _)| key(*ix))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some((_, Reverse(task), ix)) = ready.pop() {
            order.push(task);
            // neighbors() yields one entry per edge, matching the in-degree count
            for succ_ix in self.graph.neighbors_directed(ix, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&succ_ix) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(key(succ_ix));
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let stuck = in_degree
                .iter()
                .find(|(_, degree)| **degree > 0)
                .map(|(ix, _)| *ix);
            if let Some(ix) = stuck {
                return Err(self.cycle_error(ix));
            }
        }
        Ok(order)
    }
}
