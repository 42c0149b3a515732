//! Change notifications emitted by a [`crate::Project`].

use crate::ids::{AssignmentId, CalendarId, EntityRef, RelationId, ResourceId, TaskId};
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectEvent {
    /// A stored task field changed; `field` is the field name.
    TaskFieldChanged { task: TaskId, field: &'static str },
    ResourceFieldChanged { resource: ResourceId, field: &'static str },
    RelationAdded { relation: RelationId, predecessor: TaskId, successor: TaskId },
    RelationRemoved { relation: RelationId, predecessor: TaskId, successor: TaskId },
    AssignmentAdded { assignment: AssignmentId, task: TaskId, resource: ResourceId },
    AssignmentRemoved { assignment: AssignmentId, task: TaskId, resource: ResourceId },
    ChildAdded { parent: TaskId, child: TaskId },
    ChildRemoved { parent: TaskId, child: TaskId },
    /// Sent just before an entity leaves the project.
    Removed(EntityRef),
    CalendarChanged { calendar: CalendarId },
    NeedsRescheduleChanged(bool),
    Rescheduled { critical_count: usize },
}

/// Fan-out of events to any number of channel subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<ProjectEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Receiver<ProjectEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: ProjectEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        bus.emit(ProjectEvent::NeedsRescheduleChanged(true));
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), ProjectEvent::NeedsRescheduleChanged(true));
    }
}
