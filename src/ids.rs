use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_id!(
    /// Identifies a task in the work-breakdown tree.
    TaskId
);
typed_id!(
    /// Identifies a precedence edge.
    RelationId
);
typed_id!(
    /// Identifies a work or material resource.
    ResourceId
);
typed_id!(
    /// Identifies one task/resource assignment.
    AssignmentId
);
typed_id!(
    /// Identifies a node in the calendar tree.
    CalendarId
);
typed_id!(
    /// Identifies a day type in the project-wide registry.
    DayId
);

impl DayId {
    pub const WORK: DayId = DayId(1);
    pub const NONWORK: DayId = DayId(2);
    pub const USE_BASE: DayId = DayId(3);

    pub fn is_builtin(self) -> bool {
        self == Self::WORK || self == Self::NONWORK || self == Self::USE_BASE
    }
}

/// What a project-wide id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Task(TaskId),
    Relation(RelationId),
    Resource(ResourceId),
    Assignment(AssignmentId),
    Calendar(CalendarId),
    Day(DayId),
}

impl EntityRef {
    pub fn raw(&self) -> u32 {
        match self {
            EntityRef::Task(id) => id.raw(),
            EntityRef::Relation(id) => id.raw(),
            EntityRef::Resource(id) => id.raw(),
            EntityRef::Assignment(id) => id.raw(),
            EntityRef::Calendar(id) => id.raw(),
            EntityRef::Day(id) => id.raw(),
        }
    }
}

// Raw ids below this value are reserved for builtin day types.
const FIRST_ALLOCATED_ID: u32 = 16;

/// Project-wide table handing out unique ids across every entity kind.
#[derive(Debug, Clone)]
pub struct IdTable {
    next: u32,
    entries: HashMap<u32, EntityRef>,
}

impl Default for IdTable {
    fn default() -> Self {
        let mut entries = HashMap::new();
        for day in [DayId::WORK, DayId::NONWORK, DayId::USE_BASE] {
            entries.insert(day.raw(), EntityRef::Day(day));
        }
        Self {
            next: FIRST_ALLOCATED_ID,
            entries,
        }
    }
}

impl IdTable {
    fn allocate(&mut self) -> u32 {
        let raw = self.next;
        self.next += 1;
        raw
    }

    fn register(&mut self, entity: EntityRef) -> EntityRef {
        self.entries.insert(entity.raw(), entity);
        entity
    }

    pub(crate) fn task(&mut self) -> TaskId {
        let id = TaskId(self.allocate());
        self.register(EntityRef::Task(id));
        id
    }

    pub(crate) fn relation(&mut self) -> RelationId {
        let id = RelationId(self.allocate());
        self.register(EntityRef::Relation(id));
        id
    }

    pub(crate) fn resource(&mut self) -> ResourceId {
        let id = ResourceId(self.allocate());
        self.register(EntityRef::Resource(id));
        id
    }

    pub(crate) fn assignment(&mut self) -> AssignmentId {
        let id = AssignmentId(self.allocate());
        self.register(EntityRef::Assignment(id));
        id
    }

    pub(crate) fn calendar(&mut self) -> CalendarId {
        let id = CalendarId(self.allocate());
        self.register(EntityRef::Calendar(id));
        id
    }

    pub(crate) fn day(&mut self) -> DayId {
        let id = DayId(self.allocate());
        self.register(EntityRef::Day(id));
        id
    }

    pub(crate) fn release(&mut self, entity: EntityRef) {
        self.entries.remove(&entity.raw());
    }

    pub fn lookup(&self, raw: u32) -> Option<EntityRef> {
        self.entries.get(&raw).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
