use crate::ids::ResourceId;
use crate::time::TimeValue;
use std::collections::HashMap;

/// Busy-until bookkeeping for the priority extension: a leaf cannot start
/// before every Work resource it uses is free again.
#[derive(Debug, Default, Clone)]
pub struct ResourceLeveling {
    busy_until: HashMap<ResourceId, TimeValue>,
}

impl ResourceLeveling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn available_from(&self, resources: &[ResourceId]) -> Option<TimeValue> {
        resources
            .iter()
            .filter_map(|resource| self.busy_until.get(resource))
            .max()
            .copied()
    }

    pub fn reserve(&mut self, resources: &[ResourceId], until: TimeValue) {
        for resource in resources {
            let entry = self.busy_until.entry(*resource).or_insert(until);
            *entry = (*entry).max(until);
        }
    }
}
