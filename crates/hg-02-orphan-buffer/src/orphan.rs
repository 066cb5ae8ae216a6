use std::collections::HashSet;

use shared_types::{EventDescriptor, PlatformEvent};

/// A buffered event and the parents it is still waiting for.
#[derive(Debug)]
pub struct Orphan {
    pub event: PlatformEvent,
    pub missing_parents: HashSet<EventDescriptor>,
}

impl Orphan {
    pub fn new(event: PlatformEvent, missing_parents: HashSet<EventDescriptor>) -> Self {
        Self {
            event,
            missing_parents,
        }
    }

    /// Mark `parent` as resolved. Returns true once nothing is missing.
    pub fn resolve(&mut self, parent: &EventDescriptor) -> bool {
        self.missing_parents.remove(parent);
        self.missing_parents.is_empty()
    }
}
