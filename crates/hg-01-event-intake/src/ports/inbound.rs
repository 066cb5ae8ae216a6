//! Driving ports (Inbound API)

use std::sync::Arc;

use shared_types::{EventWindow, PlatformEvent, RosterHistory};

/// Event intake API.
pub trait EventIntakeApi {
    /// Validate, deduplicate and verify a hashed event.
    ///
    /// Returns the event when it may proceed to the orphan buffer, `None`
    /// when it was discarded.
    fn process_hashed_event(&mut self, event: PlatformEvent) -> Option<PlatformEvent>;

    /// Adopt a new ancient threshold and evict what fell below it.
    fn set_event_window(&mut self, window: EventWindow);

    /// Publish a replacement roster history.
    fn update_roster_history(&mut self, history: Arc<RosterHistory>);

    /// Drop all per-event state.
    fn clear(&mut self);
}
