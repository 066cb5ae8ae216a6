//! The orphan buffer itself.

use std::collections::{HashMap, HashSet, VecDeque};

use shared_types::{EventDescriptor, EventWindow, PlatformEvent, FIRST_GENERATION};
use tracing::{debug, trace};

use crate::orphan::Orphan;

/// Buffers events until their parents are released.
///
/// State is bounded by the ancient threshold: every map is pruned whenever the
/// event window advances.
#[derive(Debug, Default)]
pub struct OrphanBuffer {
    event_window: EventWindow,
    /// Generation of every released, non-ancient event.
    generations: HashMap<EventDescriptor, u64>,
    /// Buffered events by their own descriptor.
    orphans: HashMap<EventDescriptor, Orphan>,
    /// Missing parent -> buffered children waiting for it.
    waiting_on: HashMap<EventDescriptor, Vec<EventDescriptor>>,
    ancient_discards: u64,
    duplicate_discards: u64,
}

impl OrphanBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an event. Returns every event that became ready, parents first.
    pub fn handle_event(&mut self, event: PlatformEvent) -> Vec<PlatformEvent> {
        if self.event_window.is_event_ancient(&event) {
            self.ancient_discards += 1;
            trace!(event = %event, "Dropping ancient event");
            return Vec::new();
        }

        let descriptor = event.descriptor();
        if self.generations.contains_key(descriptor) || self.orphans.contains_key(descriptor) {
            self.duplicate_discards += 1;
            debug!(event = %event, "Event already held by orphan buffer");
            return Vec::new();
        }

        let missing: HashSet<EventDescriptor> = event
            .all_parents()
            .filter(|p| !self.event_window.is_ancient(p) && !self.generations.contains_key(*p))
            .cloned()
            .collect();

        if missing.is_empty() {
            return self.release(vec![event]);
        }

        trace!(event = %event, missing = missing.len(), "Buffering orphan");
        let descriptor = descriptor.clone();
        for parent in &missing {
            self.waiting_on
                .entry(parent.clone())
                .or_default()
                .push(descriptor.clone());
        }
        self.orphans.insert(descriptor, Orphan::new(event, missing));
        Vec::new()
    }

    /// Adopt a new window. Drops what became ancient and releases orphans that
    /// were only waiting for now-ancient parents.
    pub fn set_event_window(&mut self, window: EventWindow) -> Vec<PlatformEvent> {
        if window.ancient_threshold < self.event_window.ancient_threshold {
            debug!(
                current = self.event_window.ancient_threshold,
                offered = window.ancient_threshold,
                "Ignoring event window that would lower the ancient threshold"
            );
            return Vec::new();
        }
        self.event_window = window;

        self.generations.retain(|d, _| !window.is_ancient(d));
        let before = self.orphans.len();
        self.orphans.retain(|d, _| !window.is_ancient(d));
        let evicted = before - self.orphans.len();
        if evicted > 0 {
            self.ancient_discards += evicted as u64;
            debug!(evicted, "Evicted ancient orphans");
        }

        let now_ancient: Vec<EventDescriptor> = self
            .waiting_on
            .keys()
            .filter(|d| window.is_ancient(d))
            .cloned()
            .collect();
        let mut ready = Vec::new();
        for parent in now_ancient {
            for child in self.waiting_on.remove(&parent).unwrap_or_default() {
                let done = self
                    .orphans
                    .get_mut(&child)
                    .is_some_and(|orphan| orphan.resolve(&parent));
                if done {
                    if let Some(orphan) = self.orphans.remove(&child) {
                        ready.push(orphan.event);
                    }
                }
            }
        }

        let orphans = &self.orphans;
        self.waiting_on.retain(|_, children| {
            children.retain(|c| orphans.contains_key(c));
            !children.is_empty()
        });

        ready.sort_by(|a, b| {
            (a.birth_round(), a.hash()).cmp(&(b.birth_round(), b.hash()))
        });
        self.release(ready)
    }

    /// Assign generations and cascade to children, breadth first.
    fn release(&mut self, ready: Vec<PlatformEvent>) -> Vec<PlatformEvent> {
        let mut released = Vec::with_capacity(ready.len());
        let mut queue: VecDeque<PlatformEvent> = ready.into();

        while let Some(mut event) = queue.pop_front() {
            let n_gen = self.generation_of(&event);
            event.set_n_gen(n_gen);
            let descriptor = event.descriptor().clone();
            self.generations.insert(descriptor.clone(), n_gen);

            for child in self.waiting_on.remove(&descriptor).unwrap_or_default() {
                let done = self
                    .orphans
                    .get_mut(&child)
                    .is_some_and(|orphan| orphan.resolve(&descriptor));
                if done {
                    if let Some(orphan) = self.orphans.remove(&child) {
                        queue.push_back(orphan.event);
                    }
                }
            }
            released.push(event);
        }
        released
    }

    fn generation_of(&self, event: &PlatformEvent) -> u64 {
        event
            .all_parents()
            .filter_map(|p| self.generations.get(p))
            .max()
            .map_or(FIRST_GENERATION, |g| g + 1)
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Released events still tracked for generation lookups.
    pub fn resolved_count(&self) -> usize {
        self.generations.len()
    }

    pub fn ancient_discards(&self) -> u64 {
        self.ancient_discards
    }

    pub fn duplicate_discards(&self) -> u64 {
        self.duplicate_discards
    }

    pub fn clear(&mut self) {
        self.event_window = EventWindow::genesis();
        self.generations.clear();
        self.orphans.clear();
        self.waiting_on.clear();
    }
}
