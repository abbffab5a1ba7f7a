//! Thread-safe moderator handle
//!
//! Lets several producers (speaker detection, a tick timer, UI buttons)
//! feed one engine while a UI thread polls for changes.
//!
//! ```text
//!  speaker events ─┐
//!  tick timer ─────┼──► SharedModerator::send() ──► Mutex<ModerationEngine>
//!  UI overrides ───┘                                      │
//!                                                         ▼
//!                      UI timer ──► read_if_dirty() ──► Snapshot
//! ```
//!
//! Each `send` holds the lock for the whole apply / recompute / advance
//! sequence, so an event is never observed half-applied.

use crate::engine::{ModerationEngine, Snapshot};
use crate::event::ModerationEvent;
use crate::phase::Phase;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct SharedModerator {
    engine: Mutex<ModerationEngine>,
    dirty: AtomicBool,
}

impl SharedModerator {
    pub fn new(engine: ModerationEngine) -> Arc<Self> {
        Arc::new(Self {
            engine: Mutex::new(engine),
            dirty: AtomicBool::new(true),
        })
    }

    /// Apply one event and mark the state dirty
    pub fn send(&self, event: ModerationEvent) {
        self.engine.lock().send(event);
        self.dirty.store(true, Ordering::Release);
    }

    /// Apply a batch of events under a single lock
    pub fn send_all(&self, events: impl IntoIterator<Item = ModerationEvent>) {
        let mut engine = self.engine.lock();
        for event in events {
            engine.send(event);
        }
        drop(engine);
        self.dirty.store(true, Ordering::Release);
    }

    pub fn phase(&self) -> Phase {
        self.engine.lock().phase()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.lock().snapshot()
    }

    /// Snapshot only if an event was applied since the last dirty read
    pub fn read_if_dirty(&self) -> Option<Snapshot> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.snapshot())
        } else {
            None
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}
