//=========================================================================
// Event Queue
//=========================================================================
//
// FIFO of pending events owned by the engine. Each entry is an envelope
// that learns which scene it is delivered to when it is popped.
//
// Flow:
//   signal(E) ─push─> [Envelope, Envelope, ...] ─pop─> publish()
//
// Scene transitions drain the queue into the outgoing scene before the
// stack changes, so its events never reach the incoming one.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::fmt;

//=== Internal Dependencies ===============================================

use super::Event;
use crate::core::scene::SceneId;

//=== Envelope ============================================================

/// A queued event plus its delivery scene.
pub struct Envelope {
    pub event: Box<dyn Event>,

    /// Scene the event is delivered to. `None` until the engine pops it.
    pub scene: Option<SceneId>,
}

impl Envelope {
    pub fn new(event: Box<dyn Event>) -> Self {
        Self { event, scene: None }
    }

    /// Short type name of the wrapped event.
    pub fn event_name(&self) -> &'static str {
        let event: &dyn Event = &*self.event;
        event.event_name()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("event", &self.event)
            .field("scene", &self.scene)
            .finish()
    }
}

//=== EventQueue ==========================================================

/// First-in, first-out queue of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<Envelope>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event at the tail.
    pub fn push<E: Event>(&mut self, event: E) {
        self.push_boxed(Box::new(event));
    }

    pub fn push_boxed(&mut self, event: Box<dyn Event>) {
        self.pending.push_back(Envelope::new(event));
    }

    /// Removes the head of the queue.
    pub fn pop(&mut self) -> Option<Envelope> {
        self.pending.pop_front()
    }

    /// Discards every pending event, returning how many were dropped.
    pub fn flush(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Short names of pending events, head first.
    pub fn pending_names(&self) -> Vec<&'static str> {
        self.pending.iter().map(Envelope::event_name).collect()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
