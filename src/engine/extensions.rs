//=========================================================================
// Extensions
//=========================================================================
//
// Callbacks that see every event before any handler does and may mutate
// it in place.
//
//   publish(event)
//     ├─ typed extensions for TypeId::of::<E>()   (registration order)
//     ├─ wildcard extensions                      (registration order)
//     └─ handlers ...
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::events::Event;

//=== Extensions ==========================================================

type Extension = Box<dyn FnMut(&mut dyn Event)>;

#[derive(Default)]
pub struct Extensions {
    typed: HashMap<TypeId, Vec<Extension>>,
    wildcard: Vec<Extension>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `extension` on every event of type `E`.
    pub fn add<E, F>(&mut self, mut extension: F)
    where
        E: Event,
        F: FnMut(&mut E) + 'static,
    {
        let erased = move |event: &mut dyn Event| {
            if let Some(event) = event.downcast_mut::<E>() {
                extension(event);
            }
        };
        self.typed
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Box::new(erased));
    }

    /// Runs `extension` on every event.
    pub fn add_wildcard<F>(&mut self, extension: F)
    where
        F: FnMut(&mut dyn Event) + 'static,
    {
        self.wildcard.push(Box::new(extension));
    }

    pub fn len(&self) -> usize {
        self.typed.values().map(Vec::len).sum::<usize>() + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn run(&mut self, event: &mut dyn Event) {
        if let Some(extensions) = self.typed.get_mut(&event.event_type()) {
            for extension in extensions {
                extension(&mut *event);
            }
        }
        for extension in &mut self.wildcard {
            extension(&mut *event);
        }
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("typed", &self.typed.len())
            .field("wildcard", &self.wildcard.len())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{Idle, Update};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn typed_run_before_wildcard_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut extensions = Extensions::new();

        let wild = Rc::clone(&log);
        extensions.add_wildcard(move |event: &mut dyn Event| {
            let event: &dyn Event = event;
            wild.borrow_mut().push(format!("wildcard:{}", event.event_name()));
        });
        let first = Rc::clone(&log);
        extensions.add(move |_: &mut Idle| first.borrow_mut().push("idle:1".to_string()));
        let second = Rc::clone(&log);
        extensions.add(move |_: &mut Idle| second.borrow_mut().push("idle:2".to_string()));

        extensions.run(&mut Idle { time_delta: 0.5 });
        extensions.run(&mut Update { time_delta: 0.5 });

        assert_eq!(
            *log.borrow(),
            vec!["idle:1", "idle:2", "wildcard:Idle", "wildcard:Update"]
        );
        assert_eq!(extensions.len(), 3);
    }

    #[test]
    fn extensions_mutate_in_place() {
        let mut extensions = Extensions::new();
        extensions.add(|idle: &mut Idle| idle.time_delta *= 2.0);

        let mut event = Idle { time_delta: 0.25 };
        extensions.run(&mut event);
        assert_eq!(event.time_delta, 0.5);
    }
}
