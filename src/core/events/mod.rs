//=========================================================================
// Event Model
//=========================================================================
//
// Events are plain Rust values. Any `'static + Debug` type is an event;
// the engine routes it by name to every object that registered a handler
// for it.
//
// Architecture:
//   signal(E) → EventQueue (FIFO of Envelope)
//                   ↓ publish()
//   extensions → engine → subsystems → scene → scene children
//                   ↓
//   Handlers table lookup: "on_" + snake_case(type name)
//
//=========================================================================

//=== Module Declarations =================================================

mod context;
mod handlers;
mod naming;
mod queue;
pub mod types;

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::fmt::Debug;

//=== Public API ==========================================================

pub use context::{EventContext, SceneCommand};
pub use handlers::Handlers;
pub(crate) use handlers::invoke;
pub use naming::{camel_to_snake, handler_name, short_type_name};
pub use queue::{Envelope, EventQueue};
pub use types::*;

//=== Event Trait =========================================================

/// A value that can travel through the engine's event queue.
///
/// Implemented for every `'static + Debug` type. Call the methods on a
/// `&dyn Event` (never on a `Box<dyn Event>`, which is itself a value of
/// an event type).
pub trait Event: Any + Debug {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Short type name, e.g. `KeyPressed`.
    fn event_name(&self) -> &'static str;
}

impl<T: Any + Debug> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn event_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<T>())
    }
}

impl<'a> dyn Event + 'a {
    /// Concrete type id of the event value.
    pub fn event_type(&self) -> TypeId {
        self.as_any().type_id()
    }

    pub fn is<E: Event>(&self) -> bool {
        self.as_any().is::<E>()
    }

    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    pub fn downcast_mut<E: Event>(&mut self) -> Option<&mut E> {
        self.as_any_mut().downcast_mut::<E>()
    }
}

/// Handler name for the event type `E`.
pub fn handler_name_of<E: Event>() -> String {
    handler_name(short_type_name(std::any::type_name::<E>()))
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct PlayerScored {
        points: u32,
    }

    #[test]
    fn event_name_is_short_type_name() {
        let event = PlayerScored { points: 3 };
        assert_eq!(event.event_name(), "PlayerScored");
        assert_eq!(handler_name_of::<PlayerScored>(), "on_player_scored");
    }

    #[test]
    fn boxed_events_downcast_through_dyn_reference() {
        let mut boxed: Box<dyn Event> = Box::new(PlayerScored { points: 3 });
        let event: &mut dyn Event = &mut *boxed;

        assert!(event.is::<PlayerScored>());
        assert_eq!(event.event_type(), TypeId::of::<PlayerScored>());
        event.downcast_mut::<PlayerScored>().unwrap().points += 1;
        assert_eq!(event.downcast_ref::<PlayerScored>().unwrap().points, 4);
        assert!(event.downcast_ref::<Idle>().is_none());
    }
}
