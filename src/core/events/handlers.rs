//=========================================================================
// Handler Registry
//=========================================================================
//
// Per-object table of event handlers, keyed by handler name.
//
// Registration:
//   Handlers::new()
//       .on(Player::on_update)          // name derived: "on_update"
//       .on_named("on_key_pressed", ..) // explicit name
//
// Dispatch looks a handler up by the name derived from the delivered
// event. When the registered handler was built for a different event
// type (or a different receiver type) the call is rejected and reported
// as a bad event handler.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use super::{handler_name_of, short_type_name, Event, EventContext};
use crate::core::errors::{EngineError, HandlerResult};
use crate::core::objects::GameObject;

//=== Erased Handler ======================================================

/// Raised by an erased handler when the receiver or the event has the
/// wrong concrete type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mismatch;

type ErasedHandler =
    dyn Fn(&mut dyn Any, &dyn Event, &mut EventContext<'_>) -> Result<HandlerResult, Mismatch>;

fn erase<F>(f: F) -> Rc<ErasedHandler>
where
    F: Fn(&mut dyn Any, &dyn Event, &mut EventContext<'_>) -> Result<HandlerResult, Mismatch>
        + 'static,
{
    Rc::new(f)
}

/// One registered handler.
#[derive(Clone)]
pub(crate) struct HandlerEntry {
    event_name: &'static str,
    call: Rc<ErasedHandler>,
}

//=== Handlers ============================================================

/// Handler table owned by a game object, subsystem or scene.
///
/// Entries are reference counted, so cloning a table is cheap and the
/// engine can release its borrow of the owner before calling in.
#[derive(Clone, Default)]
pub struct Handlers {
    entries: HashMap<String, HandlerEntry>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` under the name derived from `E`.
    ///
    /// `T` is the concrete type of the object that owns this table.
    pub fn on<T, E, F>(self, f: F) -> Self
    where
        T: Any,
        E: Event,
        F: Fn(&mut T, &E, &mut EventContext<'_>) -> HandlerResult + 'static,
    {
        let name = handler_name_of::<E>();
        self.on_named(name, f)
    }

    /// Registers `f` under an explicit handler name.
    ///
    /// Delivering an event whose derived name is `name` but whose type is
    /// not `E` fails with [`EngineError::BadEventHandler`].
    pub fn on_named<T, E, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        T: Any,
        E: Event,
        F: Fn(&mut T, &E, &mut EventContext<'_>) -> HandlerResult + 'static,
    {
        let call = erase(move |receiver, event, ctx| {
            let receiver = receiver.downcast_mut::<T>().ok_or(Mismatch)?;
            let event = event.downcast_ref::<E>().ok_or(Mismatch)?;
            Ok(f(receiver, event, ctx))
        });

        let entry = HandlerEntry {
            event_name: short_type_name(std::any::type_name::<E>()),
            call,
        };
        self.entries.insert(name.into(), entry);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered handler names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&HandlerEntry> {
        self.entries.get(name)
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, entry.event_name)))
            .finish()
    }
}

//=== Invocation ==========================================================

/// Calls `target`'s handler named `name`, if it has one.
///
/// Returns `Ok(true)` when a handler ran. Handler failures are converted
/// with [`EngineError::from_handler`].
pub(crate) fn invoke(
    target: &mut dyn GameObject,
    name: &str,
    event: &dyn Event,
    ctx: &mut EventContext<'_>,
) -> Result<bool, EngineError> {
    let Some(entry) = target.handlers().and_then(|h| h.get(name)).cloned() else {
        return Ok(false);
    };
    let object = target.type_name();

    match (entry.call)(target.as_any_mut(), event, ctx) {
        Ok(Ok(())) => Ok(true),
        Ok(Err(error)) => Err(EngineError::from_handler(error)),
        Err(Mismatch) => Err(EngineError::BadEventHandler {
            object,
            method: name.to_string(),
            event: event.event_name(),
        }),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{EventQueue, Idle, Update};
    use crate::core::objects::Node;

    fn with_ctx<R>(f: impl FnOnce(&mut EventContext<'_>) -> R) -> (R, EventQueue) {
        let mut queue = EventQueue::new();
        let mut commands = Vec::new();
        let result = {
            let mut ctx = EventContext::new(&mut queue, None, None, &mut commands);
            f(&mut ctx)
        };
        (result, queue)
    }

    //--- Registration -----------------------------------------------------

    #[test]
    fn on_derives_name_from_event_type() {
        let handlers = Handlers::new()
            .on(|_: &mut Node, _: &Update, _: &mut EventContext<'_>| Ok(()));
        assert!(handlers.contains("on_update"));
        assert_eq!(handlers.len(), 1);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let handlers = Handlers::new()
            .on(|_: &mut Node, _: &Update, _: &mut EventContext<'_>| Ok(()))
            .on_named("on_update", |_: &mut Node, _: &Update, _: &mut EventContext<'_>| Ok(()));
        assert_eq!(handlers.len(), 1);
    }

    //--- Invocation -------------------------------------------------------

    #[test]
    fn invoke_runs_matching_handler() {
        let mut node = Node::new().with_handlers(Handlers::new().on(
            |node: &mut Node, event: &Update, ctx: &mut EventContext<'_>| {
                node.properties.set("dt", event.time_delta);
                ctx.signal(Idle { time_delta: 0.0 });
                Ok(())
            },
        ));

        let (ran, queue) = with_ctx(|ctx| {
            invoke(&mut node, "on_update", &Update { time_delta: 0.5 }, ctx)
        });

        assert!(ran.unwrap());
        assert_eq!(node.properties.get_f64("dt"), Some(0.5));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn missing_handler_is_skipped() {
        let mut node = Node::new();
        let (ran, _) = with_ctx(|ctx| invoke(&mut node, "on_update", &Update { time_delta: 0.1 }, ctx));
        assert!(!ran.unwrap());
    }

    #[test]
    fn wrong_event_type_is_a_bad_event_handler() {
        let mut node = Node::new().with_handlers(Handlers::new().on_named(
            "on_update",
            |_: &mut Node, _: &Idle, _: &mut EventContext<'_>| Ok(()),
        ));

        let (result, _) = with_ctx(|ctx| invoke(&mut node, "on_update", &Update { time_delta: 0.1 }, ctx));

        match result {
            Err(EngineError::BadEventHandler { object, method, event }) => {
                assert!(object.ends_with("Node"));
                assert_eq!(method, "on_update");
                assert_eq!(event, "Update");
            }
            other => panic!("expected BadEventHandler, got {other:?}"),
        }
    }

    #[test]
    fn handler_errors_propagate() {
        let mut node = Node::new().with_handlers(Handlers::new().on(
            |_: &mut Node, _: &Update, _: &mut EventContext<'_>| Err("exploded".into()),
        ));

        let (result, _) = with_ctx(|ctx| invoke(&mut node, "on_update", &Update { time_delta: 0.1 }, ctx));
        let error = result.unwrap_err();
        assert!(matches!(error, EngineError::Handler(_)));
        assert_eq!(error.to_string(), "exploded");
    }
}
