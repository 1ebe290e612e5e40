//=========================================================================
// Input System
//=========================================================================
//
// Polls the platform input source on every `Idle` and translates raw
// events into engine events in world coordinates.
//
//   RawEvent::KeyDown      → KeyPressed   (first press only)
//   RawEvent::KeyUp        → KeyReleased
//   RawEvent::ButtonDown   → ButtonPressed  { position: world }
//   RawEvent::ButtonUp     → ButtonReleased { position: world }
//   RawEvent::CursorMoved  → MouseMotion
//   RawEvent::Quit         → Quit
//
// World coordinates come from the current scene's main camera; without
// one a default camera is assumed.
//
//=========================================================================

//=== Module Declarations =================================================

mod event;
mod state;

//=== External Dependencies ===============================================

use glam::Vec2;
use log::{trace, warn};

//=== Internal Dependencies ===============================================

use super::{Subsystem, SubsystemContext};
use crate::core::errors::{EngineError, HandlerResult};
use crate::core::events::{
    ButtonPressed, ButtonReleased, EventContext, Handlers, Idle, KeyPressed, KeyReleased,
    MouseMotion, Quit,
};
use crate::core::objects::GameObject;
use crate::core::scene::Camera;
use crate::platform::InputSource;

//=== Public API ==========================================================

pub use event::{KeyCode, Modifiers, MouseButton, RawEvent};
pub use state::InputState;

//=== InputSystem =========================================================

/// Raw platform input to engine events.
pub struct InputSystem {
    handlers: Handlers,
    source: Box<dyn InputSource>,
    state: InputState,
}

impl InputSystem {
    pub fn new(source: Box<dyn InputSource>) -> Self {
        Self {
            handlers: Handlers::new().on(Self::on_idle),
            source,
            state: InputState::new(),
        }
    }

    pub fn from_context(ctx: &SubsystemContext<'_>) -> Result<Self, EngineError> {
        Ok(Self::new(ctx.open_input()?))
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    fn on_idle(&mut self, _event: &Idle, ctx: &mut EventContext<'_>) -> HandlerResult {
        let raw_events = self.source.poll();
        if raw_events.is_empty() {
            return Ok(());
        }

        let camera = ctx
            .current_scene()
            .and_then(|scene| scene.main_camera())
            .cloned()
            .unwrap_or_default();

        for raw in raw_events {
            self.translate(raw, &camera, ctx);
        }
        Ok(())
    }

    /// Updates the held state and signals the matching engine event.
    pub fn translate(&mut self, raw: RawEvent, camera: &Camera, ctx: &mut EventContext<'_>) {
        match raw {
            RawEvent::KeyDown { key, repeat } => {
                if key == KeyCode::Unidentified {
                    warn!(target: "systems::input", "dropping unmapped key press");
                    return;
                }
                if !self.state.press_key(key) || repeat {
                    trace!(target: "systems::input", "suppressed repeat of {:?}", key);
                    return;
                }
                ctx.signal(KeyPressed {
                    key,
                    mods: self.state.modifiers(),
                });
            }

            RawEvent::KeyUp { key } => {
                if key == KeyCode::Unidentified {
                    return;
                }
                self.state.release_key(key);
                ctx.signal(KeyReleased {
                    key,
                    mods: self.state.modifiers(),
                });
            }

            RawEvent::ButtonDown { button } => {
                self.state.press_button(button);
                ctx.signal(ButtonPressed {
                    button,
                    position: self.world_cursor(camera),
                });
            }

            RawEvent::ButtonUp { button } => {
                self.state.release_button(button);
                ctx.signal(ButtonReleased {
                    button,
                    position: self.world_cursor(camera),
                });
            }

            RawEvent::CursorMoved { position } => {
                let pixel_delta = self.state.move_cursor(position);
                ctx.signal(MouseMotion {
                    position: camera.translate_to_frame(position),
                    screen_position: position,
                    delta: pixel_delta / camera.pixel_ratio,
                    buttons: self.state.buttons().clone(),
                });
            }

            RawEvent::ModifiersChanged(modifiers) => self.state.set_modifiers(modifiers),

            RawEvent::Quit => ctx.signal(Quit),
        }
    }

    fn world_cursor(&self, camera: &Camera) -> Vec2 {
        let screen = self.state.cursor().unwrap_or_else(|| camera.viewport_center());
        camera.translate_to_frame(screen)
    }
}

impl std::fmt::Debug for InputSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSystem").field("state", &self.state).finish()
    }
}

impl GameObject for InputSystem {
    fn handlers(&self) -> Option<&Handlers> {
        Some(&self.handlers)
    }
}

impl Subsystem for InputSystem {
    fn deactivate(&mut self) -> Result<(), EngineError> {
        self.state.clear();
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{Event, EventQueue};
    use crate::platform::ChannelInput;

    //--- Test Helpers -----------------------------------------------------

    fn system() -> (InputSystem, crossbeam_channel::Sender<RawEvent>) {
        let (input, sender) = ChannelInput::new();
        (InputSystem::new(Box::new(input)), sender)
    }

    fn translate_all(system: &mut InputSystem, raw: &[RawEvent]) -> Vec<Box<dyn Event>> {
        let camera = Camera::new((800, 600), 80.0);
        let mut queue = EventQueue::new();
        let mut commands = Vec::new();
        {
            let mut ctx = EventContext::new(&mut queue, None, None, &mut commands);
            for event in raw {
                system.translate(*event, &camera, &mut ctx);
            }
        }
        std::iter::from_fn(|| queue.pop()).map(|envelope| envelope.event).collect()
    }

    //--- Keys -------------------------------------------------------------

    #[test]
    fn key_repeats_are_suppressed() {
        let (mut system, _sender) = system();
        let events = translate_all(
            &mut system,
            &[
                RawEvent::KeyDown { key: KeyCode::Space, repeat: false },
                RawEvent::KeyDown { key: KeyCode::Space, repeat: true },
                RawEvent::KeyDown { key: KeyCode::Space, repeat: false },
                RawEvent::KeyUp { key: KeyCode::Space },
            ],
        );
        assert_eq!(events.len(), 2);
        assert!(events[0].is::<KeyPressed>());
        assert!(events[1].is::<KeyReleased>());
    }

    #[test]
    fn key_events_carry_held_modifiers() {
        let (mut system, _sender) = system();
        let events = translate_all(
            &mut system,
            &[
                RawEvent::ModifiersChanged(Modifiers::CTRL),
                RawEvent::KeyDown { key: KeyCode::KeyS, repeat: false },
            ],
        );
        let pressed = events[0].downcast_ref::<KeyPressed>().unwrap();
        assert_eq!(pressed.key, KeyCode::KeyS);
        assert_eq!(pressed.mods, Modifiers::CTRL);
    }

    #[test]
    fn unidentified_keys_are_dropped() {
        let (mut system, _sender) = system();
        let events = translate_all(
            &mut system,
            &[
                RawEvent::KeyDown { key: KeyCode::Unidentified, repeat: false },
                RawEvent::KeyUp { key: KeyCode::Unidentified },
            ],
        );
        assert!(events.is_empty());
    }

    //--- Mouse ------------------------------------------------------------

    #[test]
    fn mouse_motion_is_reported_in_world_units() {
        let (mut system, _sender) = system();
        let events = translate_all(
            &mut system,
            &[
                RawEvent::CursorMoved { position: Vec2::new(400.0, 300.0) },
                RawEvent::ButtonDown { button: MouseButton::Primary },
                RawEvent::CursorMoved { position: Vec2::new(560.0, 220.0) },
            ],
        );

        let motion = events[2].downcast_ref::<MouseMotion>().unwrap();
        assert_eq!(motion.position, Vec2::new(2.0, -1.0));
        assert_eq!(motion.screen_position, Vec2::new(560.0, 220.0));
        assert_eq!(motion.delta, Vec2::new(2.0, -1.0));
        assert!(motion.buttons.contains(&MouseButton::Primary));
    }

    #[test]
    fn button_events_use_last_cursor_position() {
        let (mut system, _sender) = system();
        let events = translate_all(
            &mut system,
            &[
                RawEvent::CursorMoved { position: Vec2::new(480.0, 300.0) },
                RawEvent::ButtonDown { button: MouseButton::Secondary },
                RawEvent::ButtonUp { button: MouseButton::Secondary },
            ],
        );
        let pressed = events[1].downcast_ref::<ButtonPressed>().unwrap();
        assert_eq!(pressed.button, MouseButton::Secondary);
        assert_eq!(pressed.position, Vec2::new(1.0, 0.0));
        assert!(events[2].is::<ButtonReleased>());
        assert!(system.state().buttons().is_empty());
    }

    //--- Polling ----------------------------------------------------------

    #[test]
    fn idle_polls_the_source() {
        let (mut system, sender) = system();
        sender.send(RawEvent::Quit).unwrap();

        let mut queue = EventQueue::new();
        let mut commands = Vec::new();
        let mut ctx = EventContext::new(&mut queue, None, None, &mut commands);
        crate::core::events::invoke(&mut system, "on_idle", &Idle { time_delta: 0.0 }, &mut ctx)
            .unwrap();

        assert_eq!(queue.pending_names(), vec!["Quit"]);
    }
}
