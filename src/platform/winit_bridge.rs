//=========================================================================
// Winit Bridge
//=========================================================================
//
// Converts Winit window events into engine `RawEvent`s and sends them to
// the engine thread over a crossbeam channel.
//
// Architecture:
//   WindowEvent → WinitBridge → RawEvent → Sender ──> ChannelInput
//
// Winit wants the main thread (macOS/iOS), so the engine runs on a
// thread of its own with a `ChannelInput` as its input source. Modifier
// state is sticky: `ModifiersChanged` is forwarded as its own event and
// the input system applies it to later key events.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::Sender;
use glam::Vec2;
use log::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton as WinitMouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode as WinitKeyCode, ModifiersState, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Dependencies ===============================================

use super::PlatformError;
use crate::core::systems::input::{KeyCode, Modifiers, MouseButton, RawEvent};

//=== WinitBridge =========================================================

/// Forwards window input to an engine running on another thread.
pub struct WinitBridge {
    sender: Sender<RawEvent>,
    modifiers: Modifiers,
    title: String,
    size: (u32, u32),

    /// Created lazily in `resumed()`.
    window: Option<Window>,
}

impl WinitBridge {
    pub fn new(sender: Sender<RawEvent>) -> Self {
        Self {
            sender,
            modifiers: Modifiers::NONE,
            title: String::from("Aetheric 2D"),
            size: (800, 600),
            window: None,
        }
    }

    pub fn with_window(mut self, title: impl Into<String>, size: (u32, u32)) -> Self {
        self.title = title.into();
        self.size = size;
        self
    }

    /// Modifiers held according to the last `ModifiersChanged`.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Runs the Winit event loop on the calling thread until the window
    /// closes.
    pub fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting Winit event loop");

        let event_loop = EventLoop::new().map_err(|e| PlatformError::Window(e.to_string()))?;
        event_loop
            .run_app(&mut self)
            .map_err(|e| PlatformError::Window(e.to_string()))
    }

    //--- Translation ------------------------------------------------------

    /// Translates one window event. Returns `true` if it was forwarded.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => self.close_requested(),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers_changed(modifiers.state()),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.key(event.physical_key, event.state, event.repeat)
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse_button(*button, *state),
            _ => false,
        }
    }

    pub fn key(&mut self, physical_key: PhysicalKey, state: ElementState, repeat: bool) -> bool {
        let key = match physical_key {
            PhysicalKey::Code(code) => KeyCode::from(code),
            PhysicalKey::Unidentified(_) => KeyCode::Unidentified,
        };

        let event = match state {
            ElementState::Pressed => RawEvent::KeyDown { key, repeat },
            ElementState::Released => RawEvent::KeyUp { key },
        };
        self.send(event)
    }

    pub fn mouse_button(&mut self, button: WinitMouseButton, state: ElementState) -> bool {
        let Some(button) = mouse_button_from_winit(button) else {
            trace!(target: "platform::input", "Unmapped mouse button ignored");
            return false;
        };

        let event = match state {
            ElementState::Pressed => RawEvent::ButtonDown { button },
            ElementState::Released => RawEvent::ButtonUp { button },
        };
        self.send(event)
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) -> bool {
        self.send(RawEvent::CursorMoved {
            position: Vec2::new(x, y),
        })
    }

    pub fn modifiers_changed(&mut self, state: ModifiersState) -> bool {
        trace!(target: "platform::input", "Modifiers changed: {:?}", state);
        self.modifiers = Modifiers::from(state);
        self.send(RawEvent::ModifiersChanged(self.modifiers))
    }

    pub fn close_requested(&mut self) -> bool {
        info!(target: "platform", "Window close requested");
        self.send(RawEvent::Quit)
    }

    /// If the engine thread is gone the event is dropped so the window
    /// can still be closed.
    fn send(&self, event: RawEvent) -> bool {
        if self.sender.send(event).is_err() {
            warn!(target: "platform::input", "Channel disconnected, dropping {:?}", event);
            return false;
        }
        true
    }
}

impl std::fmt::Debug for WinitBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinitBridge")
            .field("modifiers", &self.modifiers)
            .field("title", &self.title)
            .field("size", &self.size)
            .field("has_window", &self.window.is_some())
            .finish()
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for WinitBridge {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.size.0, self.size.1));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.close_requested();
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.handle_window_event(&event);
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
        }
    }
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Winit normalizes platform keys (macOS Cmd → Ctrl, Option → Alt).
impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            logo: state.super_key(),
        }
    }
}

/// Maps Winit physical key codes to engine key codes.
///
/// Numpad, media and F21+ keys become `KeyCode::Unidentified`.
impl From<WinitKeyCode> for KeyCode {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Digits -------------------------------------------------------

            Digit0 => KeyCode::Digit0,
            Digit1 => KeyCode::Digit1,
            Digit2 => KeyCode::Digit2,
            Digit3 => KeyCode::Digit3,
            Digit4 => KeyCode::Digit4,
            Digit5 => KeyCode::Digit5,
            Digit6 => KeyCode::Digit6,
            Digit7 => KeyCode::Digit7,
            Digit8 => KeyCode::Digit8,
            Digit9 => KeyCode::Digit9,

            //--- Letters ------------------------------------------------------

            KeyA => KeyCode::KeyA,
            KeyB => KeyCode::KeyB,
            KeyC => KeyCode::KeyC,
            KeyD => KeyCode::KeyD,
            KeyE => KeyCode::KeyE,
            KeyF => KeyCode::KeyF,
            KeyG => KeyCode::KeyG,
            KeyH => KeyCode::KeyH,
            KeyI => KeyCode::KeyI,
            KeyJ => KeyCode::KeyJ,
            KeyK => KeyCode::KeyK,
            KeyL => KeyCode::KeyL,
            KeyM => KeyCode::KeyM,
            KeyN => KeyCode::KeyN,
            KeyO => KeyCode::KeyO,
            KeyP => KeyCode::KeyP,
            KeyQ => KeyCode::KeyQ,
            KeyR => KeyCode::KeyR,
            KeyS => KeyCode::KeyS,
            KeyT => KeyCode::KeyT,
            KeyU => KeyCode::KeyU,
            KeyV => KeyCode::KeyV,
            KeyW => KeyCode::KeyW,
            KeyX => KeyCode::KeyX,
            KeyY => KeyCode::KeyY,
            KeyZ => KeyCode::KeyZ,

            //--- Function -----------------------------------------------------

            F1 => KeyCode::F1,
            F2 => KeyCode::F2,
            F3 => KeyCode::F3,
            F4 => KeyCode::F4,
            F5 => KeyCode::F5,
            F6 => KeyCode::F6,
            F7 => KeyCode::F7,
            F8 => KeyCode::F8,
            F9 => KeyCode::F9,
            F10 => KeyCode::F10,
            F11 => KeyCode::F11,
            F12 => KeyCode::F12,
            F13 => KeyCode::F13,
            F14 => KeyCode::F14,
            F15 => KeyCode::F15,
            F16 => KeyCode::F16,
            F17 => KeyCode::F17,
            F18 => KeyCode::F18,
            F19 => KeyCode::F19,
            F20 => KeyCode::F20,

            //--- Modifiers ----------------------------------------------------

            ShiftLeft => KeyCode::ShiftLeft,
            ShiftRight => KeyCode::ShiftRight,
            ControlLeft => KeyCode::ControlLeft,
            ControlRight => KeyCode::ControlRight,
            AltLeft => KeyCode::AltLeft,
            AltRight => KeyCode::AltRight,
            SuperLeft => KeyCode::SuperLeft,
            SuperRight => KeyCode::SuperRight,
            CapsLock => KeyCode::CapsLock,

            //--- Navigation ---------------------------------------------------

            ArrowUp => KeyCode::ArrowUp,
            ArrowDown => KeyCode::ArrowDown,
            ArrowLeft => KeyCode::ArrowLeft,
            ArrowRight => KeyCode::ArrowRight,
            Home => KeyCode::Home,
            End => KeyCode::End,
            PageUp => KeyCode::PageUp,
            PageDown => KeyCode::PageDown,

            //--- Editing ------------------------------------------------------

            Space => KeyCode::Space,
            Enter => KeyCode::Enter,
            Escape => KeyCode::Escape,
            Tab => KeyCode::Tab,
            Backspace => KeyCode::Backspace,
            Delete => KeyCode::Delete,
            Insert => KeyCode::Insert,

            //--- Punctuation --------------------------------------------------

            Minus => KeyCode::Minus,
            Equal => KeyCode::Equal,
            BracketLeft => KeyCode::BracketLeft,
            BracketRight => KeyCode::BracketRight,
            Backslash => KeyCode::Backslash,
            Semicolon => KeyCode::Semicolon,
            Quote => KeyCode::Quote,
            Backquote => KeyCode::Backquote,
            Comma => KeyCode::Comma,
            Period => KeyCode::Period,
            Slash => KeyCode::Slash,

            _ => KeyCode::Unidentified,
        }
    }
}

/// Left/Right/Middle map to Primary/Secondary/Tertiary; other buttons
/// have no engine counterpart.
pub fn mouse_button_from_winit(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Primary),
        WinitMouseButton::Right => Some(MouseButton::Secondary),
        WinitMouseButton::Middle => Some(MouseButton::Tertiary),
        _ => None,
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};
    use winit::keyboard::NativeKeyCode;

    fn bridge() -> (WinitBridge, Receiver<RawEvent>) {
        let (tx, rx) = unbounded();
        (WinitBridge::new(tx), rx)
    }

    fn make_modifiers(shift: bool, ctrl: bool, alt: bool, logo: bool) -> ModifiersState {
        let mut state = ModifiersState::empty();
        if shift { state.insert(ModifiersState::SHIFT); }
        if ctrl { state.insert(ModifiersState::CONTROL); }
        if alt { state.insert(ModifiersState::ALT); }
        if logo { state.insert(ModifiersState::SUPER); }
        state
    }

    //--- Keys -------------------------------------------------------------

    #[test]
    fn key_press_and_release_are_forwarded() {
        let (mut bridge, rx) = bridge();
        bridge.key(PhysicalKey::Code(WinitKeyCode::KeyA), ElementState::Pressed, false);
        bridge.key(PhysicalKey::Code(WinitKeyCode::KeyA), ElementState::Pressed, true);
        bridge.key(PhysicalKey::Code(WinitKeyCode::KeyA), ElementState::Released, false);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                RawEvent::KeyDown { key: KeyCode::KeyA, repeat: false },
                RawEvent::KeyDown { key: KeyCode::KeyA, repeat: true },
                RawEvent::KeyUp { key: KeyCode::KeyA },
            ]
        );
    }

    #[test]
    fn native_keys_arrive_unidentified() {
        let (mut bridge, rx) = bridge();
        bridge.key(
            PhysicalKey::Unidentified(NativeKeyCode::Unidentified),
            ElementState::Pressed,
            false,
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            RawEvent::KeyDown { key: KeyCode::Unidentified, repeat: false }
        );
    }

    #[test]
    fn keycode_conversion() {
        assert_eq!(KeyCode::from(WinitKeyCode::KeyZ), KeyCode::KeyZ);
        assert_eq!(KeyCode::from(WinitKeyCode::F13), KeyCode::F13);
        assert_eq!(KeyCode::from(WinitKeyCode::ShiftRight), KeyCode::ShiftRight);
        assert_eq!(KeyCode::from(WinitKeyCode::Slash), KeyCode::Slash);
        assert_eq!(KeyCode::from(WinitKeyCode::F24), KeyCode::Unidentified);
        assert_eq!(KeyCode::from(WinitKeyCode::Numpad1), KeyCode::Unidentified);
    }

    //--- Modifiers --------------------------------------------------------

    #[test]
    fn modifiers_are_sticky_and_forwarded() {
        let (mut bridge, rx) = bridge();
        bridge.modifiers_changed(make_modifiers(true, false, false, true));

        assert_eq!(bridge.modifiers(), Modifiers::SHIFT.union(Modifiers::LOGO));
        assert_eq!(
            rx.try_recv().unwrap(),
            RawEvent::ModifiersChanged(Modifiers::SHIFT.union(Modifiers::LOGO))
        );
    }

    //--- Mouse ------------------------------------------------------------

    #[test]
    fn mouse_buttons_map_to_engine_buttons() {
        assert_eq!(mouse_button_from_winit(WinitMouseButton::Left), Some(MouseButton::Primary));
        assert_eq!(mouse_button_from_winit(WinitMouseButton::Right), Some(MouseButton::Secondary));
        assert_eq!(mouse_button_from_winit(WinitMouseButton::Middle), Some(MouseButton::Tertiary));
        assert_eq!(mouse_button_from_winit(WinitMouseButton::Back), None);
    }

    #[test]
    fn side_buttons_are_dropped() {
        let (mut bridge, rx) = bridge();
        assert!(!bridge.mouse_button(WinitMouseButton::Other(7), ElementState::Pressed));
        assert!(bridge.mouse_button(WinitMouseButton::Left, ElementState::Released));
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![RawEvent::ButtonUp { button: MouseButton::Primary }]
        );
    }

    #[test]
    fn cursor_and_close_are_forwarded() {
        let (mut bridge, rx) = bridge();
        bridge.cursor_moved(12.5, 40.0);
        bridge.close_requested();
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                RawEvent::CursorMoved { position: Vec2::new(12.5, 40.0) },
                RawEvent::Quit,
            ]
        );
    }

    //--- Disconnect -------------------------------------------------------

    #[test]
    fn disconnected_channel_does_not_panic() {
        let (mut bridge, rx) = bridge();
        drop(rx);
        assert!(!bridge.close_requested());
    }
}
