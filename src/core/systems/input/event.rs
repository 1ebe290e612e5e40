//=========================================================================
// Input Vocabulary
//
// Portable key, button and modifier identifiers plus the raw events the
// platform layer hands to the input system.
//
// Event Flow:
// ```text
// Platform Layer (Winit, headless channel)
//         ↓
//    RawEvent (this module)
//         ↓
//    InputSystem (repeat suppression, world coordinates)
//         ↓
//    KeyPressed / ButtonPressed / MouseMotion / ...
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec2;

//=== MouseButton =========================================================

/// Physical mouse button identifier.
///
/// Side and macro buttons have no variant; the platform layer drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MouseButton {
    /// Typically left.
    Primary,

    /// Typically right.
    Secondary,

    /// Wheel click.
    Tertiary,
}

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Represents the physical key location, not the character produced.
/// `KeyA` is the same physical key on QWERTY and AZERTY layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Numeric Keys -----------------------------------------------------

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    //--- Alphabetic Keys --------------------------------------------------

    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Function Keys ----------------------------------------------------

    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10,
    F11, F12, F13, F14, F15, F16, F17, F18, F19, F20,

    //--- Modifier Keys ----------------------------------------------------

    ShiftLeft, ShiftRight,
    ControlLeft, ControlRight,
    AltLeft, AltRight,
    SuperLeft, SuperRight,
    CapsLock,

    //--- Navigation -------------------------------------------------------

    ArrowDown, ArrowLeft, ArrowRight, ArrowUp,
    Home, End, PageUp, PageDown,

    //--- Editing ----------------------------------------------------------

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,

    //--- Punctuation ------------------------------------------------------

    Minus,
    Equal,
    BracketLeft,
    BracketRight,
    Backslash,
    Semicolon,
    Quote,
    Backquote,
    Comma,
    Period,
    Slash,

    /// Reported by the platform for keys outside this set.
    ///
    /// The input system drops it.
    Unidentified,
}

impl KeyCode {
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            KeyCode::ShiftLeft
                | KeyCode::ShiftRight
                | KeyCode::ControlLeft
                | KeyCode::ControlRight
                | KeyCode::AltLeft
                | KeyCode::AltRight
                | KeyCode::SuperLeft
                | KeyCode::SuperRight
        )
    }
}

//=== Modifiers ===========================================================

/// Modifier keys held during a key event.
///
/// Left and right variants are not distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,

    /// Ctrl (Command on macOS, as normalized by the platform).
    pub ctrl: bool,

    /// Alt (Option on macOS).
    pub alt: bool,

    /// Windows / Super / Command key.
    pub logo: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        logo: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const LOGO: Self = Self {
        logo: true,
        ..Self::NONE
    };

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }

    /// Whether every modifier held in `other` is also held here.
    pub fn contains(self, other: Modifiers) -> bool {
        (!other.shift || self.shift)
            && (!other.ctrl || self.ctrl)
            && (!other.alt || self.alt)
            && (!other.logo || self.logo)
    }

    /// Combines two modifier sets.
    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers {
            shift: self.shift || other.shift,
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            logo: self.logo || other.logo,
        }
    }
}

//=== RawEvent ============================================================

/// Platform input before translation.
///
/// Cursor positions are in window pixels with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    KeyDown {
        key: KeyCode,

        /// Auto-repeat generated by holding the key.
        repeat: bool,
    },
    KeyUp {
        key: KeyCode,
    },
    ButtonDown {
        button: MouseButton,
    },
    ButtonUp {
        button: MouseButton,
    },
    CursorMoved {
        position: Vec2,
    },
    ModifiersChanged(Modifiers),

    /// The window was closed or the OS asked the game to exit.
    Quit,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_constants_hold_one_flag() {
        assert!(Modifiers::NONE.is_empty());
        assert!(Modifiers::SHIFT.shift && !Modifiers::SHIFT.ctrl);
        assert!(Modifiers::CTRL.ctrl && !Modifiers::CTRL.alt);
        assert!(Modifiers::ALT.alt && !Modifiers::ALT.logo);
        assert!(Modifiers::LOGO.logo && !Modifiers::LOGO.shift);
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }

    #[test]
    fn contains_and_union() {
        let both = Modifiers::SHIFT.union(Modifiers::CTRL);
        assert!(both.contains(Modifiers::SHIFT));
        assert!(both.contains(Modifiers::CTRL));
        assert!(!both.contains(Modifiers::ALT));
        assert!(both.contains(Modifiers::NONE));
    }

    #[test]
    fn modifier_keys_are_recognized() {
        assert!(KeyCode::ShiftLeft.is_modifier());
        assert!(KeyCode::SuperRight.is_modifier());
        assert!(!KeyCode::KeyA.is_modifier());
        assert!(!KeyCode::CapsLock.is_modifier());
    }
}
