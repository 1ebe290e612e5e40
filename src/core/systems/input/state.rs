//=========================================================================
// Input State
//=========================================================================
//
// What is held down right now. Used to suppress key repeats and to fill
// `MouseMotion::buttons`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use glam::Vec2;

//=== Internal Dependencies ===============================================

use super::event::{KeyCode, Modifiers, MouseButton};

//=== InputState ==========================================================

#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    modifiers: Modifiers,
    cursor: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Keys -------------------------------------------------------------

    /// Records a press. Returns `false` if the key was already down.
    pub fn press_key(&mut self, key: KeyCode) -> bool {
        self.keys.insert(key)
    }

    /// Records a release. Returns `false` if the key was not down.
    pub fn release_key(&mut self, key: KeyCode) -> bool {
        self.keys.remove(&key)
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    //--- Buttons ----------------------------------------------------------

    pub fn press_button(&mut self, button: MouseButton) -> bool {
        self.buttons.insert(button)
    }

    pub fn release_button(&mut self, button: MouseButton) -> bool {
        self.buttons.remove(&button)
    }

    pub fn buttons(&self) -> &HashSet<MouseButton> {
        &self.buttons
    }

    //--- Modifiers and Cursor ---------------------------------------------

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Last cursor position in window pixels.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Stores the new cursor position and returns the pixel delta since
    /// the previous one (zero for the first report).
    pub fn move_cursor(&mut self, position: Vec2) -> Vec2 {
        let delta = self.cursor.map_or(Vec2::ZERO, |previous| position - previous);
        self.cursor = Some(position);
        delta
    }

    /// Forgets everything held. Used when a scene is paused.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.buttons.clear();
        self.modifiers = Modifiers::NONE;
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_press_is_reported_as_repeat() {
        let mut state = InputState::new();
        assert!(state.press_key(KeyCode::KeyW));
        assert!(!state.press_key(KeyCode::KeyW));
        assert!(state.release_key(KeyCode::KeyW));
        assert!(!state.release_key(KeyCode::KeyW));
        assert!(state.press_key(KeyCode::KeyW));
    }

    #[test]
    fn cursor_delta_starts_at_zero() {
        let mut state = InputState::new();
        assert_eq!(state.move_cursor(Vec2::new(10.0, 10.0)), Vec2::ZERO);
        assert_eq!(state.move_cursor(Vec2::new(14.0, 7.0)), Vec2::new(4.0, -3.0));
        assert_eq!(state.cursor(), Some(Vec2::new(14.0, 7.0)));
    }

    #[test]
    fn buttons_track_held_set() {
        let mut state = InputState::new();
        state.press_button(MouseButton::Primary);
        state.press_button(MouseButton::Tertiary);
        state.release_button(MouseButton::Primary);
        assert_eq!(state.buttons().len(), 1);
        assert!(state.buttons().contains(&MouseButton::Tertiary));

        state.clear();
        assert!(state.buttons().is_empty());
    }
}
