use log::trace;

use crate::keys::{KEY_COUNT, Key};

/// Scale applied to the cursor's offset from the window centre.
const MOUSE_SENSITIVITY: f64 = 0.15;

/// What happened to a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
    Repeat,
}

/// Keyboard and mouse state, fed from window events and read by the main loop.
///
/// Every key has four flags:
///
/// - `pressed`: held down right now.
/// - `triggered`: went down since the last [`InputState::end_frame`].
/// - `repeated`: the window system reported it again while it was already held.
/// - `toggled`: flips on every fresh press and survives releases, so it reads as "pressed an odd
///   number of times".
#[derive(Debug)]
pub struct InputState {
    pressed: [bool; KEY_COUNT],
    triggered: [bool; KEY_COUNT],
    repeated: [bool; KEY_COUNT],
    toggled: [bool; KEY_COUNT],

    keyboard_enabled: bool,
    mouse_enabled: bool,

    mouse_x: f64,
    mouse_y: f64,
    delta_x: f64,
    delta_y: f64,
    delta_scroll: f64,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pressed: [false; KEY_COUNT],
            triggered: [false; KEY_COUNT],
            repeated: [false; KEY_COUNT],
            toggled: [false; KEY_COUNT],
            keyboard_enabled: true,
            mouse_enabled: true,
            mouse_x: 0.0,
            mouse_y: 0.0,
            delta_x: 0.0,
            delta_y: 0.0,
            delta_scroll: 0.0,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_callback(&mut self, key: Key, action: KeyAction) {
        if self.keyboard_enabled {
            self.apply(key, action);
        }
    }

    pub fn mouse_callback(&mut self, button: Key, action: KeyAction) {
        if self.mouse_enabled {
            self.apply(button, action);
        }
    }

    fn apply(&mut self, key: Key, action: KeyAction) {
        match action {
            KeyAction::Press | KeyAction::Repeat => self.press_key(key, true),
            KeyAction::Release => self.press_key(key, false),
        }
    }

    pub fn press_key(&mut self, key: Key, status: bool) {
        let i = key.index();

        if !status {
            self.pressed[i] = false;
            self.repeated[i] = false;
            trace!("{key:?} released");
            return;
        }

        if self.pressed[i] {
            self.repeated[i] = true;
            trace!("{key:?} is being pressed repeatedly");
        } else {
            self.pressed[i] = true;
            self.triggered[i] = true;
            self.toggled[i] = !self.toggled[i];
            trace!("{key:?} has been triggered (toggled: {})", self.toggled[i]);
        }
    }

    /// Clears the per-frame trigger edges. Called once after each drawn frame.
    pub fn end_frame(&mut self) {
        self.triggered = [false; KEY_COUNT];
        self.delta_scroll = 0.0;
    }

    /// Lets go of every held key and button, as if each had been released. Toggles are kept.
    pub fn release_all(&mut self) {
        self.pressed = [false; KEY_COUNT];
        self.repeated = [false; KEY_COUNT];
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed[key.index()]
    }

    pub fn is_key_triggered(&self, key: Key) -> bool {
        self.triggered[key.index()]
    }

    pub fn is_key_repeating(&self, key: Key) -> bool {
        self.repeated[key.index()]
    }

    pub fn is_key_toggled(&self, key: Key) -> bool {
        self.toggled[key.index()]
    }

    pub fn is_keyboard_enabled(&self) -> bool {
        self.keyboard_enabled
    }

    pub fn set_keyboard_enabled(&mut self, status: bool) {
        self.keyboard_enabled = status;
    }

    pub fn is_mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    /// Disabling the mouse also captures the cursor at the window centre; see
    /// [`InputState::mouse_update`].
    pub fn set_mouse_enabled(&mut self, status: bool) {
        self.mouse_enabled = status;
    }

    pub fn set_cursor_position(&mut self, x: f64, y: f64) {
        self.mouse_x = x;
        self.mouse_y = y;
    }

    pub fn add_scroll(&mut self, delta: f64) {
        self.delta_scroll += delta;
    }

    /// Recomputes the cursor's scaled offset from the centre of a `width` x `height` window.
    pub fn mouse_update(&mut self, width: u32, height: u32) {
        let mid_x = f64::from(width) * 0.5;
        let mid_y = f64::from(height) * 0.5;

        self.delta_x = (mid_x - self.mouse_x) * MOUSE_SENSITIVITY;
        self.delta_y = (mid_y - self.mouse_y.ceil()) * MOUSE_SENSITIVITY;
    }

    pub fn mouse_x(&self) -> f64 {
        self.mouse_x
    }

    pub fn mouse_y(&self) -> f64 {
        self.mouse_y
    }

    pub fn delta_x(&self) -> f64 {
        self.delta_x
    }

    pub fn delta_y(&self) -> f64 {
        self.delta_y
    }

    pub fn delta_scroll(&self) -> f64 {
        self.delta_scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_pressed_and_triggered() {
        let mut input = InputState::new();
        input.key_callback(Key::Escape, KeyAction::Press);

        assert!(input.is_key_pressed(Key::Escape));
        assert!(input.is_key_triggered(Key::Escape));
        assert!(!input.is_key_repeating(Key::Escape));
        assert!(!input.is_key_pressed(Key::Enter));
    }

    #[test]
    fn trigger_is_cleared_at_end_of_frame() {
        let mut input = InputState::new();
        input.key_callback(Key::A, KeyAction::Press);
        input.end_frame();

        assert!(input.is_key_pressed(Key::A));
        assert!(!input.is_key_triggered(Key::A));
    }

    #[test]
    fn repeat_while_held_does_not_retrigger() {
        let mut input = InputState::new();
        input.key_callback(Key::A, KeyAction::Press);
        input.end_frame();
        input.key_callback(Key::A, KeyAction::Repeat);

        assert!(input.is_key_repeating(Key::A));
        assert!(!input.is_key_triggered(Key::A));
    }

    #[test]
    fn release_clears_pressed_and_repeated() {
        let mut input = InputState::new();
        input.key_callback(Key::A, KeyAction::Press);
        input.key_callback(Key::A, KeyAction::Repeat);
        input.key_callback(Key::A, KeyAction::Release);

        assert!(!input.is_key_pressed(Key::A));
        assert!(!input.is_key_repeating(Key::A));
    }

    #[test]
    fn toggle_flips_on_each_fresh_press_only() {
        let mut input = InputState::new();

        input.key_callback(Key::Digit1, KeyAction::Press);
        assert!(input.is_key_toggled(Key::Digit1));

        // Held: repeats leave the toggle alone.
        input.key_callback(Key::Digit1, KeyAction::Repeat);
        input.key_callback(Key::Digit1, KeyAction::Press);
        assert!(input.is_key_toggled(Key::Digit1));

        // Released: still toggled.
        input.key_callback(Key::Digit1, KeyAction::Release);
        assert!(input.is_key_toggled(Key::Digit1));

        // Second press flips it back, while `triggered` fires again as an edge.
        input.end_frame();
        input.key_callback(Key::Digit1, KeyAction::Press);
        assert!(!input.is_key_toggled(Key::Digit1));
        assert!(input.is_key_triggered(Key::Digit1));
    }

    #[test]
    fn disabled_keyboard_ignores_keys_but_not_buttons() {
        let mut input = InputState::new();
        input.set_keyboard_enabled(false);

        input.key_callback(Key::Space, KeyAction::Press);
        input.mouse_callback(Key::MouseLeft, KeyAction::Press);

        assert!(!input.is_key_pressed(Key::Space));
        assert!(input.is_key_pressed(Key::MouseLeft));
    }

    #[test]
    fn disabled_mouse_ignores_buttons() {
        let mut input = InputState::new();
        input.set_mouse_enabled(false);
        input.mouse_callback(Key::MouseRight, KeyAction::Press);

        assert!(!input.is_key_pressed(Key::MouseRight));
    }

    #[test]
    fn mouse_delta_is_scaled_offset_from_centre() {
        let mut input = InputState::new();
        input.set_cursor_position(300.0, 199.5);
        input.mouse_update(800, 600);

        assert!((input.delta_x() - 15.0).abs() < 1e-9);
        assert!((input.delta_y() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn scroll_accumulates_until_end_of_frame() {
        let mut input = InputState::new();
        input.add_scroll(1.0);
        input.add_scroll(-0.5);
        assert_eq!(input.delta_scroll(), 0.5);

        input.end_frame();
        assert_eq!(input.delta_scroll(), 0.0);
    }

    #[test]
    fn release_all_keeps_toggles() {
        let mut input = InputState::new();
        input.key_callback(Key::Tab, KeyAction::Press);
        input.mouse_callback(Key::MouseLeft, KeyAction::Press);

        input.release_all();

        assert!(!input.is_key_pressed(Key::Tab));
        assert!(!input.is_key_pressed(Key::MouseLeft));
        assert!(input.is_key_toggled(Key::Tab));

        input.key_callback(Key::Tab, KeyAction::Press);
        assert!(input.is_key_pressed(Key::Tab));
        assert!(!input.is_key_repeating(Key::Tab));
        assert!(!input.is_key_toggled(Key::Tab));
    }
}
