//! Keys tracked by the input table, and the adapter from winit's key and button events.

use winit::event::MouseButton;
use winit::keyboard::{KeyCode, PhysicalKey};

/// A key or mouse button with a slot in the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    LeftShift,
    LeftControl,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    MouseLeft,
    MouseRight,
    MouseMiddle,
}

/// Size of the input table.
pub const KEY_COUNT: usize = Key::MouseMiddle as usize + 1;

impl Key {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Maps a physical keyboard key to its slot. Keys we don't track map to `None`.
pub fn key_from_winit(physical_key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = physical_key else {
        return None;
    };

    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Space => Key::Space,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::ControlLeft => Key::LeftControl,

        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        _ => return None,
    };

    Some(key)
}

/// Maps a mouse button to its slot. Back/forward and other extra buttons are not tracked.
pub fn button_from_winit(button: MouseButton) -> Option<Key> {
    match button {
        MouseButton::Left => Some(Key::MouseLeft),
        MouseButton::Right => Some(Key::MouseRight),
        MouseButton::Middle => Some(Key::MouseMiddle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKeyCode;

    #[test]
    fn test_named_keys() {
        assert_eq!(key_from_winit(PhysicalKey::Code(KeyCode::Escape)), Some(Key::Escape));
        assert_eq!(key_from_winit(PhysicalKey::Code(KeyCode::NumpadEnter)), Some(Key::Enter));
        assert_eq!(key_from_winit(PhysicalKey::Code(KeyCode::Digit1)), Some(Key::Digit1));
        assert_eq!(key_from_winit(PhysicalKey::Code(KeyCode::KeyW)), Some(Key::W));
    }

    #[test]
    fn test_untracked_keys() {
        assert_eq!(key_from_winit(PhysicalKey::Code(KeyCode::F13)), None);
        assert_eq!(
            key_from_winit(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            None
        );
    }

    #[test]
    fn test_mouse_buttons() {
        assert_eq!(button_from_winit(MouseButton::Left), Some(Key::MouseLeft));
        assert_eq!(button_from_winit(MouseButton::Middle), Some(Key::MouseMiddle));
        assert_eq!(button_from_winit(MouseButton::Back), None);
    }

    #[test]
    fn test_indices_are_dense() {
        assert_eq!(Key::Escape.index(), 0);
        assert_eq!(Key::MouseMiddle.index(), KEY_COUNT - 1);
        assert!(Key::Z.index() < Key::MouseLeft.index());
    }
}
