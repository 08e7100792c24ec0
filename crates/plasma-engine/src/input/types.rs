use std::fmt;

/// Keyboard key identifier.
///
/// Printable keys carry their ASCII value as [`keycode`](Key::keycode);
/// everything else lives above 255. Keys without a mapping use
/// `Key::Unknown` and report keycode 0 alongside their platform syscode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    LeftMeta,
    RightMeta,
    CapsLock,
    NumpadEnter,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Unknown,
}

impl Key {
    const LETTERS: [Key; 26] = [
        Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
        Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
        Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
    ];

    const DIGITS: [Key; 10] = [
        Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
        Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
    ];

    const FUNCTION: [Key; 12] = [
        Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6,
        Key::F7, Key::F8, Key::F9, Key::F10, Key::F11, Key::F12,
    ];

    /// Runtime-facing keycode sent in `Display.on_key_event`.
    pub fn keycode(self) -> i32 {
        if let Some(i) = Self::LETTERS.iter().position(|k| *k == self) {
            return b'A' as i32 + i as i32;
        }
        if let Some(i) = Self::DIGITS.iter().position(|k| *k == self) {
            return b'0' as i32 + i as i32;
        }
        if let Some(i) = Self::FUNCTION.iter().position(|k| *k == self) {
            return 0x200 + 1 + i as i32;
        }
        match self {
            Key::Backspace => 8,
            Key::Tab => 9,
            Key::Enter => 13,
            Key::Escape => 27,
            Key::Space => 32,
            Key::Delete => 127,

            Key::ArrowUp => 0x100,
            Key::ArrowDown => 0x101,
            Key::ArrowLeft => 0x102,
            Key::ArrowRight => 0x103,
            Key::Insert => 0x104,
            Key::Home => 0x105,
            Key::End => 0x106,
            Key::PageUp => 0x107,
            Key::PageDown => 0x108,

            Key::LeftShift => 0x110,
            Key::RightShift => 0x111,
            Key::LeftControl => 0x112,
            Key::RightControl => 0x113,
            Key::LeftAlt => 0x114,
            Key::RightAlt => 0x115,
            Key::LeftMeta => 0x116,
            Key::RightMeta => 0x117,
            Key::CapsLock => 0x118,
            Key::NumpadEnter => 0x119,

            _ => 0,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// Pointer index reported with press and release events.
    pub fn index(self) -> i32 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(n) => n as i32,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PointerKind {
    Move,
    Press,
    Release,
}

impl PointerKind {
    pub fn code(self) -> i32 {
        match self {
            PointerKind::Move => 0,
            PointerKind::Press => 1,
            PointerKind::Release => 2,
        }
    }
}

/// Platform-agnostic display events.
///
/// Pointer coordinates are physical pixels from the top-left corner of the
/// surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Key {
        key: Key,
        is_press: bool,
        /// Platform scancode, 0 when unavailable.
        syscode: i32,
        is_repeat: bool,
    },

    /// Committed text.
    Text(String),

    Pointer {
        kind: PointerKind,
        x: i32,
        y: i32,
        index: i32,
    },

    Scroll {
        dx: f64,
        dy: f64,
        is_precise: bool,
        in_progress: bool,
        is_momentum: bool,
    },

    FocusGained,
}
