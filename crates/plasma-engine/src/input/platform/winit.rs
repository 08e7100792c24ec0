use winit::event::{
    ElementState, Ime, MouseButton as WinitMouseButton, MouseScrollDelta, TouchPhase, WindowEvent,
};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{DisplayEvent, InputState, Key, MouseButton};

/// Translates a winit `WindowEvent` into zero or more display events.
///
/// A key press may yield a key event followed by a text event.
pub fn translate_window_event(state: &mut InputState, event: &WindowEvent) -> Vec<DisplayEvent> {
    match event {
        WindowEvent::Focused(f) => state.focus(*f).into_iter().collect(),

        WindowEvent::CursorLeft { .. } => {
            state.pointer_left();
            Vec::new()
        }

        WindowEvent::CursorMoved { position, .. } => {
            vec![state.pointer_moved(position.x.round() as i32, position.y.round() as i32)]
        }

        WindowEvent::MouseInput { state: st, button, .. } => state
            .button(map_mouse_button(*button), *st == ElementState::Pressed)
            .into_iter()
            .collect(),

        WindowEvent::MouseWheel { delta, phase, .. } => vec![scroll_event(*delta, *phase)],

        WindowEvent::KeyboardInput { event, .. } => {
            let is_press = event.state == ElementState::Pressed;
            let (key, syscode) = map_key(event.physical_key);

            let mut out = vec![DisplayEvent::Key {
                key,
                is_press,
                syscode,
                is_repeat: event.repeat,
            }];
            if let (true, Some(text)) = (is_press, event.text.as_ref()) {
                out.push(DisplayEvent::Text(text.to_string()));
            }
            out
        }

        WindowEvent::Ime(Ime::Commit(text)) if !text.is_empty() => {
            vec![DisplayEvent::Text(text.clone())]
        }

        _ => Vec::new(),
    }
}

fn scroll_event(delta: MouseScrollDelta, phase: TouchPhase) -> DisplayEvent {
    let (dx, dy, is_precise) = match delta {
        MouseScrollDelta::LineDelta(x, y) => (x as f64, y as f64, false),
        MouseScrollDelta::PixelDelta(p) => (p.x, p.y, true),
    };
    DisplayEvent::Scroll {
        dx,
        dy,
        is_precise,
        in_progress: matches!(phase, TouchPhase::Started | TouchPhase::Moved),
        is_momentum: false,
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> (Key, i32) {
    let PhysicalKey::Code(code) = pk else {
        return (Key::Unknown, 0);
    };

    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::NumpadEnter => Key::NumpadEnter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::ShiftRight => Key::RightShift,
        KeyCode::ControlLeft => Key::LeftControl,
        KeyCode::ControlRight => Key::RightControl,
        KeyCode::AltLeft => Key::LeftAlt,
        KeyCode::AltRight => Key::RightAlt,
        KeyCode::SuperLeft => Key::LeftMeta,
        KeyCode::SuperRight => Key::RightMeta,
        KeyCode::CapsLock => Key::CapsLock,

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

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        _ => Key::Unknown,
    };

    (key, code as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    // ── keys ──

    #[test]
    fn maps_sided_modifiers() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ShiftLeft)).0, Key::LeftShift);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ShiftRight)).0, Key::RightShift);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyQ)).0, Key::Q);
    }

    #[test]
    fn unmapped_keys_keep_their_syscode() {
        let (key, syscode) = map_key(PhysicalKey::Code(KeyCode::NumLock));
        assert_eq!(key, Key::Unknown);
        assert_eq!(syscode, KeyCode::NumLock as i32);
    }

    // ── scroll ──

    #[test]
    fn line_and_pixel_scroll_precision() {
        let line = scroll_event(MouseScrollDelta::LineDelta(0.0, -2.0), TouchPhase::Moved);
        assert_eq!(
            line,
            DisplayEvent::Scroll {
                dx: 0.0,
                dy: -2.0,
                is_precise: false,
                in_progress: true,
                is_momentum: false
            }
        );

        let px = scroll_event(
            MouseScrollDelta::PixelDelta(PhysicalPosition::new(3.5, 0.0)),
            TouchPhase::Ended,
        );
        assert!(matches!(
            px,
            DisplayEvent::Scroll { is_precise: true, in_progress: false, .. }
        ));
    }

    // ── buttons ──

    #[test]
    fn maps_buttons() {
        assert_eq!(map_mouse_button(WinitMouseButton::Middle), MouseButton::Middle);
        assert_eq!(map_mouse_button(WinitMouseButton::Other(7)), MouseButton::Other(7));
    }
}
