use plasma_wire::Message;

use super::types::DisplayEvent;

/// Message types understood by the runtime's display.
pub mod names {
    pub const KEY: &str = "Display.on_key_event";
    pub const TEXT: &str = "Display.on_text_event";
    pub const POINTER: &str = "Display.on_pointer_event";
    pub const SCROLL: &str = "Display.on_scroll_event";
    pub const FOCUS_GAINED: &str = "Display.on_focus_gained";
    pub const RENDER: &str = "Display.render";
}

/// Scroll deltas this close to zero count as zero.
const SCROLL_EPSILON: f64 = 0.0001;

impl DisplayEvent {
    /// Encodes the event for `display_id`.
    ///
    /// Returns `None` for events the runtime should never see: text made
    /// only of control characters, and idle scroll updates.
    pub fn to_message(&self, display_id: i32) -> Option<Message> {
        match self {
            DisplayEvent::Key {
                key,
                is_press,
                syscode,
                is_repeat,
            } => {
                let mut m = Message::new(names::KEY);
                m.write_int32x(display_id)
                    .write_logical(*is_press)
                    .write_int32x(key.keycode())
                    .write_int32x(*syscode)
                    .write_logical(*is_repeat);
                Some(m)
            }

            DisplayEvent::Text(text) => {
                let mut chars = text.chars();
                let first = chars.next()?;
                let single = chars.next().is_none();
                if single && is_control(first) {
                    return None;
                }
                let mut m = Message::new(names::TEXT);
                m.write_int32x(display_id)
                    .write_int32x(first as i32)
                    .write_string(text);
                Some(m)
            }

            DisplayEvent::Pointer { kind, x, y, index } => {
                let mut m = Message::new(names::POINTER);
                m.write_int32x(display_id)
                    .write_int32x(kind.code())
                    .write_int32x(*x)
                    .write_int32x(*y)
                    .write_int32x(*index);
                Some(m)
            }

            DisplayEvent::Scroll {
                dx,
                dy,
                is_precise,
                in_progress,
                is_momentum,
            } => {
                let dx = snap_zero(*dx);
                let dy = snap_zero(*dy);
                if *in_progress && dx == 0.0 && dy == 0.0 {
                    return None;
                }
                let mut m = Message::new(names::SCROLL);
                m.write_int32x(display_id)
                    .write_real64(dx)
                    .write_real64(dy)
                    .write_logical(*is_precise)
                    .write_logical(*in_progress)
                    .write_logical(*is_momentum);
                Some(m)
            }

            DisplayEvent::FocusGained => {
                let mut m = Message::new(names::FOCUS_GAINED);
                m.write_int32x(display_id);
                Some(m)
            }
        }
    }
}

/// `Display.render(display_id, width, height)`; the reply carries the frame's
/// command stream.
pub fn render_request(display_id: i32, width: u32, height: u32) -> Message {
    let mut m = Message::new(names::RENDER);
    m.write_int32x(display_id)
        .write_int32x(width as i32)
        .write_int32x(height as i32);
    m
}

fn is_control(ch: char) -> bool {
    (ch as u32) < 32 || ch as u32 == 127
}

fn snap_zero(v: f64) -> f64 {
    if v.abs() <= SCROLL_EPSILON {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, PointerKind};

    fn parse(m: Message) -> Message {
        Message::parse(m.into_bytes())
    }

    // ── keys ──

    #[test]
    fn key_event_layout() {
        let ev = DisplayEvent::Key {
            key: Key::A,
            is_press: true,
            syscode: 30,
            is_repeat: false,
        };
        let mut m = parse(ev.to_message(0).unwrap());
        assert_eq!(m.type_name(), names::KEY);
        assert_eq!(m.read_int32x(), 0);
        assert!(m.read_logical());
        assert_eq!(m.read_int32x(), 65);
        assert_eq!(m.read_int32x(), 30);
        assert!(!m.read_logical());
        assert_eq!(m.remaining(), 0);
    }

    // ── text ──

    #[test]
    fn text_event_carries_first_scalar_and_full_text() {
        let mut m = parse(DisplayEvent::Text("hé".into()).to_message(2).unwrap());
        assert_eq!(m.type_name(), names::TEXT);
        assert_eq!(m.read_int32x(), 2);
        assert_eq!(m.read_int32x(), 'h' as i32);
        assert_eq!(m.read_string(), "hé");
        assert!(!m.has_overrun());
    }

    #[test]
    fn lone_control_characters_are_not_text() {
        for s in ["\r", "\u{8}", "\u{7f}", ""] {
            assert!(DisplayEvent::Text(s.into()).to_message(0).is_none(), "{s:?}");
        }
        assert!(DisplayEvent::Text("\ta".into()).to_message(0).is_some());
    }

    // ── pointer ──

    #[test]
    fn pointer_event_layout() {
        let ev = DisplayEvent::Pointer {
            kind: PointerKind::Release,
            x: 120,
            y: -4,
            index: 1,
        };
        let mut m = parse(ev.to_message(0).unwrap());
        assert_eq!(m.type_name(), names::POINTER);
        let fields: Vec<i32> = (0..5).map(|_| m.read_int32x()).collect();
        assert_eq!(fields, vec![0, 2, 120, -4, 1]);
        assert_eq!(m.remaining(), 0);
    }

    // ── scroll ──

    fn scroll(dx: f64, dy: f64, in_progress: bool) -> DisplayEvent {
        DisplayEvent::Scroll {
            dx,
            dy,
            is_precise: true,
            in_progress,
            is_momentum: false,
        }
    }

    #[test]
    fn scroll_event_layout() {
        let mut m = parse(scroll(1.5, -3.0, true).to_message(0).unwrap());
        assert_eq!(m.type_name(), names::SCROLL);
        assert_eq!(m.read_int32x(), 0);
        assert_eq!(m.read_real64(), 1.5);
        assert_eq!(m.read_real64(), -3.0);
        assert!(m.read_logical());
        assert!(m.read_logical());
        assert!(!m.read_logical());
        assert_eq!(m.remaining(), 0);
    }

    #[test]
    fn idle_scroll_in_progress_is_dropped() {
        assert!(scroll(0.00001, 0.0, true).to_message(0).is_none());
        // The final update of a gesture is always sent.
        let mut m = parse(scroll(0.00001, 0.0, false).to_message(0).unwrap());
        m.read_int32x();
        assert_eq!(m.read_real64(), 0.0);
    }

    // ── focus / render ──

    #[test]
    fn focus_and_render_layouts() {
        let mut m = parse(DisplayEvent::FocusGained.to_message(3).unwrap());
        assert_eq!(m.type_name(), names::FOCUS_GAINED);
        assert_eq!(m.read_int32x(), 3);
        assert_eq!(m.remaining(), 0);

        let mut m = parse(render_request(0, 800, 600));
        assert_eq!(m.type_name(), names::RENDER);
        assert_eq!((m.read_int32x(), m.read_int32x(), m.read_int32x()), (0, 800, 600));
    }
}
