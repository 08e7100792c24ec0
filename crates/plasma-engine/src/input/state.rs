use std::collections::HashSet;

use super::types::{DisplayEvent, MouseButton, PointerKind};

/// Pointer state for a single window.
///
/// Button events from the platform carry no position, so the last cursor
/// position is tracked here and stamped onto presses and releases.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in physical pixels.
    pub pointer_pos: Option<(i32, i32)>,

    /// Buttons currently held.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    pub fn pointer_moved(&mut self, x: i32, y: i32) -> DisplayEvent {
        self.pointer_pos = Some((x, y));
        DisplayEvent::Pointer {
            kind: PointerKind::Move,
            x,
            y,
            index: 0,
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer_pos = None;
    }

    /// Press or release at the last known position. A release for a button
    /// that was never pressed inside the window is dropped.
    pub fn button(&mut self, button: MouseButton, pressed: bool) -> Option<DisplayEvent> {
        let kind = if pressed {
            self.buttons_down.insert(button);
            PointerKind::Press
        } else {
            if !self.buttons_down.remove(&button) {
                return None;
            }
            PointerKind::Release
        };

        let (x, y) = self.pointer_pos.unwrap_or((0, 0));
        Some(DisplayEvent::Pointer {
            kind,
            x,
            y,
            index: button.index(),
        })
    }

    /// Focus change. Losing focus forgets held buttons.
    pub fn focus(&mut self, focused: bool) -> Option<DisplayEvent> {
        let gained = focused && !self.focused;
        self.focused = focused;
        if !focused {
            self.buttons_down.clear();
        }
        gained.then_some(DisplayEvent::FocusGained)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}
