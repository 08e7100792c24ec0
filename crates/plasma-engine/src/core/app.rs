use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::input::DisplayEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the window runtime.
pub trait App {
    /// Raw window events, before translation.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Translated input for the window's display.
    fn on_display_event(&mut self, window_id: WindowId, event: DisplayEvent) {
        let _ = (window_id, event);
    }

    /// Called once per redraw per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
