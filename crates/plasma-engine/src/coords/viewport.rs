/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height, or 1 for a degenerate viewport.
    pub fn aspect(self) -> f32 {
        if self.is_valid() {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }
}
