/// Sizing for the per-frame geometry rings.
///
/// Capacities are initial element counts per frame slot; rings grow on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Frames the GPU may be consuming while the host writes the next one.
    pub frames_in_flight: usize,
    /// Minimum uniform buffer offset alignment, in bytes.
    pub constants_alignment: usize,
    pub position_capacity: usize,
    pub color_capacity: usize,
    pub uv_capacity: usize,
    pub constants_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            constants_alignment: 256,
            position_capacity: 384,
            color_capacity: 256,
            uv_capacity: 128,
            constants_capacity: 8,
        }
    }
}

impl RenderConfig {
    /// Uses the device's real alignment limit instead of the default.
    pub fn with_limits(mut self, limits: &wgpu::Limits) -> Self {
        self.constants_alignment = limits.min_uniform_buffer_offset_alignment.max(1) as usize;
        self
    }
}
