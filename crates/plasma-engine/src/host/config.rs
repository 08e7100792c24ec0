use crate::bus::BusConfig;
use crate::render::RenderConfig;

/// Host configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Display id sent with every `Display.*` message.
    pub display_id: i32,
    /// Frames the GPU may hold before the host waits.
    pub frames_in_flight: usize,
    pub bus: BusConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            display_id: 0,
            frames_in_flight: RenderConfig::default().frames_in_flight,
            bus: BusConfig::default(),
        }
    }
}

impl HostConfig {
    /// Ring sizing for the interpreter, matching the in-flight depth.
    pub fn render_config(&self, limits: &wgpu::Limits) -> RenderConfig {
        RenderConfig {
            frames_in_flight: self.frames_in_flight.max(1),
            ..RenderConfig::default()
        }
        .with_limits(limits)
    }
}
