use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::WindowId;

use crate::bus::{Bus, RuntimeLink};
use crate::core::{App, AppControl, FrameCtx};
use crate::input::DisplayEvent;
use crate::render::gpu::{BatchRenderer, FrameBackend};
use crate::render::{RenderConfig, RenderTarget};
use crate::time::InFlight;

use super::config::HostConfig;
use super::session::DisplaySession;

/// Drives one runtime display from the window loop.
///
/// Each redraw waits for a free in-flight slot, asks the runtime for a
/// command stream, uploads finished textures, and replays the stream into
/// the frame's render pass.
pub struct PlasmaHost {
    config: HostConfig,
    session: DisplaySession,
    in_flight: Arc<InFlight>,
    renderer: Option<BatchRenderer>,
    configured: bool,
}

impl PlasmaHost {
    pub fn new(link: impl RuntimeLink + 'static, config: HostConfig) -> Result<Self> {
        let bus = Bus::new(link, config.bus.clone());
        let session = DisplaySession::new(bus, config.display_id, &RenderConfig::default())
            .context("failed to start texture loader")?;
        let in_flight = Arc::new(InFlight::new(config.frames_in_flight));

        Ok(Self {
            config,
            session,
            in_flight,
            renderer: None,
            configured: false,
        })
    }

    pub fn bus(&self) -> &Arc<Bus> {
        self.session.bus()
    }

    /// Blocks until a frame slot is free, draining GPU completions while
    /// waiting.
    fn acquire_slot(&self, ctx: &FrameCtx<'_, '_>) {
        ctx.gpu.poll();
        if !self.in_flight.try_acquire() {
            log::trace!("all {} frame slots busy; waiting for the GPU", self.in_flight.limit());
            ctx.gpu.wait_idle();
            self.in_flight.acquire();
        }
    }
}

impl App for PlasmaHost {
    fn on_display_event(&mut self, _window_id: WindowId, event: DisplayEvent) {
        self.session.forward(&event);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.configured {
            let render = self.config.render_config(&ctx.gpu.limits());
            log::debug!("render config: {render:?}");
            self.session.reconfigure(&render);
            self.configured = true;
        }

        self.session.bus().expire_stale();
        self.acquire_slot(ctx);

        let Some(mut stream) = self.session.request_frame(ctx.viewport()) else {
            self.in_flight.release();
            return AppControl::Continue;
        };

        let gate = Arc::clone(&self.in_flight);
        let session = &mut self.session;
        let renderer_slot = &mut self.renderer;

        ctx.render(
            move || gate.release(),
            |rctx, target| {
                let renderer = renderer_slot.get_or_insert_with(|| BatchRenderer::new(rctx));
                session.complete_textures(|id, image| renderer.upload_texture(rctx, id, image));

                let mut loads = Vec::new();
                let mut on_load = |id: i32, path: &str| loads.push((id, path.to_owned()));
                {
                    let target = RenderTarget::new(&mut *target.encoder, target.color_view);
                    let mut backend = FrameBackend::new(renderer, rctx, target, &mut on_load);
                    session.render(&mut stream, &mut backend);
                }
                session.request_loads(loads);
            },
        )
    }
}
