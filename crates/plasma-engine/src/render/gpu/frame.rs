use crate::render::backend::{DrawBackend, DrawCall, PipelineId};
use crate::render::data::{Position, RenderData, Uv, VertexColor};
use crate::render::error::BackendError;
use crate::render::mode::ModeDef;
use crate::render::{RenderCtx, RenderTarget};

use super::renderer::BatchRenderer;

/// Where the current frame slot starts in each GPU buffer.
#[derive(Debug, Clone, Copy, Default)]
struct SlotOffsets {
    positions: usize,
    colors: usize,
    uvs: usize,
    constants: usize,
    constants_stride: usize,
}

impl SlotOffsets {
    fn of(data: &RenderData) -> Self {
        Self {
            positions: data.positions.slot_base(),
            colors: data.colors.slot_base(),
            uvs: data.uvs.slot_base(),
            constants: data.constants_ring().slot_base(),
            constants_stride: data.constants_stride(),
        }
    }
}

/// [`DrawBackend`] for one frame: records draw calls, then uploads the
/// frame's geometry and replays them in one render pass per canvas.
pub struct FrameBackend<'a, 'f> {
    renderer: &'a mut BatchRenderer,
    ctx: &'a RenderCtx<'f>,
    target: RenderTarget<'a>,
    on_load_texture: &'a mut dyn FnMut(i32, &str),
    clear: Option<VertexColor>,
    calls: Vec<DrawCall>,
}

impl<'a, 'f> FrameBackend<'a, 'f> {
    pub fn new(
        renderer: &'a mut BatchRenderer,
        ctx: &'a RenderCtx<'f>,
        target: RenderTarget<'a>,
        on_load_texture: &'a mut dyn FnMut(i32, &str),
    ) -> Self {
        Self {
            renderer,
            ctx,
            target,
            on_load_texture,
            clear: None,
            calls: Vec::new(),
        }
    }

    fn encode(&mut self, slots: SlotOffsets) {
        let load = match self.clear {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let renderer = &*self.renderer;
        let mut rpass = self.target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("plasma canvas pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let (Some(positions), Some(colors), Some(constants)) = (
            renderer.positions.buffer(),
            renderer.colors.buffer(),
            renderer.constants_bind_group.as_ref(),
        ) else {
            return;
        };

        for call in &self.calls {
            let Some(gpu) = renderer.pipelines.get(call.pipeline.0 as usize) else { continue };

            rpass.set_pipeline(&gpu.pipeline);
            let offset = slots.constants + call.constants_index as usize * slots.constants_stride;
            rpass.set_bind_group(0, constants, &[offset as u32]);

            let pos = vertex_offset::<Position>(slots.positions, call.first_position);
            let col = vertex_offset::<VertexColor>(slots.colors, call.first_color);
            rpass.set_vertex_buffer(0, positions.slice(pos..));
            rpass.set_vertex_buffer(1, colors.slice(col..));

            if gpu.programs.needs_uvs() {
                let Some(uvs) = renderer.uvs.buffer() else { continue };
                let uv = vertex_offset::<Uv>(slots.uvs, call.first_uv);
                rpass.set_vertex_buffer(2, uvs.slice(uv..));
            }
            if gpu.programs.needs_texture() {
                let Some(tex) = call.texture.and_then(|id| renderer.textures.get(id)) else {
                    continue;
                };
                rpass.set_bind_group(1, &tex.handle.bind_group, &[]);
            }

            rpass.draw(0..call.position_count, 0..1);
        }
    }
}

impl DrawBackend for FrameBackend<'_, '_> {
    fn create_pipeline(&mut self, def: &ModeDef) -> Result<PipelineId, BackendError> {
        self.renderer.pipeline(self.ctx, def)
    }

    fn begin_canvas(&mut self, clear: Option<VertexColor>) {
        self.clear = clear;
        self.calls.clear();
    }

    /// Checks the call against its pipeline's inputs; short attributes or an
    /// unloaded texture drop the draw.
    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        let Some(programs) = self.renderer.pipeline_programs(call.pipeline) else {
            return Err(BackendError::Pipeline(format!("no pipeline {}", call.pipeline.0)));
        };

        if call.color_count < call.position_count {
            return Err(BackendError::ShortAttribute {
                attribute: "colors",
                have: call.color_count,
                need: call.position_count,
            });
        }
        if programs.needs_uvs() && call.uv_count < call.position_count {
            return Err(BackendError::ShortAttribute {
                attribute: "uvs",
                have: call.uv_count,
                need: call.position_count,
            });
        }
        if programs.needs_texture() {
            match call.texture {
                Some(id) if self.renderer.textures.contains(id) => {}
                texture => {
                    log::debug!("render mode {}: texture {texture:?} not loaded; draw skipped", call.mode);
                    return Ok(());
                }
            }
        }

        self.calls.push(*call);
        Ok(())
    }

    fn end_canvas(&mut self, data: &RenderData) {
        self.renderer.upload(self.ctx, data);
        self.encode(SlotOffsets::of(data));
        self.calls.clear();
    }

    fn load_texture(&mut self, id: i32, path: &str) {
        (self.on_load_texture)(id, path);
    }
}

#[inline]
fn vertex_offset<T>(slot_base: usize, first: u32) -> u64 {
    ((slot_base + first as usize) * std::mem::size_of::<T>()) as u64
}
