use glam::{Mat4, Vec3};
use plasma_wire::Message;

use super::cmd::{RenderCmd, StackKind};
use super::data::{Position, Uv};
use super::mode::ModeDef;

/// Encodes a render command stream into a [`Message`].
///
/// ```
/// use plasma_engine::render::CommandWriter;
/// use plasma_wire::Message;
///
/// let mut w = CommandWriter::new(Message::default());
/// w.canvas(0, Some(0xFF10_1020), |c| {
///     c.fill_box(10.0, 10.0, 100.0, 40.0, 0xFFFF_0000);
/// });
/// let stream = w.finish();
/// assert!(!stream.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct CommandWriter {
    out: Message,
}

impl CommandWriter {
    /// Appends to `out` after whatever it already holds.
    pub fn new(out: Message) -> Self {
        Self { out }
    }

    /// Appends `END_RENDER` and returns the message.
    pub fn finish(mut self) -> Message {
        self.op(RenderCmd::EndRender);
        self.out
    }

    /// Returns the message without terminating the stream.
    pub fn into_message(self) -> Message {
        self.out
    }

    /// Direct access for hand-built (possibly malformed) streams.
    pub fn raw(&mut self) -> &mut Message {
        &mut self.out
    }

    pub fn op(&mut self, cmd: RenderCmd) -> &mut Self {
        self.out.write_int32x(cmd.code());
        self
    }

    /// Writes one complete canvas: header, the body built by `body`, and
    /// `END_CANVAS`, prefixed with its byte size.
    pub fn canvas(
        &mut self,
        canvas_id: i32,
        clear_argb: Option<u32>,
        body: impl FnOnce(&mut CommandWriter),
    ) -> &mut Self {
        let mut inner = CommandWriter::new(Message::default());
        if let Some(argb) = clear_argb {
            inner.op(RenderCmd::HeaderClearColor);
            inner.out.write_int32(argb as i32);
        }
        inner.op(RenderCmd::HeaderEnd);
        body(&mut inner);
        inner.op(RenderCmd::EndCanvas);

        let bytes = inner.out.into_bytes();
        self.op(RenderCmd::BeginCanvas);
        self.out
            .write_int32x(canvas_id)
            .write_int32(bytes.len() as i32)
            .write_bytes(&bytes);
        self
    }

    pub fn load_texture(&mut self, id: i32, path: &str) -> &mut Self {
        self.op(RenderCmd::LoadTexture);
        self.out.write_int32x(id).write_string(path);
        self
    }

    pub fn push_transform(&mut self, kind: StackKind, m: Mat4, replace: bool) -> &mut Self {
        self.op(match kind {
            StackKind::Object => RenderCmd::PushObjectTransform,
            StackKind::View => RenderCmd::PushViewTransform,
            StackKind::Projection => RenderCmd::PushProjectionTransform,
        });
        for v in m.to_cols_array() {
            self.out.write_real32(v);
        }
        self.out.write_logical(replace);
        self
    }

    pub fn pop_transform(&mut self, kind: StackKind, count: i32) -> &mut Self {
        self.op(match kind {
            StackKind::Object => RenderCmd::PopObjectTransform,
            StackKind::View => RenderCmd::PopViewTransform,
            StackKind::Projection => RenderCmd::PopProjectionTransform,
        });
        self.out.write_int32x(count);
        self
    }

    pub fn define_render_mode(&mut self, id: i32, def: &ModeDef) -> &mut Self {
        self.op(RenderCmd::DefineRenderMode);
        self.out
            .write_int32x(id)
            .write_int32x(def.shape.code())
            .write_byte(def.src_blend.to_byte())
            .write_byte(def.dst_blend.to_byte())
            .write_string(&def.vertex_program)
            .write_string(&def.fragment_program);
        self
    }

    pub fn use_render_mode(&mut self, id: i32) -> &mut Self {
        self.op(RenderCmd::UseRenderMode);
        self.out.write_int32x(id);
        self
    }

    pub fn push_positions(&mut self, positions: &[Position]) -> &mut Self {
        self.op(RenderCmd::PushPositions);
        self.out.write_int32x(positions.len() as i32);
        for p in positions.iter().flatten() {
            self.out.write_real32(*p);
        }
        self
    }

    pub fn push_colors(&mut self, argb: &[u32]) -> &mut Self {
        self.op(RenderCmd::PushColors);
        self.out.write_int32x(argb.len() as i32);
        for c in argb {
            self.out.write_int32(*c as i32);
        }
        self
    }

    pub fn push_uvs(&mut self, uvs: &[Uv]) -> &mut Self {
        self.op(RenderCmd::PushUvs);
        self.out.write_int32x(uvs.len() as i32);
        for v in uvs.iter().flatten() {
            self.out.write_real32(*v);
        }
        self
    }

    pub fn use_texture(&mut self, id: i32) -> &mut Self {
        self.op(RenderCmd::UseTexture);
        self.out.write_int32x(id);
        self
    }

    pub fn rotate(&mut self, kind: StackKind, radians: f32, axis: Vec3, replace: bool) -> &mut Self {
        self.op(RenderCmd::PushRotate);
        self.out.write_int32x(kind.code()).write_real32(radians);
        self.vec3(axis);
        self.out.write_logical(replace);
        self
    }

    pub fn scale(&mut self, kind: StackKind, s: Vec3, replace: bool) -> &mut Self {
        self.op(RenderCmd::PushScale);
        self.out.write_int32x(kind.code());
        self.vec3(s);
        self.out.write_logical(replace);
        self
    }

    pub fn translate(&mut self, kind: StackKind, t: Vec3, replace: bool) -> &mut Self {
        self.op(RenderCmd::PushTranslate);
        self.out.write_int32x(kind.code());
        self.vec3(t);
        self.out.write_logical(replace);
        self
    }

    pub fn perspective(
        &mut self,
        kind: StackKind,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
        replace: bool,
    ) -> &mut Self {
        self.op(RenderCmd::PushPerspective);
        self.out
            .write_int32x(kind.code())
            .write_real32(fov_y)
            .write_real32(aspect)
            .write_real32(near)
            .write_real32(far)
            .write_logical(replace);
        self
    }

    /// `bounds` is `[left, right, bottom, top, near, far]`.
    pub fn orthographic(&mut self, kind: StackKind, bounds: [f32; 6], replace: bool) -> &mut Self {
        self.op(RenderCmd::PushOrthographic);
        self.out.write_int32x(kind.code());
        for v in bounds {
            self.out.write_real32(v);
        }
        self.out.write_logical(replace);
        self
    }

    pub fn fill_box(&mut self, x: f32, y: f32, w: f32, h: f32, argb: u32) -> &mut Self {
        self.op(RenderCmd::FillBox);
        self.reals(&[x, y, w, h]);
        self.out.write_int32(argb as i32);
        self
    }

    /// Corner colors run top-left, top-right, bottom-right, bottom-left.
    pub fn fill_box_multicolor(&mut self, x: f32, y: f32, w: f32, h: f32, argb: [u32; 4]) -> &mut Self {
        self.op(RenderCmd::FillBoxMulticolor);
        self.reals(&[x, y, w, h]);
        for c in argb {
            self.out.write_int32(c as i32);
        }
        self
    }

    pub fn fill_triangle(&mut self, points: [f32; 6], argb: u32) -> &mut Self {
        self.op(RenderCmd::FillTriangle);
        self.reals(&points);
        self.out.write_int32(argb as i32);
        self
    }

    pub fn fill_triangle_multicolor(&mut self, points: [f32; 6], argb: [u32; 3]) -> &mut Self {
        self.op(RenderCmd::FillTriangleMulticolor);
        self.reals(&points);
        for c in argb {
            self.out.write_int32(c as i32);
        }
        self
    }

    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, argb: u32) -> &mut Self {
        self.op(RenderCmd::DrawLine);
        self.reals(&[x1, y1, x2, y2]);
        self.out.write_int32(argb as i32);
        self
    }

    /// `rect` is `[x, y, w, h]`, `uv` is `[u1, v1, u2, v2]`.
    pub fn draw_image(&mut self, texture: i32, rect: [f32; 4], uv: [f32; 4], argb: u32) -> &mut Self {
        self.op(RenderCmd::DrawImage);
        self.out.write_int32x(texture);
        self.reals(&rect);
        self.reals(&uv);
        self.out.write_int32(argb as i32);
        self
    }

    fn vec3(&mut self, v: Vec3) {
        self.reals(&v.to_array());
    }

    fn reals(&mut self, values: &[f32]) {
        for v in values {
            self.out.write_real32(*v);
        }
    }
}
