use glam::{Mat4, Vec3};
use plasma_wire::Message;

use super::backend::DrawBackend;
use super::cmd::{RenderCmd, StackKind};
use super::config::RenderConfig;
use super::data::{argb_to_rgba, Position, RenderData, Uv, VertexColor};
use super::error::{BackendError, DecodeError};
use super::mode::{Batch, BlendFactor, ModeDef, ModeTable, Shape, FILL_MODE, IMAGE_MODE, LINE_MODE};

/// What happened while rendering one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// On-screen canvases drawn.
    pub canvases: usize,
    /// Offscreen canvases skipped.
    pub skipped_canvases: usize,
    pub draws: usize,
    /// `END_RENDER` was reached.
    pub completed: bool,
    pub errors: Vec<DecodeError>,
    pub backend_errors: Vec<BackendError>,
}

impl FrameReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.completed && self.errors.is_empty() && self.backend_errors.is_empty()
    }
}

/// Decodes render command streams into draw calls.
///
/// Geometry rings, transform stacks and the render mode table persist across
/// frames; counts and transforms reset after each frame.
#[derive(Debug, Clone)]
pub struct Interpreter {
    data: RenderData,
    modes: ModeTable,
    batch: Batch,
}

impl Interpreter {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            data: RenderData::new(config),
            modes: ModeTable::with_builtins(),
            batch: Batch::default(),
        }
    }

    #[inline]
    pub fn data(&self) -> &RenderData {
        &self.data
    }

    #[inline]
    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    /// Replays one frame from the stream's read cursor.
    ///
    /// Decode problems never abort the caller: the offending sub-stream is
    /// abandoned, the open canvas is closed, and the error is reported.
    pub fn render_frame<B: DrawBackend + ?Sized>(
        &mut self,
        stream: &mut Message,
        backend: &mut B,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        if let Err(e) = self.run_stream(stream, backend, &mut report) {
            log::warn!("render stream abandoned: {e}");
            report.errors.push(e);
        }
        self.data.advance_frame();
        self.batch.reset(&self.data);
        report
    }

    fn run_stream<B: DrawBackend + ?Sized>(
        &mut self,
        stream: &mut Message,
        backend: &mut B,
        report: &mut FrameReport,
    ) -> Result<(), DecodeError> {
        loop {
            let position = stream.position();
            let opcode = stream.read_int32x();
            ensure(stream, position)?;

            match RenderCmd::from_code(opcode) {
                Some(RenderCmd::EndRender) => {
                    report.completed = true;
                    return Ok(());
                }
                Some(RenderCmd::BeginCanvas) => {
                    let canvas_id = stream.read_int32x();
                    let byte_size = stream.read_int32();
                    ensure(stream, position)?;

                    if canvas_id == 0 {
                        report.canvases += 1;
                        self.run_canvas(stream, backend, report)?;
                        continue;
                    }

                    let byte_size = usize::try_from(byte_size).unwrap_or(0);
                    stream.skip(byte_size);
                    ensure(stream, position)?;
                    let e = DecodeError::UnsupportedCanvas { canvas_id, byte_size };
                    log::debug!("{e}");
                    report.skipped_canvases += 1;
                    report.errors.push(e);
                }
                Some(_) => {
                    return Err(DecodeError::UnexpectedOpcode { opcode, state: "stream", position });
                }
                None => return Err(DecodeError::UnknownOpcode { opcode, position }),
            }
        }
    }

    /// Header, body and close-out of one on-screen canvas.
    fn run_canvas<B: DrawBackend + ?Sized>(
        &mut self,
        stream: &mut Message,
        backend: &mut B,
        report: &mut FrameReport,
    ) -> Result<(), DecodeError> {
        let mut clear = None;
        let header = run_header(stream, &mut clear);
        backend.begin_canvas(clear);

        // A bad header opcode ends the header only; the body still runs.
        let result = match header {
            Err(e @ (DecodeError::UnexpectedOpcode { .. } | DecodeError::UnknownOpcode { .. })) => {
                log::warn!("canvas header cut short: {e}");
                report.errors.push(e);
                self.run_body(stream, backend, report)
            }
            other => other.and_then(|()| self.run_body(stream, backend, report)),
        };

        self.batch.flush(&mut self.modes, &mut self.data, backend, report);
        backend.end_canvas(&self.data);
        self.batch.reset(&self.data);
        result
    }

    fn run_body<B: DrawBackend + ?Sized>(
        &mut self,
        stream: &mut Message,
        backend: &mut B,
        report: &mut FrameReport,
    ) -> Result<(), DecodeError> {
        loop {
            let position = stream.position();
            let opcode = stream.read_int32x();
            ensure(stream, position)?;

            let Some(cmd) = RenderCmd::from_code(opcode) else {
                return Err(DecodeError::UnknownOpcode { opcode, position });
            };
            if cmd == RenderCmd::EndCanvas {
                return Ok(());
            }
            self.exec(cmd, position, stream, backend, report)?;
        }
    }

    fn exec<B: DrawBackend + ?Sized>(
        &mut self,
        cmd: RenderCmd,
        position: usize,
        stream: &mut Message,
        backend: &mut B,
        report: &mut FrameReport,
    ) -> Result<(), DecodeError> {
        use RenderCmd as C;

        match cmd {
            C::LoadTexture => {
                let id = stream.read_int32x();
                let path = stream.read_string();
                ensure(stream, position)?;
                backend.load_texture(id, &path);
            }

            C::PushObjectTransform | C::PushViewTransform | C::PushProjectionTransform => {
                let m = Mat4::from_cols_array(&stream.read_matrix());
                let replace = stream.read_logical();
                ensure(stream, position)?;
                self.push_transform(stack_of(cmd), m, replace, backend, report);
            }

            C::PopObjectTransform | C::PopViewTransform | C::PopProjectionTransform => {
                let count = stream.read_int32x();
                ensure(stream, position)?;
                self.batch.flush(&mut self.modes, &mut self.data, backend, report);
                self.data
                    .transforms
                    .pop(stack_of(cmd), usize::try_from(count).unwrap_or(0));
            }

            C::DefineRenderMode => {
                let id = stream.read_int32x();
                let shape = stream.read_int32x();
                let src = BlendFactor::from_byte(stream.read_byte());
                let dst = BlendFactor::from_byte(stream.read_byte());
                let vs = stream.read_string();
                let fs = stream.read_string();
                ensure(stream, position)?;

                let Some(shape) = Shape::from_code(shape) else {
                    missing(report, "shape", shape);
                    return Ok(());
                };
                if self.batch.mode() == Some(id) {
                    self.batch.flush(&mut self.modes, &mut self.data, backend, report);
                }
                self.modes
                    .define(id, ModeDef::new(shape, &vs, &fs).with_blend(src, dst));
            }

            C::UseRenderMode => {
                let id = stream.read_int32x();
                ensure(stream, position)?;
                self.activate(id, backend, report);
            }

            C::PushPositions => {
                let n = element_count(stream, 12, position)?;
                let positions: Vec<Position> = (0..n)
                    .map(|_| [stream.read_real32(), stream.read_real32(), stream.read_real32()])
                    .collect();
                ensure(stream, position)?;
                self.data.positions.push(&positions);
            }

            C::PushColors => {
                let n = element_count(stream, 4, position)?;
                let colors: Vec<VertexColor> =
                    (0..n).map(|_| argb_to_rgba(stream.read_int32())).collect();
                ensure(stream, position)?;
                self.data.colors.push(&colors);
            }

            C::PushUvs => {
                let n = element_count(stream, 8, position)?;
                let uvs: Vec<Uv> = (0..n)
                    .map(|_| [stream.read_real32(), stream.read_real32()])
                    .collect();
                ensure(stream, position)?;
                self.data.uvs.push(&uvs);
            }

            C::UseTexture => {
                let id = stream.read_int32x();
                ensure(stream, position)?;
                self.bind_texture(id, backend, report);
            }

            C::PushRotate => {
                let stack = read_stack(stream);
                let radians = stream.read_real32();
                let axis = read_vec3(stream);
                let replace = stream.read_logical();
                ensure(stream, position)?;
                let axis = axis.normalize_or_zero();
                let m = if axis == Vec3::ZERO {
                    Mat4::IDENTITY
                } else {
                    Mat4::from_axis_angle(axis, radians)
                };
                self.push_shorthand(stack, m, replace, backend, report);
            }

            C::PushScale => {
                let stack = read_stack(stream);
                let s = read_vec3(stream);
                let replace = stream.read_logical();
                ensure(stream, position)?;
                self.push_shorthand(stack, Mat4::from_scale(s), replace, backend, report);
            }

            C::PushTranslate => {
                let stack = read_stack(stream);
                let t = read_vec3(stream);
                let replace = stream.read_logical();
                ensure(stream, position)?;
                self.push_shorthand(stack, Mat4::from_translation(t), replace, backend, report);
            }

            C::PushPerspective => {
                let stack = read_stack(stream);
                let [fov_y, aspect, near, far] = read_reals::<4>(stream);
                let replace = stream.read_logical();
                ensure(stream, position)?;
                let m = Mat4::perspective_rh(fov_y, aspect, near, far);
                self.push_shorthand(stack, m, replace, backend, report);
            }

            C::PushOrthographic => {
                let stack = read_stack(stream);
                let [left, right, bottom, top, near, far] = read_reals::<6>(stream);
                let replace = stream.read_logical();
                ensure(stream, position)?;
                let m = Mat4::orthographic_rh(left, right, bottom, top, near, far);
                self.push_shorthand(stack, m, replace, backend, report);
            }

            C::FillBox => {
                let [x, y, w, h] = read_reals::<4>(stream);
                let c = argb_to_rgba(stream.read_int32());
                ensure(stream, position)?;
                if self.activate(FILL_MODE, backend, report) {
                    self.push_quad([x, y, w, h], [c; 4], None);
                }
            }

            C::FillBoxMulticolor => {
                let [x, y, w, h] = read_reals::<4>(stream);
                let colors = read_colors::<4>(stream);
                ensure(stream, position)?;
                if self.activate(FILL_MODE, backend, report) {
                    self.push_quad([x, y, w, h], colors, None);
                }
            }

            C::FillTriangle => {
                let p = read_reals::<6>(stream);
                let c = argb_to_rgba(stream.read_int32());
                ensure(stream, position)?;
                if self.activate(FILL_MODE, backend, report) {
                    self.push_triangle(p, [c; 3]);
                }
            }

            C::FillTriangleMulticolor => {
                let p = read_reals::<6>(stream);
                let colors = read_colors::<3>(stream);
                ensure(stream, position)?;
                if self.activate(FILL_MODE, backend, report) {
                    self.push_triangle(p, colors);
                }
            }

            C::DrawLine => {
                let [x1, y1, x2, y2] = read_reals::<4>(stream);
                let c = argb_to_rgba(stream.read_int32());
                ensure(stream, position)?;
                if self.activate(LINE_MODE, backend, report) {
                    self.data.positions.push(&[[x1, y1, 0.0], [x2, y2, 0.0]]);
                    self.data.colors.push(&[c, c]);
                }
            }

            C::DrawImage => {
                let texture = stream.read_int32x();
                let rect = read_reals::<4>(stream);
                let uv = read_reals::<4>(stream);
                let c = argb_to_rgba(stream.read_int32());
                ensure(stream, position)?;
                if self.activate(IMAGE_MODE, backend, report) {
                    self.bind_texture(texture, backend, report);
                    self.push_quad(rect, [c; 4], Some(uv));
                }
            }

            C::EndRender | C::BeginCanvas | C::EndCanvas | C::HeaderClearColor | C::HeaderEnd => {
                return Err(DecodeError::UnexpectedOpcode {
                    opcode: cmd.code(),
                    state: "body",
                    position,
                });
            }
        }
        Ok(())
    }

    // ── batch helpers ──

    fn activate<B: DrawBackend + ?Sized>(
        &mut self,
        id: i32,
        backend: &mut B,
        report: &mut FrameReport,
    ) -> bool {
        let ok = self
            .batch
            .activate(id, &mut self.modes, &mut self.data, backend, report);
        if !ok {
            missing(report, "render mode", id);
        }
        ok
    }

    fn bind_texture<B: DrawBackend + ?Sized>(
        &mut self,
        texture: i32,
        backend: &mut B,
        report: &mut FrameReport,
    ) {
        if !self
            .batch
            .bind_texture(texture, &mut self.modes, &mut self.data, backend, report)
        {
            log::debug!("texture {texture} bound with no active render mode; ignored");
        }
    }

    fn push_transform<B: DrawBackend + ?Sized>(
        &mut self,
        stack: StackKind,
        m: Mat4,
        replace: bool,
        backend: &mut B,
        report: &mut FrameReport,
    ) {
        self.batch.flush(&mut self.modes, &mut self.data, backend, report);
        self.data.transforms.push(stack, m, replace);
    }

    fn push_shorthand<B: DrawBackend + ?Sized>(
        &mut self,
        stack: Option<StackKind>,
        m: Mat4,
        replace: bool,
        backend: &mut B,
        report: &mut FrameReport,
    ) {
        match stack {
            Some(stack) => self.push_transform(stack, m, replace, backend, report),
            None => log::debug!("transform shorthand with unknown stack selector; ignored"),
        }
    }

    /// Two triangles; corners run top-left, top-right, bottom-right, bottom-left.
    fn push_quad(&mut self, [x, y, w, h]: [f32; 4], colors: [VertexColor; 4], uv: Option<[f32; 4]>) {
        let corners = [[x, y, 0.0], [x + w, y, 0.0], [x + w, y + h, 0.0], [x, y + h, 0.0]];
        const ORDER: [usize; 6] = [0, 1, 2, 0, 2, 3];

        self.data.positions.push(&ORDER.map(|i| corners[i]));
        self.data.colors.push(&ORDER.map(|i| colors[i]));
        if let Some([u1, v1, u2, v2]) = uv {
            let uvs = [[u1, v1], [u2, v1], [u2, v2], [u1, v2]];
            self.data.uvs.push(&ORDER.map(|i| uvs[i]));
        }
    }

    fn push_triangle(&mut self, p: [f32; 6], colors: [VertexColor; 3]) {
        self.data
            .positions
            .push(&[[p[0], p[1], 0.0], [p[2], p[3], 0.0], [p[4], p[5], 0.0]]);
        self.data.colors.push(&colors);
    }
}

fn run_header(stream: &mut Message, clear: &mut Option<VertexColor>) -> Result<(), DecodeError> {
    loop {
        let position = stream.position();
        let opcode = stream.read_int32x();
        ensure(stream, position)?;

        match RenderCmd::from_code(opcode) {
            Some(RenderCmd::HeaderClearColor) => {
                let argb = stream.read_int32();
                ensure(stream, position)?;
                *clear = Some(argb_to_rgba(argb));
            }
            Some(RenderCmd::HeaderEnd) => return Ok(()),
            Some(_) => {
                return Err(DecodeError::UnexpectedOpcode { opcode, state: "header", position });
            }
            None => return Err(DecodeError::UnknownOpcode { opcode, position }),
        }
    }
}

#[inline]
fn ensure(stream: &Message, position: usize) -> Result<(), DecodeError> {
    if stream.has_overrun() {
        Err(DecodeError::OutOfBounds { position })
    } else {
        Ok(())
    }
}

/// Reads an element count and checks it against the bytes left.
fn element_count(stream: &mut Message, min_bytes: usize, position: usize) -> Result<usize, DecodeError> {
    let count = stream.read_int32x();
    ensure(stream, position)?;
    match usize::try_from(count) {
        Ok(n) if n.saturating_mul(min_bytes) <= stream.remaining() => Ok(n),
        _ => Err(DecodeError::OutOfBounds { position }),
    }
}

fn missing(report: &mut FrameReport, kind: &'static str, id: i32) {
    let e = DecodeError::MissingResource { kind, id };
    log::debug!("{e}");
    report.errors.push(e);
}

fn stack_of(cmd: RenderCmd) -> StackKind {
    match cmd {
        RenderCmd::PushViewTransform | RenderCmd::PopViewTransform => StackKind::View,
        RenderCmd::PushProjectionTransform | RenderCmd::PopProjectionTransform => {
            StackKind::Projection
        }
        _ => StackKind::Object,
    }
}

fn read_stack(stream: &mut Message) -> Option<StackKind> {
    StackKind::from_code(stream.read_int32x())
}

fn read_reals<const N: usize>(stream: &mut Message) -> [f32; N] {
    let mut out = [0.0; N];
    for v in out.iter_mut() {
        *v = stream.read_real32();
    }
    out
}

fn read_vec3(stream: &mut Message) -> Vec3 {
    Vec3::from_array(read_reals::<3>(stream))
}

fn read_colors<const N: usize>(stream: &mut Message) -> [VertexColor; N] {
    let mut out = [[0.0; 4]; N];
    for c in out.iter_mut() {
        *c = argb_to_rgba(stream.read_int32());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::RecordingBackend;
    use crate::render::writer::CommandWriter;

    fn run(interp: &mut Interpreter, stream: Message) -> (FrameReport, RecordingBackend) {
        let mut backend = RecordingBackend::default();
        let mut stream = Message::parse(stream.into_bytes());
        let report = interp.render_frame(&mut stream, &mut backend);
        (report, backend)
    }

    fn writer() -> CommandWriter {
        CommandWriter::new(Message::with_id("", 1))
    }

    fn interp() -> Interpreter {
        Interpreter::new(&RenderConfig::default())
    }

    // ── stream structure ──

    #[test]
    fn empty_frame_completes() {
        let (report, backend) = run(&mut interp(), writer().finish());
        assert!(report.is_clean());
        assert_eq!(report.canvases, 0);
        assert!(backend.canvases.is_empty());
    }

    #[test]
    fn clear_color_reaches_backend() {
        let mut w = writer();
        w.canvas(0, Some(0xFF00_FF00), |_| {});
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(report.is_clean());
        assert_eq!(backend.canvases, vec![Some([0.0, 1.0, 0.0, 1.0])]);
        assert_eq!(backend.ended, 1);
    }

    #[test]
    fn offscreen_canvas_is_skipped_exactly() {
        let mut w = writer();
        w.canvas(5, None, |c| {
            c.fill_box(0.0, 0.0, 10.0, 10.0, 0xFFFF_FFFF);
            c.push_transform(StackKind::Object, Mat4::from_scale(Vec3::splat(2.0)), false);
        });
        w.canvas(0, None, |c| {
            c.draw_line(0.0, 0.0, 1.0, 1.0, 0xFF00_0000);
        });

        let mut i = interp();
        let (report, backend) = run(&mut i, w.finish());

        assert!(report.completed);
        assert_eq!(report.skipped_canvases, 1);
        assert_eq!(report.canvases, 1);
        assert!(matches!(
            report.errors.as_slice(),
            [DecodeError::UnsupportedCanvas { canvas_id: 5, .. }]
        ));
        // Only the on-screen line made it through.
        assert_eq!(backend.draws.len(), 1);
        assert_eq!(backend.draws[0].mode, LINE_MODE);
        assert_eq!(backend.positions_at_end, vec![2]);
    }

    #[test]
    fn skip_advances_by_declared_size() {
        let body = [0xAAu8; 7];
        let mut w = writer();
        w.op(RenderCmd::BeginCanvas);
        w.raw().write_int32x(3).write_int32(body.len() as i32).write_bytes(&body);
        let before_end = w.raw().len();
        let mut stream = Message::parse(w.finish().into_bytes());

        let mut backend = RecordingBackend::default();
        let report = interp().render_frame(&mut stream, &mut backend);
        assert!(report.completed);
        assert_eq!(stream.position(), before_end + 1);
        assert!(backend.canvases.is_empty());
    }

    #[test]
    fn missing_end_render_is_out_of_bounds() {
        let mut w = writer();
        w.canvas(0, None, |_| {});
        let (report, _) = run(&mut interp(), w.into_message());
        assert!(!report.completed);
        assert!(matches!(report.errors.as_slice(), [DecodeError::OutOfBounds { .. }]));
    }

    // ── error handling ──

    #[test]
    fn unknown_opcode_abandons_canvas_but_closes_it() {
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.fill_box(0.0, 0.0, 4.0, 4.0, 0xFFFF_FFFF);
            c.raw().write_int32x(99);
            c.fill_box(10.0, 0.0, 4.0, 4.0, 0xFFFF_FFFF);
        });
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(!report.completed);
        assert!(matches!(
            report.errors.as_slice(),
            [DecodeError::UnknownOpcode { opcode: 99, .. }]
        ));
        assert_eq!(backend.draws.len(), 1);
        assert_eq!(backend.draws[0].position_count, 6);
        assert_eq!(backend.ended, 1);
    }

    #[test]
    fn header_rejects_body_opcode() {
        let mut w = writer();
        w.op(RenderCmd::BeginCanvas);
        w.raw().write_int32x(0).write_int32(0);
        w.op(RenderCmd::EndCanvas);
        w.fill_box(0.0, 0.0, 4.0, 4.0, 0xFFFF_FFFF);
        w.op(RenderCmd::EndCanvas);
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(matches!(
            report.errors.as_slice(),
            [DecodeError::UnexpectedOpcode { state: "header", .. }]
        ));
        assert_eq!(backend.canvases, vec![None]);
        assert_eq!(backend.draws.len(), 1);
        assert_eq!(backend.ended, 1);
        assert!(report.completed);
    }

    #[test]
    fn unknown_header_opcode_still_runs_body() {
        let mut w = writer();
        w.op(RenderCmd::BeginCanvas);
        w.raw().write_int32x(0).write_int32(0).write_int32x(99);
        w.fill_box(0.0, 0.0, 4.0, 4.0, 0xFF00_FF00);
        w.op(RenderCmd::EndCanvas);
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(matches!(
            report.errors.as_slice(),
            [DecodeError::UnknownOpcode { opcode: 99, .. }]
        ));
        assert_eq!(report.draws, 1);
        assert_eq!(backend.draws[0].position_count, 6);
        assert!(report.completed);
    }

    #[test]
    fn truncated_header_abandons_the_frame() {
        let mut w = writer();
        w.op(RenderCmd::BeginCanvas);
        w.raw().write_int32x(0).write_int32(0);
        w.op(RenderCmd::HeaderClearColor);
        let (report, backend) = run(&mut interp(), w.into_message());

        assert!(matches!(report.errors.as_slice(), [DecodeError::OutOfBounds { .. }]));
        assert!(backend.draws.is_empty());
        assert_eq!(backend.ended, 1);
        assert!(!report.completed);
    }

    #[test]
    fn truncated_positions_are_rejected() {
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.use_render_mode(FILL_MODE);
            c.op(RenderCmd::PushPositions);
            c.raw().write_int32x(1_000_000);
        });
        let (report, backend) = run(&mut interp(), w.finish());
        assert!(matches!(report.errors.as_slice(), [DecodeError::OutOfBounds { .. }]));
        assert!(backend.draws.is_empty());
    }

    #[test]
    fn missing_mode_is_reported_and_skipped() {
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.use_render_mode(42);
            c.push_positions(&[[0.0; 3]; 3]);
        });
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(report.completed);
        assert_eq!(
            report.errors,
            vec![DecodeError::MissingResource { kind: "render mode", id: 42 }]
        );
        assert!(backend.draws.is_empty());
    }

    #[test]
    fn bad_program_degrades_to_no_draw() {
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.define_render_mode(1, &ModeDef::new(Shape::Triangles, "vs_nope", "fs_color"));
            c.use_render_mode(1);
            c.push_positions(&[[0.0; 3]; 3]);
        });
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(report.completed);
        assert_eq!(report.backend_errors, vec![BackendError::UnknownProgram("vs_nope".into())]);
        assert!(backend.draws.is_empty());
    }

    // ── batching ──

    #[test]
    fn explicit_modes_flush_in_submission_order() {
        let points = ModeDef::new(Shape::Points, "vs_color", "fs_color");
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.define_render_mode(1, &ModeDef::new(Shape::Triangles, "vs_color", "fs_color"));
            c.define_render_mode(2, &points);
            c.use_render_mode(1);
            c.push_positions(&[[0.0; 3]; 3]);
            c.push_colors(&[0xFFFF_FFFF; 3]);
            c.use_render_mode(2);
            c.push_positions(&[[1.0; 3]; 2]);
            c.push_colors(&[0xFF00_0000; 2]);
        });
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(report.is_clean());
        let calls: Vec<_> = backend
            .draws
            .iter()
            .map(|d| (d.mode, d.shape, d.first_position, d.position_count, d.color_count))
            .collect();
        assert_eq!(
            calls,
            vec![(1, Shape::Triangles, 0, 3, 3), (2, Shape::Points, 3, 2, 2)]
        );
        assert_eq!(report.draws, 2);
    }

    #[test]
    fn consecutive_fills_share_one_draw() {
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.fill_box(0.0, 0.0, 1.0, 1.0, 0xFFFF_0000);
            c.fill_triangle([0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 0xFF00_FF00);
            c.fill_box_multicolor(0.0, 0.0, 1.0, 1.0, [0xFFFF_FFFF; 4]);
        });
        let (_, backend) = run(&mut interp(), w.finish());

        assert_eq!(backend.draws.len(), 1);
        assert_eq!(backend.draws[0].position_count, 15);
        assert_eq!(backend.draws[0].color_count, 15);
    }

    #[test]
    fn transform_push_splits_batch_and_captures_constants() {
        let mut i = interp();
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.fill_box(0.0, 0.0, 1.0, 1.0, 0xFFFF_0000);
            c.translate(StackKind::Object, Vec3::new(5.0, 0.0, 0.0), false);
            c.fill_box(0.0, 0.0, 1.0, 1.0, 0xFFFF_0000);
            c.pop_transform(StackKind::Object, 1);
        });

        let mut backend = RecordingBackend::default();
        let mut stream = Message::parse(w.finish().into_bytes());
        // Inspect constants before the frame advances.
        let report = {
            let mut report = FrameReport::default();
            let result = i.run_stream(&mut stream, &mut backend, &mut report);
            assert!(result.is_ok());
            report
        };

        assert_eq!(report.draws, 2);
        let c0 = i.data().constants_at(backend.draws[0].constants_index).unwrap();
        let c1 = i.data().constants_at(backend.draws[1].constants_index).unwrap();
        assert_eq!(c0.world, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(
            c1.world,
            Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)).to_cols_array_2d()
        );
    }

    #[test]
    fn draw_image_binds_texture_and_uvs() {
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.draw_image(4, [0.0, 0.0, 8.0, 8.0], [0.0, 0.0, 1.0, 1.0], 0xFFFF_FFFF);
            c.draw_image(4, [8.0, 0.0, 8.0, 8.0], [0.0, 0.0, 1.0, 1.0], 0xFFFF_FFFF);
            c.draw_image(5, [0.0, 8.0, 8.0, 8.0], [0.0, 0.0, 1.0, 1.0], 0xFFFF_FFFF);
        });
        let (report, backend) = run(&mut interp(), w.finish());

        assert!(report.is_clean());
        let calls: Vec<_> = backend
            .draws
            .iter()
            .map(|d| (d.texture, d.position_count, d.uv_count))
            .collect();
        assert_eq!(calls, vec![(Some(4), 12, 12), (Some(5), 6, 6)]);
    }

    #[test]
    fn load_texture_is_delegated() {
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.load_texture(3, "assets/logo.png");
        });
        let (_, backend) = run(&mut interp(), w.finish());
        assert_eq!(backend.textures, vec![(3, "assets/logo.png".to_string())]);
    }

    #[test]
    fn modes_persist_but_geometry_resets_between_frames() {
        let mut i = interp();
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.define_render_mode(9, &ModeDef::new(Shape::Lines, "vs_color", "fs_color"));
        });
        run(&mut i, w.finish());

        let mut w = writer();
        w.canvas(0, None, |c| {
            c.use_render_mode(9);
            c.push_positions(&[[0.0; 3]; 2]);
            c.push_colors(&[0xFFFF_FFFF; 2]);
        });
        let (report, backend) = run(&mut i, w.finish());

        assert!(report.is_clean());
        assert_eq!(backend.draws[0].first_position, 0);
        assert_eq!(i.data().positions.count(), 0);
        assert_eq!(i.data().positions.frame(), 2);
    }

    #[test]
    fn shorthand_transforms_target_their_stack() {
        let mut i = interp();
        let mut w = writer();
        w.canvas(0, None, |c| {
            c.orthographic(StackKind::Projection, [0.0, 100.0, 100.0, 0.0, -1.0, 1.0], false);
            c.rotate(StackKind::View, 0.3, Vec3::Z, false);
            c.scale(StackKind::Object, Vec3::splat(2.0), false);
            c.perspective(StackKind::Projection, 1.0, 1.5, 0.1, 10.0, true);
        });
        let mut backend = RecordingBackend::default();
        let mut stream = Message::parse(w.finish().into_bytes());
        let mut report = FrameReport::default();
        assert!(i.run_stream(&mut stream, &mut backend, &mut report).is_ok());

        let t = &i.data().transforms;
        assert_eq!(t.world_depth(), 2);
        assert_eq!(t.depth(StackKind::Projection), 2);
        assert!(t
            .projection_top()
            .abs_diff_eq(Mat4::perspective_rh(1.0, 1.5, 0.1, 10.0), 1e-6));
        assert!(report.errors.is_empty());
    }
}
