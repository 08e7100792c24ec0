use std::collections::HashMap;

use super::backend::{DrawBackend, DrawCall, PipelineId};
use super::data::RenderData;
use super::error::BackendError;
use super::interp::FrameReport;

/// Implicit mode used by the fill primitives.
pub const FILL_MODE: i32 = -1;
/// Implicit mode used by `DRAW_LINE`.
pub const LINE_MODE: i32 = -2;
/// Implicit mode used by `DRAW_IMAGE`.
pub const IMAGE_MODE: i32 = -3;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Shape {
    Points,
    Lines,
    Triangles,
}

impl Shape {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Shape::Points),
            2 => Some(Shape::Lines),
            3 => Some(Shape::Triangles),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Shape::Points => 1,
            Shape::Lines => 2,
            Shape::Triangles => 3,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BlendFactor {
    #[default]
    None,
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcColor,
    OneMinusSrcColor,
}

impl BlendFactor {
    /// Unknown bytes read as `None`.
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => BlendFactor::Zero,
            2 => BlendFactor::One,
            3 => BlendFactor::SrcAlpha,
            4 => BlendFactor::OneMinusSrcAlpha,
            5 => BlendFactor::DstAlpha,
            6 => BlendFactor::OneMinusDstAlpha,
            7 => BlendFactor::SrcColor,
            8 => BlendFactor::OneMinusSrcColor,
            _ => BlendFactor::None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            BlendFactor::None => 0,
            BlendFactor::Zero => 1,
            BlendFactor::One => 2,
            BlendFactor::SrcAlpha => 3,
            BlendFactor::OneMinusSrcAlpha => 4,
            BlendFactor::DstAlpha => 5,
            BlendFactor::OneMinusDstAlpha => 6,
            BlendFactor::SrcColor => 7,
            BlendFactor::OneMinusSrcColor => 8,
        }
    }
}

/// A draw configuration as defined by `DEFINE_RENDER_MODE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModeDef {
    pub shape: Shape,
    pub src_blend: BlendFactor,
    pub dst_blend: BlendFactor,
    pub vertex_program: String,
    pub fragment_program: String,
}

impl ModeDef {
    pub fn new(shape: Shape, vertex_program: &str, fragment_program: &str) -> Self {
        Self {
            shape,
            src_blend: BlendFactor::None,
            dst_blend: BlendFactor::None,
            vertex_program: vertex_program.to_owned(),
            fragment_program: fragment_program.to_owned(),
        }
    }

    pub fn with_blend(mut self, src: BlendFactor, dst: BlendFactor) -> Self {
        self.src_blend = src;
        self.dst_blend = dst;
        self
    }

    #[inline]
    pub fn blending_enabled(&self) -> bool {
        self.src_blend != BlendFactor::None && self.dst_blend != BlendFactor::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Unbuilt,
    Ready(PipelineId),
    Failed,
}

#[derive(Debug, Clone)]
pub struct ModeEntry {
    pub def: ModeDef,
    pub texture: Option<i32>,
    pipeline: PipelineState,
}

/// Render modes keyed by id. Pipelines are built lazily on first flush.
#[derive(Debug, Clone, Default)]
pub struct ModeTable {
    modes: HashMap<i32, ModeEntry>,
}

impl ModeTable {
    /// A table holding the implicit fill, line and image modes.
    pub fn with_builtins() -> Self {
        let alpha = |def: ModeDef| def.with_blend(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        let mut table = Self::default();
        table.define(FILL_MODE, alpha(ModeDef::new(Shape::Triangles, "vs_color", "fs_color")));
        table.define(LINE_MODE, alpha(ModeDef::new(Shape::Lines, "vs_color", "fs_color")));
        table.define(IMAGE_MODE, alpha(ModeDef::new(Shape::Triangles, "vs_texture", "fs_texture")));
        table
    }

    /// Defines or overwrites a mode. An overwrite forgets the old pipeline.
    pub fn define(&mut self, id: i32, def: ModeDef) {
        self.modes.insert(
            id,
            ModeEntry {
                def,
                texture: None,
                pipeline: PipelineState::Unbuilt,
            },
        );
    }

    #[inline]
    pub fn get(&self, id: i32) -> Option<&ModeEntry> {
        self.modes.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: i32) -> bool {
        self.modes.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// `Ok(None)` after an earlier build failure for this definition.
    fn pipeline_for<B: DrawBackend + ?Sized>(
        &mut self,
        id: i32,
        backend: &mut B,
    ) -> Result<Option<PipelineId>, BackendError> {
        let Some(entry) = self.modes.get_mut(&id) else { return Ok(None) };
        match entry.pipeline {
            PipelineState::Ready(p) => Ok(Some(p)),
            PipelineState::Failed => Ok(None),
            PipelineState::Unbuilt => match backend.create_pipeline(&entry.def) {
                Ok(p) => {
                    entry.pipeline = PipelineState::Ready(p);
                    Ok(Some(p))
                }
                Err(e) => {
                    entry.pipeline = PipelineState::Failed;
                    Err(e)
                }
            },
        }
    }
}

/// The active mode and where its geometry starts in each ring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    mode: Option<i32>,
    first_position: usize,
    first_color: usize,
    first_uv: usize,
}

impl Batch {
    #[inline]
    pub fn mode(&self) -> Option<i32> {
        self.mode
    }

    #[inline]
    pub fn first_position(&self) -> usize {
        self.first_position
    }

    #[inline]
    pub fn is_pending(&self, data: &RenderData) -> bool {
        self.mode.is_some() && data.positions.count() > self.first_position
    }

    /// Makes `id` the active mode.
    ///
    /// Re-activating the active mode while it holds geometry does nothing;
    /// anything else flushes the previous batch first. Returns `false` when
    /// `id` is not defined, which leaves no mode active.
    pub fn activate<B: DrawBackend + ?Sized>(
        &mut self,
        id: i32,
        modes: &mut ModeTable,
        data: &mut RenderData,
        backend: &mut B,
        report: &mut FrameReport,
    ) -> bool {
        if self.mode == Some(id) && self.is_pending(data) {
            return true;
        }

        self.flush(modes, data, backend, report);
        self.mark_start(data);

        if modes.contains(id) {
            self.mode = Some(id);
            true
        } else {
            self.mode = None;
            false
        }
    }

    /// Binds `texture` to the active mode, flushing first if it changes.
    ///
    /// Returns `false` when no mode is active.
    pub fn bind_texture<B: DrawBackend + ?Sized>(
        &mut self,
        texture: i32,
        modes: &mut ModeTable,
        data: &mut RenderData,
        backend: &mut B,
        report: &mut FrameReport,
    ) -> bool {
        let Some(id) = self.mode else { return false };
        let current = modes.get(id).and_then(|e| e.texture);
        if current == Some(texture) {
            return true;
        }

        self.flush(modes, data, backend, report);
        if let Some(entry) = modes.modes.get_mut(&id) {
            entry.texture = Some(texture);
        }
        true
    }

    /// Submits pending geometry as one draw call and moves the batch start
    /// to the current counts. The mode stays active.
    pub fn flush<B: DrawBackend + ?Sized>(
        &mut self,
        modes: &mut ModeTable,
        data: &mut RenderData,
        backend: &mut B,
        report: &mut FrameReport,
    ) {
        let Some(id) = self.mode else { return };
        if !self.is_pending(data) {
            return;
        }

        let pipeline = match modes.pipeline_for(id, backend) {
            Ok(Some(p)) => Some(p),
            Ok(None) => None,
            Err(e) => {
                log::warn!("render mode {id}: {e}");
                report.backend_errors.push(e);
                None
            }
        };

        if let (Some(pipeline), Some(entry)) = (pipeline, modes.get(id)) {
            let constants_index = data.push_current_constants();
            let call = DrawCall {
                mode: id,
                shape: entry.def.shape,
                pipeline,
                first_position: self.first_position as u32,
                position_count: (data.positions.count() - self.first_position) as u32,
                first_color: self.first_color as u32,
                color_count: data.colors.count().saturating_sub(self.first_color) as u32,
                first_uv: self.first_uv as u32,
                uv_count: data.uvs.count().saturating_sub(self.first_uv) as u32,
                constants_index,
                texture: entry.texture,
            };
            match backend.draw(&call) {
                Ok(()) => report.draws += 1,
                Err(e) => {
                    log::warn!("draw for render mode {id} dropped: {e}");
                    report.backend_errors.push(e);
                }
            }
        }

        self.mark_start(data);
    }

    /// Drops the active mode without flushing.
    pub fn reset(&mut self, data: &RenderData) {
        self.mode = None;
        self.mark_start(data);
    }

    fn mark_start(&mut self, data: &RenderData) {
        self.first_position = data.positions.count();
        self.first_color = data.colors.count();
        self.first_uv = data.uvs.count();
    }
}
