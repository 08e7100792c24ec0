use super::data::{RenderData, VertexColor};
use super::error::BackendError;
use super::mode::{ModeDef, Shape};

/// Backend handle for a compiled render mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineId(pub u32);

/// One flushed batch. Ranges are relative to the current frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: i32,
    pub shape: Shape,
    pub pipeline: PipelineId,
    pub first_position: u32,
    pub position_count: u32,
    pub first_color: u32,
    pub color_count: u32,
    pub first_uv: u32,
    pub uv_count: u32,
    pub constants_index: u32,
    pub texture: Option<i32>,
}

/// Sink for decoded frames.
///
/// `draw` calls arrive between `begin_canvas` and `end_canvas`; the geometry
/// they reference is complete once `end_canvas` hands over the frame's data.
pub trait DrawBackend {
    fn create_pipeline(&mut self, def: &ModeDef) -> Result<PipelineId, BackendError>;

    /// `clear` is straight-alpha RGBA; `None` keeps the previous contents.
    fn begin_canvas(&mut self, clear: Option<VertexColor>);

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError>;

    fn end_canvas(&mut self, data: &RenderData);

    /// Starts an asynchronous texture load; completion is reported elsewhere.
    fn load_texture(&mut self, id: i32, path: &str);
}

/// Shader entry points the built-in WGSL module provides.
pub const KNOWN_PROGRAMS: [&str; 4] = ["vs_color", "fs_color", "vs_texture", "fs_texture"];

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub pipelines: Vec<ModeDef>,
    pub draws: Vec<DrawCall>,
    pub canvases: Vec<Option<VertexColor>>,
    pub ended: usize,
    pub textures: Vec<(i32, String)>,
    /// Position count of the frame data seen at each `end_canvas`.
    pub positions_at_end: Vec<usize>,
}

#[cfg(test)]
impl DrawBackend for RecordingBackend {
    fn create_pipeline(&mut self, def: &ModeDef) -> Result<PipelineId, BackendError> {
        for program in [&def.vertex_program, &def.fragment_program] {
            if !KNOWN_PROGRAMS.contains(&program.as_str()) {
                return Err(BackendError::UnknownProgram(program.clone()));
            }
        }
        self.pipelines.push(def.clone());
        Ok(PipelineId(self.pipelines.len() as u32 - 1))
    }

    fn begin_canvas(&mut self, clear: Option<VertexColor>) {
        self.canvases.push(clear);
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        self.draws.push(*call);
        Ok(())
    }

    fn end_canvas(&mut self, data: &RenderData) {
        self.ended += 1;
        self.positions_at_end.push(data.positions.count());
    }

    fn load_texture(&mut self, id: i32, path: &str) {
        self.textures.push((id, path.to_owned()));
    }
}
