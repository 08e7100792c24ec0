use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::config::RenderConfig;
use super::ring::FrameRing;
use super::transform::TransformStacks;

pub type Position = [f32; 3];
pub type VertexColor = [f32; 4];
pub type Uv = [f32; 2];

/// Per-draw uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Constants {
    pub projection: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
}

impl Constants {
    pub fn new(projection: Mat4, world: Mat4) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            world: world.to_cols_array_2d(),
        }
    }
}

/// Geometry and transform state the interpreter writes for one frame.
///
/// Constants live in a byte ring whose entries are padded to
/// `constants_stride` so each one can be bound with a dynamic offset.
#[derive(Debug, Clone)]
pub struct RenderData {
    pub positions: FrameRing<Position>,
    pub colors: FrameRing<VertexColor>,
    pub uvs: FrameRing<Uv>,
    pub transforms: TransformStacks,
    constants: FrameRing<u8>,
    constants_stride: usize,
    padded: Vec<u8>,
}

impl RenderData {
    pub fn new(config: &RenderConfig) -> Self {
        let frames = config.frames_in_flight;
        let constants_stride = align_up(std::mem::size_of::<Constants>(), config.constants_alignment);
        Self {
            positions: FrameRing::new(config.position_capacity, frames),
            colors: FrameRing::new(config.color_capacity, frames),
            uvs: FrameRing::new(config.uv_capacity, frames),
            transforms: TransformStacks::new(),
            constants: FrameRing::new(config.constants_capacity * constants_stride, frames),
            constants_stride,
            padded: vec![0; constants_stride],
        }
    }

    /// Records one constants entry and returns its index within the frame.
    pub fn push_constants(&mut self, constants: &Constants) -> u32 {
        let bytes = bytemuck::bytes_of(constants);
        self.padded[..bytes.len()].copy_from_slice(bytes);
        let first = self.constants.push(&self.padded);
        (first / self.constants_stride) as u32
    }

    /// Snapshot of the current transform tops as a constants entry.
    pub fn push_current_constants(&mut self) -> u32 {
        let c = Constants::new(self.transforms.projection_top(), self.transforms.world_top());
        self.push_constants(&c)
    }

    #[inline]
    pub fn constants_stride(&self) -> usize {
        self.constants_stride
    }

    #[inline]
    pub fn constants_count(&self) -> usize {
        self.constants.count() / self.constants_stride
    }

    /// Padded constants bytes written this frame.
    #[inline]
    pub fn constants_bytes(&self) -> &[u8] {
        self.constants.frame_slice()
    }

    #[inline]
    pub fn constants_ring(&self) -> &FrameRing<u8> {
        &self.constants
    }

    pub fn constants_at(&self, index: u32) -> Option<Constants> {
        let start = index as usize * self.constants_stride;
        let end = start + std::mem::size_of::<Constants>();
        self.constants_bytes()
            .get(start..end)
            .map(bytemuck::pod_read_unaligned)
    }

    /// Moves every ring to its next slot and drops this frame's transforms.
    pub fn advance_frame(&mut self) {
        self.positions.advance_frame();
        self.colors.advance_frame();
        self.uvs.advance_frame();
        self.constants.advance_frame();
        self.transforms.clear();
    }
}

#[inline]
fn align_up(size: usize, alignment: usize) -> usize {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Converts a packed `0xAARRGGBB` value to straight-alpha RGBA floats.
#[inline]
pub fn argb_to_rgba(argb: i32) -> VertexColor {
    let [a, r, g, b] = (argb as u32).to_be_bytes();
    [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ]
}
