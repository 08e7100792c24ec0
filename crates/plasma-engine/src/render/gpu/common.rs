//! GPU-side mapping of render modes: programs, blend, topology, vertex layouts.

use crate::render::data::{Constants, Position, Uv, VertexColor};
use crate::render::error::BackendError;
use crate::render::mode::{BlendFactor, ModeDef, Shape};

// ── programs ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(super) enum Stage {
    Color,
    Texture,
}

/// The entry-point pair a render mode resolved to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(super) struct Programs {
    pub vertex: Stage,
    pub fragment: Stage,
}

impl Programs {
    pub fn resolve(def: &ModeDef) -> Result<Self, BackendError> {
        let vertex = match def.vertex_program.as_str() {
            "vs_color" => Stage::Color,
            "vs_texture" => Stage::Texture,
            other => return Err(BackendError::UnknownProgram(other.to_owned())),
        };
        let fragment = match def.fragment_program.as_str() {
            "fs_color" => Stage::Color,
            "fs_texture" => Stage::Texture,
            other => return Err(BackendError::UnknownProgram(other.to_owned())),
        };

        // fs_texture consumes an interpolated uv only vs_texture produces.
        if vertex == Stage::Color && fragment == Stage::Texture {
            return Err(BackendError::Pipeline(format!(
                "`{}` does not provide the inputs `{}` reads",
                def.vertex_program, def.fragment_program
            )));
        }
        Ok(Self { vertex, fragment })
    }

    pub fn vertex_entry(self) -> &'static str {
        match self.vertex {
            Stage::Color => "vs_color",
            Stage::Texture => "vs_texture",
        }
    }

    pub fn fragment_entry(self) -> &'static str {
        match self.fragment {
            Stage::Color => "fs_color",
            Stage::Texture => "fs_texture",
        }
    }

    #[inline]
    pub fn needs_uvs(self) -> bool {
        self.vertex == Stage::Texture
    }

    #[inline]
    pub fn needs_texture(self) -> bool {
        self.fragment == Stage::Texture
    }
}

// ── blend ─────────────────────────────────────────────────────────────────

fn blend_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::None | BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
    }
}

/// `None` (replace) unless both factors are set.
pub(super) fn blend_state(def: &ModeDef) -> Option<wgpu::BlendState> {
    if !def.blending_enabled() {
        return None;
    }
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(def.src_blend),
        dst_factor: blend_factor(def.dst_blend),
        operation: wgpu::BlendOperation::Add,
    };
    Some(wgpu::BlendState {
        color: component,
        alpha: component,
    })
}

pub(super) fn topology(shape: Shape) -> wgpu::PrimitiveTopology {
    match shape {
        Shape::Points => wgpu::PrimitiveTopology::PointList,
        Shape::Lines => wgpu::PrimitiveTopology::LineList,
        Shape::Triangles => wgpu::PrimitiveTopology::TriangleList,
    }
}

// ── vertex layouts ────────────────────────────────────────────────────────

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x4];
const UV_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

fn layout<T>(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<T>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// One buffer per attribute: slot 0 positions, 1 colors, 2 uvs.
pub(super) fn vertex_layouts(programs: Programs) -> Vec<wgpu::VertexBufferLayout<'static>> {
    let mut layouts = vec![
        layout::<Position>(&POSITION_ATTRS),
        layout::<VertexColor>(&COLOR_ATTRS),
    ];
    if programs.needs_uvs() {
        layouts.push(layout::<Uv>(&UV_ATTRS));
    }
    layouts
}

// ── constants binding ─────────────────────────────────────────────────────

pub(super) const CONSTANTS_SIZE: u64 = std::mem::size_of::<Constants>() as u64;
