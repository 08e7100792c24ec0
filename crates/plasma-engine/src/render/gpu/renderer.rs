use std::collections::HashMap;

use bytemuck::Pod;

use crate::render::backend::PipelineId;
use crate::render::data::RenderData;
use crate::render::error::BackendError;
use crate::render::mode::ModeDef;
use crate::render::ring::FrameRing;
use crate::render::RenderCtx;
use crate::texture::{DecodedImage, TextureTable};

use super::common::{blend_state, topology, vertex_layouts, Programs, CONSTANTS_SIZE};

pub(super) struct GpuPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub programs: Programs,
}

pub struct GpuTexture {
    _texture: wgpu::Texture,
    pub(super) bind_group: wgpu::BindGroup,
}

/// GPU mirror of one [`FrameRing`]. Reallocated whenever the ring grows.
pub(super) struct GpuRing {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    generation: Option<u64>,
}

impl GpuRing {
    fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            buffer: None,
            generation: None,
        }
    }

    /// Uploads the current slot. Returns `true` if the buffer was recreated.
    fn sync<T: Pod>(&mut self, ctx: &RenderCtx<'_>, ring: &FrameRing<T>) -> bool {
        let elem = std::mem::size_of::<T>();
        let recreated = self.generation != Some(ring.generation()) || self.buffer.is_none();

        if recreated {
            let size = (ring.as_slice().len() * elem) as u64;
            let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size,
                usage: self.usage,
                mapped_at_creation: false,
            });
            // Seed every slot so frames still in flight keep their data.
            ctx.queue.write_buffer(&buffer, 0, bytemuck::cast_slice(ring.as_slice()));
            self.buffer = Some(buffer);
            self.generation = Some(ring.generation());
            return true;
        }

        let slice = ring.frame_slice();
        if let (Some(buffer), false) = (self.buffer.as_ref(), slice.is_empty()) {
            let offset = (ring.slot_base() * elem) as u64;
            ctx.queue.write_buffer(buffer, offset, bytemuck::cast_slice(slice));
        }
        false
    }

    #[inline]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// Long-lived GPU state behind the batch renderer: shader module, layouts,
/// compiled pipelines, ring buffers and uploaded textures.
pub struct BatchRenderer {
    format: wgpu::TextureFormat,
    shader: wgpu::ShaderModule,
    constants_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    color_pipeline_layout: wgpu::PipelineLayout,
    texture_pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    pub(super) pipelines: Vec<GpuPipeline>,
    pipeline_cache: HashMap<ModeDef, PipelineId>,

    pub(super) positions: GpuRing,
    pub(super) colors: GpuRing,
    pub(super) uvs: GpuRing,
    pub(super) constants: GpuRing,
    pub(super) constants_bind_group: Option<wgpu::BindGroup>,

    pub(super) textures: TextureTable<GpuTexture>,
}

impl BatchRenderer {
    pub fn new(ctx: &RenderCtx<'_>) -> Self {
        let device = ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("plasma batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batch.wgsl").into()),
        });

        let constants_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("plasma constants bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(CONSTANTS_SIZE),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("plasma texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let color_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("plasma color pipeline layout"),
            bind_group_layouts: &[&constants_layout],
            immediate_size: 0,
        });

        let texture_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("plasma texture pipeline layout"),
            bind_group_layouts: &[&constants_layout, &texture_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("plasma texture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            format: ctx.surface_format,
            shader,
            constants_layout,
            texture_layout,
            color_pipeline_layout,
            texture_pipeline_layout,
            sampler,
            pipelines: Vec::new(),
            pipeline_cache: HashMap::new(),
            positions: GpuRing::new("plasma positions", wgpu::BufferUsages::VERTEX),
            colors: GpuRing::new("plasma colors", wgpu::BufferUsages::VERTEX),
            uvs: GpuRing::new("plasma uvs", wgpu::BufferUsages::VERTEX),
            constants: GpuRing::new("plasma constants", wgpu::BufferUsages::UNIFORM),
            constants_bind_group: None,
            textures: TextureTable::new(),
        }
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    pub fn textures(&self) -> &TextureTable<GpuTexture> {
        &self.textures
    }

    /// Compiles (or reuses) the pipeline for a mode definition.
    pub(super) fn pipeline(
        &mut self,
        ctx: &RenderCtx<'_>,
        def: &ModeDef,
    ) -> Result<PipelineId, BackendError> {
        if let Some(id) = self.pipeline_cache.get(def) {
            return Ok(*id);
        }

        let programs = Programs::resolve(def)?;
        let layout = if programs.needs_texture() {
            &self.texture_pipeline_layout
        } else {
            &self.color_pipeline_layout
        };
        let buffers = vertex_layouts(programs);

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("plasma batch pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some(programs.vertex_entry()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some(programs.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: blend_state(def),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: topology(def.shape),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let id = PipelineId(self.pipelines.len() as u32);
        log::debug!(
            "pipeline {} built ({:?}, {} / {})",
            id.0,
            def.shape,
            def.vertex_program,
            def.fragment_program
        );
        self.pipelines.push(GpuPipeline { pipeline, programs });
        self.pipeline_cache.insert(def.clone(), id);
        Ok(id)
    }

    pub(super) fn pipeline_programs(&self, id: PipelineId) -> Option<Programs> {
        self.pipelines.get(id.0 as usize).map(|p| p.programs)
    }

    /// Mirrors this frame's geometry and constants into GPU buffers.
    pub(super) fn upload(&mut self, ctx: &RenderCtx<'_>, data: &RenderData) {
        self.positions.sync(ctx, &data.positions);
        self.colors.sync(ctx, &data.colors);
        self.uvs.sync(ctx, &data.uvs);
        let recreated = self.constants.sync(ctx, data.constants_ring());

        if recreated || self.constants_bind_group.is_none() {
            self.constants_bind_group = self.constants.buffer().map(|buffer| {
                ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("plasma constants bind group"),
                    layout: &self.constants_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer,
                            offset: 0,
                            size: wgpu::BufferSize::new(CONSTANTS_SIZE),
                        }),
                    }],
                })
            });
        }
    }

    /// Uploads an RGBA8 image and records it under `id`.
    pub fn upload_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        id: i32,
        image: &DecodedImage,
    ) -> Result<(), BackendError> {
        let max = ctx.device.limits().max_texture_dimension_2d;
        if image.width == 0 || image.height == 0 || image.width > max || image.height > max {
            return Err(BackendError::Texture(format!(
                "texture {id}: unsupported size {}x{} (max {max})",
                image.width, image.height
            )));
        }
        let expected = image.width as usize * image.height as usize * 4;
        if image.pixels.len() != expected {
            return Err(BackendError::Texture(format!(
                "texture {id}: {} bytes of pixels, expected {expected}",
                image.pixels.len()
            )));
        }

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("plasma texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("plasma texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.textures.insert(
            id,
            image.width,
            image.height,
            GpuTexture {
                _texture: texture,
                bind_group,
            },
        );
        Ok(())
    }
}
