use bytemuck::{Pod, Zeroable, bytes_of};
use lib_gpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, Buffer,
    BufferInitDescriptor, BufferUsages, Color, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, ConstantBuffer, DeviceExt, FilterMode, FragmentState, FrontFace,
    IndexFormat, LoadOp, MultisampleState, Operations, PipelineCompilationOptions,
    PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    Sampler, SamplerBindingType, SamplerDescriptor, ShaderStages, StoreOp, TextureSampleType,
    TextureView, TextureViewDimension, VertexAttribute, VertexBufferLayout, VertexFormat,
    VertexState, VertexStepMode, include_wgsl,
};
use lib_math::{Vec2, vec2};

use crate::renderer::{RenderContext, StereoTargets};

/// Copies the stereo image to the window so the desktop shows what the
/// headset shows, letterboxed to keep its aspect ratio.
#[derive(Debug)]
pub struct Mirror {
    vertex_buf: Buffer,
    index_buf: Buffer,
    uniform_buf: ConstantBuffer<MirrorUniform>,
    sampler: Sampler,
    bind_group_layout: BindGroupLayout,
    bind_groups: Vec<BindGroup>,
    source_aspect: f32,
    pipeline: RenderPipeline,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct MirrorUniform {
    dst_extents: Vec2,
}

impl Mirror {
    pub fn new(targets: &StereoTargets, ctx: RenderContext) -> Self {
        let vertex_buf = ctx.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mirror vertex buffer"),
            contents: bytes_of(&[
                vec2(-1.0, -1.0),
                vec2(1.0, -1.0),
                vec2(1.0, 1.0),
                vec2(-1.0, 1.0),
            ]),
            usage: BufferUsages::VERTEX,
        });

        let index_buf = ctx.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mirror index buffer"),
            contents: bytes_of::<[u16; _]>(&[0, 1, 2, 2, 3, 0]),
            usage: BufferUsages::INDEX,
        });

        let uniform_buf = ConstantBuffer::new("mirror uniform buffer", ctx.device);

        let sampler = ctx.device.create_sampler(&SamplerDescriptor {
            label: Some("mirror sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("mirror bind group layout"),
                entries: &[
                    ConstantBuffer::<MirrorUniform>::layout_entry(0, ShaderStages::VERTEX),
                    BindGroupLayoutEntry {
                        binding: 1,
                        ty: BindingType::Texture {
                            sample_type: TextureSampleType::Float { filterable: true },
                            view_dimension: TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                        visibility: ShaderStages::FRAGMENT,
                    },
                    BindGroupLayoutEntry {
                        binding: 2,
                        ty: BindingType::Sampler(SamplerBindingType::Filtering),
                        count: None,
                        visibility: ShaderStages::FRAGMENT,
                    },
                ],
            });

        let shader = ctx
            .device
            .create_shader_module(include_wgsl!("mirror.wgsl"));

        let pipeline = ctx
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("mirror pipeline"),
                cache: None,
                depth_stencil: None,
                layout: Some(
                    &ctx.device
                        .create_pipeline_layout(&PipelineLayoutDescriptor {
                            label: Some("mirror pipeline layout"),
                            bind_group_layouts: &[&bind_group_layout],
                            push_constant_ranges: &[],
                        }),
                ),
                multiview: None,
                primitive: PrimitiveState {
                    front_face: FrontFace::Ccw,
                    conservative: false,
                    cull_mode: None,
                    polygon_mode: PolygonMode::Fill,
                    strip_index_format: None,
                    topology: PrimitiveTopology::TriangleList,
                    unclipped_depth: false,
                },
                vertex: VertexState {
                    module: &shader,
                    entry_point: None,
                    compilation_options: PipelineCompilationOptions::default(),
                    buffers: &[VERTEX_BUFFER_LAYOUT],
                },
                fragment: Some(FragmentState {
                    module: &shader,
                    targets: &[Some(ColorTargetState {
                        blend: None,
                        format: ctx.surface_format,
                        write_mask: ColorWrites::all(),
                    })],
                    entry_point: None,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                multisample: MultisampleState::default(),
            });

        let size = targets.size();
        let mut mirror = Self {
            vertex_buf,
            index_buf,
            uniform_buf,
            sampler,
            bind_group_layout,
            bind_groups: Vec::new(),
            source_aspect: size.w as f32 / size.h.max(1) as f32,
            pipeline,
        };

        mirror.bind_groups = targets
            .color_views()
            .iter()
            .map(|view| mirror.bind_group(view, ctx))
            .collect();

        mirror
    }

    /// Draws color image `index` of the stereo targets over the whole
    /// window, with black bars where the aspect ratios differ.
    pub fn draw(&self, index: usize, output: &TextureView, output_size: (u32, u32), ctx: RenderContext) {
        let (width, height) = output_size;
        let output_aspect = width as f32 / height.max(1) as f32;

        self.uniform_buf.push(
            &MirrorUniform {
                dst_extents: letterbox_extents(self.source_aspect, output_aspect),
            },
            ctx.queue,
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("mirror command encoder"),
            });

        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("mirror pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: output,
                ops: Operations {
                    load: LoadOp::Clear(Color::BLACK),
                    store: StoreOp::Store,
                },
                depth_slice: None,
                resolve_target: None,
            })],
            timestamp_writes: None,
            occlusion_query_set: None,
            depth_stencil_attachment: None,
        });

        pass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        pass.set_index_buffer(self.index_buf.slice(..), IndexFormat::Uint16);
        pass.set_bind_group(0, &self.bind_groups[index], &[]);
        pass.set_pipeline(&self.pipeline);

        pass.draw_indexed(0..6, 0, 0..1);

        drop(pass);

        ctx.queue.submit([encoder.finish()]);
    }

    fn bind_group(&self, source: &TextureView, ctx: RenderContext) -> BindGroup {
        ctx.device.create_bind_group(&BindGroupDescriptor {
            label: Some("mirror bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buf.binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(source),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

/// Half extents in normalized device coordinates of the largest rectangle
/// with `source_aspect` that fits a target with `target_aspect`.
pub fn letterbox_extents(source_aspect: f32, target_aspect: f32) -> Vec2 {
    if target_aspect > source_aspect {
        vec2(source_aspect / target_aspect, 1.0)
    } else {
        vec2(1.0, target_aspect / source_aspect)
    }
}

const VERTEX_BUFFER_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: size_of::<Vec2>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &[VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 0,
        shader_location: 0,
    }],
};
