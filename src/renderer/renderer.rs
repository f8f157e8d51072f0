use image::RgbaImage;
use lib_app::AppContext;
use lib_gpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType,
    ColorTargetState, ColorWrites, CompareFunction, DEPTH_FORMAT, DepthBiasState, DepthStencilState,
    DepthTarget, Device, DynamicConstantBuffer, Face, FilterMode, FragmentState, FrontFace,
    MultisampleState, PipelineCompilationOptions, PipelineLayout, PipelineLayoutDescriptor,
    PolygonMode, PrimitiveState, PrimitiveTopology, Queue, RenderPipeline,
    RenderPipelineDescriptor, SamplerBindingType, SamplerDescriptor, ShaderModule, ShaderStages,
    StencilState, TextureFormat, TextureSampleType, TextureViewDescriptor, TextureViewDimension,
    VertexState, include_wgsl,
};
use lib_hmd::EYE_COUNT;
use tracing::debug;

use crate::{
    renderer::{
        GpuMesh, MeshData, PerDrawData, PerFrameData, VERTEX_BUFFER_LAYOUT, mip_chain,
        upload_mipmapped,
    },
    scene::{MeshKind, NUM_INSTANCES, NUM_MODEL_TYPES},
};

/// Passes a single frame can hold.
pub const MAX_PASSES: usize = EYE_COUNT;
/// Draws a single frame can hold, over all of its passes.
pub const MAX_DRAWS: usize = (NUM_MODEL_TYPES * NUM_INSTANCES + 1) * MAX_PASSES;

/// Draws the scene with normal-mapped lighting into any color target.
#[derive(Debug)]
pub struct Renderer {
    pub(in crate::renderer) meshes: [GpuMesh; MeshKind::ALL.len()],
    pub(in crate::renderer) per_frame_buf: DynamicConstantBuffer<PerFrameData>,
    pub(in crate::renderer) per_draw_buf: DynamicConstantBuffer<PerDrawData>,
    pub(in crate::renderer) constants_bind_group: BindGroup,
    pub(in crate::renderer) material_bind_group: BindGroup,
    pub(in crate::renderer) pipeline_layout: PipelineLayout,
    pub(in crate::renderer) shader: ShaderModule,
    pub(in crate::renderer) pipelines: Vec<(TextureFormat, RenderPipeline)>,
    pub(in crate::renderer) window_depth: Option<DepthTarget>,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub device: &'a Device,
    pub queue: &'a Queue,
    pub surface_format: TextureFormat,
}

/// Base color and tangent-space normals shared by every mesh.
#[derive(Debug, Clone)]
pub struct MaterialImages {
    pub diffuse: RgbaImage,
    pub normal: RgbaImage,
}

impl Renderer {
    pub fn new(material: &MaterialImages, ctx: RenderContext) -> Self {
        let meshes = MeshKind::ALL.map(|kind| {
            GpuMesh::new(
                &format!("renderer {kind:?} mesh"),
                &MeshData::for_kind(kind),
                ctx.device,
            )
        });

        let per_frame_buf =
            DynamicConstantBuffer::new("renderer per frame buffer", MAX_PASSES, ctx.device);
        let per_draw_buf =
            DynamicConstantBuffer::new("renderer per draw buffer", MAX_DRAWS, ctx.device);

        let constants_bind_group_layout =
            ctx.device
                .create_bind_group_layout(&BindGroupLayoutDescriptor {
                    label: Some("renderer constants bind group layout"),
                    entries: &[
                        DynamicConstantBuffer::<PerFrameData>::layout_entry(
                            0,
                            ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                        ),
                        DynamicConstantBuffer::<PerDrawData>::layout_entry(
                            1,
                            ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                        ),
                    ],
                });

        let constants_bind_group = ctx.device.create_bind_group(&BindGroupDescriptor {
            label: Some("renderer constants bind group"),
            layout: &constants_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: per_frame_buf.binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: per_draw_buf.binding(),
                },
            ],
        });

        let (material_bind_group_layout, material_bind_group) = material_bind_group(material, ctx);

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some("renderer pipeline layout"),
                bind_group_layouts: &[&constants_bind_group_layout, &material_bind_group_layout],
                push_constant_ranges: &[],
            });

        let shader = ctx.device.create_shader_module(include_wgsl!("mesh.wgsl"));

        let mut renderer = Self {
            meshes,
            per_frame_buf,
            per_draw_buf,
            constants_bind_group,
            material_bind_group,
            pipeline_layout,
            shader,
            pipelines: Vec::new(),
            window_depth: None,
        };

        renderer.ensure_pipeline(ctx.surface_format, ctx.device);

        renderer
    }

    pub(in crate::renderer) fn mesh(&self, kind: MeshKind) -> &GpuMesh {
        &self.meshes[kind as usize]
    }

    /// Index into `pipelines` of the pipeline writing to `format`, built on
    /// first use.
    pub(in crate::renderer) fn ensure_pipeline(
        &mut self,
        format: TextureFormat,
        device: &Device,
    ) -> usize {
        if let Some(index) = self.pipelines.iter().position(|(f, _)| *f == format) {
            return index;
        }

        debug!(?format, "building mesh pipeline");

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("renderer mesh pipeline"),
            cache: None,
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            layout: Some(&self.pipeline_layout),
            multiview: None,
            primitive: PrimitiveState {
                front_face: FrontFace::Ccw,
                conservative: false,
                cull_mode: Some(Face::Back),
                polygon_mode: PolygonMode::Fill,
                strip_index_format: None,
                topology: PrimitiveTopology::TriangleList,
                unclipped_depth: false,
            },
            vertex: VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[VERTEX_BUFFER_LAYOUT],
            },
            fragment: Some(FragmentState {
                module: &self.shader,
                targets: &[Some(ColorTargetState {
                    blend: None,
                    format,
                    write_mask: ColorWrites::all(),
                })],
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
            }),
            multisample: MultisampleState::default(),
        });

        self.pipelines.push((format, pipeline));
        self.pipelines.len() - 1
    }
}

fn material_bind_group(material: &MaterialImages, ctx: RenderContext) -> (BindGroupLayout, BindGroup) {
    let diffuse = upload_mipmapped(
        "renderer diffuse texture",
        &mip_chain(&material.diffuse),
        TextureFormat::Rgba8UnormSrgb,
        ctx.device,
        ctx.queue,
    );

    // Normals are data, not color: no sRGB decoding.
    let normal = upload_mipmapped(
        "renderer normal texture",
        &mip_chain(&material.normal),
        TextureFormat::Rgba8Unorm,
        ctx.device,
        ctx.queue,
    );

    let sampler = ctx.device.create_sampler(&SamplerDescriptor {
        label: Some("renderer material sampler"),
        address_mode_u: AddressMode::Repeat,
        address_mode_v: AddressMode::Repeat,
        address_mode_w: AddressMode::Repeat,
        anisotropy_clamp: 1,
        border_color: None,
        compare: None,
        lod_min_clamp: 0.0,
        lod_max_clamp: 32.0,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        mipmap_filter: FilterMode::Linear,
    });

    let texture_entry = |binding| BindGroupLayoutEntry {
        binding,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
        visibility: ShaderStages::FRAGMENT,
    };

    let layout = ctx
        .device
        .create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("renderer material bind group layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                BindGroupLayoutEntry {
                    binding: 2,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                    visibility: ShaderStages::FRAGMENT,
                },
            ],
        });

    let bind_group = ctx.device.create_bind_group(&BindGroupDescriptor {
        label: Some("renderer material bind group"),
        layout: &layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(
                    &diffuse.create_view(&TextureViewDescriptor::default()),
                ),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::TextureView(
                    &normal.create_view(&TextureViewDescriptor::default()),
                ),
            },
            BindGroupEntry {
                binding: 2,
                resource: BindingResource::Sampler(&sampler),
            },
        ],
    });

    (layout, bind_group)
}

impl<'a> From<AppContext<'a>> for RenderContext<'a> {
    fn from(value: AppContext<'a>) -> Self {
        Self {
            device: value.device,
            queue: value.queue,
            surface_format: value.surface_format,
        }
    }
}
