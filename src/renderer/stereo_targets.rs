use lib_gpu::{
    DepthTarget, Device, Extent3d, TextureDescriptor, TextureDimension, TextureUsages, TextureView,
    TextureViewDescriptor,
};
use lib_hmd::Sizei;

use crate::{
    renderer::{DrawList, RenderContext, Renderer, STEREO_COLOR_FORMAT},
    stereo::{FrameExecutor, StereoImage, StereoSwapChains},
};

/// GPU textures backing every buffer of the stereo swap chains.
///
/// Color images can be sampled, so the last submitted frame can be mirrored
/// to the window.
#[derive(Debug)]
pub struct StereoTargets {
    color: Vec<TextureView>,
    depth: Vec<DepthTarget>,
    size: Sizei,
}

/// Executes planned frames with a [`Renderer`] into [`StereoTargets`].
#[derive(Debug)]
pub struct StereoExecutor<'a> {
    pub renderer: &'a mut Renderer,
    pub targets: &'a StereoTargets,
    pub ctx: RenderContext<'a>,
}

impl StereoTargets {
    pub fn new(swap_chains: &StereoSwapChains, device: &Device) -> Self {
        let color_desc = swap_chains.color_desc();
        let depth_desc = swap_chains.depth_desc();
        let size = Sizei {
            w: color_desc.width,
            h: color_desc.height,
        };

        let color = (0..swap_chains.color_len())
            .map(|index| {
                device
                    .create_texture(&TextureDescriptor {
                        label: Some(&format!("stereo color texture {index}")),
                        size: Extent3d {
                            width: size.w,
                            height: size.h,
                            depth_or_array_layers: 1,
                        },
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: TextureDimension::D2,
                        format: STEREO_COLOR_FORMAT,
                        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
                        view_formats: &[],
                    })
                    .create_view(&TextureViewDescriptor::default())
            })
            .collect();

        let depth = (0..swap_chains.depth_len())
            .map(|index| {
                DepthTarget::new(
                    &format!("stereo depth texture {index}"),
                    depth_desc.width,
                    depth_desc.height,
                    device,
                )
            })
            .collect();

        Self { color, depth, size }
    }

    pub fn color(&self, index: usize) -> &TextureView {
        &self.color[index]
    }

    pub fn depth(&self, index: usize) -> &TextureView {
        self.depth[index].view()
    }

    pub fn color_views(&self) -> &[TextureView] {
        &self.color
    }

    pub fn size(&self) -> Sizei {
        self.size
    }
}

impl FrameExecutor for StereoExecutor<'_> {
    fn execute(&mut self, list: &DrawList, image: StereoImage) {
        self.renderer.execute(
            list,
            self.targets.color(image.color_index),
            STEREO_COLOR_FORMAT,
            self.targets.depth(image.depth_index),
            self.ctx,
        );
    }
}
