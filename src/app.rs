use std::time::Duration;

use lib_app::{AppContext, AppEvent, AppFlow, AppHandler};
use lib_gpu::TextureView;
use lib_hmd::SimulatedHmd;
use lib_window::{WindowAttributes, dpi::PhysicalSize};
use tracing::{error, info};

use crate::{
    asset::{DIFFUSE_TEXTURE, NORMAL_TEXTURE, load_texture_or},
    camera::Camera,
    config::{DemoConfig, StereoMode},
    controls::Controls,
    renderer::{
        MaterialImages, Mirror, PROCEDURAL_TEXTURE_SIZE, RenderContext, Renderer, StereoExecutor,
        StereoTargets, procedural_diffuse, procedural_normal,
    },
    scene::Scene,
    stereo::{FrameError, FrameOutcome, StereoLayout, StereoRig},
};

#[derive(Debug)]
pub struct NormalMappingApp {
    config: DemoConfig,
    camera: Camera,
    scene: Scene,
    controls: Controls,
    frames_rendered: u64,
    gpu: Option<GpuState>,
}

#[derive(Debug)]
struct GpuState {
    // Dropped first: the headset session goes away before the GPU resources.
    stereo: Option<StereoOutput>,
    renderer: Renderer,
}

#[derive(Debug)]
struct StereoOutput {
    rig: StereoRig,
    targets: StereoTargets,
    mirror: Mirror,
}

impl NormalMappingApp {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            camera: Camera::default(),
            scene: Scene::grid(),
            controls: Controls::new(),
            frames_rendered: 0,
            gpu: None,
        }
    }

    fn material(&self) -> MaterialImages {
        let dir = self.config.texture_dir.as_deref();

        MaterialImages {
            diffuse: load_texture_or(dir, DIFFUSE_TEXTURE, || {
                procedural_diffuse(PROCEDURAL_TEXTURE_SIZE)
            }),
            normal: load_texture_or(dir, NORMAL_TEXTURE, || {
                procedural_normal(PROCEDURAL_TEXTURE_SIZE)
            }),
        }
    }

    fn start_stereo(&self, ctx: RenderContext) -> Result<Option<StereoOutput>, FrameError> {
        let layout = match self.config.stereo {
            StereoMode::Mono => return Ok(None),
            StereoMode::Sequential => StereoLayout::Sequential,
            StereoMode::Instanced => StereoLayout::Instanced,
        };

        let hmd = SimulatedHmd::new(self.config.hmd.clone());
        let rig = StereoRig::new(Box::new(hmd), layout, self.config.pixel_density)?;
        let targets = StereoTargets::new(rig.swap_chains(), ctx.device);
        let mirror = Mirror::new(&targets, ctx);

        let eye_size = rig.swap_chains().eye_size();
        info!(
            layout = ?rig.layout(),
            eye_width = eye_size.w,
            eye_height = eye_size.h,
            buffers = rig.swap_chains().color_len(),
            "stereo output ready"
        );

        Ok(Some(StereoOutput {
            rig,
            targets,
            mirror,
        }))
    }

    fn abort(&mut self, err: FrameError) -> AppFlow {
        let frame_index = self
            .gpu
            .as_ref()
            .and_then(|gpu| gpu.stereo.as_ref())
            .map(|stereo| stereo.rig.frame_index());
        error!(error = %err, ?frame_index, "stereo rendering failed");

        if let Some(gpu) = &mut self.gpu
            && gpu.stereo.take().is_some()
        {
            info!("headset session closed");
        }

        AppFlow::abort(err)
    }
}

impl AppHandler for NormalMappingApp {
    fn window_attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title("Normal Mapping")
            .with_inner_size(PhysicalSize::new(1280, 720))
    }

    fn on_init(&mut self, ctx: AppContext<'_>) -> AppFlow {
        let (width, height) = ctx.surface_size;
        self.camera.resize_viewport(width, height);
        self.camera.update_matrices();

        let renderer = Renderer::new(&self.material(), ctx.into());

        let stereo = match self.start_stereo(ctx.into()) {
            Ok(stereo) => stereo,
            Err(err) => return self.abort(err),
        };

        info!(mode = ?self.config.stereo, objects = self.scene.objects.len(), "scene ready");

        self.gpu = Some(GpuState { stereo, renderer });

        AppFlow::Continue
    }

    fn on_update(&mut self, delta_time: Duration, _ctx: AppContext<'_>) -> AppFlow {
        if self
            .config
            .max_frames
            .is_some_and(|max| self.frames_rendered >= max)
        {
            info!(frames = self.frames_rendered, "frame limit reached");
            return AppFlow::Exit;
        }

        let delta_seconds = delta_time.as_secs_f32();
        let input = self.controls.next_frame();

        if input.exit {
            return AppFlow::Exit;
        }

        if input.recenter
            && let Some(stereo) = self.gpu.as_mut().and_then(|gpu| gpu.stereo.as_mut())
        {
            stereo.rig.recenter();
        }

        input.apply(&mut self.camera, delta_seconds);
        self.scene.advance(delta_seconds);

        AppFlow::Continue
    }

    fn on_render(&mut self, output: &TextureView, ctx: AppContext<'_>) -> AppFlow {
        let Some(gpu) = &mut self.gpu else {
            return AppFlow::Continue;
        };

        let Some(stereo) = &mut gpu.stereo else {
            gpu.renderer
                .render_mono(&self.scene, &self.camera, output, ctx.surface_size, ctx.into());
            self.frames_rendered += 1;

            return AppFlow::Continue;
        };

        let mut executor = StereoExecutor {
            renderer: &mut gpu.renderer,
            targets: &stereo.targets,
            ctx: ctx.into(),
        };

        match stereo
            .rig
            .render_frame(&self.camera, &self.scene, &mut executor)
        {
            Ok(FrameOutcome::Submitted) => self.frames_rendered += 1,
            Ok(FrameOutcome::Skipped) => {}
            Ok(FrameOutcome::Quit) => return AppFlow::Exit,
            Err(err) => return self.abort(err),
        }

        if let Some(image) = stereo.rig.last_image() {
            stereo
                .mirror
                .draw(image.color_index, output, ctx.surface_size, ctx.into());
        }

        AppFlow::Continue
    }

    fn on_resize(&mut self, width: u32, height: u32, _ctx: AppContext<'_>) {
        self.camera.resize_viewport(width, height);
        self.camera.update_matrices();
    }

    fn on_event(&mut self, event: AppEvent<'_>, _ctx: AppContext<'_>) -> AppFlow {
        match event {
            AppEvent::CloseRequested => return AppFlow::Exit,
            AppEvent::Device { device: _, event } => self.controls.event(event),
            _ => {}
        }

        AppFlow::Continue
    }
}
