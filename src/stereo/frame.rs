use lib_hmd::{
    EYE_COUNT, Eye, FovPort, HmdError, HmdSession, LayerEyeFovDepth, Posef, SessionStatus,
};
use tracing::{debug, info, warn};

use crate::{
    camera::Camera,
    renderer::{DrawList, plan_instanced, plan_sequential},
    scene::Scene,
    stereo::{ProjectionLayout, StereoImage, StereoSwapChains, compose_stereo_views},
};

/// Runs a planned frame on the GPU.
pub trait FrameExecutor {
    /// Draws `list` into the swap chain images named by `image`.
    fn execute(&mut self, list: &DrawList, image: StereoImage);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoLayout {
    /// One pass per eye.
    Sequential,
    /// One pass, two instances per draw.
    Instanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Submitted,
    /// The app is not visible on the headset; nothing was drawn.
    Skipped,
    /// The runtime asked the app to quit.
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Hmd(#[from] HmdError),
    #[error("the headset display was lost")]
    DisplayLost,
}

/// A headset session with the swap chains its frames are rendered into.
#[derive(Debug)]
pub struct StereoRig {
    // Released before the session that created them.
    swap_chains: StereoSwapChains,
    session: Box<dyn HmdSession>,
    layout: StereoLayout,
    fov: [FovPort; EYE_COUNT],
    hmd_to_eye: [Posef; EYE_COUNT],
    frame_index: u64,
    last_image: Option<StereoImage>,
}

impl StereoRig {
    pub fn new(
        mut session: Box<dyn HmdSession>,
        layout: StereoLayout,
        pixels_per_display_pixel: f32,
    ) -> Result<Self, FrameError> {
        let desc = session.description();
        info!(
            product = %desc.product_name,
            width = desc.resolution.w,
            height = desc.resolution.h,
            refresh_rate = desc.display_refresh_rate,
            ?layout,
            "headset session started"
        );

        let fov = desc.default_eye_fov;
        let hmd_to_eye = Eye::BOTH
            .map(|eye| session.eye_render_desc(eye, fov[eye.index()]).hmd_to_eye_pose);
        let eye_sizes = Eye::BOTH.map(|eye| {
            session.fov_texture_size(eye, fov[eye.index()], pixels_per_display_pixel)
        });

        let swap_chains = StereoSwapChains::new(session.as_mut(), eye_sizes)?;

        Ok(Self {
            swap_chains,
            session,
            layout,
            fov,
            hmd_to_eye,
            frame_index: 0,
            last_image: None,
        })
    }

    /// Renders and submits one frame.
    ///
    /// Queries that fail before rendering leave the GPU untouched; any error
    /// is fatal for the session.
    pub fn render_frame(
        &mut self,
        camera: &Camera,
        scene: &Scene,
        executor: &mut impl FrameExecutor,
    ) -> Result<FrameOutcome, FrameError> {
        let status = self.session.session_status()?;

        if let Some(outcome) = self.handle_status(status)? {
            return Ok(outcome);
        }

        let poses = self.session.eye_poses(self.frame_index, &self.hmd_to_eye)?;

        let projection_layout = match self.layout {
            StereoLayout::Sequential => ProjectionLayout::Full,
            StereoLayout::Instanced => ProjectionLayout::SideBySide,
        };
        let views = compose_stereo_views(
            self.session.as_ref(),
            camera,
            &self.fov,
            &poses,
            projection_layout,
        );

        let list = match self.layout {
            StereoLayout::Sequential => {
                plan_sequential(scene, &views, self.swap_chains.viewports())
            }
            StereoLayout::Instanced => plan_instanced(
                scene,
                &views,
                self.swap_chains.target_size(),
                self.swap_chains.split_x(),
            ),
        };

        let image = self.swap_chains.image();
        executor.execute(&list, image);
        self.swap_chains.commit()?;

        let layer = LayerEyeFovDepth {
            color_textures: [self.swap_chains.color_id(); EYE_COUNT],
            depth_textures: [self.swap_chains.depth_id(); EYE_COUNT],
            viewports: self.swap_chains.viewports(),
            fov: self.fov,
            render_poses: poses.poses,
            sensor_sample_time: poses.sensor_sample_time,
            projection_desc: views.timewarp,
        };

        self.session.submit_frame(self.frame_index, &layer)?;

        debug!(
            frame_index = self.frame_index,
            draws = list.draw_count(),
            "stereo frame submitted"
        );

        self.last_image = Some(image);
        self.frame_index += 1;

        Ok(FrameOutcome::Submitted)
    }

    pub fn recenter(&mut self) {
        self.session.recenter_tracking_origin();
    }

    pub fn swap_chains(&self) -> &StereoSwapChains {
        &self.swap_chains
    }

    /// The images of the last submitted frame.
    pub fn last_image(&self) -> Option<StereoImage> {
        self.last_image
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn layout(&self) -> StereoLayout {
        self.layout
    }

    fn handle_status(&mut self, status: SessionStatus) -> Result<Option<FrameOutcome>, FrameError> {
        if status.display_lost {
            return Err(FrameError::DisplayLost);
        }

        if status.should_quit {
            info!("headset runtime requested quit");
            return Ok(Some(FrameOutcome::Quit));
        }

        if status.should_recenter {
            info!("headset runtime requested recenter");
            self.session.recenter_tracking_origin();
        }

        if !status.is_visible {
            debug!(frame_index = self.frame_index, "not visible on the headset, skipping frame");
            return Ok(Some(FrameOutcome::Skipped));
        }

        if !status.hmd_present {
            warn!("headset reports no display attached");
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_hmd::{
        SimulatedHmd, SimulatedHmdConfig,
        simulated::{FailurePlan, SimulatedHmdHandle},
    };

    #[derive(Debug, Default)]
    struct RecordingExecutor {
        frames: Vec<(DrawList, StereoImage)>,
    }

    impl FrameExecutor for RecordingExecutor {
        fn execute(&mut self, list: &DrawList, image: StereoImage) {
            self.frames.push((list.clone(), image));
        }
    }

    fn rig(layout: StereoLayout, failures: FailurePlan) -> (StereoRig, SimulatedHmdHandle) {
        let hmd = SimulatedHmd::new(SimulatedHmdConfig {
            head_motion: false,
            failures,
            ..Default::default()
        });
        let handle = hmd.handle();

        (StereoRig::new(Box::new(hmd), layout, 0.25).unwrap(), handle)
    }

    fn render(rig: &mut StereoRig, executor: &mut RecordingExecutor) -> Result<FrameOutcome, FrameError> {
        rig.render_frame(&Camera::default(), &Scene::grid(), executor)
    }

    #[test]
    fn submits_one_layer_per_frame() {
        let (mut rig, handle) = rig(StereoLayout::Sequential, FailurePlan::default());
        let mut executor = RecordingExecutor::default();

        for _ in 0..3 {
            assert_eq!(render(&mut rig, &mut executor).unwrap(), FrameOutcome::Submitted);
        }

        assert_eq!(handle.submitted_frames(), 3);
        assert_eq!(executor.frames.len(), 3);
        assert_eq!(rig.frame_index(), 3);

        let layer = handle.last_layer().unwrap();
        assert_eq!(layer.color_textures, [rig.swap_chains().color_id(); EYE_COUNT]);
        assert_eq!(layer.viewports, rig.swap_chains().viewports());
        assert_eq!(layer.projection_desc.projection32, -1.0);
    }

    #[test]
    fn failed_pose_query_issues_no_draw_and_no_submit() {
        let (mut rig, handle) = rig(
            StereoLayout::Sequential,
            FailurePlan {
                eye_poses_at_frame: Some(1),
                ..Default::default()
            },
        );
        let mut executor = RecordingExecutor::default();

        render(&mut rig, &mut executor).unwrap();
        let result = render(&mut rig, &mut executor);

        assert!(matches!(
            result,
            Err(FrameError::Hmd(HmdError::EyePoses { frame_index: 1, .. }))
        ));
        assert_eq!(executor.frames.len(), 1);
        assert_eq!(handle.submitted_frames(), 1);
    }

    #[test]
    fn failed_status_query_issues_no_draw_and_no_submit() {
        let (mut rig, handle) = rig(
            StereoLayout::Instanced,
            FailurePlan {
                session_status_at_call: Some(0),
                ..Default::default()
            },
        );
        let mut executor = RecordingExecutor::default();

        assert!(matches!(
            render(&mut rig, &mut executor),
            Err(FrameError::Hmd(HmdError::SessionStatus { .. }))
        ));
        assert!(executor.frames.is_empty());
        assert_eq!(handle.submitted_frames(), 0);
    }

    #[test]
    fn swap_chains_are_released_when_a_failed_rig_is_dropped() {
        let (mut rig, handle) = rig(
            StereoLayout::Sequential,
            FailurePlan {
                submit_at_frame: Some(0),
                ..Default::default()
            },
        );
        let mut executor = RecordingExecutor::default();

        assert!(render(&mut rig, &mut executor).is_err());
        assert_eq!(handle.live_swap_chains(), 2);

        drop(rig);
        assert_eq!(handle.live_swap_chains(), 0);
    }

    #[test]
    fn failed_commit_is_fatal_and_submits_nothing() {
        let (mut rig, handle) = rig(
            StereoLayout::Sequential,
            FailurePlan {
                commit_at_call: Some(0),
                ..Default::default()
            },
        );
        let color = rig.swap_chains().color_id();
        let mut executor = RecordingExecutor::default();

        let result = render(&mut rig, &mut executor);

        assert!(matches!(
            result,
            Err(FrameError::Hmd(HmdError::Commit { id, .. })) if id == color
        ));
        assert_eq!(handle.submitted_frames(), 0);
        assert_eq!(rig.frame_index(), 0);
        assert_eq!(rig.last_image(), None);
        assert_eq!(handle.live_swap_chains(), 2);

        drop(rig);
        assert_eq!(handle.live_swap_chains(), 0);
    }

    #[test]
    fn invisible_frames_are_skipped() {
        let (mut rig, handle) = rig(StereoLayout::Sequential, FailurePlan::default());
        let mut executor = RecordingExecutor::default();

        handle.set_visible(false);
        assert_eq!(render(&mut rig, &mut executor).unwrap(), FrameOutcome::Skipped);
        assert!(executor.frames.is_empty());
        assert_eq!(handle.submitted_frames(), 0);

        handle.set_visible(true);
        assert_eq!(render(&mut rig, &mut executor).unwrap(), FrameOutcome::Submitted);
    }

    #[test]
    fn runtime_requests_are_honored() {
        let (mut rig, handle) = rig(StereoLayout::Sequential, FailurePlan::default());
        let mut executor = RecordingExecutor::default();

        handle.request_recenter();
        assert_eq!(render(&mut rig, &mut executor).unwrap(), FrameOutcome::Submitted);
        assert_eq!(handle.recenter_count(), 1);

        handle.request_quit();
        assert_eq!(render(&mut rig, &mut executor).unwrap(), FrameOutcome::Quit);

        handle.lose_display();
        assert!(matches!(
            render(&mut rig, &mut executor),
            Err(FrameError::DisplayLost)
        ));
        assert_eq!(handle.submitted_frames(), 1);
    }

    #[test]
    fn sequential_viewports_tile_the_target_with_identity_poses() {
        let (mut rig, _handle) = rig(StereoLayout::Sequential, FailurePlan::default());
        let mut executor = RecordingExecutor::default();

        render(&mut rig, &mut executor).unwrap();

        let (list, image) = &executor.frames[0];
        let [left, right] = [list.passes[0].viewport, list.passes[1].viewport];

        assert_eq!(list.passes.len(), 2);
        assert_eq!(left.x, 0);
        assert_eq!(left.right(), right.x);
        assert_eq!(right.right(), image.size.w as i32);
        assert_eq!((left.h, right.h), (image.size.h, image.size.h));
        assert!(!left.intersects(&right));
        assert_eq!(left.area() + right.area(), image.size.w as u64 * image.size.h as u64);
    }

    #[test]
    fn instanced_frames_use_one_pass_with_two_instances() {
        let (mut rig, _handle) = rig(StereoLayout::Instanced, FailurePlan::default());
        let mut executor = RecordingExecutor::default();

        render(&mut rig, &mut executor).unwrap();

        let (list, image) = &executor.frames[0];
        assert_eq!(list.passes.len(), 1);
        assert_eq!(list.passes[0].instance_count, 2);
        assert_eq!(list.passes[0].viewport.w, image.size.w);
        assert_eq!(
            list.passes[0].per_frame.stereo_split_x,
            rig.swap_chains().split_x() as f32
        );
    }

    #[test]
    fn renders_into_the_current_image_and_then_advances() {
        let (mut rig, _handle) = rig(StereoLayout::Sequential, FailurePlan::default());
        let mut executor = RecordingExecutor::default();

        render(&mut rig, &mut executor).unwrap();
        render(&mut rig, &mut executor).unwrap();

        assert_eq!(executor.frames[0].1.color_index, 0);
        assert_eq!(executor.frames[1].1.color_index, 1);
        assert_eq!(rig.last_image().map(|image| image.color_index), Some(1));
    }
}
