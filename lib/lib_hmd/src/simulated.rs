//! An in-process stand-in for a headset runtime.
//!
//! Behaves like a seated headset with a fixed panel and a slow head sway.
//! The runtime-side state is shared with [`SimulatedHmdHandle`] so callers
//! can steer the session (visibility, quit and recenter requests, display
//! loss) and inspect what was submitted.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use glam::{EulerRot, Quat, Vec3};
use tracing::{debug, info, warn};

use crate::{
    EYE_COUNT, Eye, EyePoses, EyeRenderDesc, FovPort, HmdDesc, HmdError, HmdSession,
    LayerEyeFovDepth, Posef, Quatf, SessionStatus, Sizei, SwapChainDesc, SwapChainId,
    TextureSwapChain, Vector3f,
};

const SWAP_CHAIN_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedHmdConfig {
    pub product_name: String,
    /// Panel resolution of a single eye.
    pub eye_resolution: Sizei,
    pub eye_fov: [FovPort; EYE_COUNT],
    /// Inter-pupillary distance in meters.
    pub ipd: f32,
    pub refresh_rate: f32,
    pub head_motion: bool,
    pub failures: FailurePlan,
}

/// Calls that the simulated runtime fails on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FailurePlan {
    /// Zero-based index of the session status query that fails.
    pub session_status_at_call: Option<u64>,
    pub eye_poses_at_frame: Option<u64>,
    /// Zero-based index of the swap chain commit that fails, counted over
    /// every chain of the session.
    pub commit_at_call: Option<u64>,
    pub submit_at_frame: Option<u64>,
}

#[derive(Debug)]
pub struct SimulatedHmd {
    config: SimulatedHmdConfig,
    origin: Quat,
    last_head_orientation: Quat,
    state: Arc<Mutex<SimulatedState>>,
}

#[derive(Debug, Clone)]
pub struct SimulatedHmdHandle {
    state: Arc<Mutex<SimulatedState>>,
}

#[derive(Debug)]
struct SimulatedState {
    next_swap_chain_id: u32,
    swap_chains: HashMap<SwapChainId, SwapChainRecord>,
    status_calls: u64,
    commit_calls: u64,
    commit_failure_at: Option<u64>,
    last_submitted_frame: Option<u64>,
    submitted_frames: u64,
    last_layer: Option<LayerEyeFovDepth>,
    is_visible: bool,
    display_lost: bool,
    quit_requested: bool,
    recenter_requested: bool,
    recenter_count: u32,
}

#[derive(Debug, Clone, Copy)]
struct SwapChainRecord {
    committed: bool,
}

#[derive(Debug)]
struct SimulatedSwapChain {
    id: SwapChainId,
    desc: SwapChainDesc,
    current: usize,
    state: Arc<Mutex<SimulatedState>>,
}

impl Default for SimulatedHmdConfig {
    fn default() -> Self {
        // Asymmetric per-eye fields of view, wider on the temple side.
        Self {
            product_name: "Simulated HMD".into(),
            eye_resolution: Sizei { w: 1080, h: 1200 },
            eye_fov: [
                FovPort::from_degrees(55.8, 55.7, 54.4, 51.3),
                FovPort::from_degrees(55.9, 55.6, 51.3, 54.4),
            ],
            ipd: 0.064,
            refresh_rate: 90.0,
            head_motion: true,
            failures: FailurePlan::default(),
        }
    }
}

impl SimulatedHmd {
    pub fn new(config: SimulatedHmdConfig) -> Self {
        info!(
            product = %config.product_name,
            width = config.eye_resolution.w,
            height = config.eye_resolution.h,
            ipd = config.ipd,
            "simulated hmd session created"
        );

        let commit_failure_at = config.failures.commit_at_call;

        Self {
            config,
            origin: Quat::IDENTITY,
            last_head_orientation: Quat::IDENTITY,
            state: Arc::new(Mutex::new(SimulatedState {
                next_swap_chain_id: 1,
                swap_chains: HashMap::new(),
                status_calls: 0,
                commit_calls: 0,
                commit_failure_at,
                last_submitted_frame: None,
                submitted_frames: 0,
                last_layer: None,
                is_visible: true,
                display_lost: false,
                quit_requested: false,
                recenter_requested: false,
                recenter_count: 0,
            })),
        }
    }

    pub fn handle(&self) -> SimulatedHmdHandle {
        SimulatedHmdHandle {
            state: self.state.clone(),
        }
    }

    fn head_orientation(&self, frame_index: u64) -> Quat {
        if !self.config.head_motion {
            return Quat::IDENTITY;
        }

        let t = frame_index as f32 / self.config.refresh_rate;
        Quat::from_euler(
            EulerRot::YXZ,
            (t * 0.5).sin() * 0.15,
            (t * 0.3).sin() * 0.05,
            0.0,
        )
    }

    fn pixels_per_tan_angle(&self, eye: Eye) -> [f32; 2] {
        let fov = self.config.eye_fov[eye.index()];

        [
            self.config.eye_resolution.w as f32 / fov.horizontal_tan(),
            self.config.eye_resolution.h as f32 / fov.vertical_tan(),
        ]
    }
}

impl HmdSession for SimulatedHmd {
    fn description(&self) -> HmdDesc {
        HmdDesc {
            product_name: self.config.product_name.clone(),
            resolution: Sizei {
                w: self.config.eye_resolution.w * EYE_COUNT as u32,
                h: self.config.eye_resolution.h,
            },
            default_eye_fov: self.config.eye_fov,
            display_refresh_rate: self.config.refresh_rate,
        }
    }

    fn session_status(&self) -> Result<SessionStatus, HmdError> {
        let mut state = lock(&self.state);

        let call = state.status_calls;
        state.status_calls += 1;

        if self.config.failures.session_status_at_call == Some(call) {
            warn!(call, "simulated session status failure");
            return Err(HmdError::SessionStatus {
                reason: "runtime service connection lost (simulated)".into(),
            });
        }

        Ok(SessionStatus {
            is_visible: state.is_visible && !state.display_lost,
            hmd_present: !state.display_lost,
            display_lost: state.display_lost,
            should_quit: state.quit_requested,
            should_recenter: state.recenter_requested,
        })
    }

    fn eye_render_desc(&self, eye: Eye, fov: FovPort) -> EyeRenderDesc {
        let side = match eye {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        };

        EyeRenderDesc {
            eye,
            fov,
            hmd_to_eye_pose: Posef {
                orientation: Quatf::IDENTITY,
                position: Vector3f {
                    x: side * self.config.ipd * 0.5,
                    y: 0.0,
                    z: 0.0,
                },
            },
        }
    }

    fn fov_texture_size(&self, eye: Eye, fov: FovPort, pixels_per_display_pixel: f32) -> Sizei {
        let [x, y] = self.pixels_per_tan_angle(eye);

        Sizei {
            w: ((x * fov.horizontal_tan() * pixels_per_display_pixel).ceil() as u32).max(1),
            h: ((y * fov.vertical_tan() * pixels_per_display_pixel).ceil() as u32).max(1),
        }
    }

    fn eye_poses(
        &mut self,
        frame_index: u64,
        hmd_to_eye_poses: &[Posef; EYE_COUNT],
    ) -> Result<EyePoses, HmdError> {
        if self.config.failures.eye_poses_at_frame == Some(frame_index) {
            warn!(frame_index, "simulated eye pose failure");
            return Err(HmdError::EyePoses {
                frame_index,
                reason: "tracking data unavailable (simulated)".into(),
            });
        }

        let raw_head = self.head_orientation(frame_index);
        self.last_head_orientation = raw_head;
        let head = self.origin.inverse() * raw_head;

        let poses = hmd_to_eye_poses.map(|offset| Posef {
            orientation: (head * Quat::from(offset.orientation)).into(),
            position: (head * Vec3::from(offset.position)).into(),
        });

        Ok(EyePoses {
            poses,
            sensor_sample_time: frame_index as f64 / self.config.refresh_rate as f64,
        })
    }

    fn create_swap_chain(
        &mut self,
        desc: &SwapChainDesc,
    ) -> Result<Box<dyn TextureSwapChain>, HmdError> {
        if desc.width == 0 || desc.height == 0 || desc.sample_count == 0 {
            return Err(HmdError::SwapChainCreate {
                reason: format!("invalid swap chain description {desc:?}"),
            });
        }

        let mut state = lock(&self.state);

        let id = SwapChainId(state.next_swap_chain_id);
        state.next_swap_chain_id += 1;
        state
            .swap_chains
            .insert(id, SwapChainRecord { committed: false });

        debug!(id = id.0, ?desc, "created simulated swap chain");

        Ok(Box::new(SimulatedSwapChain {
            id,
            desc: *desc,
            current: 0,
            state: self.state.clone(),
        }))
    }

    fn submit_frame(
        &mut self,
        frame_index: u64,
        layer: &LayerEyeFovDepth,
    ) -> Result<(), HmdError> {
        if self.config.failures.submit_at_frame == Some(frame_index) {
            warn!(frame_index, "simulated submit failure");
            return Err(HmdError::Submit {
                frame_index,
                reason: "compositor rejected the frame (simulated)".into(),
            });
        }

        let mut state = lock(&self.state);

        if let Some(last) = state.last_submitted_frame
            && frame_index <= last
        {
            return Err(HmdError::Submit {
                frame_index,
                reason: format!("frame index did not advance past {last}"),
            });
        }

        let referenced = layer.color_textures.iter().chain(&layer.depth_textures);

        for id in referenced.clone() {
            match state.swap_chains.get(id) {
                None => {
                    return Err(HmdError::Submit {
                        frame_index,
                        reason: format!("swap chain {} is not alive", id.0),
                    });
                }
                Some(record) if !record.committed => {
                    return Err(HmdError::Submit {
                        frame_index,
                        reason: format!("swap chain {} was not committed", id.0),
                    });
                }
                Some(_) => {}
            }
        }

        for id in referenced {
            if let Some(record) = state.swap_chains.get_mut(id) {
                record.committed = false;
            }
        }

        state.last_submitted_frame = Some(frame_index);
        state.submitted_frames += 1;
        state.last_layer = Some(layer.clone());

        Ok(())
    }

    fn recenter_tracking_origin(&mut self) {
        self.origin = self.last_head_orientation;

        let mut state = lock(&self.state);
        state.recenter_requested = false;
        state.recenter_count += 1;

        info!("simulated tracking origin recentered");
    }
}

impl SimulatedHmdHandle {
    pub fn live_swap_chains(&self) -> usize {
        lock(&self.state).swap_chains.len()
    }

    pub fn submitted_frames(&self) -> u64 {
        lock(&self.state).submitted_frames
    }

    pub fn last_layer(&self) -> Option<LayerEyeFovDepth> {
        lock(&self.state).last_layer.clone()
    }

    pub fn recenter_count(&self) -> u32 {
        lock(&self.state).recenter_count
    }

    pub fn set_visible(&self, is_visible: bool) {
        lock(&self.state).is_visible = is_visible;
    }

    pub fn request_quit(&self) {
        lock(&self.state).quit_requested = true;
    }

    pub fn request_recenter(&self) {
        lock(&self.state).recenter_requested = true;
    }

    pub fn lose_display(&self) {
        lock(&self.state).display_lost = true;
    }
}

impl TextureSwapChain for SimulatedSwapChain {
    fn id(&self) -> SwapChainId {
        self.id
    }

    fn desc(&self) -> &SwapChainDesc {
        &self.desc
    }

    fn len(&self) -> usize {
        SWAP_CHAIN_LENGTH
    }

    fn current_index(&self) -> usize {
        self.current
    }

    fn commit(&mut self) -> Result<(), HmdError> {
        let mut state = lock(&self.state);

        let call = state.commit_calls;
        state.commit_calls += 1;

        if state.commit_failure_at == Some(call) {
            warn!(call, id = self.id.0, "simulated swap chain commit failure");
            return Err(HmdError::Commit {
                id: self.id,
                reason: "simulated commit failure".into(),
            });
        }

        match state.swap_chains.get_mut(&self.id) {
            Some(record) => record.committed = true,
            None => {
                return Err(HmdError::Commit {
                    id: self.id,
                    reason: "swap chain is not alive".into(),
                });
            }
        }

        self.current = (self.current + 1) % SWAP_CHAIN_LENGTH;

        Ok(())
    }
}

impl Drop for SimulatedSwapChain {
    fn drop(&mut self) {
        lock(&self.state).swap_chains.remove(&self.id);

        debug!(id = self.id.0, "released simulated swap chain");
    }
}

// The state holds plain data, so a panic while it was locked cannot leave it
// half-updated in a way later calls would misread.
fn lock(state: &Mutex<SimulatedState>) -> MutexGuard<'_, SimulatedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Recti, SwapChainFormat, TimewarpProjectionDesc};

    fn still_hmd(failures: FailurePlan) -> SimulatedHmd {
        SimulatedHmd::new(SimulatedHmdConfig {
            head_motion: false,
            failures,
            ..Default::default()
        })
    }

    fn offsets(hmd: &SimulatedHmd) -> [Posef; EYE_COUNT] {
        let fov = hmd.description().default_eye_fov;
        Eye::BOTH.map(|eye| hmd.eye_render_desc(eye, fov[eye.index()]).hmd_to_eye_pose)
    }

    fn color_desc() -> SwapChainDesc {
        SwapChainDesc {
            format: SwapChainFormat::Rgba8UnormSrgb,
            width: 64,
            height: 32,
            sample_count: 1,
        }
    }

    fn layer(color: SwapChainId, depth: SwapChainId) -> LayerEyeFovDepth {
        LayerEyeFovDepth {
            color_textures: [color; EYE_COUNT],
            depth_textures: [depth; EYE_COUNT],
            viewports: [Recti::new(0, 0, 32, 32), Recti::new(32, 0, 32, 32)],
            fov: [FovPort::symmetric(45.0); EYE_COUNT],
            render_poses: [Posef::IDENTITY; EYE_COUNT],
            sensor_sample_time: 0.0,
            projection_desc: TimewarpProjectionDesc::default(),
        }
    }

    #[test]
    fn eye_poses_are_separated_by_ipd() {
        let mut hmd = still_hmd(FailurePlan::default());
        let offsets = offsets(&hmd);

        let poses = hmd.eye_poses(0, &offsets).unwrap().poses;
        let left = Vec3::from(poses[0].position);
        let right = Vec3::from(poses[1].position);

        assert!((left.distance(right) - 0.064).abs() < 1e-6);
        assert!(left.x < 0.0 && right.x > 0.0);
    }

    #[test]
    fn pose_failure_is_reported_for_the_planned_frame_only() {
        let mut hmd = still_hmd(FailurePlan {
            eye_poses_at_frame: Some(2),
            ..Default::default()
        });
        let offsets = offsets(&hmd);

        assert!(hmd.eye_poses(1, &offsets).is_ok());
        assert!(matches!(
            hmd.eye_poses(2, &offsets),
            Err(HmdError::EyePoses { frame_index: 2, .. })
        ));
        assert!(hmd.eye_poses(3, &offsets).is_ok());
    }

    #[test]
    fn session_status_failure() {
        let hmd = still_hmd(FailurePlan {
            session_status_at_call: Some(1),
            ..Default::default()
        });

        assert!(hmd.session_status().unwrap().is_visible);
        assert!(hmd.session_status().is_err());
        assert!(hmd.session_status().is_ok());
    }

    #[test]
    fn dropping_a_swap_chain_releases_it() {
        let mut hmd = still_hmd(FailurePlan::default());
        let handle = hmd.handle();

        let color = hmd.create_swap_chain(&color_desc()).unwrap();
        let depth = hmd
            .create_swap_chain(&SwapChainDesc {
                format: SwapChainFormat::Depth32Float,
                ..color_desc()
            })
            .unwrap();
        assert_eq!(handle.live_swap_chains(), 2);

        drop(color);
        assert_eq!(handle.live_swap_chains(), 1);

        drop(depth);
        assert_eq!(handle.live_swap_chains(), 0);
    }

    #[test]
    fn submit_requires_committed_swap_chains() {
        let mut hmd = still_hmd(FailurePlan::default());
        let handle = hmd.handle();

        let mut color = hmd.create_swap_chain(&color_desc()).unwrap();
        let mut depth = hmd.create_swap_chain(&color_desc()).unwrap();
        let layer = layer(color.id(), depth.id());

        color.commit().unwrap();
        assert!(hmd.submit_frame(0, &layer).is_err());

        depth.commit().unwrap();
        hmd.submit_frame(0, &layer).unwrap();
        assert_eq!(handle.submitted_frames(), 1);
        assert_eq!(handle.last_layer(), Some(layer.clone()));

        // Commits are consumed by the submission.
        assert!(hmd.submit_frame(1, &layer).is_err());
    }

    #[test]
    fn commit_advances_the_ring() {
        let mut hmd = still_hmd(FailurePlan::default());
        let mut chain = hmd.create_swap_chain(&color_desc()).unwrap();

        let indices: Vec<_> = (0..4)
            .map(|_| {
                let index = chain.current_index();
                chain.commit().unwrap();
                index
            })
            .collect();

        assert_eq!(indices, [0, 1, 2, 0]);
    }

    #[test]
    fn planned_commit_fails_without_advancing_the_ring() {
        let mut hmd = still_hmd(FailurePlan {
            commit_at_call: Some(1),
            ..Default::default()
        });
        let mut chain = hmd.create_swap_chain(&color_desc()).unwrap();

        chain.commit().unwrap();
        assert!(matches!(chain.commit(), Err(HmdError::Commit { id, .. }) if id == chain.id()));
        assert_eq!(chain.current_index(), 1);

        chain.commit().unwrap();
        assert_eq!(chain.current_index(), 2);
    }

    #[test]
    fn frame_index_must_advance() {
        let mut hmd = still_hmd(FailurePlan::default());
        let mut color = hmd.create_swap_chain(&color_desc()).unwrap();
        let layer = layer(color.id(), color.id());

        color.commit().unwrap();
        hmd.submit_frame(5, &layer).unwrap();

        color.commit().unwrap();
        assert!(hmd.submit_frame(5, &layer).is_err());
    }

    #[test]
    fn recenter_cancels_current_head_rotation() {
        let mut hmd = SimulatedHmd::new(SimulatedHmdConfig::default());
        let handle = hmd.handle();
        let offsets = [Posef::IDENTITY; EYE_COUNT];

        let before = hmd.eye_poses(40, &offsets).unwrap().poses[0];
        assert!(!Quat::from(before.orientation).abs_diff_eq(Quat::IDENTITY, 1e-3));

        handle.request_recenter();
        assert!(hmd.session_status().unwrap().should_recenter);

        hmd.recenter_tracking_origin();
        let after = hmd.eye_poses(40, &offsets).unwrap().poses[0];

        assert!(Quat::from(after.orientation).abs_diff_eq(Quat::IDENTITY, 1e-5));
        assert!(!hmd.session_status().unwrap().should_recenter);
        assert_eq!(handle.recenter_count(), 1);
    }

    #[test]
    fn texture_size_scales_with_density() {
        let hmd = still_hmd(FailurePlan::default());
        let fov = hmd.description().default_eye_fov[0];

        let full = hmd.fov_texture_size(Eye::Left, fov, 1.0);
        let half = hmd.fov_texture_size(Eye::Left, fov, 0.5);

        // Rounded up, so allow a pixel of float slack.
        assert!(full.w.abs_diff(1080) <= 1 && full.h.abs_diff(1200) <= 1, "{full:?}");
        assert!(half.w.abs_diff(540) <= 1 && half.h.abs_diff(600) <= 1, "{half:?}");
    }
}
