use std::fmt::Debug;

use crate::{
    EYE_COUNT, Eye, FovPort, HmdError, LayerEyeFovDepth, Matrix4f, Posef, Sizei,
    SwapChainDesc, TextureSwapChain,
};

#[derive(Debug, Clone, PartialEq)]
pub struct HmdDesc {
    pub product_name: String,
    /// Resolution of the whole panel, both eyes side by side.
    pub resolution: Sizei,
    pub default_eye_fov: [FovPort; EYE_COUNT],
    pub display_refresh_rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    /// The application owns the display and its frames are shown.
    pub is_visible: bool,
    pub hmd_present: bool,
    pub display_lost: bool,
    pub should_quit: bool,
    pub should_recenter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRenderDesc {
    pub eye: Eye,
    pub fov: FovPort,
    /// Offset from the center of the head to this eye, including half the
    /// inter-pupillary distance.
    pub hmd_to_eye_pose: Posef,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePoses {
    pub poses: [Posef; EYE_COUNT],
    pub sensor_sample_time: f64,
}

/// A connection to a head-mounted display runtime.
///
/// All calls are synchronous round trips and must be made from the render
/// thread.
pub trait HmdSession: Debug {
    fn description(&self) -> HmdDesc;

    fn session_status(&self) -> Result<SessionStatus, HmdError>;

    fn eye_render_desc(&self, eye: Eye, fov: FovPort) -> EyeRenderDesc;

    /// Render target size that keeps one target pixel per display pixel at
    /// the center of the lens when `pixels_per_display_pixel` is 1.
    fn fov_texture_size(&self, eye: Eye, fov: FovPort, pixels_per_display_pixel: f32) -> Sizei;

    /// Predicted tracking-space pose of each eye for `frame_index`.
    fn eye_poses(
        &mut self,
        frame_index: u64,
        hmd_to_eye_poses: &[Posef; EYE_COUNT],
    ) -> Result<EyePoses, HmdError>;

    /// Projection for `fov` as a row-major matrix; see [`FovPort::projection`].
    fn projection(&self, fov: FovPort, near: f32, far: f32) -> Matrix4f {
        fov.projection(near, far)
    }

    fn create_swap_chain(
        &mut self,
        desc: &SwapChainDesc,
    ) -> Result<Box<dyn TextureSwapChain>, HmdError>;

    /// Presents a layer whose swap chains were committed this frame.
    fn submit_frame(&mut self, frame_index: u64, layer: &LayerEyeFovDepth)
    -> Result<(), HmdError>;

    /// Makes the current head pose the new tracking origin.
    fn recenter_tracking_origin(&mut self);
}
