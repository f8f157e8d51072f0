use crate::{EYE_COUNT, FovPort, Matrix4f, Posef, SwapChainId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sizei {
    pub w: u32,
    pub h: u32,
}

/// A pixel rectangle inside a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Recti {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Recti {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn intersects(&self, other: &Recti) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// The projection terms the compositor needs to reproject depth for
/// latency compensation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimewarpProjectionDesc {
    pub projection22: f32,
    pub projection23: f32,
    pub projection32: f32,
}

impl TimewarpProjectionDesc {
    pub fn from_projection(projection: &Matrix4f) -> Self {
        Self {
            projection22: projection.m[2][2],
            projection23: projection.m[2][3],
            projection32: projection.m[3][2],
        }
    }
}

// Everything the compositor needs to present one stereo frame. Built fresh
// every frame and only borrowed by the submit call.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEyeFovDepth {
    // Color swap chain each eye was rendered into. Both eyes may share one.
    pub color_textures: [SwapChainId; EYE_COUNT],

    // Depth swap chain matching each color swap chain.
    pub depth_textures: [SwapChainId; EYE_COUNT],

    // Rectangle of each eye's image inside its color texture.
    pub viewports: [Recti; EYE_COUNT],

    pub fov: [FovPort; EYE_COUNT],

    // Tracking-space eye poses the images were rendered with.
    pub render_poses: [Posef; EYE_COUNT],

    // Time at which the render poses were sampled, in seconds.
    pub sensor_sample_time: f64,

    pub projection_desc: TimewarpProjectionDesc,
}
