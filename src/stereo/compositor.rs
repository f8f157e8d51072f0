use lib_hmd::{EYE_COUNT, Eye, EyePoses, FovPort, HmdSession, Matrix4f, Posef, TimewarpProjectionDesc};
use lib_math::{Frustum, Mat4, Quat, Vec3, vec3};

use crate::camera::{Camera, FAR_CLIP, NEAR_CLIP};

/// How each eye's image is placed in clip space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionLayout {
    /// The eye owns the whole viewport it is drawn with.
    Full,
    /// Both eyes share one full-width viewport; each is squeezed into its
    /// half of normalized device x.
    SideBySide,
}

/// One eye's camera for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeView {
    pub eye: Eye,
    pub position: Vec3,
    pub orientation: Quat,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    /// Culling volume of the eye, independent of the layout.
    pub frustum: Frustum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StereoViews {
    pub eyes: [EyeView; EYE_COUNT],
    pub timewarp: TimewarpProjectionDesc,
}

/// Places a tracked eye pose in the world the camera looks at.
///
/// The eye offset is rotated by the camera orientation and added to the
/// camera position. The tracked orientation is applied first and the camera
/// orientation second, so a vector `v` in eye space ends up at
/// `camera * (eye * v)`.
pub fn compose_eye_pose(camera_position: Vec3, camera_orientation: Quat, eye: &Posef) -> (Vec3, Quat) {
    let position = camera_position + camera_orientation * Vec3::from(eye.position);
    let orientation = (camera_orientation * Quat::from(eye.orientation)).normalize();

    (position, orientation)
}

/// Squeezes `projection` into one half of normalized device x: `[-1, 0]`
/// for the left eye, `[0, 1]` for the right.
pub fn side_by_side(projection: Mat4, eye: Eye) -> Mat4 {
    let shift = match eye {
        Eye::Left => -0.5,
        Eye::Right => 0.5,
    };

    Mat4::from_translation(vec3(shift, 0.0, 0.0)) * Mat4::from_scale(vec3(0.5, 1.0, 1.0)) * projection
}

pub fn eye_view(
    camera: &Camera,
    eye: Eye,
    pose: &Posef,
    vendor_projection: &Matrix4f,
    layout: ProjectionLayout,
) -> EyeView {
    let (position, orientation) = compose_eye_pose(camera.eye, camera.orientation(), pose);
    let view = camera.with_pose(position, orientation).view();

    let full = Mat4::from(*vendor_projection);
    let projection = match layout {
        ProjectionLayout::Full => full,
        ProjectionLayout::SideBySide => side_by_side(full, eye),
    };

    EyeView {
        eye,
        position,
        orientation,
        view,
        projection,
        view_projection: projection * view,
        frustum: Frustum::from_view_projection(&(full * view)),
    }
}

/// Builds both eye views for a frame from the tracked poses.
///
/// The timewarp descriptor is taken from the left eye's projection; both
/// eyes share the same clip planes so either would do.
pub fn compose_stereo_views<S: HmdSession + ?Sized>(
    session: &S,
    camera: &Camera,
    fov: &[FovPort; EYE_COUNT],
    poses: &EyePoses,
    layout: ProjectionLayout,
) -> StereoViews {
    let vendor = Eye::BOTH.map(|eye| session.projection(fov[eye.index()], NEAR_CLIP, FAR_CLIP));

    let eyes = Eye::BOTH.map(|eye| {
        eye_view(
            camera,
            eye,
            &poses.poses[eye.index()],
            &vendor[eye.index()],
            layout,
        )
    });

    StereoViews {
        eyes,
        timewarp: TimewarpProjectionDesc::from_projection(&vendor[Eye::Left.index()]),
    }
}
