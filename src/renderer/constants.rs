use bytemuck::{Pod, Zeroable};
use lib_hmd::EYE_COUNT;
use lib_math::{Mat4, Vec4, pack_normal_matrix};

/// Uniforms shared by every draw of a pass. Mirrors `PerFrame` in
/// `mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerFrameData {
    pub projection: Mat4,
    pub view: Mat4,
    pub light_position: Vec4,
    pub time: f32,
    /// First pixel column of the right eye in an instanced pass, 0 otherwise.
    pub stereo_split_x: f32,
    pub _padding: [f32; 2],
}

/// Uniforms of a single draw. Mirrors `PerDraw` in `mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerDrawData {
    /// Indexed by eye in instanced passes; both slots match otherwise.
    pub mvp: [Mat4; EYE_COUNT],
    pub world: Mat4,
    /// Columns of the normal matrix, padded like a WGSL `mat3x3<f32>`.
    pub normal: [Vec4; 3],
}

impl PerFrameData {
    pub fn new(projection: Mat4, view: Mat4, light_position: Vec4, time: f32) -> Self {
        Self {
            projection,
            view,
            light_position,
            time,
            stereo_split_x: 0.0,
            _padding: [0.0; 2],
        }
    }
}

impl PerDrawData {
    pub fn new(world: Mat4, view_projection: [Mat4; EYE_COUNT]) -> Self {
        Self {
            mvp: view_projection.map(|view_projection| view_projection * world),
            world,
            normal: pack_normal_matrix(&world),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_math::vec3;

    #[test]
    fn layouts_match_the_shader() {
        assert_eq!(size_of::<PerFrameData>(), 160);
        assert_eq!(size_of::<PerDrawData>(), 240);
        assert_eq!(std::mem::offset_of!(PerFrameData, light_position), 128);
        assert_eq!(std::mem::offset_of!(PerFrameData, stereo_split_x), 148);
        assert_eq!(std::mem::offset_of!(PerDrawData, world), 128);
        assert_eq!(std::mem::offset_of!(PerDrawData, normal), 192);
    }

    #[test]
    fn per_draw_multiplies_world_last() {
        let world = Mat4::from_translation(vec3(3.0, 1.5, 0.0));
        let view_projection = Mat4::perspective_rh(1.0, 1.5, 0.2, 1000.0);

        let data = PerDrawData::new(world, [view_projection, Mat4::IDENTITY]);

        assert_eq!(data.mvp[0], view_projection * world);
        assert_eq!(data.mvp[1], world);
        assert_eq!(data.normal, [Vec4::X, Vec4::Y, Vec4::Z]);
    }
}
