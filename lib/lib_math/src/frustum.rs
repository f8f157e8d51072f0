use glam::{Mat4, Vec3, Vec4};

/// Six clip planes `(a, b, c, d)` with normals pointing into the volume, in
/// the order left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the planes of a column-vector view-projection matrix whose
    /// clip-space depth range is `[0, 1]`.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(normalize_plane);

        Self { planes }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }

    /// Conservative: spheres near a frustum corner may pass while outside.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let length = plane.truncate().length();

    if length > 0.0 { plane / length } else { plane }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    fn test_frustum() -> Frustum {
        let view = Mat4::look_to_rh(Vec3::ZERO, -Vec3::Z, Vec3::Y);
        let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);

        Frustum::from_view_projection(&(projection * view))
    }

    #[test]
    fn contains_points_in_front() {
        let frustum = test_frustum();

        assert!(frustum.contains_point(vec3(0.0, 0.0, -1.0)));
        assert!(frustum.contains_point(vec3(0.5, -0.5, -10.0)));
    }

    #[test]
    fn rejects_points_outside() {
        let frustum = test_frustum();

        assert!(!frustum.contains_point(vec3(0.0, 0.0, 1.0)));
        assert!(!frustum.contains_point(vec3(0.0, 0.0, -0.05)));
        assert!(!frustum.contains_point(vec3(0.0, 0.0, -150.0)));
        assert!(!frustum.contains_point(vec3(50.0, 0.0, -1.0)));
    }

    #[test]
    fn spheres_straddling_a_plane_intersect() {
        let frustum = test_frustum();

        assert!(frustum.intersects_sphere(vec3(0.0, 0.0, 0.5), 1.0));
        assert!(!frustum.intersects_sphere(vec3(0.0, 0.0, 2.0), 1.0));
        assert!(frustum.intersects_sphere(vec3(0.0, 0.0, -5.0), 0.1));
    }

    #[test]
    fn planes_are_normalized() {
        for plane in test_frustum().planes {
            assert!((plane.truncate().length() - 1.0).abs() < 1e-5);
        }
    }
}
