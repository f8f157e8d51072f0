use crate::Matrix4f;

/// A field of view given as the tangents of the half-angles between the
/// eye's center line and each edge. Tangents of edges on the far side of the
/// center line are negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovPort {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

impl FovPort {
    pub fn from_degrees(up: f32, down: f32, left: f32, right: f32) -> Self {
        Self {
            up_tan: up.to_radians().tan(),
            down_tan: down.to_radians().tan(),
            left_tan: left.to_radians().tan(),
            right_tan: right.to_radians().tan(),
        }
    }

    pub fn symmetric(half_angle_degrees: f32) -> Self {
        let d = half_angle_degrees;
        Self::from_degrees(d, d, d, d)
    }

    /// Widest extent of both ports on every side.
    pub fn max(self, other: Self) -> Self {
        Self {
            up_tan: self.up_tan.max(other.up_tan),
            down_tan: self.down_tan.max(other.down_tan),
            left_tan: self.left_tan.max(other.left_tan),
            right_tan: self.right_tan.max(other.right_tan),
        }
    }

    pub fn horizontal_tan(&self) -> f32 {
        self.left_tan + self.right_tan
    }

    pub fn vertical_tan(&self) -> f32 {
        self.up_tan + self.down_tan
    }

    /// Off-center perspective projection for this port. Right-handed (the
    /// eye looks down -Z), clip-space depth in `[0, 1]` from `near` to `far`.
    pub fn projection(&self, near: f32, far: f32) -> Matrix4f {
        let x_scale = 2.0 / self.horizontal_tan();
        let x_offset = (self.right_tan - self.left_tan) / self.horizontal_tan();
        let y_scale = 2.0 / self.vertical_tan();
        let y_offset = (self.up_tan - self.down_tan) / self.vertical_tan();
        let depth = far / (near - far);

        Matrix4f {
            m: [
                [x_scale, 0.0, x_offset, 0.0],
                [0.0, y_scale, y_offset, 0.0],
                [0.0, 0.0, depth, depth * near],
                [0.0, 0.0, -1.0, 0.0],
            ],
        }
    }
}
