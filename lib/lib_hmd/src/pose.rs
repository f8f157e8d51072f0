use glam::{Mat4, Quat, Vec3};

// Plain runtime-side math types. They carry no convention of their own
// beyond what is documented on each; conversion into renderer math happens
// at the call site.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quatf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// A rigid transform relative to the tracking origin, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Posef {
    pub orientation: Quatf,
    pub position: Vector3f,
}

/// A 4x4 matrix stored row-major (`m[row][column]`) and meant to be applied
/// to column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4f {
    pub m: [[f32; 4]; 4],
}

impl Quatf {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quatf {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Posef {
    pub const IDENTITY: Self = Self {
        orientation: Quatf::IDENTITY,
        position: Vector3f {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
    };
}

impl Matrix4f {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };
}

impl From<Vector3f> for Vec3 {
    fn from(value: Vector3f) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

impl From<Vec3> for Vector3f {
    fn from(value: Vec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }
}

impl From<Quatf> for Quat {
    fn from(value: Quatf) -> Self {
        Quat::from_xyzw(value.x, value.y, value.z, value.w)
    }
}

impl From<Quat> for Quatf {
    fn from(value: Quat) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
            w: value.w,
        }
    }
}

impl From<Matrix4f> for Mat4 {
    /// Reorders the rows into glam's column-major storage.
    fn from(value: Matrix4f) -> Self {
        Mat4::from_cols_array_2d(&value.m).transpose()
    }
}
