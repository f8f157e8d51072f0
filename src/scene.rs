use lib_math::{Mat4, Vec3, vec3};

pub const GRID_SPACING: f32 = 1.5;
pub const NUM_INSTANCES: usize = 5;
pub const NUM_MODEL_TYPES: usize = 2;

/// Top of the floor, just below the lowest row of models.
pub const FLOOR_HEIGHT: f32 = -0.5;
pub const FLOOR_EXTENT: f32 = 12.0;

pub const CUBE_HALF_EXTENT: f32 = 0.5;
pub const CRATE_HALF_EXTENTS: Vec3 = vec3(0.5, 0.4, 0.5);

pub const CAMERA_EYE: Vec3 = vec3(10.0, 5.0, 7.0);
pub const CAMERA_TARGET: Vec3 = vec3(3.0, 0.5, 0.0);

/// Scene time advanced per second of wall-clock time.
pub const TIME_SCALE: f32 = 0.06;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cube,
    Crate,
    Floor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshKind,
    pub world: Mat4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub time: f32,
}

impl MeshKind {
    pub const ALL: [MeshKind; 3] = [MeshKind::Cube, MeshKind::Crate, MeshKind::Floor];

    /// Model types laid out on the grid, one per row.
    pub const MODEL_TYPES: [MeshKind; NUM_MODEL_TYPES] = [MeshKind::Cube, MeshKind::Crate];

    /// Radius of a sphere around the mesh origin enclosing every vertex.
    pub fn bounding_radius(self) -> f32 {
        match self {
            MeshKind::Cube => Vec3::splat(CUBE_HALF_EXTENT).length(),
            MeshKind::Crate => CRATE_HALF_EXTENTS.length(),
            MeshKind::Floor => FLOOR_EXTENT * std::f32::consts::SQRT_2,
        }
    }
}

impl SceneObject {
    /// World-space bounding sphere as `(center, radius)`.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        let scale = self.world.x_axis.truncate().length();

        (
            self.world.transform_point3(Vec3::ZERO),
            self.mesh.bounding_radius() * scale,
        )
    }
}

impl Scene {
    /// Rows of model instances along +X, one row per model type stacked
    /// along +Y, over a single floor.
    pub fn grid() -> Self {
        let mut objects = Vec::with_capacity(NUM_MODEL_TYPES * NUM_INSTANCES + 1);

        for (i, mesh) in MeshKind::MODEL_TYPES.into_iter().enumerate() {
            for j in 0..NUM_INSTANCES {
                objects.push(SceneObject {
                    mesh,
                    world: Mat4::from_translation(vec3(
                        j as f32 * GRID_SPACING,
                        i as f32 * GRID_SPACING,
                        0.0,
                    )),
                });
            }
        }

        let grid_center = (NUM_INSTANCES - 1) as f32 * GRID_SPACING * 0.5;
        objects.push(SceneObject {
            mesh: MeshKind::Floor,
            world: Mat4::from_translation(vec3(grid_center, FLOOR_HEIGHT, 0.0)),
        });

        Self { objects, time: 0.0 }
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        self.time += delta_seconds * TIME_SCALE;
    }

    /// The light sweeps back and forth along the grid.
    pub fn light_position(&self) -> Vec3 {
        vec3((self.time * 5.0).sin() * 4.0 + 3.0, 1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_holds_every_instance_and_one_floor() {
        let scene = Scene::grid();

        assert_eq!(scene.objects.len(), NUM_MODEL_TYPES * NUM_INSTANCES + 1);
        assert_eq!(
            scene
                .objects
                .iter()
                .filter(|object| object.mesh == MeshKind::Floor)
                .count(),
            1
        );
    }

    #[test]
    fn instances_are_spaced_on_the_grid() {
        let scene = Scene::grid();

        let crates: Vec<Vec3> = scene
            .objects
            .iter()
            .filter(|object| object.mesh == MeshKind::Crate)
            .map(|object| object.world.w_axis.truncate())
            .collect();

        assert_eq!(crates.len(), NUM_INSTANCES);
        for pair in crates.windows(2) {
            assert!((pair[1] - pair[0]).abs_diff_eq(vec3(GRID_SPACING, 0.0, 0.0), 1e-6));
        }
        assert_eq!(crates[0], vec3(0.0, GRID_SPACING, 0.0));
    }

    #[test]
    fn light_starts_at_grid_center() {
        let mut scene = Scene::grid();
        assert!(scene.light_position().abs_diff_eq(vec3(3.0, 1.0, 1.0), 1e-6));

        scene.advance(1.0);
        assert!((scene.time - TIME_SCALE).abs() < 1e-6);
        assert!(scene.light_position().x > 3.0);
    }
}
