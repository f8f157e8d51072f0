//! Frame plans: every pass and draw of a frame with its constants already
//! computed, independent of the GPU that will execute them.

use lib_hmd::{EYE_COUNT, Eye, Recti, Sizei};
use lib_math::{Mat4, Vec3};

use crate::{
    camera::Camera,
    renderer::{PerDrawData, PerFrameData},
    scene::{MeshKind, Scene},
    stereo::StereoViews,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawList {
    pub passes: Vec<PassPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub label: &'static str,
    pub viewport: Recti,
    /// Clear the whole target before drawing instead of loading it.
    pub clear: bool,
    pub per_frame: PerFrameData,
    /// Instances per draw; 2 draws every mesh once per eye.
    pub instance_count: u32,
    pub draws: Vec<DrawCall>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshKind,
    pub per_draw: PerDrawData,
}

impl DrawList {
    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.draws.len()).sum()
    }
}

/// A single view filling `viewport`, as on a desktop monitor.
pub fn plan_mono(scene: &Scene, camera: &Camera, viewport: Recti) -> DrawList {
    let per_frame = PerFrameData::new(
        camera.projection(),
        camera.view(),
        scene.light_position().extend(0.0),
        scene.time,
    );

    let draws = visible_draws(
        scene,
        |center, radius| camera.frustum().intersects_sphere(center, radius),
        [camera.view_projection(); EYE_COUNT],
    );

    DrawList {
        passes: vec![PassPlan {
            label: "mono pass",
            viewport,
            clear: true,
            per_frame,
            instance_count: 1,
            draws,
        }],
    }
}

/// One pass per eye, each restricted to its own viewport of the shared
/// target. Only the first pass clears.
pub fn plan_sequential(
    scene: &Scene,
    views: &StereoViews,
    viewports: [Recti; EYE_COUNT],
) -> DrawList {
    let passes = Eye::BOTH
        .into_iter()
        .map(|eye| {
            let view = &views.eyes[eye.index()];

            PassPlan {
                label: match eye {
                    Eye::Left => "left eye pass",
                    Eye::Right => "right eye pass",
                },
                viewport: viewports[eye.index()],
                clear: eye == Eye::Left,
                per_frame: PerFrameData::new(
                    view.projection,
                    view.view,
                    scene.light_position().extend(0.0),
                    scene.time,
                ),
                instance_count: 1,
                draws: visible_draws(
                    scene,
                    |center, radius| view.frustum.intersects_sphere(center, radius),
                    [view.view_projection; EYE_COUNT],
                ),
            }
        })
        .collect();

    DrawList { passes }
}

/// One full-width pass drawing every mesh twice. The shader picks the eye's
/// matrix by instance and drops fragments that land on the other eye's half,
/// which starts at `split_x`.
///
/// Both eyes share a single visibility decision: a mesh seen by either eye
/// is drawn for both.
pub fn plan_instanced(scene: &Scene, views: &StereoViews, target: Sizei, split_x: u32) -> DrawList {
    let left = &views.eyes[Eye::Left.index()];

    let mut per_frame = PerFrameData::new(
        left.projection,
        left.view,
        scene.light_position().extend(0.0),
        scene.time,
    );
    per_frame.stereo_split_x = split_x as f32;

    let draws = visible_draws(
        scene,
        |center, radius| {
            views
                .eyes
                .iter()
                .any(|view| view.frustum.intersects_sphere(center, radius))
        },
        views.eyes.each_ref().map(|view| view.view_projection),
    );

    DrawList {
        passes: vec![PassPlan {
            label: "instanced stereo pass",
            viewport: Recti::new(0, 0, target.w, target.h),
            clear: true,
            per_frame,
            instance_count: EYE_COUNT as u32,
            draws,
        }],
    }
}

fn visible_draws(
    scene: &Scene,
    is_visible: impl Fn(Vec3, f32) -> bool,
    view_projection: [Mat4; EYE_COUNT],
) -> Vec<DrawCall> {
    scene
        .objects
        .iter()
        .filter(|object| {
            let (center, radius) = object.bounding_sphere();
            is_visible(center, radius)
        })
        .map(|object| DrawCall {
            mesh: object.mesh,
            per_draw: PerDrawData::new(object.world, view_projection),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stereo::{ProjectionLayout, compose_stereo_views};
    use lib_hmd::{EyePoses, HmdSession, Posef, SimulatedHmd, SimulatedHmdConfig, Vector3f};
    use lib_math::vec3;

    fn stereo_views(layout: ProjectionLayout) -> StereoViews {
        views_from(&Camera::default(), [-0.032, 0.032], layout)
    }

    fn views_from(camera: &Camera, eye_x: [f32; EYE_COUNT], layout: ProjectionLayout) -> StereoViews {
        let hmd = SimulatedHmd::new(SimulatedHmdConfig::default());
        let fov = hmd.description().default_eye_fov;
        let offset = |x| Posef {
            position: Vector3f { x, y: 0.0, z: 0.0 },
            ..Posef::IDENTITY
        };

        let poses = EyePoses {
            poses: eye_x.map(offset),
            sensor_sample_time: 0.0,
        };

        compose_stereo_views(&hmd, camera, &fov, &poses, layout)
    }

    #[test]
    fn mono_draws_the_whole_grid() {
        let scene = Scene::grid();
        let list = plan_mono(&scene, &Camera::default(), Recti::new(0, 0, 1280, 720));

        assert_eq!(list.passes.len(), 1);
        assert_eq!(list.draw_count(), scene.objects.len());
        assert!(list.passes[0].clear);
        assert_eq!(list.passes[0].per_frame.stereo_split_x, 0.0);
    }

    #[test]
    fn culls_what_the_camera_cannot_see() {
        let scene = Scene::grid();
        let mut camera = Camera::default();
        camera.look_at(camera.eye + (camera.eye - camera.target()) * 10.0);
        camera.update_matrices();

        let list = plan_mono(&scene, &camera, Recti::new(0, 0, 1280, 720));

        // The floor surrounds the eye, so it stays.
        let meshes: Vec<_> = list.passes[0].draws.iter().map(|draw| draw.mesh).collect();
        assert_eq!(meshes, [MeshKind::Floor]);
    }

    #[test]
    fn sequential_renders_each_eye_into_its_viewport() {
        let scene = Scene::grid();
        let views = stereo_views(ProjectionLayout::Full);
        let viewports = [Recti::new(0, 0, 600, 700), Recti::new(600, 0, 600, 700)];

        let list = plan_sequential(&scene, &views, viewports);

        assert_eq!(list.passes.len(), 2);
        for (eye, pass) in list.passes.iter().enumerate() {
            assert_eq!(pass.viewport, viewports[eye]);
            assert_eq!(pass.instance_count, 1);
            assert_eq!(pass.clear, eye == 0);
            assert_eq!(pass.per_frame.view, views.eyes[eye].view);
            assert_eq!(pass.per_frame.projection, views.eyes[eye].projection);

            for draw in &pass.draws {
                assert_eq!(draw.per_draw.mvp[0], draw.per_draw.mvp[1]);
                assert_eq!(
                    draw.per_draw.mvp[0],
                    views.eyes[eye].view_projection * draw.per_draw.world
                );
            }
        }
        assert_ne!(list.passes[0].per_frame.view, list.passes[1].per_frame.view);
    }

    #[test]
    fn instanced_draws_each_mesh_once_for_both_eyes() {
        let scene = Scene::grid();
        let views = stereo_views(ProjectionLayout::SideBySide);

        let list = plan_instanced(&scene, &views, Sizei { w: 1200, h: 700 }, 600);

        assert_eq!(list.passes.len(), 1);
        let pass = &list.passes[0];
        assert_eq!(pass.instance_count, 2);
        assert_eq!(pass.viewport, Recti::new(0, 0, 1200, 700));
        assert_eq!(pass.per_frame.stereo_split_x, 600.0);
        assert_eq!(pass.per_frame.view, views.eyes[0].view);
        assert_eq!(pass.draws.len(), scene.objects.len());

        for draw in &pass.draws {
            for eye in Eye::BOTH {
                assert_eq!(
                    draw.per_draw.mvp[eye.index()],
                    views.eyes[eye.index()].view_projection * draw.per_draw.world
                );
            }
        }
    }

    #[test]
    fn instanced_draws_what_either_eye_sees() {
        let scene = Scene::grid();
        let mut camera = Camera::default();
        camera.eye = vec3(3.0, 0.75, 6.0);
        camera.look_at(camera.eye + Vec3::NEG_Z);
        camera.update_matrices();

        // The right eye sits far past the end of the grid and only sees the floor.
        let eye_x = [0.0, 20.0];
        let instanced = plan_instanced(
            &scene,
            &views_from(&camera, eye_x, ProjectionLayout::SideBySide),
            Sizei { w: 1200, h: 700 },
            600,
        );
        let full = views_from(&camera, eye_x, ProjectionLayout::Full);
        let sequential = plan_sequential(
            &scene,
            &full,
            [Recti::new(0, 0, 600, 700), Recti::new(600, 0, 600, 700)],
        );

        let left_draws = sequential.passes[0].draws.len();
        let right_draws = sequential.passes[1].draws.len();
        assert!(left_draws > right_draws);
        assert!(instanced.draw_count() >= left_draws.max(right_draws));

        let one_eye_only: Vec<_> = scene
            .objects
            .iter()
            .filter(|object| {
                let (center, radius) = object.bounding_sphere();
                let seen_by = full
                    .eyes
                    .iter()
                    .filter(|view| view.frustum.intersects_sphere(center, radius))
                    .count();
                seen_by == 1
            })
            .collect();
        assert!(!one_eye_only.is_empty());

        for object in one_eye_only {
            assert!(
                instanced.passes[0]
                    .draws
                    .iter()
                    .any(|draw| draw.mesh == object.mesh && draw.per_draw.world == object.world)
            );
        }
    }
}
