use glam::{Mat4, Vec3, Vec4};

/// Packs the upper 3x3 block of `m` as three padded columns, which is how a
/// WGSL `mat3x3<f32>` is laid out inside a uniform buffer.
pub fn pack_upper_3x3(m: &Mat4) -> [Vec4; 3] {
    [
        m.x_axis.truncate().extend(0.0),
        m.y_axis.truncate().extend(0.0),
        m.z_axis.truncate().extend(0.0),
    ]
}

/// Packs the normal transform of `world`.
///
/// The normal transform is the inverse-transpose of the upper 3x3 block. For
/// a matrix with uniform scale and no shear that block is a scaled rotation,
/// so its inverse-transpose differs from it only by a scale factor that the
/// shader removes by normalizing. This function relies on that and packs the
/// block unchanged.
///
/// # Preconditions
///
/// `world` has uniform scale and no shear (checked in debug builds).
pub fn pack_normal_matrix(world: &Mat4) -> [Vec4; 3] {
    debug_assert!(
        is_uniform_scale_without_shear(world, 1e-4),
        "normal matrix packing requires uniform scale and no shear: {world}"
    );

    pack_upper_3x3(world)
}

/// Returns true when the upper 3x3 block of `m` is a rotation times a
/// positive uniform scale, within a relative `epsilon`.
pub fn is_uniform_scale_without_shear(m: &Mat4, epsilon: f32) -> bool {
    let axes: [Vec3; 3] = [
        m.x_axis.truncate(),
        m.y_axis.truncate(),
        m.z_axis.truncate(),
    ];

    let scale = axes[0].length();
    if scale <= f32::EPSILON {
        return false;
    }

    let same_length = axes
        .iter()
        .all(|axis| (axis.length() - scale).abs() <= epsilon * scale);

    let orthogonal = [(0, 1), (0, 2), (1, 2)]
        .iter()
        .all(|&(a, b)| axes[a].dot(axes[b]).abs() <= epsilon * scale * scale);

    same_length && orthogonal
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, vec3};

    #[test]
    fn packs_rotation_block_exactly() {
        let world = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.5),
            Quat::from_euler(glam::EulerRot::YXZ, 0.4, -1.1, 0.25),
            vec3(1.5, 3.0, -2.0),
        );

        let packed = pack_normal_matrix(&world);

        assert_eq!(packed[0].truncate(), world.x_axis.truncate());
        assert_eq!(packed[1].truncate(), world.y_axis.truncate());
        assert_eq!(packed[2].truncate(), world.z_axis.truncate());
        assert!(packed.iter().all(|column| column.w == 0.0));
    }

    #[test]
    fn translation_only_packs_identity() {
        let world = Mat4::from_translation(vec3(6.0, 1.5, 0.0));

        assert_eq!(
            pack_normal_matrix(&world),
            [Vec4::X, Vec4::Y, Vec4::Z],
        );
    }

    #[test]
    fn detects_non_uniform_scale_and_shear() {
        let stretched = Mat4::from_scale(vec3(1.0, 2.0, 1.0));
        assert!(!is_uniform_scale_without_shear(&stretched, 1e-4));

        let mut sheared = Mat4::IDENTITY;
        sheared.y_axis.x = 0.5;
        assert!(!is_uniform_scale_without_shear(&sheared, 1e-4));

        let rotated = Mat4::from_rotation_z(0.7) * Mat4::from_scale(Vec3::splat(0.3));
        assert!(is_uniform_scale_without_shear(&rotated, 1e-4));
    }
}
