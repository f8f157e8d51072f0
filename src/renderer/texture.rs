use image::{
    EncodableLayout, Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use lib_gpu::{
    Device, Extent3d, Origin3d, Queue, TexelCopyBufferLayout, TexelCopyTextureInfo, Texture,
    TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};
use lib_math::{Vec3, vec3};

pub const PROCEDURAL_TEXTURE_SIZE: u32 = 256;

const FRAME_WIDTH: f32 = 0.08;
const PLANK_COUNT: f32 = 4.0;
const GROOVE_WIDTH: f32 = 0.015;
const NORMAL_STRENGTH: f32 = 6.0;

/// Every mip level of `base`, down to 1x1.
pub fn mip_chain(base: &RgbaImage) -> Vec<RgbaImage> {
    let mut levels = vec![base.clone()];

    loop {
        let last = &levels[levels.len() - 1];
        if last.width() <= 1 && last.height() <= 1 {
            break levels;
        }

        let next = imageops::resize(
            last,
            (last.width() / 2).max(1),
            (last.height() / 2).max(1),
            FilterType::Triangle,
        );
        levels.push(next);
    }
}

/// Uploads `levels` as the full mip chain of a new texture.
pub fn upload_mipmapped(
    label: &str,
    levels: &[RgbaImage],
    format: TextureFormat,
    device: &Device,
    queue: &Queue,
) -> Texture {
    let base = &levels[0];

    let texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width: base.width(),
            height: base.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: levels.len() as u32,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (mip_level, image) in levels.iter().enumerate() {
        queue.write_texture(
            TexelCopyTextureInfo {
                texture: &texture,
                aspect: TextureAspect::All,
                mip_level: mip_level as u32,
                origin: Origin3d::ZERO,
            },
            image.as_bytes(),
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width() * 4),
                rows_per_image: Some(image.height()),
            },
            Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    texture
}

/// Wooden planks inside a darker frame.
pub fn procedural_diffuse(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        let (u, v) = texel_uv(x, y, size);

        let color = if in_frame(u, v) {
            vec3(110.0, 70.0, 35.0)
        } else {
            let plank = (v * PLANK_COUNT).floor();
            let grain = (u * 40.0 + plank * 3.0).sin() * 10.0 + (u * 7.0 + v * 90.0).sin() * 4.0;
            vec3(170.0, 115.0, 60.0) + Vec3::splat(grain - plank * 6.0)
        };

        let color = color.clamp(Vec3::ZERO, Vec3::splat(255.0));
        Rgba([color.x as u8, color.y as u8, color.z as u8, 255])
    })
}

/// Tangent-space normals of [`procedural_diffuse`]: a raised frame and
/// grooves between the planks. `+x` points along increasing `u`, `+y` along
/// increasing `v`.
pub fn procedural_normal(size: u32) -> RgbaImage {
    let step = 1.0 / size as f32;

    RgbaImage::from_fn(size, size, |x, y| {
        let (u, v) = texel_uv(x, y, size);

        let du = (height(u + step, v) - height(u - step, v)) / (2.0 * step);
        let dv = (height(u, v + step) - height(u, v - step)) / (2.0 * step);

        let normal = vec3(-du * step * NORMAL_STRENGTH, -dv * step * NORMAL_STRENGTH, 1.0)
            .normalize();

        encode_normal(normal)
    })
}

pub fn encode_normal(normal: Vec3) -> Rgba<u8> {
    let encoded = (normal * 0.5 + Vec3::splat(0.5)) * 255.0;

    Rgba([
        encoded.x.round() as u8,
        encoded.y.round() as u8,
        encoded.z.round() as u8,
        255,
    ])
}

fn texel_uv(x: u32, y: u32, size: u32) -> (f32, f32) {
    ((x as f32 + 0.5) / size as f32, (y as f32 + 0.5) / size as f32)
}

fn in_frame(u: f32, v: f32) -> bool {
    u < FRAME_WIDTH || u > 1.0 - FRAME_WIDTH || v < FRAME_WIDTH || v > 1.0 - FRAME_WIDTH
}

fn height(u: f32, v: f32) -> f32 {
    if in_frame(u, v) {
        return 1.0;
    }

    let plank_edge = (v * PLANK_COUNT).fract();
    if plank_edge < GROOVE_WIDTH * PLANK_COUNT || plank_edge > 1.0 - GROOVE_WIDTH * PLANK_COUNT {
        0.0
    } else {
        0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_ends_at_one_texel() {
        let levels = mip_chain(&RgbaImage::new(256, 64));

        assert_eq!(levels.len(), 9);
        assert_eq!(levels[1].dimensions(), (128, 32));
        assert_eq!(levels[6].dimensions(), (4, 1));
        assert_eq!(levels[8].dimensions(), (1, 1));
    }

    #[test]
    fn flat_areas_encode_straight_up() {
        let normals = procedural_normal(PROCEDURAL_TEXTURE_SIZE);

        // Middle of a plank, away from grooves and the frame.
        let texel = normals.get_pixel(PROCEDURAL_TEXTURE_SIZE / 2, PROCEDURAL_TEXTURE_SIZE * 3 / 8);
        assert_eq!(*texel, encode_normal(Vec3::Z));
        assert_eq!(texel.0, [128, 128, 255, 255]);
    }

    #[test]
    fn frame_edge_tilts_toward_the_inside() {
        let size = PROCEDURAL_TEXTURE_SIZE;
        let normals = procedural_normal(size);

        // Just inside the left frame edge the surface steps down toward +u.
        let edge = (FRAME_WIDTH * size as f32) as u32;
        let texel = normals.get_pixel(edge, size * 3 / 8);

        assert!(texel.0[0] > 128, "{texel:?}");
    }

    #[test]
    fn procedural_textures_are_opaque() {
        let diffuse = procedural_diffuse(64);

        assert_eq!(diffuse.dimensions(), (64, 64));
        assert!(diffuse.pixels().all(|pixel| pixel.0[3] == 255));
    }
}
