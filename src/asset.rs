use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, info, warn};

#[macro_export]
macro_rules! asset_path {
    ($path:literal) => {
        concat!(env!("CARGO_MANIFEST_DIR"), "/assets/", $path)
    };
}

pub const DIFFUSE_TEXTURE: &str = "diffuse.png";
pub const NORMAL_TEXTURE: &str = "normal.png";

#[derive(Debug, thiserror::Error)]
#[error("failed to load image {path}")]
pub struct AssetError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

pub fn load_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|source| AssetError {
            path: path.to_owned(),
            source,
        })
}

/// Loads `file` from `dir`, or from the bundled asset directory when no
/// directory was given, and falls back to `generate` when that fails.
///
/// Failing to load from an explicitly chosen directory is worth a warning;
/// the bundled directory is allowed to be empty.
pub fn load_texture_or(
    dir: Option<&Path>,
    file: &str,
    generate: impl FnOnce() -> RgbaImage,
) -> RgbaImage {
    let explicit = dir.is_some();
    let path = dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(asset_path!("textures")))
        .join(file);

    match load_rgba(&path) {
        Ok(image) => {
            info!(path = %path.display(), width = image.width(), height = image.height(), "texture loaded");
            image
        }
        Err(err) if explicit => {
            warn!(error = %err, cause = %err.source, "using a procedural texture instead");
            generate()
        }
        Err(err) => {
            debug!(error = %err, "no bundled texture, using a procedural one");
            generate()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_fall_back() {
        let dir = std::env::temp_dir().join("normal_mapping_missing_textures");

        let image = load_texture_or(Some(&dir), DIFFUSE_TEXTURE, || RgbaImage::new(3, 2));

        assert_eq!(image.dimensions(), (3, 2));
    }

    #[test]
    fn loads_png_from_the_given_directory() {
        let dir = std::env::temp_dir().join(format!("normal_mapping_textures_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(dir.join(NORMAL_TEXTURE))
            .unwrap();

        let image = load_texture_or(Some(&dir), NORMAL_TEXTURE, || RgbaImage::new(1, 1));

        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(image.get_pixel(2, 2).0, [10, 20, 30, 255]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
