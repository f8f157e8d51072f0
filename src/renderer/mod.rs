mod constants;
mod draw_list;
mod mesh;
mod mirror;
mod render_pass;
mod renderer;
mod stereo_targets;
mod texture;

pub use constants::*;
pub use draw_list::*;
pub use mesh::*;
pub use mirror::*;
pub use renderer::*;
pub use stereo_targets::*;
pub use texture::*;

use lib_gpu::{Color, TextureFormat};

/// Format of the stereo swap chain images.
pub const STEREO_COLOR_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

const CLEAR_COLOR: Color = Color {
    r: 0.1,
    g: 0.1,
    b: 0.12,
    a: 1.0,
};
