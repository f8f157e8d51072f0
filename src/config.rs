use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lib_hmd::{SimulatedHmdConfig, simulated::FailurePlan};

#[derive(Parser, Debug)]
#[command(
    name = "normal-mapping",
    version,
    about = "Normal-mapped scene rendered to a window or a stereo headset"
)]
pub struct Cli {
    /// How frames reach the headset: mono (window only), sequential or instanced
    #[arg(long, value_enum, default_value_t = StereoMode::Sequential)]
    pub stereo: StereoMode,

    /// Eye render target resolution relative to the headset panel
    #[arg(long, default_value_t = 1.0)]
    pub pixel_density: f32,

    /// Directory holding diffuse.png and normal.png (procedural textures otherwise)
    #[arg(long)]
    pub textures: Option<PathBuf>,

    /// Make the simulated headset fail its eye pose query at this frame
    #[arg(long)]
    pub fail_pose_query_at: Option<u64>,

    /// Exit after rendering this many frames
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Keep the simulated head still
    #[arg(long)]
    pub no_head_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StereoMode {
    /// Desktop rendering, no headset session.
    Mono,
    /// One pass per eye into its half of the shared target.
    #[default]
    Sequential,
    /// One pass drawing every mesh twice, once into each half.
    Instanced,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub stereo: StereoMode,
    pub pixel_density: f32,
    pub texture_dir: Option<PathBuf>,
    pub max_frames: Option<u64>,
    pub hmd: SimulatedHmdConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("pixel density must be in (0, {MAX_PIXEL_DENSITY}], got {0}")]
    PixelDensity(f32),
    #[error("texture directory {0} does not exist")]
    TextureDir(PathBuf),
}

const MAX_PIXEL_DENSITY: f32 = 4.0;

impl DemoConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if !(cli.pixel_density > 0.0 && cli.pixel_density <= MAX_PIXEL_DENSITY) {
            return Err(ConfigError::PixelDensity(cli.pixel_density));
        }

        if let Some(dir) = &cli.textures
            && !dir.is_dir()
        {
            return Err(ConfigError::TextureDir(dir.clone()));
        }

        Ok(Self {
            stereo: cli.stereo,
            pixel_density: cli.pixel_density,
            texture_dir: cli.textures,
            max_frames: cli.max_frames,
            hmd: SimulatedHmdConfig {
                head_motion: !cli.no_head_motion,
                failures: FailurePlan {
                    eye_poses_at_frame: cli.fail_pose_query_at,
                    ..Default::default()
                },
                ..Default::default()
            },
        })
    }
}
