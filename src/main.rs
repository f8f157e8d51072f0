mod app;
mod asset;
mod camera;
mod config;
mod controls;
mod renderer;
mod scene;
mod stereo;

use clap::Parser;
use lib_app::run_app;
use tracing::info;

use crate::{
    app::NormalMappingApp,
    config::{Cli, DemoConfig},
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "normal_mapping=info,lib_app=info,lib_hmd=info,wgpu_core=warn".into()),
        )
        .init();

    let config = DemoConfig::from_cli(cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        stereo = ?config.stereo,
        pixel_density = config.pixel_density,
        "normal-mapping starting"
    );

    run_app(NormalMappingApp::new(config))?;

    info!("normal-mapping exited cleanly");

    Ok(())
}
