use clap::Parser;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    process::ExitCode,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dicom_viewports::{
    Command, Flow, Gpu, ViewSession, VolumeLoader, VolumeTexture,
    config::{self, Cli, InspectConfig, ViewConfig},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        config::Command::View(config) => run_view(config).await,
        config::Command::Inspect(config) => run_inspect(config),
    }
}

async fn run_view(config: ViewConfig) -> ExitCode {
    init_logging(config.verbose);

    let gpu = match Gpu::headless().await {
        Ok(gpu) => gpu,
        Err(e) => {
            error!("GPU initialization failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = ViewSession::new(config.sort_by);
    for folder in config.folders {
        session.apply(Command::LoadVolume(folder), &gpu);
    }
    log_viewports(&session);

    let input: Box<dyn BufRead> = match &config.script {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                error!("Unable to open script {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    info!("Keys: 1-4 select slot, w/s slice, j/u zoom, l <folder> load, q quit");
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Unable to read command: {}", e);
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        if session.apply(command, &gpu) == Flow::Quit {
            break;
        }
        log_viewports(&session);
    }

    info!("Session ended");
    ExitCode::SUCCESS
}

fn run_inspect(config: InspectConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let volume = match VolumeLoader::load_from_directory(&config.folder, config.sort_by) {
        Ok(volume) => volume,
        Err(e) => {
            error!("Failed to load volume: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let range = volume.source_range();
    info!(
        "Volume {}x{}x{} (width x height x depth), source intensities {}..={}",
        volume.width(),
        volume.height(),
        volume.depth(),
        range.min,
        range.max
    );

    if let Some(output) = &config.output {
        let Some(image) = volume.slice_image(config.depth) else {
            error!("Volume has no slice at depth {}", config.depth);
            return ExitCode::FAILURE;
        };
        if let Err(e) = image.save(output) {
            error!("Unable to write {}: {}", output.display(), e);
            return ExitCode::FAILURE;
        }
        info!("Wrote slice at depth {} to {}", config.depth, output.display());
    }

    ExitCode::SUCCESS
}

fn log_viewports(session: &ViewSession<VolumeTexture>) {
    info!(
        "Active slot {} of {} loaded",
        session.active_slot() + 1,
        session.occupied_count()
    );
    for viewport in session.viewports() {
        info!(
            "  slot {}: {:?} voxels, slice {:.2}, zoom {:.2}",
            viewport.slot + 1,
            viewport.texture.dimensions(),
            viewport.slice_depth,
            viewport.zoom_level
        );
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dicom_viewports=debug"
    } else {
        "dicom_viewports=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
