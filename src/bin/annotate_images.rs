use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use opencv::{
    core::Vector,
    imgcodecs::{self, IMREAD_COLOR},
    prelude::*,
};

use vision_proximity::{config::DetectorConfig, pipeline::FrameProcessor, ssd::CaffeSsdDetector};

/// Run detection and ranging on still images and write annotated copies.
#[derive(Debug, Parser)]
#[command(about)]
struct Args {
    /// Configuration file (defaults to ./config.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to write annotated images to
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Images to annotate
    #[arg(required = true)]
    image_paths: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config =
        DetectorConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let mut detector =
        CaffeSsdDetector::new(&config.model).context("Failed to load detection model")?;
    let processor = FrameProcessor::new(&config);

    fs::create_dir_all(&args.output_dir).context("creating output directory")?;

    let mut written = 0;

    for path in &args.image_paths {
        let path_str = path.to_string_lossy();
        let image = imgcodecs::imread(&path_str, IMREAD_COLOR).context("reading image from disk")?;

        if image.empty() {
            warn!("Skipping unreadable image: {path:?}");
            continue;
        }

        let annotated = processor
            .process(image, &mut detector)
            .with_context(|| format!("processing {path:?}"))?;

        for measurement in &annotated.measurements {
            info!("{path:?}: {}", measurement.display_text());
        }
        if annotated.near_alert {
            info!("{path:?}: object too close");
        }

        let Some(file_name) = path.file_name() else {
            bail!("Expected an image file path, got {path:?}");
        };
        let out_path = args.output_dir.join(file_name);

        imgcodecs::imwrite(&out_path.to_string_lossy(), &annotated.image, &Vector::new())
            .context("writing annotated image to disk")?;
        written += 1;
    }

    info!("Wrote {written} annotated images to {:?}", args.output_dir);

    Ok(())
}
