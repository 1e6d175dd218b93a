use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use vision_proximity::{
    camera::OpenCvCamera,
    config::DetectorConfig,
    display::{HighGuiDisplay, WINDOW_TITLE},
    pipeline::{FrameProcessor, VisionPipeline},
    ssd::CaffeSsdDetector,
};

/// Live object detection with monocular distance estimation.
#[derive(Debug, Parser)]
#[command(about)]
struct Args {
    /// Configuration file (defaults to ./config.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index
    #[arg(long)]
    camera: Option<i32>,

    /// Caffe network topology file
    #[arg(long)]
    prototxt: Option<PathBuf>,

    /// Caffe weights file
    #[arg(long)]
    weights: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config =
        DetectorConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(index) = args.camera {
        config.camera.index = index;
    }
    if let Some(prototxt) = args.prototxt {
        config.model.prototxt = prototxt;
    }
    if let Some(weights) = args.weights {
        config.model.weights = weights;
    }

    let detector = CaffeSsdDetector::new(&config.model).context("Failed to load detection model")?;
    let camera = OpenCvCamera::new(config.camera.clone()).context("Failed to initialize camera")?;
    let display = HighGuiDisplay::new(WINDOW_TITLE)?;
    let processor = FrameProcessor::new(&config);

    let mut pipeline = VisionPipeline::new(camera, detector, display, processor);
    let shown = pipeline.run()?;

    info!("Stopped after {shown} frames");

    Ok(())
}
