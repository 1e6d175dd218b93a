use anyhow::{Context, Result};
use log::{debug, info};
use opencv::{core::Mat, prelude::*};

use crate::analysis::{DistanceAnalyzer, Measurement};
use crate::annotation::{annotate, ClassPalette};
use crate::camera::frames;
use crate::config::DetectorConfig;
use crate::traits::{Camera as CameraTrait, Detector, Display};

/// Output of one pass of the frame processor.
pub struct AnnotatedFrame {
    pub image: Mat,
    pub measurements: Vec<Measurement>,
    pub near_alert: bool,
}

/// Read-only per-process context: ranging tables, thresholds and palette.
///
/// Holds no per-frame state, so processing the same frame twice yields the
/// same image.
pub struct FrameProcessor {
    analyzer: DistanceAnalyzer,
    palette: ClassPalette,
}

impl FrameProcessor {
    pub fn new(config: &DetectorConfig) -> Self {
        FrameProcessor {
            analyzer: DistanceAnalyzer::new(config),
            palette: ClassPalette::seeded(config.palette_seed, config.classes.len()),
        }
    }

    pub fn process<D: Detector>(&self, mut frame: Mat, detector: &mut D) -> Result<AnnotatedFrame> {
        let (width, height) = (frame.cols(), frame.rows());

        let detections = detector.detect(&frame).context("Inference failed")?;
        let measurements = self.analyzer.analyze_all(&detections, width, height);

        annotate(&mut frame, &measurements, &self.palette).context("Annotation failed")?;

        for measurement in &measurements {
            debug!(
                "{} ({:.2}) at {:?}: {:.2}cm",
                measurement.label, measurement.confidence, measurement.pixel_box, measurement.distance_cm
            );
        }

        let near_alert = measurements.iter().any(|m| m.near);
        if near_alert {
            debug!("Object closer than threshold");
        }

        Ok(AnnotatedFrame {
            image: frame,
            measurements,
            near_alert,
        })
    }
}

pub struct VisionPipeline<Camera: CameraTrait, Model, Screen> {
    camera: Camera,
    detector: Model,
    display: Screen,
    processor: FrameProcessor,
}

impl<Camera, Model, Screen> VisionPipeline<Camera, Model, Screen>
where
    Camera: CameraTrait,
    Model: Detector,
    Screen: Display,
{
    pub fn new(camera: Camera, detector: Model, display: Screen, processor: FrameProcessor) -> Self {
        VisionPipeline {
            camera,
            detector,
            display,
            processor,
        }
    }

    /// Processes and shows frames until the quit key is pressed.
    ///
    /// Returns the number of frames displayed.
    pub fn run(&mut self) -> Result<u64> {
        let mut shown = 0;

        for frame in frames(&mut self.camera) {
            let frame = frame.context("Failed to read frame from camera")?;

            let annotated = self.processor.process(frame, &mut self.detector)?;

            self.display
                .show(&annotated.image)
                .context("Failed to display frame")?;
            shown += 1;

            if self.display.quit_requested()? {
                info!("Quit requested after {shown} frames");
                break;
            }
        }

        Ok(shown)
    }
}
