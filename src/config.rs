//! Runtime configuration.
//!
//! Every field defaults to the compiled-in calibration constants, so an empty
//! `config.json` (or none at all) reproduces the stock behavior. Any subset of
//! fields may be overridden.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::catalog::{ClassCatalog, KnownHeights};
use crate::error::{Result, VisionError};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Caffe network topology (`deploy.prototxt`).
    pub prototxt: PathBuf,
    /// Trained Caffe weights.
    pub weights: PathBuf,
    /// Side length of the square network input.
    pub input_size: i32,
    pub scale_factor: f64,
    pub mean: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            prototxt: PathBuf::from("models/deploy.prototxt"),
            weights: PathBuf::from("models/mobilenet_iter_73000.caffemodel"),
            input_size: 300,
            scale_factor: 0.007843,
            mean: 127.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: i32,
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    pub warmup_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            index: 0,
            width: 640,
            height: 480,
            fps: 30.,
            warmup_ms: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangingConfig {
    /// Candidates at or below this confidence are dropped.
    pub confidence_threshold: f32,
    /// Pinhole focal length in pixels.
    pub focal_length: f64,
    /// Distances strictly below this raise the near alert.
    pub near_distance_cm: f64,
}

impl Default for RangingConfig {
    fn default() -> Self {
        RangingConfig {
            confidence_threshold: 0.2,
            focal_length: 615.,
            near_distance_cm: 50.,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model: ModelConfig,
    pub camera: CameraConfig,
    pub ranging: RangingConfig,
    pub palette_seed: u64,
    pub classes: ClassCatalog,
    pub known_heights: KnownHeights,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            model: ModelConfig::default(),
            camera: CameraConfig::default(),
            ranging: RangingConfig::default(),
            palette_seed: 4904,
            classes: ClassCatalog::default(),
            known_heights: KnownHeights::default(),
        }
    }
}

impl DetectorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: DetectorConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if given, otherwise `config.json` when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::from_file(default_path)
                } else {
                    info!("No {DEFAULT_CONFIG_PATH} found, using built-in defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(VisionError::Config(msg.to_string()));

        if !(0. ..1.).contains(&self.ranging.confidence_threshold) {
            return invalid("confidence_threshold must be in [0, 1)");
        }
        if self.ranging.focal_length <= 0. {
            return invalid("focal_length must be positive");
        }
        if self.ranging.near_distance_cm <= 0. {
            return invalid("near_distance_cm must be positive");
        }
        if self.model.input_size <= 0 {
            return invalid("model input_size must be positive");
        }
        if self.camera.width <= 0 || self.camera.height <= 0 || self.camera.fps <= 0. {
            return invalid("camera resolution and fps must be positive");
        }
        if self.classes.is_empty() {
            return invalid("class catalog must not be empty");
        }
        if let Some((label, _)) = self.known_heights.iter().find(|(_, h)| *h <= 0.) {
            return Err(VisionError::Config(format!(
                "known height for {label} must be positive"
            )));
        }

        Ok(())
    }
}
