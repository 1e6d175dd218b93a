//! MobileNet-SSD inference through the OpenCV DNN module.

use log::info;
use opencv::{
    core::{Mat, Scalar, Size, CV_32F},
    dnn::{self, Net},
    imgproc,
    prelude::*,
};

use crate::config::ModelConfig;
use crate::detection::{detections_from_blob, RawDetection};
use crate::error::{Result, VisionError};
use crate::traits::Detector;

/// Resizes and normalizes a BGR frame into the network's NCHW input blob.
pub fn preprocess(frame: &Mat, config: &ModelConfig) -> Result<Mat> {
    let input_size = Size::new(config.input_size, config.input_size);

    let mut resized = Mat::default();
    imgproc::resize(frame, &mut resized, input_size, 0., 0., imgproc::INTER_LINEAR)?;

    let blob = dnn::blob_from_image(
        &resized,
        config.scale_factor,
        input_size,
        Scalar::all(config.mean),
        false,
        false,
        CV_32F,
    )?;

    Ok(blob)
}

pub struct CaffeSsdDetector {
    net: Net,
    config: ModelConfig,
}

impl CaffeSsdDetector {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        for path in [&config.prototxt, &config.weights] {
            if !path.is_file() {
                return Err(VisionError::Model(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let prototxt = config.prototxt.to_string_lossy();
        let weights = config.weights.to_string_lossy();

        let mut net = dnn::read_net_from_caffe(&prototxt, &weights)
            .map_err(|e| VisionError::Model(format!("failed to load {prototxt}: {}", e.message)))?;

        if net.empty()? {
            return Err(VisionError::Model(format!("{prototxt} produced an empty network")));
        }

        #[cfg(feature = "opencl")]
        net.set_preferable_target(dnn::DNN_TARGET_OPENCL)?;

        #[cfg(not(feature = "opencl"))]
        net.set_preferable_target(dnn::DNN_TARGET_CPU)?;

        info!(
            "Loaded MobileNet-SSD from {} / {} ({}x{} input)",
            prototxt, weights, config.input_size, config.input_size
        );

        Ok(CaffeSsdDetector {
            net,
            config: config.clone(),
        })
    }
}

impl Detector for CaffeSsdDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<RawDetection>> {
        let blob = preprocess(frame, &self.config)?;

        self.net.set_input(&blob, "", 1., Scalar::default())?;
        let output = self.net.forward_single("")?;

        detections_from_blob(&output)
    }
}
