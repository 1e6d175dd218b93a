use std::{thread, time::Duration};

use log::{info, warn};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::config::CameraConfig;
use crate::error::{Result, VisionError};
use crate::traits::Camera;

pub struct OpenCvCamera {
    capture: VideoCapture,
    config: CameraConfig,
}

impl OpenCvCamera {
    pub fn new(config: CameraConfig) -> Result<Self> {
        let mut capture = VideoCapture::new(config.index, videoio::CAP_ANY)
            .map_err(|e| VisionError::Camera(format!("failed to open camera {}: {}", config.index, e.message)))?;

        if !capture.is_opened()? {
            return Err(VisionError::Camera(format!(
                "camera {} failed to open",
                config.index
            )));
        }

        let requests = [
            ("width", videoio::CAP_PROP_FRAME_WIDTH, config.width as f64),
            ("height", videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64),
            ("fps", videoio::CAP_PROP_FPS, config.fps),
        ];
        for (name, prop, value) in requests {
            if !capture.set(prop, value)? {
                warn!("Camera {} ignored {name} = {value}", config.index);
            }
        }

        info!(
            "Camera {} opened at {}x{} @ {}fps",
            config.index, config.width, config.height, config.fps
        );

        // Allow the sensor to settle before the first frame.
        thread::sleep(Duration::from_millis(config.warmup_ms));

        Ok(OpenCvCamera { capture, config })
    }
}

impl Camera for OpenCvCamera {
    fn grab_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();

        if !self.capture.read(&mut frame)? || frame.empty() {
            return Err(VisionError::Camera(format!(
                "camera {} returned no frame",
                self.config.index
            )));
        }

        Ok(frame)
    }
}

/// Lazy, infinite frame sequence pulled from a camera.
///
/// The sequence never ends on its own; the consumer decides when to stop.
/// Once it yields an error it is fused and yields nothing further.
pub struct Frames<'a, C: Camera> {
    camera: &'a mut C,
    failed: bool,
}

impl<'a, C: Camera> Iterator for Frames<'a, C> {
    type Item = Result<Mat>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let frame = self.camera.grab_frame();
        self.failed = frame.is_err();
        Some(frame)
    }
}

pub fn frames<C: Camera>(camera: &mut C) -> Frames<'_, C> {
    Frames {
        camera,
        failed: false,
    }
}
