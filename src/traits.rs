use opencv::core::Mat;

use crate::detection::RawDetection;
use crate::error::Result;

/// Source of BGR frames. Each call blocks until a frame is available.
pub trait Camera {
    fn grab_frame(&mut self) -> Result<Mat>;
}

/// Maps a BGR frame to the model's raw candidate table.
///
/// Inference mutates the network's internal buffers, hence `&mut self`.
pub trait Detector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<RawDetection>>;
}

pub trait Display {
    fn show(&mut self, frame: &Mat) -> Result<()>;

    /// Non-blocking poll for the quit key.
    fn quit_requested(&mut self) -> Result<bool>;
}
