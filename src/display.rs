use log::info;
use opencv::{core::Mat, highgui};

use crate::error::{Result, VisionError};
use crate::traits::Display;

pub const WINDOW_TITLE: &str = "Real-time Object Detection and Distance Measurement";

const QUIT_KEY: u8 = b'q';

pub struct HighGuiDisplay {
    title: String,
}

impl HighGuiDisplay {
    pub fn new(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| VisionError::Display(format!("failed to open window: {}", e.message)))?;

        Ok(HighGuiDisplay {
            title: title.to_string(),
        })
    }
}

impl Display for HighGuiDisplay {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.title, frame)?;
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        let key = highgui::wait_key(1)?;
        Ok(key >= 0 && (key & 0xFF) as u8 == QUIT_KEY)
    }
}

impl Drop for HighGuiDisplay {
    fn drop(&mut self) {
        if highgui::destroy_all_windows().is_ok() {
            info!("Closed display windows");
        }
    }
}
