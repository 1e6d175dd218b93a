use log::warn;
use ndarray::ArrayView2;
use opencv::{core::Mat, prelude::*};

use crate::error::Result;

/// Values per candidate row: `[image_id, class_idx, confidence, x0, y0, x1, y1]`.
pub const DETECTION_FIELDS: usize = 7;

/// One candidate slot of the SSD output, box still normalized to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDetection {
    pub class_idx: i64,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

impl RawDetection {
    pub fn new(class_idx: i64, confidence: f32, bbox: [f32; 4]) -> Self {
        RawDetection {
            class_idx,
            confidence,
            bbox,
        }
    }
}

/// Reads the flat candidate table in model order.
///
/// Returns `None` when the value count is not a whole number of rows.
pub fn parse_detections(values: &[f32]) -> Option<Vec<RawDetection>> {
    if values.len() % DETECTION_FIELDS != 0 {
        return None;
    }

    let rows = values.len() / DETECTION_FIELDS;
    let table = ArrayView2::from_shape((rows, DETECTION_FIELDS), values).ok()?;

    Some(
        table
            .outer_iter()
            .map(|row| {
                RawDetection::new(
                    row[1] as i64,
                    row[2],
                    [row[3], row[4], row[5], row[6]],
                )
            })
            .collect(),
    )
}

/// Decodes a `[1, 1, N, 7]` float output blob.
///
/// A blob of unexpected shape yields zero candidates for the frame rather than
/// an error.
pub fn detections_from_blob(blob: &Mat) -> Result<Vec<RawDetection>> {
    if blob.empty() {
        return Ok(Vec::new());
    }

    let values = blob.data_typed::<f32>()?;

    match parse_detections(values) {
        Some(detections) => Ok(detections),
        None => {
            warn!(
                "Discarding detector output with {} values (not a multiple of {DETECTION_FIELDS})",
                values.len()
            );
            Ok(Vec::new())
        }
    }
}
