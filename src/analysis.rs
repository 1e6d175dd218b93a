//! Monocular ranging from bounding-box height.
//!
//! Uses the pinhole approximation `distance = real_height * focal_length /
//! pixel_height`, with a per-class assumed real height.

use log::debug;

use crate::catalog::{ClassCatalog, KnownHeights};
use crate::config::{DetectorConfig, RangingConfig};
use crate::detection::RawDetection;

/// Pixel-space box, corners truncated toward zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBox {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl PixelBox {
    pub fn from_normalized(bbox: [f32; 4], width: i32, height: i32) -> Self {
        let (w, h) = (width as f32, height as f32);

        PixelBox {
            start_x: (bbox[0] * w) as i32,
            start_y: (bbox[1] * h) as i32,
            end_x: (bbox[2] * w) as i32,
            end_y: (bbox[3] * h) as i32,
        }
    }

    /// Widened so saturated corners cannot overflow.
    pub fn perceived_height(&self) -> i64 {
        i64::from(self.end_y) - i64::from(self.start_y)
    }
}

/// A candidate that survived filtering, with its estimated distance.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub class_idx: usize,
    pub label: String,
    pub confidence: f32,
    pub pixel_box: PixelBox,
    pub distance_cm: f64,
    pub near: bool,
}

impl Measurement {
    pub fn display_text(&self) -> String {
        format!("{}: {:.2}cm", self.label, self.distance_cm)
    }
}

pub fn estimate_distance(
    known_height: f64,
    focal_length: f64,
    perceived_height: i64,
) -> Option<f64> {
    if perceived_height > 0 {
        Some(known_height * focal_length / perceived_height as f64)
    } else {
        None
    }
}

pub struct DistanceAnalyzer {
    classes: ClassCatalog,
    known_heights: KnownHeights,
    ranging: RangingConfig,
}

impl DistanceAnalyzer {
    pub fn new(config: &DetectorConfig) -> Self {
        DistanceAnalyzer {
            classes: config.classes.clone(),
            known_heights: config.known_heights.clone(),
            ranging: config.ranging.clone(),
        }
    }

    pub fn is_near(&self, distance_cm: f64) -> bool {
        distance_cm < self.ranging.near_distance_cm
    }

    /// Filters and ranges one candidate against a `width` x `height` frame.
    pub fn analyze(
        &self,
        detection: &RawDetection,
        width: i32,
        height: i32,
    ) -> Option<Measurement> {
        if detection.confidence.is_nan()
            || detection.confidence <= self.ranging.confidence_threshold
        {
            return None;
        }

        if detection.bbox.iter().any(|v| !v.is_finite()) {
            debug!("Skipping candidate with non-finite box {:?}", detection.bbox);
            return None;
        }

        let label = match self.classes.label(detection.class_idx) {
            Some(label) => label,
            None => {
                debug!("Skipping candidate with unknown class index {}", detection.class_idx);
                return None;
            }
        };

        let known_height = self.known_heights.get(label)?;
        let pixel_box = PixelBox::from_normalized(detection.bbox, width, height);
        let distance_cm = estimate_distance(
            known_height,
            self.ranging.focal_length,
            pixel_box.perceived_height(),
        )?;

        Some(Measurement {
            class_idx: detection.class_idx as usize,
            label: label.to_string(),
            confidence: detection.confidence,
            pixel_box,
            distance_cm,
            near: self.is_near(distance_cm),
        })
    }

    /// Ranges all candidates, preserving model order.
    pub fn analyze_all(
        &self,
        detections: &[RawDetection],
        width: i32,
        height: i32,
    ) -> Vec<Measurement> {
        detections
            .iter()
            .filter_map(|detection| self.analyze(detection, width, height))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const BOTTLE: i64 = 5;
    const DOG: i64 = 12;
    const PERSON: i64 = 15;

    fn analyzer() -> DistanceAnalyzer {
        DistanceAnalyzer::new(&DetectorConfig::default())
    }

    #[test]
    fn test_person_distance() {
        assert_relative_eq!(estimate_distance(170., 615., 51).unwrap(), 2050.0);
    }

    #[rstest]
    #[case(0)]
    #[case(-12)]
    fn test_no_distance_without_positive_height(#[case] perceived_height: i64) {
        assert_eq!(estimate_distance(170., 615., perceived_height), None);
    }

    #[test]
    fn test_bottle_scenario() {
        let detection = RawDetection::new(BOTTLE, 0.9, [0.4, 0.4, 0.5, 0.9]);

        let measurement = analyzer().analyze(&detection, 640, 480).unwrap();

        assert_eq!(
            measurement.pixel_box,
            PixelBox {
                start_x: 256,
                start_y: 192,
                end_x: 320,
                end_y: 432,
            }
        );
        assert_eq!(measurement.pixel_box.perceived_height(), 240);
        assert_relative_eq!(measurement.distance_cm, 76.875);
        assert!(!measurement.near);
        assert_eq!(measurement.display_text(), "bottle: 76.88cm");
    }

    #[rstest]
    #[case(0.15)]
    #[case(0.2)]
    #[case(0.0)]
    #[case(f32::NAN)]
    fn test_low_confidence_is_dropped(#[case] confidence: f32) {
        let detection = RawDetection::new(BOTTLE, confidence, [0.4, 0.4, 0.5, 0.9]);
        assert_eq!(analyzer().analyze(&detection, 640, 480), None);
    }

    #[test]
    fn test_class_without_known_height_is_dropped() {
        let detection = RawDetection::new(DOG, 0.95, [0.1, 0.1, 0.5, 0.9]);
        assert_eq!(analyzer().analyze(&detection, 640, 480), None);
    }

    #[rstest]
    #[case(22)]
    #[case(255)]
    #[case(-1)]
    fn test_out_of_range_class_is_dropped(#[case] class_idx: i64) {
        let detection = RawDetection::new(class_idx, 0.95, [0.1, 0.1, 0.5, 0.9]);
        assert_eq!(analyzer().analyze(&detection, 640, 480), None);
    }

    #[rstest]
    #[case([0.1, 0.5, 0.4, 0.5])]
    #[case([0.1, 0.6, 0.4, 0.5])]
    #[case([0., f32::NEG_INFINITY, 1., f32::INFINITY])]
    #[case([0., f32::NAN, 1., 0.9])]
    fn test_degenerate_box_is_dropped(#[case] bbox: [f32; 4]) {
        let detection = RawDetection::new(PERSON, 0.95, bbox);
        assert_eq!(analyzer().analyze(&detection, 640, 480), None);
    }

    #[test]
    fn test_saturated_corners_do_not_overflow() {
        let pixel_box = PixelBox::from_normalized([0., -1e30, 1., 1e30], 640, 480);

        assert_eq!(pixel_box.start_y, i32::MIN);
        assert_eq!(pixel_box.end_y, i32::MAX);
        assert_eq!(pixel_box.perceived_height(), i64::from(i32::MAX) - i64::from(i32::MIN));
    }

    #[rstest]
    #[case(49.999, true)]
    #[case(50.0, false)]
    #[case(50.001, false)]
    fn test_near_threshold_is_strict(#[case] distance: f64, #[case] near: bool) {
        assert_eq!(analyzer().is_near(distance), near);
    }

    #[test]
    fn test_measurement_at_exact_threshold_does_not_alert() {
        // 30 * 615 / 369 == 50.0
        let detection = RawDetection::new(BOTTLE, 0.9, [0.0, 0.0, 0.5, 0.5]);

        let measurement = analyzer().analyze(&detection, 640, 738).unwrap();

        assert_eq!(measurement.pixel_box.perceived_height(), 369);
        assert_eq!(measurement.distance_cm, 50.0);
        assert!(!measurement.near);
    }

    #[test]
    fn test_close_object_alerts() {
        let detection = RawDetection::new(BOTTLE, 0.9, [0.0, 0.0, 1.0, 1.0]);

        let measurement = analyzer().analyze(&detection, 640, 480).unwrap();

        assert_relative_eq!(measurement.distance_cm, 30. * 615. / 480.);
        assert!(measurement.near);
    }

    #[test]
    fn test_analyze_all_keeps_model_order() {
        let detections = [
            RawDetection::new(PERSON, 0.5, [0.0, 0.0, 0.1, 0.5]),
            RawDetection::new(BOTTLE, 0.1, [0.0, 0.0, 0.1, 0.5]),
            RawDetection::new(BOTTLE, 0.7, [0.0, 0.0, 0.1, 0.5]),
        ];

        let labels: Vec<_> = analyzer()
            .analyze_all(&detections, 640, 480)
            .into_iter()
            .map(|m| m.label)
            .collect();

        assert_eq!(labels, vec!["person", "bottle"]);
    }
}
