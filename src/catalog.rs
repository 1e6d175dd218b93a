use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Class names in the order MobileNet-SSD emits class indices.
pub const MOBILENET_SSD_CLASSES: &[&str] = &[
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "smartphone",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// Assumed real-world object heights in centimeters.
pub const KNOWN_HEIGHTS_CM: &[(&str, f64)] = &[
    ("person", 170.),
    ("bottle", 30.),
    ("car", 150.),
    ("bus", 300.),
    ("chair", 100.),
    ("diningtable", 75.),
    ("tvmonitor", 60.),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassCatalog {
    labels: Vec<String>,
}

impl ClassCatalog {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        ClassCatalog {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolves a model class index. Negative or past-the-end indices yield `None`.
    pub fn label(&self, class_idx: i64) -> Option<&str> {
        usize::try_from(class_idx)
            .ok()
            .and_then(|idx| self.labels.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        ClassCatalog::new(MOBILENET_SSD_CLASSES.iter().copied())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownHeights {
    heights_cm: BTreeMap<String, f64>,
}

impl KnownHeights {
    pub fn new<S: Into<String>>(heights: impl IntoIterator<Item = (S, f64)>) -> Self {
        KnownHeights {
            heights_cm: heights
                .into_iter()
                .map(|(label, height)| (label.into(), height))
                .collect(),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.heights_cm.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.heights_cm
            .iter()
            .map(|(label, height)| (label.as_str(), *height))
    }
}

impl Default for KnownHeights {
    fn default() -> Self {
        KnownHeights::new(KNOWN_HEIGHTS_CM.iter().copied())
    }
}
