use std::{path::Path, sync::Arc};

use snafu::{ResultExt, ensure};

use crate::error::{ConfigReadSnafu, DetectError, UnknownClassSnafu};

/// COCO class names in the order the stock detector was exported with.
#[rustfmt::skip]
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorbike", "aeroplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "sofa", "pottedplant", "bed", "diningtable", "toilet", "tvmonitor", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Box colors cycled by class id when drawing detections.
const PALETTE: [[u8; 3]; 11] = [
    [255, 0, 0],     // Red
    [0, 255, 0],     // Green
    [0, 0, 255],     // Blue
    [255, 255, 0],   // Yellow
    [255, 0, 255],   // Magenta
    [0, 255, 255],   // Cyan
    [128, 0, 128],   // Purple
    [255, 165, 0],   // Orange
    [128, 128, 128], // Gray
    [0, 128, 0],     // Dark Green
    [255, 20, 147],  // Deep Pink
];

/// Ordered, immutable table of class names; index = class id.
///
/// Cloning shares the underlying table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCatalog {
    names: Arc<[String]>,
}

impl ClassCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The 80-class COCO catalog.
    pub fn coco() -> Self {
        Self::new(COCO_CLASSES)
    }

    /// Loads a newline separated list of names. Blank lines are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context(ConfigReadSnafu {
            path: path.to_string_lossy(),
        })?;

        Ok(Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        ))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Looks up a class name, failing with `UnknownClass` when out of range.
    pub fn name(&self, class_id: u32) -> Result<&str, DetectError> {
        let idx = class_id as usize;
        ensure!(
            idx < self.names.len(),
            UnknownClassSnafu {
                class_id,
                catalog_size: self.names.len(),
            }
        );
        Ok(&self.names[idx])
    }

    pub const fn color(class_id: u32) -> [u8; 3] {
        PALETTE[class_id as usize % PALETTE.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::coco()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_catalog() {
        let catalog = ClassCatalog::coco();
        assert_eq!(catalog.len(), 80);
        assert_eq!(catalog.name(0).unwrap(), "person");
        assert_eq!(catalog.name(2).unwrap(), "car");
        assert_eq!(catalog.name(79).unwrap(), "toothbrush");
    }

    #[test]
    fn test_unknown_class() {
        let catalog = ClassCatalog::new(["cat", "dog"]);
        let err = catalog.name(2).unwrap_err();
        assert!(matches!(
            err,
            DetectError::UnknownClass {
                class_id: 2,
                catalog_size: 2
            }
        ));
    }

    #[test]
    fn test_clone_shares_table() {
        let catalog = ClassCatalog::coco();
        let shared = catalog.clone();
        assert!(Arc::ptr_eq(&catalog.names, &shared.names));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "cat\n\n  dog  \nbird\n").unwrap();

        let catalog = ClassCatalog::from_file(&path).unwrap();

        assert_eq!(catalog.iter().collect::<Vec<_>>(), vec!["cat", "dog", "bird"]);
    }

    #[test]
    fn test_color_cycles() {
        assert_eq!(ClassCatalog::color(0), ClassCatalog::color(11));
        assert_ne!(ClassCatalog::color(0), ClassCatalog::color(1));
    }
}
