use serde::{Deserialize, Serialize};

/// Every way a string splits into dictionary words.
///
/// Empty means the string has no full cover. Each inner vector is one
/// segmentation, words in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub segmentations: Vec<Vec<String>>,
}

impl SegmentationResult {
    pub fn is_empty(&self) -> bool {
        self.segmentations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segmentations.len()
    }

    /// Each segmentation joined with single spaces, e.g. `"race car"`.
    pub fn phrases(&self) -> Vec<String> {
        self.segmentations
            .iter()
            .map(|words| words.join(" "))
            .collect()
    }
}
