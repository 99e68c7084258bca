//! Visual comparison configuration.

use crate::compare::check_unit;
use crate::error::{Error, Result};
use crate::model::BoundingBox;
use serde::{Deserialize, Serialize};

/// Options for comparing two page images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualOptions {
    /// Minimum SSIM for the comparison to pass
    pub threshold: f64,

    /// Regions (image pixels) excluded from every metric
    pub masks: Vec<BoundingBox>,

    /// Resize the candidate to the baseline size when they differ
    pub auto_resize: bool,

    /// Optional upper bound on the fraction of differing pixels
    pub max_pixel_diff_ratio: Option<f64>,

    /// Per-channel difference tolerated before a pixel counts as changed
    pub pixel_tolerance: u8,

    /// Side of the square SSIM window in pixels
    pub window_size: u32,
}

impl VisualOptions {
    /// Create new visual options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SSIM threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Exclude a region from comparison.
    pub fn with_mask(mut self, region: BoundingBox) -> Self {
        self.masks.push(region);
        self
    }

    /// Exclude several regions from comparison.
    pub fn with_masks(mut self, regions: impl IntoIterator<Item = BoundingBox>) -> Self {
        self.masks.extend(regions);
        self
    }

    /// Enable or disable resizing of the candidate.
    pub fn with_auto_resize(mut self, auto_resize: bool) -> Self {
        self.auto_resize = auto_resize;
        self
    }

    /// Also require the differing-pixel fraction to stay under a bound.
    pub fn with_max_pixel_diff_ratio(mut self, ratio: f64) -> Self {
        self.max_pixel_diff_ratio = Some(ratio);
        self
    }

    /// Set the per-channel pixel tolerance.
    pub fn with_pixel_tolerance(mut self, tolerance: u8) -> Self {
        self.pixel_tolerance = tolerance;
        self
    }

    /// Reject invalid thresholds and window sizes.
    pub fn validate(&self) -> Result<()> {
        check_unit("visual threshold", self.threshold)?;
        if let Some(ratio) = self.max_pixel_diff_ratio {
            check_unit("max_pixel_diff_ratio", ratio)?;
        }
        if self.window_size < 2 {
            return Err(Error::config(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        for mask in &self.masks {
            if !mask.x.is_finite()
                || !mask.y.is_finite()
                || !mask.width.is_finite()
                || !mask.height.is_finite()
                || mask.width < 0.0
                || mask.height < 0.0
            {
                return Err(Error::config(format!("invalid mask region {:?}", mask)));
            }
        }
        Ok(())
    }
}

impl Default for VisualOptions {
    fn default() -> Self {
        Self {
            threshold: 0.95,
            masks: Vec::new(),
            auto_resize: true,
            max_pixel_diff_ratio: None,
            pixel_tolerance: 0,
            window_size: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = VisualOptions::default();
        assert_eq!(options.threshold, 0.95);
        assert!(options.auto_resize);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options() {
        assert!(VisualOptions::new().with_threshold(1.2).validate().is_err());
        assert!(VisualOptions::new()
            .with_max_pixel_diff_ratio(-0.5)
            .validate()
            .is_err());
        assert!(VisualOptions::new()
            .with_mask(BoundingBox::region(0.0, 0.0, -5.0, 5.0))
            .validate()
            .is_err());
    }
}
