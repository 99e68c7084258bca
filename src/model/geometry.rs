//! Spatial types shared by content elements and image masks.

use serde::{Deserialize, Serialize};

/// Unit in which every bounding box of one document is expressed.
///
/// Units are recorded, never converted: callers convert before comparing
/// documents produced in different units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateUnit {
    /// PDF points (1/72 inch)
    #[default]
    Points,
    /// Rendered image pixels
    Pixels,
    /// Fractions of the page size (0.0 - 1.0)
    Normalized,
}

/// An axis-aligned rectangle on a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Page number (1-indexed)
    #[serde(default = "first_page")]
    pub page: u32,

    /// Left edge
    pub x: f64,

    /// Top edge
    pub y: f64,

    /// Width (must be positive to be valid)
    pub width: f64,

    /// Height (must be positive to be valid)
    pub height: f64,

    /// Detection confidence reported by the producer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

fn first_page() -> u32 {
    1
}

impl BoundingBox {
    /// Create a bounding box on the given page.
    pub fn new(page: u32, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            page,
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    /// Create a pixel-space region on page 1, used for image masks.
    pub fn region(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(1, x, y, width, height)
    }

    /// Set the producer-reported confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area, zero for degenerate boxes.
    pub fn area(&self) -> f64 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width * self.height
        } else {
            0.0
        }
    }

    /// Whether the box has a 1-indexed page, finite coordinates and positive size.
    pub fn is_valid(&self) -> bool {
        self.page >= 1
            && self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Whether the box lies inside a page of the given size.
    pub fn fits_within(&self, page_width: f64, page_height: f64) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.right() <= page_width && self.bottom() <= page_height
    }

    /// Overlapping area with another box on the same page.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        if self.page != other.page {
            return 0.0;
        }
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Whether both boxes cover the same page region, ignoring confidence.
    ///
    /// NaN coordinates equal each other here, so any box is the same region
    /// as itself.
    pub fn same_region(&self, other: &BoundingBox) -> bool {
        let same = |a: f64, b: f64| a == b || (a.is_nan() && b.is_nan());
        self.page == other.page
            && same(self.x, other.x)
            && same(self.y, other.y)
            && same(self.width, other.width)
            && same(self.height, other.height)
    }

    /// Intersection over union, in `[0, 1]`.
    ///
    /// Boxes on different pages, disjoint boxes and degenerate boxes all
    /// yield 0.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let inter = self.intersection_area(other);
        if inter <= 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        (inter / union).clamp(0.0, 1.0)
    }
}
