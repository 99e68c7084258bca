//! Perceptual comparison of rendered page images.
//!
//! Images are compared with mean SSIM on the luma channel plus the ratio of
//! differing RGB pixels. Mask regions are painted with the same neutral gray
//! on both sides before any metric is computed, so dynamic content such as
//! timestamps cannot cause a failure.
//!
//! # Example
//!
//! ```
//! use docparity::model::BoundingBox;
//! use docparity::visual::{compare_images, VisualOptions};
//! use image::{DynamicImage, RgbImage, Rgb};
//!
//! let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 255, 255])));
//! let options = VisualOptions::new().with_mask(BoundingBox::region(0.0, 0.0, 32.0, 8.0));
//! let result = compare_images(&page, &page, &options).unwrap();
//! assert!(result.passed);
//! assert_eq!(result.ssim_score, 1.0);
//! ```

mod options;
mod ssim;

pub use options::VisualOptions;
pub use ssim::ssim;

use crate::error::{Error, Result};
use crate::model::BoundingBox;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fill value for masked pixels.
const MASK_FILL: Rgb<u8> = Rgb([128, 128, 128]);

/// Highlight color for differing pixels in [`diff_image`].
const DIFF_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Outcome of comparing two images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualResult {
    /// Mean structural similarity (1.0 = identical)
    pub ssim_score: f64,

    /// Fraction of unmasked pixels that differ
    pub pixel_diff_ratio: f64,

    /// Whether the configured criteria were met
    pub passed: bool,

    /// Width the images were compared at
    pub width: u32,

    /// Height the images were compared at
    pub height: u32,

    /// Whether the candidate was resized to the baseline size
    pub resized: bool,

    /// Number of pixels excluded by masks
    pub masked_pixels: u64,

    /// Why the comparison could not be performed, if it could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl VisualResult {
    fn failed(width: u32, height: u32, reason: String) -> Self {
        Self {
            ssim_score: 0.0,
            pixel_diff_ratio: 1.0,
            passed: false,
            width,
            height,
            resized: false,
            masked_pixels: 0,
            failure: Some(reason),
        }
    }
}

/// Both images at a common size with masks applied.
struct Prepared {
    baseline: RgbImage,
    candidate: RgbImage,
    masked: Vec<bool>,
    resized: bool,
}

fn prepare(
    baseline: &DynamicImage,
    candidate: &DynamicImage,
    options: &VisualOptions,
) -> std::result::Result<Prepared, String> {
    let mut base = baseline.to_rgb8();
    let mut cand = candidate.to_rgb8();
    let (width, height) = base.dimensions();
    if width == 0 || height == 0 {
        return Err("baseline image is empty".to_string());
    }
    if cand.width() == 0 || cand.height() == 0 {
        return Err("candidate image is empty".to_string());
    }

    let mut resized = false;
    if cand.dimensions() != base.dimensions() {
        if !options.auto_resize {
            return Err(format!(
                "dimension mismatch: baseline {}x{}, candidate {}x{}",
                width,
                height,
                cand.width(),
                cand.height()
            ));
        }
        log::debug!(
            "resizing candidate from {}x{} to {}x{}",
            cand.width(),
            cand.height(),
            width,
            height
        );
        cand = imageops::resize(&cand, width, height, FilterType::Lanczos3);
        resized = true;
    }

    let mut masked = vec![false; (width as usize) * (height as usize)];
    for region in &options.masks {
        if let Some((x0, y0, x1, y1)) = pixel_rect(region, width, height) {
            for y in y0..y1 {
                for x in x0..x1 {
                    base.put_pixel(x, y, MASK_FILL);
                    cand.put_pixel(x, y, MASK_FILL);
                    masked[(y as usize) * (width as usize) + x as usize] = true;
                }
            }
        }
    }

    Ok(Prepared {
        baseline: base,
        candidate: cand,
        masked,
        resized,
    })
}

/// Clip a region to the image and round it outwards to whole pixels.
fn pixel_rect(region: &BoundingBox, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = region.x.floor().max(0.0);
    let y0 = region.y.floor().max(0.0);
    let x1 = region.right().ceil().min(width as f64);
    let y1 = region.bottom().ceil().min(height as f64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

fn differs(a: &Rgb<u8>, b: &Rgb<u8>, tolerance: u8) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .any(|(x, y)| x.abs_diff(*y) > tolerance)
}

/// Compare a candidate page image against a baseline.
///
/// A dimension mismatch with auto-resize disabled, or an empty image,
/// yields a failed result with [`VisualResult::failure`] set rather than an
/// error. Errors are reserved for invalid options.
pub fn compare_images(
    baseline: &DynamicImage,
    candidate: &DynamicImage,
    options: &VisualOptions,
) -> Result<VisualResult> {
    options.validate()?;

    let prepared = match prepare(baseline, candidate, options) {
        Ok(prepared) => prepared,
        Err(reason) => {
            log::warn!("visual comparison not performed: {}", reason);
            return Ok(VisualResult::failed(
                baseline.width(),
                baseline.height(),
                reason,
            ));
        }
    };

    let (width, height) = prepared.baseline.dimensions();
    let masked_pixels = prepared.masked.iter().filter(|&&m| m).count();
    let unmasked = prepared.masked.len() - masked_pixels;

    let changed = prepared
        .baseline
        .pixels()
        .zip(prepared.candidate.pixels())
        .zip(&prepared.masked)
        .filter(|((a, b), masked)| !**masked && differs(a, b, options.pixel_tolerance))
        .count();
    let pixel_diff_ratio = if unmasked == 0 {
        0.0
    } else {
        changed as f64 / unmasked as f64
    };

    let gray_a = imageops::grayscale(&prepared.baseline);
    let gray_b = imageops::grayscale(&prepared.candidate);
    let ssim_score = ssim(&gray_a, &gray_b, options.window_size);

    let passed = ssim_score >= options.threshold
        && options
            .max_pixel_diff_ratio
            .map_or(true, |max| pixel_diff_ratio <= max);

    log::debug!(
        "visual comparison {}x{}: ssim {:.4}, {:.2}% pixels differ, passed={}",
        width,
        height,
        ssim_score,
        pixel_diff_ratio * 100.0,
        passed
    );

    Ok(VisualResult {
        ssim_score,
        pixel_diff_ratio,
        passed,
        width,
        height,
        resized: prepared.resized,
        masked_pixels: masked_pixels as u64,
        failure: None,
    })
}

/// Load two image files and compare them.
pub fn compare_image_files<P: AsRef<Path>, Q: AsRef<Path>>(
    baseline: P,
    candidate: Q,
    options: &VisualOptions,
) -> Result<VisualResult> {
    let baseline = image::open(baseline)?;
    let candidate = image::open(candidate)?;
    compare_images(&baseline, &candidate, options)
}

/// Render the candidate with every differing unmasked pixel painted red.
pub fn diff_image(
    baseline: &DynamicImage,
    candidate: &DynamicImage,
    options: &VisualOptions,
) -> Result<RgbImage> {
    options.validate()?;
    let prepared = prepare(baseline, candidate, options).map_err(Error::Other)?;
    let width = prepared.baseline.width() as usize;

    let mut out = prepared.candidate.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let idx = (y as usize) * width + x as usize;
        if !prepared.masked[idx]
            && differs(
                prepared.baseline.get_pixel(x, y),
                pixel,
                options.pixel_tolerance,
            )
        {
            *pixel = DIFF_COLOR;
        }
    }
    Ok(out)
}
