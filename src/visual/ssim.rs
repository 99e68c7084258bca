//! Structural similarity on grayscale images.
//!
//! Mean SSIM over every `window x window` square, computed with summed-area
//! tables so each window costs O(1). Images smaller than the window are
//! treated as a single window.

use image::GrayImage;

const DATA_RANGE: f64 = 255.0;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Summed-area table with one row and column of zero padding.
struct Integral {
    width: usize,
    sums: Vec<f64>,
}

impl Integral {
    fn build(width: usize, height: usize, value: impl Fn(usize, usize) -> f64) -> Self {
        let stride = width + 1;
        let mut sums = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += value(x, y);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { width, sums }
    }

    /// Sum over `[x0, x1) x [y0, y1)`.
    fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        let stride = self.width + 1;
        self.sums[y1 * stride + x1] - self.sums[y0 * stride + x1] - self.sums[y1 * stride + x0]
            + self.sums[y0 * stride + x0]
    }
}

/// Mean SSIM of two equally sized grayscale images.
///
/// Returns exactly 1.0 for identical inputs. Callers guarantee equal
/// dimensions.
pub fn ssim(a: &GrayImage, b: &GrayImage, window: u32) -> f64 {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    if a.as_raw() == b.as_raw() {
        return 1.0;
    }

    let (width, height) = (a.width() as usize, a.height() as usize);
    if width == 0 || height == 0 {
        return 1.0;
    }
    let win_w = (window as usize).min(width);
    let win_h = (window as usize).min(height);

    let pa = |x: usize, y: usize| a.as_raw()[y * width + x] as f64;
    let pb = |x: usize, y: usize| b.as_raw()[y * width + x] as f64;

    let sum_a = Integral::build(width, height, pa);
    let sum_b = Integral::build(width, height, pb);
    let sum_aa = Integral::build(width, height, |x, y| pa(x, y) * pa(x, y));
    let sum_bb = Integral::build(width, height, |x, y| pb(x, y) * pb(x, y));
    let sum_ab = Integral::build(width, height, |x, y| pa(x, y) * pb(x, y));

    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);
    let n = (win_w * win_h) as f64;

    let mut total = 0.0;
    let mut windows = 0usize;
    for y0 in 0..=(height - win_h) {
        for x0 in 0..=(width - win_w) {
            let (x1, y1) = (x0 + win_w, y0 + win_h);
            let mu_a = sum_a.sum(x0, y0, x1, y1) / n;
            let mu_b = sum_b.sum(x0, y0, x1, y1) / n;
            let var_a = sum_aa.sum(x0, y0, x1, y1) / n - mu_a * mu_a;
            let var_b = sum_bb.sum(x0, y0, x1, y1) / n - mu_b * mu_b;
            let cov = sum_ab.sum(x0, y0, x1, y1) / n - mu_a * mu_b;

            let numerator = (2.0 * mu_a * mu_b + c1) * (2.0 * cov + c2);
            let denominator = (mu_a * mu_a + mu_b * mu_b + c1) * (var_a + var_b + c2);
            total += numerator / denominator;
            windows += 1;
        }
    }

    (total / windows as f64).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]))
    }

    #[test]
    fn test_identical_is_one() {
        let img = gradient(40, 30);
        assert_eq!(ssim(&img, &img, 7), 1.0);
    }

    #[test]
    fn test_inverted_is_low() {
        let img = gradient(40, 30);
        let inverted = GrayImage::from_fn(40, 30, |x, y| Luma([255 - img.get_pixel(x, y)[0]]));
        assert!(ssim(&img, &inverted, 7) < 0.2);
    }

    #[test]
    fn test_small_noise_stays_high() {
        let img = gradient(40, 30);
        let noisy = GrayImage::from_fn(40, 30, |x, y| {
            let v = img.get_pixel(x, y)[0];
            Luma([if (x + y) % 5 == 0 { v.saturating_add(2) } else { v }])
        });
        let score = ssim(&img, &noisy, 7);
        assert!(score > 0.95 && score < 1.0, "score = {}", score);
    }

    #[test]
    fn test_image_smaller_than_window() {
        let a = GrayImage::from_pixel(3, 3, Luma([100]));
        let b = GrayImage::from_pixel(3, 3, Luma([110]));
        let score = ssim(&a, &b, 7);
        assert!(score > 0.9 && score < 1.0);
    }

    #[test]
    fn test_integral_sum() {
        let table = Integral::build(3, 2, |x, y| (x + 3 * y) as f64);
        // 0 1 2 / 3 4 5
        assert_eq!(table.sum(0, 0, 3, 2), 15.0);
        assert_eq!(table.sum(1, 0, 3, 2), 12.0);
        assert_eq!(table.sum(1, 1, 2, 2), 4.0);
    }
}
