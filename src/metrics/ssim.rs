use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

// Standard SSIM constants for 8-bit dynamic range (Wang et al., 2004).
const K1: f64 = 0.01;
const K2: f64 = 0.03;
const L: f64 = 255.0;
const WINDOW: u32 = 8;

/// Structural similarity of two images, range [0, 1], 1.0 = identical.
/// Both images are resized to a `size`×`size` canonical square first so the
/// score does not depend on the source resolutions.
pub fn similarity(a: &DynamicImage, b: &DynamicImage, size: u32) -> f64 {
    let ga = canonical_gray(a, size);
    let gb = canonical_gray(b, size);
    windowed_ssim(&ga, &gb)
}

fn canonical_gray(image: &DynamicImage, size: u32) -> GrayImage {
    image.resize_exact(size, size, FilterType::Triangle).to_luma8()
}

/// Mean SSIM over non-overlapping windows. Both buffers have identical
/// dimensions by construction.
fn windowed_ssim(a: &GrayImage, b: &GrayImage) -> f64 {
    let (width, height) = a.dimensions();
    let c1 = (K1 * L) * (K1 * L);
    let c2 = (K2 * L) * (K2 * L);

    let mut sum = 0.0;
    let mut windows = 0u32;

    let mut y = 0;
    while y < height {
        let wh = WINDOW.min(height - y);
        let mut x = 0;
        while x < width {
            let ww = WINDOW.min(width - x);
            sum += window_score(a, b, x, y, ww, wh, c1, c2);
            windows += 1;
            x += WINDOW;
        }
        y += WINDOW;
    }

    if windows == 0 { 0.0 } else { sum / f64::from(windows) }
}

#[allow(clippy::too_many_arguments)]
fn window_score(a: &GrayImage, b: &GrayImage, x0: u32, y0: u32, w: u32, h: u32, c1: f64, c2: f64) -> f64 {
    let n = f64::from(w * h);

    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            sum_a += f64::from(a.get_pixel(x, y)[0]);
            sum_b += f64::from(b.get_pixel(x, y)[0]);
        }
    }
    let mean_a = sum_a / n;
    let mean_b = sum_b / n;

    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut covar = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let da = f64::from(a.get_pixel(x, y)[0]) - mean_a;
            let db = f64::from(b.get_pixel(x, y)[0]) - mean_b;
            var_a += da * da;
            var_b += db * db;
            covar += da * db;
        }
    }
    var_a /= n;
    var_b /= n;
    covar /= n;

    let numerator = (2.0 * mean_a * mean_b + c1) * (2.0 * covar + c2);
    let denominator = (mean_a * mean_a + mean_b * mean_b + c1) * (var_a + var_b + c2);
    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn checkerboard(cell: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(64, 64, move |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([230])
            } else {
                Luma([25])
            }
        }))
    }

    fn solid(value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([value])))
    }

    #[test]
    fn identical_images_score_one() {
        let img = checkerboard(8);
        let score = similarity(&img, &img, 64);
        assert!((score - 1.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = checkerboard(8);
        let b = checkerboard(4);
        let ab = similarity(&a, &b, 64);
        let ba = similarity(&b, &a, 64);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn black_versus_white_scores_near_zero() {
        let score = similarity(&solid(0), &solid(255), 64);
        assert!(score < 0.1, "got {score}");
    }

    #[test]
    fn size_invariance_via_canonical_resize() {
        // Same solid content at different source resolutions.
        let small = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 30, Luma([128])));
        let large = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 100, Luma([128])));
        let score = similarity(&small, &large, 64);
        assert!((score - 1.0).abs() < 1e-6, "got {score}");
    }
}
