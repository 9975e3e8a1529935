use image::{DynamicImage, GrayImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Objective per-image quality. `composite` is what curation ranks on;
/// higher is better.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityScore {
    /// Laplacian variance over grayscale pixels; unbounded, higher = sharper.
    pub sharpness: f64,
    /// Mean brightness normalized to [0, 1]; 0.5 is ideal.
    pub exposure: f64,
    /// `sharpness − k·|exposure − 0.5|`.
    pub composite: f64,
}

impl QualityScore {
    /// Lowest score an image can get; assigned when it cannot be decoded.
    pub fn worst(weight: f64) -> Self {
        Self {
            sharpness: 0.0,
            exposure: 0.0,
            composite: -(weight * 0.5),
        }
    }
}

/// Score a decoded image. Pure, independent of any grouping.
pub fn score_image(image: &DynamicImage, weight: f64) -> QualityScore {
    let gray = image.to_luma8();
    let sharpness = laplacian_variance(&gray);
    let exposure = mean_brightness(&gray);
    QualityScore {
        sharpness,
        exposure,
        composite: sharpness - weight * (exposure - 0.5).abs(),
    }
}

/// Score an image file; an undecodable file gets the worst possible score.
pub fn score_path(path: &Path, weight: f64) -> QualityScore {
    match image::open(path) {
        Ok(image) => score_image(&image, weight),
        Err(err) => {
            log::warn!(
                "Failed to decode {} for quality scoring: {err}",
                path.display()
            );
            QualityScore::worst(weight)
        }
    }
}

/// Score many files in parallel, preserving input order.
pub fn score_paths(paths: &[PathBuf], weight: f64) -> Vec<QualityScore> {
    paths
        .par_iter()
        .map(|path| score_path(path, weight))
        .collect()
}

/// Variance of the Laplacian (second derivative) response; the standard
/// focus proxy. Zero for images smaller than the 3×3 kernel.
fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let kernel = [[0i32, -1, 0], [-1, 4, -1], [0, -1, 0]];
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0u64;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut response = 0i32;
            for (ky, row) in kernel.iter().enumerate() {
                for (kx, &k) in row.iter().enumerate() {
                    let px = x + kx as u32 - 1;
                    let py = y + ky as u32 - 1;
                    response += i32::from(gray.get_pixel(px, py)[0]) * k;
                }
            }
            let r = f64::from(response);
            sum += r;
            sum_sq += r * r;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

fn mean_brightness(gray: &GrayImage) -> f64 {
    let total: u64 = gray.pixels().map(|p| u64::from(p[0])).sum();
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return 0.0;
    }
    (total as f64 / count as f64) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn dynamic(img: GrayImage) -> DynamicImage {
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn flat_image_has_zero_sharpness() {
        let img = dynamic(GrayImage::from_pixel(32, 32, Luma([100])));
        let score = score_image(&img, 1.0);
        assert_eq!(score.sharpness, 0.0);
    }

    #[test]
    fn edges_raise_sharpness() {
        let flat = dynamic(GrayImage::from_pixel(32, 32, Luma([100])));
        let checker = dynamic(GrayImage::from_fn(32, 32, |x, y| {
            Luma([if (x + y) % 2 == 0 { 255 } else { 0 }])
        }));
        assert!(score_image(&checker, 1.0).sharpness > score_image(&flat, 1.0).sharpness);
    }

    #[test]
    fn mid_gray_is_ideal_exposure() {
        let mid = dynamic(GrayImage::from_pixel(16, 16, Luma([128])));
        let score = score_image(&mid, 1.0);
        assert!((score.exposure - 0.5).abs() < 0.01);
    }

    #[test]
    fn exposure_penalty_separates_equal_sharpness() {
        // Same structure, one shifted far toward white: identical sharpness,
        // the well-exposed one must win on composite.
        let well = dynamic(GrayImage::from_fn(32, 32, |x, _| {
            Luma([if x % 2 == 0 { 118 } else { 138 }])
        }));
        let blown = dynamic(GrayImage::from_fn(32, 32, |x, _| {
            Luma([if x % 2 == 0 { 225 } else { 245 }])
        }));
        let a = score_image(&well, 1.0);
        let b = score_image(&blown, 1.0);
        assert!((a.sharpness - b.sharpness).abs() < 1e-9);
        assert!(a.composite > b.composite);
    }

    #[test]
    fn weight_scales_the_exposure_penalty() {
        let dark = dynamic(GrayImage::from_pixel(16, 16, Luma([10])));
        let light_penalty = score_image(&dark, 0.1);
        let heavy_penalty = score_image(&dark, 10.0);
        assert!(light_penalty.composite > heavy_penalty.composite);
    }

    #[test]
    fn undecodable_path_scores_worst() {
        let dir = tempfile::TempDir::new().unwrap();
        let bad = dir.path().join("bad.jpg");
        std::fs::write(&bad, b"garbage").unwrap();
        let score = score_path(&bad, 1.0);
        assert_eq!(score.composite, QualityScore::worst(1.0).composite);
    }
}
