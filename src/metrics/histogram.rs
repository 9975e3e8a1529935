use image::DynamicImage;

pub const BINS: usize = 256;

/// Normalized grayscale brightness histogram.
pub fn luma_histogram(image: &DynamicImage) -> [f64; BINS] {
    let gray = image.to_luma8();
    let mut hist = [0.0f64; BINS];
    for pixel in gray.pixels() {
        hist[pixel[0] as usize] += 1.0;
    }
    let total: f64 = hist.iter().sum();
    if total > 0.0 {
        for bin in &mut hist {
            *bin /= total;
        }
    }
    hist
}

/// Pearson correlation between two histograms, nominal range [−1, 1].
/// Negative correlation means anti-correlated brightness distributions;
/// callers must never treat a negative value as a match.
pub fn correlation(a: &[f64; BINS], b: &[f64; BINS]) -> f64 {
    let n = BINS as f64;
    let mean_a: f64 = a.iter().sum::<f64>() / n;
    let mean_b: f64 = b.iter().sum::<f64>() / n;

    let mut covar = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covar += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        // Flat histograms carry no usable signal; fail closed.
        return 0.0;
    }
    covar / denom
}

/// Histogram similarity of two decoded images.
pub fn similarity(a: &DynamicImage, b: &DynamicImage) -> f64 {
    correlation(&luma_histogram(a), &luma_histogram(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn solid(value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([value])))
    }

    fn gradient() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(32, 32, |x, y| {
            Luma([((x * 7 + y * 3) % 256) as u8])
        }))
    }

    #[test]
    fn identical_images_correlate_fully() {
        let img = gradient();
        let sim = similarity(&img, &img);
        assert!((sim - 1.0).abs() < 1e-9, "got {sim}");
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = gradient();
        let b = solid(128);
        assert_eq!(similarity(&a, &b), similarity(&b, &a));
    }

    #[test]
    fn disjoint_brightness_is_not_a_match() {
        let sim = similarity(&solid(0), &solid(255));
        assert!(sim < 0.5, "got {sim}");
    }

    #[test]
    fn correlation_can_go_negative() {
        // Mass concentrated in opposite halves of the range.
        let mut a = [0.0; BINS];
        let mut b = [0.0; BINS];
        for i in 0..BINS / 2 {
            a[i] = 1.0;
            b[BINS - 1 - i] = 1.0;
        }
        assert!(correlation(&a, &b) < 0.0);
    }

    #[test]
    fn flat_histograms_fail_closed() {
        let a = [1.0 / BINS as f64; BINS];
        assert_eq!(correlation(&a, &a), 0.0);
    }
}
