use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CurateError;

/// One of the three pairwise similarity techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Perceptual hash (dHash) Hamming similarity.
    #[value(name = "phash")]
    #[serde(rename = "phash")]
    Hash,
    /// Grayscale histogram correlation.
    Histogram,
    /// Structural similarity index at a canonical resolution.
    Ssim,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Hash => write!(f, "phash"),
            MetricKind::Histogram => write!(f, "histogram"),
            MetricKind::Ssim => write!(f, "ssim"),
        }
    }
}

/// Tuning knobs for a curation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurateConfig {
    /// Similarity threshold in (0, 1]; a pair at or above it is a duplicate.
    pub threshold: f64,
    /// Metric evaluation order; the first metric to reach the threshold wins.
    pub metric_order: Vec<MetricKind>,
    /// Weight of the exposure penalty in the composite quality score.
    pub quality_weight: f64,
    /// Edge length of the canonical square both images are resized to for SSIM.
    pub ssim_size: u32,
    /// Perceptual hash size (bits per side).
    pub hash_size: u32,
}

impl Default for CurateConfig {
    fn default() -> Self {
        Self {
            threshold: 0.90,
            metric_order: vec![MetricKind::Hash, MetricKind::Histogram, MetricKind::Ssim],
            quality_weight: 1.0,
            ssim_size: 256,
            hash_size: 8,
        }
    }
}

impl CurateConfig {
    /// Check the configuration before any file is mutated. All violations
    /// here are fatal; the engine refuses to start a run with them.
    pub fn validate(&self) -> Result<(), CurateError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(CurateError::Config(format!(
                "threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        if self.metric_order.is_empty() {
            return Err(CurateError::Config(
                "metric order must name at least one metric".into(),
            ));
        }
        for (i, m) in self.metric_order.iter().enumerate() {
            if self.metric_order[..i].contains(m) {
                return Err(CurateError::Config(format!(
                    "metric order lists {m} more than once"
                )));
            }
        }
        if self.ssim_size < 16 {
            return Err(CurateError::Config(format!(
                "ssim size must be at least 16, got {}",
                self.ssim_size
            )));
        }
        if self.hash_size < 4 {
            return Err(CurateError::Config(format!(
                "hash size must be at least 4, got {}",
                self.hash_size
            )));
        }
        if !self.quality_weight.is_finite() || self.quality_weight < 0.0 {
            return Err(CurateError::Config(format!(
                "quality weight must be a non-negative number, got {}",
                self.quality_weight
            )));
        }
        Ok(())
    }
}
