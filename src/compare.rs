use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::config::{CurateConfig, MetricKind};
use crate::metrics::phash::{Fingerprint, FingerprintHasher};
use crate::metrics::{histogram, phash, ssim};

/// What linked two images into the same duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Byte-identical files (equal content digest).
    Identical,
    /// A similarity metric reached the threshold.
    Similar(MetricKind),
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Identical => write!(f, "identical"),
            MatchKind::Similar(metric) => write!(f, "{metric}"),
        }
    }
}

/// A pair judged to be the same shot. Indices refer into
/// [`CompareOutcome::images`]; `a < b` always holds.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateEdge {
    pub a: usize,
    pub b: usize,
    pub kind: MatchKind,
    pub score: f64,
}

/// An image dropped from the run before any comparison.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct CompareOutcome {
    /// Images that decoded cleanly, in sorted path order.
    pub images: Vec<PathBuf>,
    /// Unreadable or undecodable files, excluded from all comparisons.
    pub skipped: Vec<SkippedImage>,
    pub edges: Vec<DuplicateEdge>,
}

/// Evaluate every unordered pair of images and emit one edge per pair that
/// met the threshold. Metrics run in priority order and stop at the first
/// hit, so the expensive pixel metrics are skipped whenever the cached
/// fingerprints already prove a match.
///
/// Cost is O(n²) pair evaluations; callers needing to scale past a few
/// thousand images should pre-bucket upstream before calling this.
pub fn find_duplicate_edges(paths: &[PathBuf], config: &CurateConfig) -> CompareOutcome {
    let hasher = FingerprintHasher::new(config.hash_size);

    // Fingerprint pass: one decode per image, results cached for the run.
    let fingerprinted: Vec<Result<(PathBuf, Fingerprint), SkippedImage>> = paths
        .par_iter()
        .map(|path| match fs::read(path) {
            Err(err) => Err(SkippedImage {
                path: path.clone(),
                reason: format!("unreadable: {err}"),
            }),
            Ok(bytes) => match image::load_from_memory(&bytes) {
                Err(err) => Err(SkippedImage {
                    path: path.clone(),
                    reason: format!("decode failed: {err}"),
                }),
                Ok(img) => Ok((path.clone(), hasher.fingerprint(&img, &bytes))),
            },
        })
        .collect();

    let mut images = Vec::new();
    let mut fingerprints = Vec::new();
    let mut skipped = Vec::new();
    for result in fingerprinted {
        match result {
            Ok((path, fp)) => {
                images.push(path);
                fingerprints.push(fp);
            }
            Err(skip) => {
                log::warn!("Skipping {}: {}", skip.path.display(), skip.reason);
                skipped.push(skip);
            }
        }
    }

    let mut edges = exact_edges(&fingerprints);
    edges.extend(metric_edges(&images, &fingerprints, config));

    CompareOutcome {
        images,
        skipped,
        edges,
    }
}

/// Byte-identical files, linked without running any metric.
fn exact_edges(fingerprints: &[Fingerprint]) -> Vec<DuplicateEdge> {
    let mut by_digest: HashMap<[u8; 32], Vec<usize>> = HashMap::new();
    for (idx, fp) in fingerprints.iter().enumerate() {
        by_digest.entry(fp.digest).or_default().push(idx);
    }

    let mut edges = Vec::new();
    for indices in by_digest.values() {
        if indices.len() > 1 {
            for &other in &indices[1..] {
                edges.push(DuplicateEdge {
                    a: indices[0],
                    b: other,
                    kind: MatchKind::Identical,
                    score: 1.0,
                });
            }
        }
    }
    edges.sort_by_key(|e| (e.a, e.b));
    edges
}

fn metric_edges(
    images: &[PathBuf],
    fingerprints: &[Fingerprint],
    config: &CurateConfig,
) -> Vec<DuplicateEdge> {
    let n = images.len();
    let total_pairs = n.saturating_sub(1) * n / 2;
    let bar = ProgressBar::new(total_pairs as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} pairs {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let bar_ref = &bar;
    let edges: Vec<DuplicateEdge> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            (i + 1..n).filter_map(move |j| {
                bar_ref.inc(1);
                // Same-digest pairs already carry an exact edge.
                if fingerprints[i].digest == fingerprints[j].digest {
                    return None;
                }
                compare_pair(images, fingerprints, i, j, config)
            })
        })
        .collect();

    bar.finish_and_clear();
    edges
}

/// Evaluate one unordered pair in metric priority order, stopping at the
/// first metric that reaches the threshold. Any decode or compute failure
/// scores 0.0 for that metric only and evaluation moves on.
fn compare_pair(
    images: &[PathBuf],
    fingerprints: &[Fingerprint],
    i: usize,
    j: usize,
    config: &CurateConfig,
) -> Option<DuplicateEdge> {
    let mut decoded: Option<(DynamicImage, DynamicImage)> = None;
    let mut decode_failed = false;

    for &metric in &config.metric_order {
        let score = match metric {
            MetricKind::Hash => phash::similarity(
                &fingerprints[i].perceptual,
                &fingerprints[j].perceptual,
            ),
            MetricKind::Histogram | MetricKind::Ssim => {
                if decoded.is_none() && !decode_failed {
                    match (image::open(&images[i]), image::open(&images[j])) {
                        (Ok(a), Ok(b)) => decoded = Some((a, b)),
                        (Err(err), _) | (_, Err(err)) => {
                            log::warn!(
                                "Failed to re-decode {} / {} for {metric}: {err}; scoring 0",
                                images[i].display(),
                                images[j].display()
                            );
                            decode_failed = true;
                        }
                    }
                }
                match &decoded {
                    Some((a, b)) if metric == MetricKind::Histogram => histogram::similarity(a, b),
                    Some((a, b)) => ssim::similarity(a, b, config.ssim_size),
                    None => 0.0,
                }
            }
        };

        if score >= config.threshold {
            return Some(DuplicateEdge {
                a: i,
                b: j,
                kind: MatchKind::Similar(metric),
                score,
            });
        }
    }
    None
}
