use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::compare::{DuplicateEdge, MatchKind};
use crate::group::DuplicateGroup;
use crate::quality::QualityScore;

/// Why a non-representative image is being removed: the edge that linked it
/// into its group, plus both quality scores for the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct CurationDecision {
    pub image: PathBuf,
    pub kept: PathBuf,
    pub reason: MatchKind,
    pub match_score: f64,
    pub quality: QualityScore,
    pub kept_quality: QualityScore,
}

/// One resolved group: the surviving representative and a decision per loser.
#[derive(Debug, Clone, Serialize)]
pub struct GroupResolution {
    pub kept: PathBuf,
    pub kept_quality: QualityScore,
    pub decisions: Vec<CurationDecision>,
}

/// Pick the group member with the best composite quality; ties go to the
/// lexicographically smallest path so repeated runs agree.
pub fn resolve_group(
    group: &DuplicateGroup,
    images: &[PathBuf],
    scores: &HashMap<usize, QualityScore>,
    quality_weight: f64,
) -> GroupResolution {
    let score_of = |idx: usize| -> QualityScore {
        scores
            .get(&idx)
            .copied()
            .unwrap_or_else(|| QualityScore::worst(quality_weight))
    };

    let mut keeper = group.members[0];
    for &candidate in &group.members[1..] {
        let best = score_of(keeper).composite;
        let contender = score_of(candidate).composite;
        if contender > best || (contender == best && images[candidate] < images[keeper]) {
            keeper = candidate;
        }
    }

    let kept_quality = score_of(keeper);
    let decisions = group
        .members
        .iter()
        .filter(|&&idx| idx != keeper)
        .map(|&loser| {
            let edge = linking_edge(group, loser, keeper);
            CurationDecision {
                image: images[loser].clone(),
                kept: images[keeper].clone(),
                reason: edge.kind,
                match_score: edge.score,
                quality: score_of(loser),
                kept_quality,
            }
        })
        .collect();

    GroupResolution {
        kept: images[keeper].clone(),
        kept_quality,
        decisions,
    }
}

/// The edge recorded as the loser's removal reason: a direct edge to the
/// representative when one exists, otherwise the first edge that touches
/// the loser.
fn linking_edge(group: &DuplicateGroup, loser: usize, keeper: usize) -> &DuplicateEdge {
    group
        .edges
        .iter()
        .find(|e| (e.a == loser && e.b == keeper) || (e.a == keeper && e.b == loser))
        .or_else(|| group.edges.iter().find(|e| e.a == loser || e.b == loser))
        .unwrap_or(&group.edges[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricKind;

    fn edge(a: usize, b: usize, metric: MetricKind, score: f64) -> DuplicateEdge {
        DuplicateEdge {
            a,
            b,
            kind: MatchKind::Similar(metric),
            score,
        }
    }

    fn quality(composite: f64) -> QualityScore {
        QualityScore {
            sharpness: composite,
            exposure: 0.5,
            composite,
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn highest_composite_wins() {
        let group = DuplicateGroup {
            members: vec![0, 1, 2],
            edges: vec![
                edge(0, 1, MetricKind::Hash, 0.97),
                edge(1, 2, MetricKind::Histogram, 0.92),
            ],
        };
        let images = paths(&["a.jpg", "b.jpg", "c.jpg"]);
        let scores = HashMap::from([(0, quality(10.0)), (1, quality(30.0)), (2, quality(20.0))]);

        let resolution = resolve_group(&group, &images, &scores, 1.0);
        assert_eq!(resolution.kept, PathBuf::from("b.jpg"));
        assert_eq!(resolution.decisions.len(), 2);
    }

    #[test]
    fn quality_tie_breaks_on_path_order() {
        let group = DuplicateGroup {
            members: vec![0, 1],
            edges: vec![edge(0, 1, MetricKind::Hash, 1.0)],
        };
        let images = paths(&["b.jpg", "a.jpg"]);
        let scores = HashMap::from([(0, quality(5.0)), (1, quality(5.0))]);

        let resolution = resolve_group(&group, &images, &scores, 1.0);
        assert_eq!(resolution.kept, PathBuf::from("a.jpg"));
    }

    #[test]
    fn loser_reason_prefers_direct_edge_to_keeper() {
        let group = DuplicateGroup {
            members: vec![0, 1, 2],
            edges: vec![
                edge(0, 1, MetricKind::Hash, 0.95),
                edge(1, 2, MetricKind::Ssim, 0.91),
            ],
        };
        let images = paths(&["a.jpg", "b.jpg", "c.jpg"]);
        let scores = HashMap::from([(0, quality(1.0)), (1, quality(9.0)), (2, quality(2.0))]);

        let resolution = resolve_group(&group, &images, &scores, 1.0);
        assert_eq!(resolution.kept, PathBuf::from("b.jpg"));

        let loser_a = resolution
            .decisions
            .iter()
            .find(|d| d.image == PathBuf::from("a.jpg"))
            .unwrap();
        assert_eq!(loser_a.reason, MatchKind::Similar(MetricKind::Hash));
        assert_eq!(loser_a.match_score, 0.95);

        let loser_c = resolution
            .decisions
            .iter()
            .find(|d| d.image == PathBuf::from("c.jpg"))
            .unwrap();
        assert_eq!(loser_c.reason, MatchKind::Similar(MetricKind::Ssim));
    }

    #[test]
    fn chained_loser_without_direct_edge_uses_its_own_link() {
        // 0~1 and 1~2; keeper is 0, so loser 2 has no direct edge to it.
        let group = DuplicateGroup {
            members: vec![0, 1, 2],
            edges: vec![
                edge(0, 1, MetricKind::Hash, 0.95),
                edge(1, 2, MetricKind::Histogram, 0.93),
            ],
        };
        let images = paths(&["a.jpg", "b.jpg", "c.jpg"]);
        let scores = HashMap::from([(0, quality(9.0)), (1, quality(1.0)), (2, quality(2.0))]);

        let resolution = resolve_group(&group, &images, &scores, 1.0);
        assert_eq!(resolution.kept, PathBuf::from("a.jpg"));
        let loser_c = resolution
            .decisions
            .iter()
            .find(|d| d.image == PathBuf::from("c.jpg"))
            .unwrap();
        assert_eq!(loser_c.reason, MatchKind::Similar(MetricKind::Histogram));
    }
}
