use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compare::{self, SkippedImage};
use crate::config::CurateConfig;
use crate::error::CurateError;
use crate::execute::{self, AUDIT_FILE};
use crate::group;
use crate::quality::{self, QualityScore};
use crate::resolve::{self, GroupResolution};
use crate::scan;

/// Everything decided for one run, before any file is touched.
#[derive(Debug, Serialize)]
pub struct CurationPlan {
    /// All images that entered the pairwise comparison, sorted.
    pub images: Vec<PathBuf>,
    /// Files excluded up front (unreadable or undecodable).
    pub skipped: Vec<SkippedImage>,
    /// Resolved duplicate groups: one keeper plus decisions for its losers.
    pub groups: Vec<GroupResolution>,
}

impl CurationPlan {
    pub fn decision_count(&self) -> usize {
        self.groups.iter().map(|g| g.decisions.len()).sum()
    }
}

/// Result of a full run, for programmatic chaining with downstream steps.
#[derive(Debug, Serialize)]
pub struct CurationReport {
    pub scanned: usize,
    pub skipped: Vec<SkippedImage>,
    pub groups: Vec<GroupResolution>,
    /// File names moved into the removed store this run.
    pub removed: Vec<String>,
    /// Losers recognized as moved by an earlier run.
    pub already_curated: Vec<String>,
    /// Losers that could not be moved, left in place.
    pub failed: Vec<(PathBuf, String)>,
}

/// Build the curation plan for `dir`: scan, compare pairwise, close groups
/// transitively, score quality and pick representatives. Mutates nothing.
pub fn plan(
    dir: &Path,
    removed_dir: &Path,
    config: &CurateConfig,
) -> Result<CurationPlan, CurateError> {
    config.validate()?;
    if !dir.is_dir() {
        return Err(CurateError::Config(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let paths = scan::scan_directory(dir, Some(removed_dir))?;
    log::info!("Comparing {} images pairwise", paths.len());
    let outcome = compare::find_duplicate_edges(&paths, config);
    let groups = group::group_edges(outcome.images.len(), &outcome.edges);

    // Quality is only consulted inside groups; score those members, each
    // exactly once, in parallel.
    let members: Vec<usize> = groups.iter().flat_map(|g| g.members.iter().copied()).collect();
    let scores: HashMap<usize, QualityScore> = members
        .par_iter()
        .map(|&idx| {
            (
                idx,
                quality::score_path(&outcome.images[idx], config.quality_weight),
            )
        })
        .collect();

    let resolutions = groups
        .iter()
        .map(|g| resolve::resolve_group(g, &outcome.images, &scores, config.quality_weight))
        .collect();

    Ok(CurationPlan {
        images: outcome.images,
        skipped: outcome.skipped,
        groups: resolutions,
    })
}

/// Full pipeline: [`plan`] followed by the irreversible move step, with one
/// audit record per moved file appended to `.curation.jsonl` inside `dir`.
pub fn curate(
    dir: &Path,
    removed_dir: &Path,
    config: &CurateConfig,
) -> Result<CurationReport, CurateError> {
    let plan = plan(dir, removed_dir, config)?;

    let decisions: Vec<_> = plan
        .groups
        .iter()
        .flat_map(|g| g.decisions.iter().cloned())
        .collect();
    let audit_path = dir.join(AUDIT_FILE);
    let outcome = execute::execute(&decisions, removed_dir, &audit_path)?;

    Ok(CurationReport {
        scanned: plan.images.len() + plan.skipped.len(),
        skipped: plan.skipped,
        groups: plan.groups,
        removed: outcome.removed,
        already_curated: outcome.already_curated,
        failed: outcome.failed,
    })
}
