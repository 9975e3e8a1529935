use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CurateError;
use crate::resolve::CurationDecision;

/// Audit log file name, kept beside the curated folder.
pub const AUDIT_FILE: &str = ".curation.jsonl";

/// One line of the append-only audit log, written per moved image.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub image: String,
    pub destination: String,
    pub kept: String,
    pub reason: String,
    pub match_score: f64,
    pub quality: f64,
    pub kept_quality: f64,
}

#[derive(Debug, Default)]
pub struct ExecuteOutcome {
    /// File names moved into the removed store this run.
    pub removed: Vec<String>,
    /// Losers whose source was already gone and destination already present.
    pub already_curated: Vec<String>,
    /// Losers that could not be moved, left in place.
    pub failed: Vec<(PathBuf, String)>,
}

/// Move every loser into `removed_dir`, preserving file names.
///
/// Collisions are a configuration error and are rejected before any file is
/// touched. A loser whose source is gone while its destination exists is
/// treated as already curated, which makes re-running after an interrupted
/// run safe. Individual move failures are logged and collected, never fatal.
pub fn execute(
    decisions: &[CurationDecision],
    removed_dir: &Path,
    audit_path: &Path,
) -> Result<ExecuteOutcome, CurateError> {
    preflight(decisions, removed_dir)?;

    let mut outcome = ExecuteOutcome::default();
    if decisions.is_empty() {
        return Ok(outcome);
    }

    fs::create_dir_all(removed_dir)?;
    let mut audit = OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_path)?;

    for decision in decisions {
        let name = file_name(&decision.image);
        let dest = removed_dir.join(&name);

        if !decision.image.exists() {
            if dest.exists() {
                outcome.already_curated.push(name);
            } else {
                log::warn!(
                    "Failed to curate {}: source vanished mid-run",
                    decision.image.display()
                );
                outcome
                    .failed
                    .push((decision.image.clone(), "source vanished".into()));
            }
            continue;
        }

        match fs::rename(&decision.image, &dest) {
            Ok(()) => {
                let record = AuditRecord {
                    timestamp: Utc::now().to_rfc3339(),
                    image: name.clone(),
                    destination: dest.to_string_lossy().into_owned(),
                    kept: file_name(&decision.kept),
                    reason: decision.reason.to_string(),
                    match_score: decision.match_score,
                    quality: decision.quality.composite,
                    kept_quality: decision.kept_quality.composite,
                };
                writeln!(audit, "{}", serde_json::to_string(&record)?)?;
                outcome.removed.push(name);
            }
            Err(err) => {
                log::warn!("Failed to curate {}: {err}", decision.image.display());
                outcome.failed.push((decision.image.clone(), err.to_string()));
            }
        }
    }

    Ok(outcome)
}

/// Reject collisions before mutating anything: two losers sharing a file
/// name, or a loser whose destination is already occupied while the source
/// still exists.
fn preflight(decisions: &[CurationDecision], removed_dir: &Path) -> Result<(), CurateError> {
    let mut seen: HashSet<String> = HashSet::new();
    for decision in decisions {
        let name = file_name(&decision.image);
        if !seen.insert(name.clone()) {
            return Err(CurateError::DestinationCollision(removed_dir.join(name)));
        }
        let dest = removed_dir.join(&name);
        if dest.exists() && decision.image.exists() {
            return Err(CurateError::DestinationCollision(dest));
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
