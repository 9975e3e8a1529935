//! Duplicate-detection and quality-based photo curation engine.
//!
//! A run compares every pair of images with up to three similarity metrics
//! (perceptual hash, histogram correlation, SSIM), closes the resulting
//! duplicate edges transitively into groups, keeps the member with the best
//! objective quality per group and moves the rest into a removed store with
//! an append-only audit log.

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod execute;
pub mod group;
pub mod metrics;
pub mod quality;
pub mod resolve;
pub mod scan;

pub use compare::{DuplicateEdge, MatchKind, SkippedImage};
pub use config::{CurateConfig, MetricKind};
pub use engine::{curate, plan, CurationPlan, CurationReport};
pub use error::CurateError;
pub use execute::{AuditRecord, AUDIT_FILE};
pub use quality::QualityScore;
pub use resolve::{CurationDecision, GroupResolution};
