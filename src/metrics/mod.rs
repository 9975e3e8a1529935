//! Metric providers: one similarity score per image pair, each in its own
//! metric-specific range. All of them fail closed, a score of 0.0 stands in
//! for anything that could not be computed.

pub mod histogram;
pub mod phash;
pub mod ssim;
