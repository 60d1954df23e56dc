//! Per-user aggregators: alt-account fingerprinting and boosting/sandbag
//! heuristics. Everything here produces reports for moderator review.

pub mod alt;
pub mod boost;
pub mod games;
pub mod stats;
pub mod users;

pub use alt::{AltReport, Fingerprint};
pub use boost::BoostReport;
