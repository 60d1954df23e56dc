//! Tournament chat moderation: pattern banks, the scoring cascade, the
//! gibberish detector, and the auto-timeout gate.

pub mod classifier;
pub mod gibberish;
pub mod rules;
pub mod timeout;

pub use classifier::{classify, Classified, Span};
pub use rules::{Category, Lang};
pub use timeout::{TimeoutGate, TimeoutOutcome};
