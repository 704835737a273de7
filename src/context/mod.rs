//! Context detection: which mode fits the board and the user right now.

pub mod detector;

pub use detector::{ContextDetector, ModeRecommendation};
