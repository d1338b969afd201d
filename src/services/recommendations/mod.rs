/// Taste-based recommendations and library personality labels
pub mod engine;
pub mod personality;

pub use engine::{build_taste_profile, recommend, score_media, MediaScore, Recommendation, TasteProfile};
pub use personality::{classify, Archetype, Personality};

/// Default number of recommendations returned
pub const DEFAULT_LIMIT: usize = 20;
