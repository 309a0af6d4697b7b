//! papersift-ranker — Deterministic relevance scoring.
//!
//! Combines the oracle's base score with keyword bonuses/penalties and a
//! venue prestige multiplier. Everything here is pure.

pub mod scorer;
pub mod normalise;
pub mod weights;

pub use scorer::{score_paper, ScoreBreakdown, ScoreInput};
pub use weights::{VenueWeights, VenueTier, VenueMatch, VenueRule};
