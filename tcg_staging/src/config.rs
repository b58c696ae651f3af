//! Tunable thresholds and scoring weights.
//!
//! The defaults are the empirically chosen values the staging workflow has
//! been run with; the CLI can override the thresholds and the floor price.

use serde::{Deserialize, Serialize};

/// Additive adjustments applied by [`crate::scoring::WeightedScorer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub set_match: f64,
    /// Same collector number, or one side has none
    pub number_match: f64,
    pub number_mismatch: f64,
    pub condition_match: f64,
    pub condition_mismatch: f64,
    /// One name contains the other
    pub name_containment: f64,
    pub grade_same: f64,
    pub grade_adjacent: f64,
    pub grade_distant: f64,
    pub foil_keyword_mismatch: f64,
    /// showcase, etched, borderless, extended, gilded
    pub print_keyword_mismatch: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            set_match: 50.0,
            number_match: 100.0,
            number_mismatch: -30.0,
            condition_match: 50.0,
            condition_mismatch: -20.0,
            name_containment: 20.0,
            grade_same: 50.0,
            grade_adjacent: -10.0,
            grade_distant: -30.0,
            foil_keyword_mismatch: -40.0,
            print_keyword_mismatch: -30.0,
        }
    }
}

/// Settings for a resolver session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Top score at or above which a candidate is accepted outright
    pub auto_confirm_score: f64,
    /// Lower threshold that also needs a clear lead over the runner-up
    pub secondary_score: f64,
    pub lead_margin: f64,
    /// Last resort price when neither catalog nor purchase price is positive
    pub floor_price: f64,
    /// Skip candidates that cannot plausibly be the same card name
    pub prefilter: bool,
    /// Face similarity (0-100) above which a token face counts as matching
    pub token_face_similarity: f64,
    /// How many ranked candidates the operator is shown
    pub max_prompt_candidates: usize,
    pub weights: ScoreWeights,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            auto_confirm_score: 270.0,
            secondary_score: 260.0,
            lead_margin: 30.0,
            floor_price: 0.25,
            prefilter: true,
            token_face_similarity: 70.0,
            max_prompt_candidates: 10,
            weights: ScoreWeights::default(),
        }
    }
}
