//! Confidence scoring for extracted candidate records.
//!
//! The score is a pure function of the payload: no source metadata, no
//! reviewer history, no clock. Weights are kept in basis points so the sum
//! is exact and the same payload always yields the same `f64`.

use serde::Serialize;

use super::models::{ExtractedPayload, MaterialType};

const WEIGHT_NAME: u32 = 2_500;
const WEIGHT_MATERIALS: u32 = 3_000;
const WEIGHT_DESCRIPTION: u32 = 1_500;
const WEIGHT_CLASSIFICATION: u32 = 1_500;
const WEIGHT_ORIGIN: u32 = 1_500;
const BASIS_POINTS: f64 = 10_000.0;

/// Minimum number of materials for the materials criterion.
pub const MIN_MATERIALS: usize = 3;

pub const HIGH_CONFIDENCE: f64 = 0.8;
pub const MEDIUM_CONFIDENCE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Description must have at least this many characters to count.
    pub min_description_length: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_description_length: 50,
        }
    }
}

/// Display bucket. Informational only: never drives approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONFIDENCE {
            ConfidenceBucket::High
        } else if score >= MEDIUM_CONFIDENCE {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Low
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Score an extraction payload in [0, 1].
pub fn score(payload: &ExtractedPayload, config: &ScoringConfig) -> f64 {
    let mut points = 0u32;

    if payload.pattern_name().is_some() {
        points += WEIGHT_NAME;
    }

    if payload.materials.len() >= MIN_MATERIALS
        && payload.has_material_type(MaterialType::Hook)
        && payload.has_material_type(MaterialType::Thread)
    {
        points += WEIGHT_MATERIALS;
    }

    let description_length = payload
        .description
        .as_deref()
        .map(|d| d.trim().chars().count())
        .unwrap_or(0);
    if description_length > 0 && description_length >= config.min_description_length {
        points += WEIGHT_DESCRIPTION;
    }

    if payload.category.is_some() && payload.difficulty.is_some() && payload.water_type.is_some() {
        points += WEIGHT_CLASSIFICATION;
    }

    if has_text(&payload.origin) {
        points += WEIGHT_ORIGIN;
    }

    (points as f64 / BASIS_POINTS).clamp(0.0, 1.0)
}
