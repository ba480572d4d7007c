use crate::types::{LookbackWindow, SeriesSummary};
use serde::{Deserialize, Serialize};

/// Raw assessment returned by the qualitative collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeAssessment {
    /// Signed direction, nominally in [-1, 1].
    pub direction: f64,
    /// Conviction multiplier, nominally in [0, 1].
    #[serde(default = "default_magnitude")]
    pub magnitude: f64,
    #[serde(default)]
    pub rationale: String,
    /// Model confidence, nominally in [0, 1].
    pub confidence: f64,
}

fn default_magnitude() -> f64 {
    1.0
}

/// Bounded directional nudge derived from an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeNudge {
    /// Direction in [-1, 1].
    pub direction: f64,
    pub rationale: String,
    /// Model confidence in [0, 1].
    pub model_confidence: f64,
}

impl QualitativeNudge {
    /// Normalized contribution: direction scaled by model confidence.
    pub fn signed_strength(&self) -> f64 {
        self.direction * self.model_confidence
    }
}

/// Market trend as reported by an AI analyst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTrend {
    Bullish,
    Bearish,
    Neutral,
    #[serde(other)]
    Unknown,
}

/// Conviction of a reported trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrength {
    Strong,
    Moderate,
    Weak,
    #[serde(other)]
    Unknown,
}

/// JSON view produced by an AI market analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketView {
    pub trend: MarketTrend,
    #[serde(default = "unknown_strength")]
    pub trend_strength: TrendStrength,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub confidence: f64,
}

fn unknown_strength() -> TrendStrength {
    TrendStrength::Unknown
}

/// Context handed to the qualitative collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentContext {
    pub asset: String,
    pub window: LookbackWindow,
    pub as_of: i64,
    /// Summary of the most recent cached series, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesSummary>,
}
