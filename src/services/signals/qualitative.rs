//! Qualitative overlay.
//!
//! Maps an externally produced market assessment onto a bounded nudge.
//! Failures stay `Unavailable`; they are never turned into a neutral 0.

use crate::error::FeedError;
use crate::types::{
    Availability, MarketTrend, MarketView, QualitativeAssessment, QualitativeNudge,
    TrendStrength, UnavailableReason,
};
use tracing::warn;

/// Convert a collaborator result into a nudge.
pub fn overlay(
    asset: &str,
    result: Result<QualitativeAssessment, FeedError>,
) -> Availability<QualitativeNudge> {
    match result {
        Ok(assessment) => nudge(asset, assessment),
        Err(e) => {
            warn!("Qualitative assessment for {} failed: {}", asset, e);
            Availability::Unavailable(e.reason())
        }
    }
}

/// Validate and clamp an assessment.
pub fn nudge(asset: &str, assessment: QualitativeAssessment) -> Availability<QualitativeNudge> {
    let QualitativeAssessment {
        direction,
        magnitude,
        rationale,
        confidence,
    } = assessment;

    if !direction.is_finite() || !magnitude.is_finite() || !confidence.is_finite() {
        warn!("Non-finite qualitative assessment for {}", asset);
        return Availability::Unavailable(UnavailableReason::Malformed);
    }

    let raw = direction * magnitude;
    let direction = raw.clamp(-1.0, 1.0);
    let model_confidence = confidence.clamp(0.0, 1.0);
    if direction != raw || model_confidence != confidence {
        warn!(
            "Clamped qualitative assessment for {}: direction {} -> {}, confidence {} -> {}",
            asset, raw, direction, confidence, model_confidence
        );
    }

    Availability::Value(QualitativeNudge {
        direction,
        rationale,
        model_confidence,
    })
}

impl TrendStrength {
    /// Conviction multiplier applied to the trend direction.
    pub fn magnitude(&self) -> f64 {
        match self {
            TrendStrength::Strong => 1.0,
            TrendStrength::Moderate | TrendStrength::Unknown => 0.6,
            TrendStrength::Weak => 0.3,
        }
    }
}

impl TryFrom<MarketView> for QualitativeAssessment {
    type Error = FeedError;

    fn try_from(view: MarketView) -> Result<Self, Self::Error> {
        let direction = match view.trend {
            MarketTrend::Bullish => 1.0,
            MarketTrend::Bearish => -1.0,
            MarketTrend::Neutral => 0.0,
            MarketTrend::Unknown => {
                return Err(FeedError::Malformed("unrecognized trend".to_string()))
            }
        };
        Ok(QualitativeAssessment {
            direction,
            magnitude: view.trend_strength.magnitude(),
            rationale: view.analysis,
            confidence: view.confidence,
        })
    }
}

/// Parse an analyst's JSON reply into an assessment.
pub fn parse_market_view(json: &str) -> Result<QualitativeAssessment, FeedError> {
    let view: MarketView =
        serde_json::from_str(json).map_err(|e| FeedError::Malformed(e.to_string()))?;
    QualitativeAssessment::try_from(view)
}
