//! Composite signal synthesis.
//!
//! Pure function of its inputs: each component is normalized to [-1, 1],
//! missing components are dropped from the weighted mean (never counted as
//! zero) and confidence shrinks with both missing weight and disagreement.

use crate::config::{ComponentWeights, Config, SynthesisConfig};
use crate::services::signals::sentiment::SentimentAggregator;
use crate::services::signals::technical::TechnicalSnapshot;
use crate::types::{
    Availability, ComponentContribution, ComponentKind, ComponentStatus, CompositeSignal,
    Evaluation, LookbackWindow, PatternScan, QualitativeNudge, SentimentScore, SignalLabel,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Pattern scan plus the price it is judged against.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternInput {
    pub scan: PatternScan,
    pub last_close: f64,
}

/// Everything one synthesis consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInputs {
    pub asset: String,
    pub window: LookbackWindow,
    /// Evaluation time, unix milliseconds.
    pub as_of: i64,
    pub technical: Availability<TechnicalSnapshot>,
    pub pattern: Availability<PatternInput>,
    pub sentiment: Availability<SentimentScore>,
    pub qualitative: Availability<QualitativeNudge>,
}

/// Normalized outcome of one component before weighting.
struct Normalized {
    status: ComponentStatus,
    value: Option<f64>,
    note: Option<String>,
}

impl Normalized {
    fn included(value: f64, note: String) -> Self {
        Self {
            status: ComponentStatus::Included,
            value: Some(value.clamp(-1.0, 1.0)),
            note: Some(note),
        }
    }

    fn excluded(status: ComponentStatus) -> Self {
        Self {
            status,
            value: None,
            note: None,
        }
    }

    fn from_missing<T>(availability: &Availability<T>) -> Option<Self> {
        match availability {
            Availability::Value(_) => None,
            Availability::Unavailable(reason) => {
                Some(Self::excluded(ComponentStatus::Unavailable(*reason)))
            }
            Availability::InsufficientData => {
                Some(Self::excluded(ComponentStatus::InsufficientData))
            }
        }
    }
}

fn normalize_technical(input: &Availability<TechnicalSnapshot>) -> Normalized {
    if let Some(missing) = Normalized::from_missing(input) {
        return missing;
    }
    let Some(snapshot) = input.value() else {
        return Normalized::excluded(ComponentStatus::InsufficientData);
    };
    match snapshot.normalized() {
        Some(v) => Normalized::included(v, snapshot.note()),
        None => Normalized::excluded(ComponentStatus::InsufficientData),
    }
}

fn normalize_pattern(input: &Availability<PatternInput>, cfg: &SynthesisConfig) -> Normalized {
    if let Some(missing) = Normalized::from_missing(input) {
        return missing;
    }
    let Some(PatternInput { scan, last_close }) = input.value() else {
        return Normalized::excluded(ComponentStatus::InsufficientData);
    };

    let dominant = scan.dominant();
    if dominant.is_none() {
        return Normalized {
            status: ComponentStatus::NoFormation,
            value: None,
            note: Some(format!("{} swing points, no formation", scan.extrema.len())),
        };
    }

    let mut value = dominant.signed_strength();
    let mut note = format!("{} ({:.2})", dominant.kind, dominant.confidence);

    // Heading into a nearby level caps the move.
    let near = cfg.proximity_pct / 100.0;
    if *last_close > 0.0 {
        if value > 0.0 {
            if let Some(level) = scan.resistance_above(*last_close) {
                if (level.price - last_close) / last_close <= near {
                    value *= cfg.proximity_damping;
                    note.push_str(&format!(", near resistance {:.2}", level.price));
                }
            }
        } else if value < 0.0 {
            if let Some(level) = scan.support_below(*last_close) {
                if (last_close - level.price) / last_close <= near {
                    value *= cfg.proximity_damping;
                    note.push_str(&format!(", near support {:.2}", level.price));
                }
            }
        }
    }

    Normalized::included(value, note)
}

fn normalize_sentiment(
    input: &Availability<SentimentScore>,
    aggregator: &SentimentAggregator,
) -> Normalized {
    if let Some(missing) = Normalized::from_missing(input) {
        return missing;
    }
    let Some(score) = input.value() else {
        return Normalized::excluded(ComponentStatus::InsufficientData);
    };
    Normalized::included(
        aggregator.normalized(score),
        format!(
            "{:+.2} over {} items, {:?}",
            score.value,
            score.coverage,
            score.mood()
        )
        .to_lowercase(),
    )
}

fn normalize_qualitative(input: &Availability<QualitativeNudge>) -> Normalized {
    if let Some(missing) = Normalized::from_missing(input) {
        return missing;
    }
    let Some(nudge) = input.value() else {
        return Normalized::excluded(ComponentStatus::InsufficientData);
    };
    let note = if nudge.rationale.is_empty() {
        format!("confidence {:.2}", nudge.model_confidence)
    } else {
        nudge.rationale.clone()
    };
    Normalized::included(nudge.signed_strength(), note)
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Combine component inputs into one evaluation.
///
/// Returns `Evaluation::Unavailable` when no component carries a value, or
/// when every component that does has a declared weight of zero.
pub fn synthesize(inputs: &ComponentInputs, weights: &ComponentWeights, config: &Config) -> Evaluation {
    let aggregator = SentimentAggregator::new(config.sentiment.clone());
    let normalized: BTreeMap<ComponentKind, Normalized> = BTreeMap::from([
        (ComponentKind::Technical, normalize_technical(&inputs.technical)),
        (
            ComponentKind::Pattern,
            normalize_pattern(&inputs.pattern, &config.synthesis),
        ),
        (
            ComponentKind::Sentiment,
            normalize_sentiment(&inputs.sentiment, &aggregator),
        ),
        (
            ComponentKind::Qualitative,
            normalize_qualitative(&inputs.qualitative),
        ),
    ]);

    let included: Vec<(ComponentKind, f64)> = normalized
        .iter()
        .filter_map(|(kind, n)| n.value.map(|v| (*kind, v)))
        .collect();
    let included_weight: f64 = included.iter().map(|(k, _)| weights.get(*k)).sum();
    let declared_weight = weights.total();

    if included.is_empty() || included_weight <= 0.0 || declared_weight <= 0.0 {
        debug!(
            "No weighted components for {} {}, signal unavailable",
            inputs.asset, inputs.window
        );
        return Evaluation::Unavailable;
    }

    let strength = (included
        .iter()
        .map(|(k, v)| weights.get(*k) * v)
        .sum::<f64>()
        / included_weight)
        .clamp(-1.0, 1.0);

    let values: Vec<f64> = included.iter().map(|(_, v)| *v).collect();
    let penalty = (config.synthesis.disagreement_factor * variance(&values)).min(1.0);
    let coverage = (included_weight / declared_weight).min(1.0);
    let confidence = (coverage * (1.0 - penalty)).clamp(0.0, 1.0);

    let breakdown = normalized
        .into_iter()
        .map(|(kind, n)| {
            let weight = weights.get(kind);
            let effective_weight = if n.value.is_some() {
                weight / included_weight
            } else {
                0.0
            };
            let contribution = n.value.map_or(0.0, |v| v * effective_weight);
            (
                kind,
                ComponentContribution {
                    status: n.status,
                    normalized: n.value,
                    weight,
                    effective_weight,
                    contribution,
                    note: n.note,
                },
            )
        })
        .collect();

    let label = SignalLabel::from_strength(
        strength,
        config.thresholds.weak,
        config.thresholds.strong,
    );

    debug!(
        "Composite for {} {}: {} strength {:.3} confidence {:.3} ({} of 4 components, penalty {:.3})",
        inputs.asset,
        inputs.window,
        label.label(),
        strength,
        confidence,
        included.len(),
        penalty
    );

    Evaluation::Signal(CompositeSignal {
        asset: inputs.asset.clone(),
        window: inputs.window,
        as_of: inputs.as_of,
        strength,
        label,
        confidence,
        breakdown,
    })
}
