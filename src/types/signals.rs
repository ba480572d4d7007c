use crate::types::LookbackWindow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a component produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Upstream collaborator returned an error.
    Failed,
    /// Upstream collaborator rejected the request for rate limiting.
    RateLimited,
    /// Upstream collaborator did not answer within the component timeout.
    TimedOut,
    /// Upstream data violated an invariant and could not be used.
    Malformed,
    /// Upstream answered, but with nothing usable.
    NoData,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Failed => write!(f, "failed"),
            UnavailableReason::RateLimited => write!(f, "rate limited"),
            UnavailableReason::TimedOut => write!(f, "timed out"),
            UnavailableReason::Malformed => write!(f, "malformed"),
            UnavailableReason::NoData => write!(f, "no data"),
        }
    }
}

/// Tagged outcome of a single input component.
///
/// Missing data is never folded into a numeric default: a neutral value is
/// `Value(0.0)`, an absent one is `Unavailable` or `InsufficientData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Availability<T> {
    Value(T),
    Unavailable(UnavailableReason),
    InsufficientData,
}

impl<T> Availability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Availability::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Availability::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Availability<U> {
        match self {
            Availability::Value(v) => Availability::Value(f(v)),
            Availability::Unavailable(r) => Availability::Unavailable(r),
            Availability::InsufficientData => Availability::InsufficientData,
        }
    }
}

/// Value of a technical indicator as of the series' last timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorReading {
    /// Not enough points for the indicator's lookback.
    Undefined,
    Scalar {
        value: f64,
    },
    Macd {
        macd: f64,
        signal: f64,
        histogram: f64,
    },
    Band {
        middle: f64,
        upper: f64,
        lower: f64,
        width: f64,
    },
}

impl IndicatorReading {
    pub fn is_defined(&self) -> bool {
        !matches!(self, IndicatorReading::Undefined)
    }

    /// The scalar value, if this is a scalar reading.
    pub fn scalar(&self) -> Option<f64> {
        match self {
            IndicatorReading::Scalar { value } => Some(*value),
            _ => None,
        }
    }
}

/// Computed indicator with the lookback it used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub id: String,
    pub name: String,
    pub lookback: usize,
    pub reading: IndicatorReading,
}

/// Directional classification of a composite signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLabel {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl SignalLabel {
    /// Classify a strength in [-1, 1].
    ///
    /// Boundary values resolve to the label closer to `Hold`: exactly
    /// `weak` is Hold, exactly `strong` is Buy (and symmetrically).
    pub fn from_strength(strength: f64, weak: f64, strong: f64) -> Self {
        if strength > strong {
            SignalLabel::StrongBuy
        } else if strength > weak {
            SignalLabel::Buy
        } else if strength >= -weak {
            SignalLabel::Hold
        } else if strength >= -strong {
            SignalLabel::Sell
        } else {
            SignalLabel::StrongSell
        }
    }

    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            SignalLabel::StrongSell => "Strong Sell",
            SignalLabel::Sell => "Sell",
            SignalLabel::Hold => "Hold",
            SignalLabel::Buy => "Buy",
            SignalLabel::StrongBuy => "Strong Buy",
        }
    }
}

/// Input component of the composite signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Technical,
    Pattern,
    Sentiment,
    Qualitative,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Technical,
        ComponentKind::Pattern,
        ComponentKind::Sentiment,
        ComponentKind::Qualitative,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Technical => "technical",
            ComponentKind::Pattern => "pattern",
            ComponentKind::Sentiment => "sentiment",
            ComponentKind::Qualitative => "qualitative",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a component took part in a synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ComponentStatus {
    Included,
    /// Pattern scan ran but found no formation.
    NoFormation,
    InsufficientData,
    Unavailable(UnavailableReason),
}

/// One component's entry in the composite breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentContribution {
    pub status: ComponentStatus,
    /// Normalized value in [-1, 1], when the component was included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<f64>,
    /// Declared static weight.
    pub weight: f64,
    /// Weight after renormalizing over included components.
    pub effective_weight: f64,
    /// `normalized * effective_weight`; zero when excluded.
    pub contribution: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Composite signal for one asset, one window, one evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSignal {
    pub asset: String,
    pub window: LookbackWindow,
    /// Evaluation time, unix milliseconds.
    pub as_of: i64,
    /// Strength in [-1, 1].
    pub strength: f64,
    pub label: SignalLabel,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub breakdown: BTreeMap<ComponentKind, ComponentContribution>,
}

impl CompositeSignal {
    /// Components that contributed to the strength.
    pub fn included(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.breakdown
            .iter()
            .filter(|(_, c)| c.status == ComponentStatus::Included)
            .map(|(k, _)| *k)
    }

    /// Human-readable summary of the signal and each component.
    pub fn explain(&self) -> String {
        let mut out = format!(
            "{} ({}): {} with strength {:+.2} and confidence {:.0}%",
            self.asset.to_uppercase(),
            self.window,
            self.label.label(),
            self.strength,
            self.confidence * 100.0
        );

        for (kind, c) in &self.breakdown {
            let line = match (c.status, c.normalized) {
                (ComponentStatus::Included, Some(v)) => format!(
                    "\n- {}: {:+.2} x {:.2} = {:+.3}",
                    kind, v, c.effective_weight, c.contribution
                ),
                (ComponentStatus::NoFormation, _) => format!("\n- {}: no formation", kind),
                (ComponentStatus::InsufficientData, _) => {
                    format!("\n- {}: insufficient data", kind)
                }
                (ComponentStatus::Unavailable(reason), _) => {
                    format!("\n- {}: unavailable ({})", kind, reason)
                }
                (ComponentStatus::Included, None) => format!("\n- {}: included", kind),
            };
            out.push_str(&line);
            if let Some(note) = &c.note {
                out.push_str(&format!(" [{}]", note));
            }
        }

        out
    }
}

/// Result of one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "signal", rename_all = "snake_case")]
pub enum Evaluation {
    Signal(CompositeSignal),
    /// No component produced a value. Distinct from a flat Hold.
    Unavailable,
}

impl Evaluation {
    pub fn signal(&self) -> Option<&CompositeSignal> {
        match self {
            Evaluation::Signal(s) => Some(s),
            Evaluation::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Evaluation::Unavailable)
    }
}
