use serde::{Deserialize, Serialize};
use std::fmt;

/// Chart formation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DoubleTop,
    DoubleBottom,
    HeadAndShoulders,
    AscendingTriangle,
    DescendingTriangle,
    None,
}

impl PatternKind {
    /// Directional bias of the formation: +1 bullish, -1 bearish, 0 none.
    pub fn bias(&self) -> f64 {
        match self {
            PatternKind::DoubleBottom | PatternKind::AscendingTriangle => 1.0,
            PatternKind::DoubleTop
            | PatternKind::HeadAndShoulders
            | PatternKind::DescendingTriangle => -1.0,
            PatternKind::None => 0.0,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternKind::DoubleTop => "double_top",
            PatternKind::DoubleBottom => "double_bottom",
            PatternKind::HeadAndShoulders => "head_and_shoulders",
            PatternKind::AscendingTriangle => "ascending_triangle",
            PatternKind::DescendingTriangle => "descending_triangle",
            PatternKind::None => "none",
        };
        f.write_str(s)
    }
}

/// Detected formation spanning `[start, end]` (unix milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub start: i64,
    pub end: i64,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl Pattern {
    /// The "nothing found" outcome over a span.
    pub fn none(start: i64, end: i64) -> Self {
        Self {
            kind: PatternKind::None,
            start,
            end,
            confidence: 0.0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == PatternKind::None
    }

    /// Signed value in [-1, 1]: bias scaled by confidence.
    pub fn signed_strength(&self) -> f64 {
        self.kind.bias() * self.confidence
    }
}

/// Whether an extremum is a local high or low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumKind {
    Peak,
    Trough,
}

/// Confirmed swing point in a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub index: usize,
    pub time: i64,
    pub price: f64,
    pub kind: ExtremumKind,
}

/// Support or resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// Price level touched repeatedly by swing points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistanceLevel {
    pub price: f64,
    /// Number of touches.
    pub strength: u32,
    pub kind: LevelKind,
}

/// Everything the pattern detector found in one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternScan {
    pub extrema: Vec<Extremum>,
    pub levels: Vec<SupportResistanceLevel>,
    /// At most one pattern per kind, strongest first.
    pub patterns: Vec<Pattern>,
    /// Span of the scanned series.
    pub start: i64,
    pub end: i64,
}

impl PatternScan {
    /// Highest-confidence pattern, ties broken by the latest end, or `none`.
    pub fn dominant(&self) -> Pattern {
        self.patterns
            .first()
            .copied()
            .unwrap_or_else(|| Pattern::none(self.start, self.end))
    }

    pub fn pattern(&self, kind: PatternKind) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.kind == kind)
    }

    /// Nearest resistance at or above `price`.
    pub fn resistance_above(&self, price: f64) -> Option<&SupportResistanceLevel> {
        self.levels
            .iter()
            .filter(|l| l.kind == LevelKind::Resistance && l.price >= price)
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    /// Nearest support at or below `price`.
    pub fn support_below(&self, price: f64) -> Option<&SupportResistanceLevel> {
        self.levels
            .iter()
            .filter(|l| l.kind == LevelKind::Support && l.price <= price)
            .max_by(|a, b| a.price.total_cmp(&b.price))
    }
}
