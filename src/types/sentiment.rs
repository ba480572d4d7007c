use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores within this distance of zero count as neutral.
pub const NEUTRAL_BAND: f64 = 0.05;

/// Origin of a sentiment item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentSource {
    News,
    Reddit,
    Twitter,
    Other,
}

/// A single pre-scored news article or social post.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentItem {
    /// Score in [-1, 1] assigned upstream.
    pub score: f64,
    /// Publication time, unix milliseconds.
    pub timestamp: i64,
    #[serde(default = "default_source")]
    pub source: SentimentSource,
}

fn default_source() -> SentimentSource {
    SentimentSource::Other
}

impl SentimentItem {
    pub fn new(score: f64, timestamp: i64, source: SentimentSource) -> Self {
        Self {
            score,
            timestamp,
            source,
        }
    }
}

/// Overall tone of a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentMood {
    Positive,
    Neutral,
    Negative,
}

impl SentimentMood {
    pub fn classify(score: f64) -> Self {
        if score > NEUTRAL_BAND {
            SentimentMood::Positive
        } else if score < -NEUTRAL_BAND {
            SentimentMood::Negative
        } else {
            SentimentMood::Neutral
        }
    }
}

/// Count of items by tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl SentimentDistribution {
    pub fn record(&mut self, score: f64) {
        match SentimentMood::classify(score) {
            SentimentMood::Positive => self.positive += 1,
            SentimentMood::Neutral => self.neutral += 1,
            SentimentMood::Negative => self.negative += 1,
        }
    }
}

/// Aggregated, recency-weighted sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentScore {
    /// Score in [-1, 1].
    pub value: f64,
    /// Number of items inside the lookback window.
    pub coverage: u32,
    /// Age of the newest item, milliseconds.
    pub recency_ms: i64,
    pub distribution: SentimentDistribution,
    pub by_source: BTreeMap<SentimentSource, u32>,
}

impl SentimentScore {
    pub fn mood(&self) -> SentimentMood {
        SentimentMood::classify(self.value)
    }
}
