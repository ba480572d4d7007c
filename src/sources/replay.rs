//! In-memory collaborators that replay recorded responses.
//!
//! Used by the replay binary and by tests. Each feed answers per asset
//! (case-insensitive) with a recorded payload or a recorded error, after an
//! optional artificial delay.

use crate::config::{ComponentWeights, Config};
use crate::error::{AppError, FeedError, Result as AppResult};
use crate::services::SignalEngine;
use crate::sources::{PriceFeed, QualitativeSource, SentimentFeed};
use crate::types::{
    AssessmentContext, LookbackWindow, MarketView, PricePoint, QualitativeAssessment,
    SentimentItem,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Recorded responses keyed by lowercase asset.
struct Recorded<T> {
    responses: DashMap<String, Result<T, FeedError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl<T: Clone> Recorded<T> {
    fn new() -> Self {
        Self {
            responses: DashMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    async fn answer(&self, asset: &str) -> Result<T, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(&asset.to_lowercase())
            .map(|r| r.value().clone())
            .unwrap_or_else(|| Err(FeedError::Unavailable(format!("no data for {}", asset))))
    }
}

/// Price feed replaying recorded OHLC series.
pub struct ReplayPriceFeed {
    recorded: Recorded<Vec<PricePoint>>,
}

impl ReplayPriceFeed {
    pub fn new() -> Self {
        Self {
            recorded: Recorded::new(),
        }
    }

    pub fn with_series(self, asset: &str, points: Vec<PricePoint>) -> Self {
        self.recorded.responses.insert(asset.to_lowercase(), Ok(points));
        self
    }

    pub fn with_error(self, asset: &str, error: FeedError) -> Self {
        self.recorded.responses.insert(asset.to_lowercase(), Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.recorded.delay = Some(delay);
        self
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.recorded.calls.load(Ordering::SeqCst)
    }
}

impl Default for ReplayPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceFeed for ReplayPriceFeed {
    fn name(&self) -> &str {
        "replay-prices"
    }

    async fn fetch_ohlc(
        &self,
        asset: &str,
        _window: LookbackWindow,
    ) -> Result<Vec<PricePoint>, FeedError> {
        self.recorded.answer(asset).await
    }
}

/// Sentiment feed replaying recorded items.
pub struct ReplaySentimentFeed {
    name: String,
    recorded: Recorded<Vec<SentimentItem>>,
}

impl ReplaySentimentFeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorded: Recorded::new(),
        }
    }

    pub fn with_items(self, asset: &str, items: Vec<SentimentItem>) -> Self {
        self.recorded.responses.insert(asset.to_lowercase(), Ok(items));
        self
    }

    pub fn with_error(self, asset: &str, error: FeedError) -> Self {
        self.recorded.responses.insert(asset.to_lowercase(), Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.recorded.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.recorded.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentFeed for ReplaySentimentFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_sentiment_items(
        &self,
        asset: &str,
        _window: LookbackWindow,
    ) -> Result<Vec<SentimentItem>, FeedError> {
        self.recorded.answer(asset).await
    }
}

/// Qualitative source replaying recorded assessments.
pub struct ReplayQualitativeSource {
    recorded: Recorded<QualitativeAssessment>,
}

impl ReplayQualitativeSource {
    pub fn new() -> Self {
        Self {
            recorded: Recorded::new(),
        }
    }

    pub fn with_assessment(self, asset: &str, assessment: QualitativeAssessment) -> Self {
        self.recorded
            .responses
            .insert(asset.to_lowercase(), Ok(assessment));
        self
    }

    pub fn with_error(self, asset: &str, error: FeedError) -> Self {
        self.recorded.responses.insert(asset.to_lowercase(), Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.recorded.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.recorded.calls.load(Ordering::SeqCst)
    }
}

impl Default for ReplayQualitativeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QualitativeSource for ReplayQualitativeSource {
    fn name(&self) -> &str {
        "replay-assessments"
    }

    async fn assess(
        &self,
        asset: &str,
        _context: &AssessmentContext,
    ) -> Result<QualitativeAssessment, FeedError> {
        self.recorded.answer(asset).await
    }
}

/// Recorded inputs for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub asset: String,
    pub window: LookbackWindow,
    /// Evaluation time; defaults to the last price timestamp.
    #[serde(default)]
    pub as_of: Option<i64>,
    #[serde(default)]
    pub prices: Vec<PricePoint>,
    #[serde(default)]
    pub sentiment: Vec<SentimentItem>,
    #[serde(default)]
    pub assessment: Option<QualitativeAssessment>,
    /// Raw analyst view, used when no assessment is recorded.
    #[serde(default)]
    pub market_view: Option<MarketView>,
    /// Per-evaluation weights override.
    #[serde(default)]
    pub weights: Option<ComponentWeights>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.asset.trim().is_empty() {
            return Err(AppError::BadRequest("snapshot asset is empty".to_string()));
        }
        if let Some(weights) = &snapshot.weights {
            weights.validate()?;
        }
        Ok(snapshot)
    }

    /// Read and parse a snapshot file.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    /// Evaluation time for this snapshot.
    pub fn as_of(&self) -> i64 {
        self.as_of
            .or_else(|| self.prices.iter().map(|p| p.time).max())
            .unwrap_or(0)
    }

    /// Engine whose collaborators replay this snapshot.
    pub fn engine(&self, config: Config) -> Arc<SignalEngine> {
        let mut prices = ReplayPriceFeed::new();
        if !self.prices.is_empty() {
            prices = prices.with_series(&self.asset, self.prices.clone());
        }

        let sentiment =
            ReplaySentimentFeed::new("snapshot").with_items(&self.asset, self.sentiment.clone());

        let mut qualitative = ReplayQualitativeSource::new();
        if let Some(assessment) = &self.assessment {
            qualitative = qualitative.with_assessment(&self.asset, assessment.clone());
        } else if let Some(view) = &self.market_view {
            qualitative = match QualitativeAssessment::try_from(view.clone()) {
                Ok(assessment) => qualitative.with_assessment(&self.asset, assessment),
                Err(e) => qualitative.with_error(&self.asset, e),
            };
        }

        SignalEngine::new(
            config,
            Arc::new(prices),
            vec![Arc::new(sentiment)],
            Arc::new(qualitative),
        )
    }
}


#[cfg(test)]
mod snapshot_tests {
    use super::*;
    use crate::types::{Evaluation, UnavailableReason};

    #[test]
    fn test_snapshot_defaults() {
        let snapshot = Snapshot::from_json(
            r#"{"asset": "btc", "window": "24h", "prices": [
                {"time": 1000, "open": 1, "high": 1, "low": 1, "close": 1},
                {"time": 2000, "open": 1, "high": 2, "low": 1, "close": 2}
            ]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.window, LookbackWindow::OneDay);
        assert_eq!(snapshot.as_of(), 2000);
        assert!(snapshot.sentiment.is_empty());
        assert!(snapshot.assessment.is_none());
    }

    #[test]
    fn test_snapshot_requires_asset() {
        let result = Snapshot::from_json(r#"{"asset": " ", "window": "1h"}"#);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(AppError::SerdeJson(_))
        ));
        let zero = r#"{"asset": "btc", "window": "1h", "weights":
            {"technical": 0, "pattern": 0, "sentiment": 0, "qualitative": 0}}"#;
        assert!(matches!(Snapshot::from_json(zero), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_snapshot_market_view_feeds_qualitative() {
        let snapshot = Snapshot::from_json(
            r#"{"asset": "eth", "window": "1d", "asOf": 0,
                "marketView": {"trend": "bullish", "trend_strength": "strong", "confidence": 0.5}}"#,
        )
        .unwrap();
        let engine = snapshot.engine(Config::default());
        let evaluation = engine
            .evaluate_at(&snapshot.asset, snapshot.window, None, snapshot.as_of())
            .await;
        let signal = match evaluation {
            Evaluation::Signal(signal) => signal,
            Evaluation::Unavailable => panic!("qualitative component should be available"),
        };
        assert!((signal.strength - 0.5).abs() < 1e-12);
        assert_eq!(
            signal.breakdown[&crate::types::ComponentKind::Technical].status,
            crate::types::ComponentStatus::Unavailable(UnavailableReason::Failed)
        );
    }
}
