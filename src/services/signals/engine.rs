//! Evaluation engine.
//!
//! Gathers the four components from their collaborators concurrently, each
//! bounded by the component timeout, and hands them to the synthesizer.

use crate::config::{ComponentWeights, Config};
use crate::error::FeedError;
use crate::services::price_store::{PriceSeriesStore, SeriesLookup};
use crate::services::signals::composite::{synthesize, ComponentInputs, PatternInput};
use crate::services::signals::patterns::PatternDetector;
use crate::services::signals::qualitative::overlay;
use crate::services::signals::sentiment::SentimentAggregator;
use crate::services::signals::technical::TechnicalSnapshot;
use crate::sources::{PriceFeed, QualitativeSource, SentimentFeed};
use crate::types::{
    AssessmentContext, Availability, Evaluation, LookbackWindow, PriceSeries, QualitativeNudge,
    SentimentScore, UnavailableReason,
};
use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run a collaborator call on its own task, giving up after `timeout`.
///
/// The task is not aborted on timeout; its late result is simply dropped.
async fn bounded<T, F>(what: &str, asset: &str, timeout: Duration, call: F) -> Result<T, FeedError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, FeedError>> + Send + 'static,
{
    let handle = tokio::spawn(call);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!("{} task for {} failed: {}", what, asset, e);
            Err(FeedError::Unavailable(e.to_string()))
        }
        Err(_) => {
            warn!(
                "{} for {} timed out after {}ms",
                what,
                asset,
                timeout.as_millis()
            );
            Err(FeedError::Timeout)
        }
    }
}

fn log_feed_error(what: &str, source: &str, asset: &str, error: &FeedError) {
    match error {
        FeedError::RateLimited => warn!("{} {} rate limited for {}", what, source, asset),
        FeedError::Timeout => {}
        other => warn!("{} {} failed for {}: {}", what, source, asset, other),
    }
}

/// Composite signal engine.
pub struct SignalEngine {
    config: Config,
    store: Arc<PriceSeriesStore>,
    price_feed: Arc<dyn PriceFeed>,
    sentiment_feeds: Vec<Arc<dyn SentimentFeed>>,
    qualitative: Arc<dyn QualitativeSource>,
    detector: PatternDetector,
    aggregator: SentimentAggregator,
}

impl SignalEngine {
    /// Create a new engine over the given collaborators.
    pub fn new(
        config: Config,
        price_feed: Arc<dyn PriceFeed>,
        sentiment_feeds: Vec<Arc<dyn SentimentFeed>>,
        qualitative: Arc<dyn QualitativeSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store: PriceSeriesStore::new(config.price.clone()),
            detector: PatternDetector::new(config.patterns.clone()),
            aggregator: SentimentAggregator::new(config.sentiment.clone()),
            config,
            price_feed,
            sentiment_feeds,
            qualitative,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared price series cache.
    pub fn store(&self) -> &Arc<PriceSeriesStore> {
        &self.store
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.component_timeout_ms)
    }

    /// Evaluate `asset` over `window` as of now.
    pub async fn evaluate(
        &self,
        asset: &str,
        window: LookbackWindow,
        weights: Option<ComponentWeights>,
    ) -> Evaluation {
        let as_of = chrono::Utc::now().timestamp_millis();
        self.evaluate_at(asset, window, weights, as_of).await
    }

    /// Evaluate `asset` over `window` as of `as_of` (unix milliseconds).
    pub async fn evaluate_at(
        &self,
        asset: &str,
        window: LookbackWindow,
        weights: Option<ComponentWeights>,
        as_of: i64,
    ) -> Evaluation {
        let asset = asset.to_lowercase();
        let weights = self.resolve_weights(weights);

        // Context comes from what is already cached so the overlay never
        // waits on the price feed.
        let context = AssessmentContext {
            asset: asset.clone(),
            window,
            as_of,
            series: self
                .store
                .get_series(&asset, window)
                .series()
                .and_then(|s| s.summary()),
        };

        let (series, sentiment, qualitative) = tokio::join!(
            self.fetch_series(&asset, window, as_of),
            self.fetch_sentiment(&asset, window, as_of),
            self.fetch_qualitative(&asset, context),
        );

        let (technical, pattern) = match series {
            Availability::Value(series) => {
                let technical = TechnicalSnapshot::compute(&series, &self.config.indicators);
                let scan = self.detector.scan(&series);
                let last_close = series.last().map(|p| p.close).unwrap_or(0.0);
                (
                    Availability::Value(technical),
                    Availability::Value(PatternInput { scan, last_close }),
                )
            }
            Availability::Unavailable(reason) => (
                Availability::Unavailable(reason),
                Availability::Unavailable(reason),
            ),
            Availability::InsufficientData => {
                (Availability::InsufficientData, Availability::InsufficientData)
            }
        };

        let inputs = ComponentInputs {
            asset: asset.clone(),
            window,
            as_of,
            technical,
            pattern,
            sentiment,
            qualitative,
        };
        let evaluation = synthesize(&inputs, &weights, &self.config);

        match &evaluation {
            Evaluation::Signal(signal) => info!(
                "Evaluated {} {}: {} (strength {:+.3}, confidence {:.3})",
                asset,
                window,
                signal.label.label(),
                signal.strength,
                signal.confidence
            ),
            Evaluation::Unavailable => {
                warn!("No components available for {} {}", asset, window)
            }
        }
        evaluation
    }

    fn resolve_weights(&self, weights: Option<ComponentWeights>) -> ComponentWeights {
        match weights {
            Some(w) => match w.validate() {
                Ok(()) => w,
                Err(e) => {
                    warn!("Ignoring weights override: {}", e);
                    self.config.weights
                }
            },
            None => self.config.weights,
        }
    }

    /// Refresh the cached series, falling back to a recent snapshot on failure.
    async fn fetch_series(
        &self,
        asset: &str,
        window: LookbackWindow,
        as_of: i64,
    ) -> Availability<Arc<PriceSeries>> {
        let feed = Arc::clone(&self.price_feed);
        let task_asset = asset.to_string();
        let fetched = bounded("Price fetch", asset, self.timeout(), async move {
            feed.fetch_ohlc(&task_asset, window).await
        })
        .await;

        match fetched {
            Ok(points) => {
                let report = self.store.ingest(asset, window, points);
                if report.accepted == 0 {
                    let reason = if report.dropped_malformed > 0 {
                        UnavailableReason::Malformed
                    } else {
                        UnavailableReason::NoData
                    };
                    warn!(
                        "Price feed {} returned no usable points for {}",
                        self.price_feed.name(),
                        asset
                    );
                    return self.cached_or(asset, window, as_of, reason);
                }
                match self.store.get_series(asset, window) {
                    SeriesLookup::Series(series) => Availability::Value(series),
                    SeriesLookup::Empty => Availability::Unavailable(UnavailableReason::NoData),
                    SeriesLookup::InsufficientData {
                        available,
                        required,
                    } => {
                        debug!(
                            "{} {} has {} of {} required points",
                            asset, window, available, required
                        );
                        Availability::InsufficientData
                    }
                }
            }
            Err(e) => {
                log_feed_error("Price feed", self.price_feed.name(), asset, &e);
                self.cached_or(asset, window, as_of, e.reason())
            }
        }
    }

    /// Recent cached snapshot, or `reason` when there is none.
    fn cached_or(
        &self,
        asset: &str,
        window: LookbackWindow,
        as_of: i64,
        reason: UnavailableReason,
    ) -> Availability<Arc<PriceSeries>> {
        match self.store.fresh_series(asset, window, as_of) {
            Some(series) => {
                debug!("Using cached {} {} series", asset, window);
                Availability::Value(series)
            }
            None => Availability::Unavailable(reason),
        }
    }

    /// Poll every sentiment feed concurrently and aggregate what arrives.
    async fn fetch_sentiment(
        &self,
        asset: &str,
        window: LookbackWindow,
        as_of: i64,
    ) -> Availability<SentimentScore> {
        if self.sentiment_feeds.is_empty() {
            return Availability::Unavailable(UnavailableReason::NoData);
        }

        let calls = self.sentiment_feeds.iter().map(|feed| {
            let feed = Arc::clone(feed);
            let task_asset = asset.to_string();
            bounded("Sentiment fetch", asset, self.timeout(), async move {
                feed.fetch_sentiment_items(&task_asset, window).await
            })
        });
        let results = join_all(calls).await;

        let mut items = Vec::new();
        let mut first_error = None;
        let mut answered = 0;
        for (feed, result) in self.sentiment_feeds.iter().zip(results) {
            match result {
                Ok(batch) => {
                    answered += 1;
                    items.extend(batch);
                }
                Err(e) => {
                    log_feed_error("Sentiment feed", feed.name(), asset, &e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if answered == 0 {
            if let Some(e) = first_error {
                return Availability::Unavailable(e.reason());
            }
        }
        self.aggregator.aggregate(asset, &items, window, as_of)
    }

    async fn fetch_qualitative(
        &self,
        asset: &str,
        context: AssessmentContext,
    ) -> Availability<QualitativeNudge> {
        let source = Arc::clone(&self.qualitative);
        let task_asset = asset.to_string();
        let result = bounded("Qualitative assessment", asset, self.timeout(), async move {
            source.assess(&task_asset, &context).await
        })
        .await;
        overlay(asset, result)
    }
}
