//! Sentiment aggregation.
//!
//! Items arrive pre-scored in [-1, 1]. The aggregate is a recency-weighted
//! mean, with each item weighted by `exp(-age / half_life)`, then scaled by
//! the freshness of the newest item so a stale set fades toward zero.

use crate::config::SentimentConfig;
use crate::types::{
    Availability, LookbackWindow, SentimentDistribution, SentimentItem, SentimentScore,
    UnavailableReason,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Recency-weighted sentiment aggregator.
pub struct SentimentAggregator {
    config: SentimentConfig,
}

impl SentimentAggregator {
    pub fn new(config: SentimentConfig) -> Self {
        Self { config }
    }

    fn half_life_ms(&self) -> f64 {
        self.config.half_life_secs.max(1).saturating_mul(1000) as f64
    }

    /// Aggregate the items inside `window` as of `as_of` (unix ms).
    ///
    /// Returns `Unavailable(NoData)` when nothing falls inside the window,
    /// or `Unavailable(Malformed)` when every item was rejected.
    pub fn aggregate(
        &self,
        asset: &str,
        items: &[SentimentItem],
        window: LookbackWindow,
        as_of: i64,
    ) -> Availability<SentimentScore> {
        let half_life = self.half_life_ms();
        let lookback = window.duration_ms();

        let mut malformed = 0usize;
        let mut weight_sum = 0.0;
        let mut weighted = 0.0;
        let mut newest_age: Option<i64> = None;
        let mut coverage = 0u32;
        let mut distribution = SentimentDistribution::default();
        let mut by_source = BTreeMap::new();

        for item in items {
            if !item.score.is_finite() || !(-1.0..=1.0).contains(&item.score) {
                malformed += 1;
                continue;
            }
            // Items stamped after the evaluation time count as brand new.
            let age = as_of.saturating_sub(item.timestamp).max(0);
            if age > lookback {
                continue;
            }

            let w = (-(age as f64) / half_life).exp();
            weight_sum += w;
            weighted += w * item.score;
            newest_age = Some(newest_age.map_or(age, |n| n.min(age)));
            coverage += 1;
            distribution.record(item.score);
            *by_source.entry(item.source).or_insert(0u32) += 1;
        }

        if malformed > 0 {
            warn!(
                "Dropped {} malformed sentiment items for {}",
                malformed, asset
            );
        }

        let Some(recency_ms) = newest_age else {
            return if malformed > 0 && malformed == items.len() {
                Availability::Unavailable(UnavailableReason::Malformed)
            } else {
                Availability::Unavailable(UnavailableReason::NoData)
            };
        };
        if weight_sum <= 0.0 {
            return Availability::Unavailable(UnavailableReason::NoData);
        }

        let freshness = (-(recency_ms as f64) / half_life).exp();
        let value = (weighted / weight_sum * freshness).clamp(-1.0, 1.0);

        debug!(
            "Sentiment for {}: {:.3} from {} items (newest {}s old)",
            asset,
            value,
            coverage,
            recency_ms / 1000
        );

        Availability::Value(SentimentScore {
            value,
            coverage,
            recency_ms,
            distribution,
            by_source,
        })
    }

    /// Share of full influence granted to a score with `coverage` items.
    pub fn coverage_factor(&self, coverage: u32) -> f64 {
        let saturation = self.config.coverage_saturation.max(1) as f64;
        (coverage as f64 / saturation).min(1.0)
    }

    /// Normalized sentiment component in [-1, 1].
    pub fn normalized(&self, score: &SentimentScore) -> f64 {
        (score.value * self.coverage_factor(score.coverage)).clamp(-1.0, 1.0)
    }
}
