//! Validated price series cache.
//!
//! One immutable `PriceSeries` snapshot per `(asset, window)`. A refresh
//! builds a complete new series and swaps it in with a single insert, so
//! readers either see the old snapshot or the new one, never a mix.

use crate::config::PriceStoreConfig;
use crate::error::FeedError;
use crate::sources::PriceFeed;
use crate::types::{LookbackWindow, PricePoint, PriceSeries};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a series lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesLookup {
    Series(Arc<PriceSeries>),
    /// Nothing stored for this asset and window.
    Empty,
    /// Stored, but with fewer valid points than required.
    InsufficientData { available: usize, required: usize },
}

impl SeriesLookup {
    pub fn series(&self) -> Option<&Arc<PriceSeries>> {
        match self {
            SeriesLookup::Series(s) => Some(s),
            _ => None,
        }
    }
}

/// What happened to a batch of ingested points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub dropped_malformed: usize,
    pub dropped_duplicates: usize,
    pub gaps: usize,
}

/// Store of validated price series keyed by asset and window.
pub struct PriceSeriesStore {
    /// Key format: "{asset}:{window}"
    series: DashMap<String, Arc<PriceSeries>>,
    config: PriceStoreConfig,
}

fn cache_key(asset: &str, window: LookbackWindow) -> String {
    format!("{}:{}", asset.to_lowercase(), window.label())
}

/// Validate, sort and deduplicate raw points.
///
/// Malformed points are dropped and logged. When two points share a
/// timestamp the later one in the input wins.
pub fn sanitize_points(asset: &str, points: Vec<PricePoint>) -> (Vec<PricePoint>, IngestReport) {
    let mut report = IngestReport::default();

    let mut valid: Vec<(usize, PricePoint)> = Vec::with_capacity(points.len());
    for (i, point) in points.into_iter().enumerate() {
        match point.check() {
            Ok(()) => valid.push((i, point)),
            Err(reason) => {
                warn!(
                    "Dropping malformed price point for {} at {}: {}",
                    asset, point.time, reason
                );
                report.dropped_malformed += 1;
            }
        }
    }

    // Stable on input order so "last occurrence wins" is well defined.
    valid.sort_by_key(|(i, p)| (p.time, *i));

    let mut cleaned: Vec<PricePoint> = Vec::with_capacity(valid.len());
    for (_, point) in valid {
        match cleaned.last_mut() {
            Some(last) if last.time == point.time => {
                *last = point;
                report.dropped_duplicates += 1;
            }
            _ => cleaned.push(point),
        }
    }

    report.accepted = cleaned.len();
    report.gaps = crate::types::chart::count_gaps(&cleaned);
    (cleaned, report)
}

impl PriceSeriesStore {
    /// Create a new price series store.
    pub fn new(config: PriceStoreConfig) -> Arc<Self> {
        Arc::new(Self {
            series: DashMap::new(),
            config,
        })
    }

    pub fn min_points(&self) -> usize {
        self.config.min_points
    }

    /// Validate raw points and replace the stored series for `(asset, window)`.
    ///
    /// A batch with no usable points leaves the stored snapshot in place.
    pub fn ingest(
        &self,
        asset: &str,
        window: LookbackWindow,
        points: Vec<PricePoint>,
    ) -> IngestReport {
        let (cleaned, report) = sanitize_points(asset, points);

        if report.dropped_malformed > 0 || report.dropped_duplicates > 0 {
            warn!(
                "Data quality for {} {}: {} accepted, {} malformed, {} duplicate timestamps",
                asset, window, report.accepted, report.dropped_malformed, report.dropped_duplicates
            );
        }
        if report.gaps > 0 {
            debug!("{} {} series has {} gaps", asset, window, report.gaps);
        }

        if cleaned.is_empty() {
            warn!("No usable points for {} {}, keeping previous snapshot", asset, window);
            return report;
        }

        let series = PriceSeries::from_validated(asset.to_lowercase(), window, cleaned);
        self.series.insert(cache_key(asset, window), Arc::new(series));
        report
    }

    /// Get the current snapshot for `(asset, window)`.
    pub fn get_series(&self, asset: &str, window: LookbackWindow) -> SeriesLookup {
        let snapshot = match self.series.get(&cache_key(asset, window)) {
            Some(entry) => Arc::clone(entry.value()),
            None => return SeriesLookup::Empty,
        };

        if snapshot.is_empty() {
            return SeriesLookup::Empty;
        }
        if snapshot.len() < self.config.min_points {
            return SeriesLookup::InsufficientData {
                available: snapshot.len(),
                required: self.config.min_points,
            };
        }
        SeriesLookup::Series(snapshot)
    }

    /// Snapshot usable as a fallback at `as_of`, if fresh enough.
    pub fn fresh_series(
        &self,
        asset: &str,
        window: LookbackWindow,
        as_of: i64,
    ) -> Option<Arc<PriceSeries>> {
        let series = self.get_series(asset, window).series()?.clone();
        let age_ms = as_of - series.last_time()?;
        if age_ms <= self.config.max_cached_age_secs * 1000 {
            Some(series)
        } else {
            debug!(
                "Cached {} {} series is {}s old, not reusing",
                asset,
                window,
                age_ms / 1000
            );
            None
        }
    }

    /// Fetch from a price feed and store the result.
    pub async fn refresh(
        &self,
        feed: &dyn PriceFeed,
        asset: &str,
        window: LookbackWindow,
    ) -> Result<IngestReport, FeedError> {
        let points = feed.fetch_ohlc(asset, window).await?;
        Ok(self.ingest(asset, window, points))
    }

    /// Remove every stored window for an asset.
    pub fn invalidate(&self, asset: &str) {
        let prefix = format!("{}:", asset.to_lowercase());
        self.series.retain(|k, _| !k.starts_with(&prefix));
    }

    /// Number of stored series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
