use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lookback window for a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LookbackWindow {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d", alias = "24h")]
    OneDay,
    #[serde(rename = "7d", alias = "1w")]
    SevenDays,
    #[serde(rename = "30d", alias = "1m")]
    ThirtyDays,
}

impl LookbackWindow {
    /// Parse a window from its short label.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(LookbackWindow::OneHour),
            "4h" => Some(LookbackWindow::FourHours),
            "1d" | "24h" => Some(LookbackWindow::OneDay),
            "7d" | "1w" => Some(LookbackWindow::SevenDays),
            "30d" | "1m" => Some(LookbackWindow::ThirtyDays),
            _ => None,
        }
    }

    /// Short label used in cache keys and reports.
    pub fn label(&self) -> &'static str {
        match self {
            LookbackWindow::OneHour => "1h",
            LookbackWindow::FourHours => "4h",
            LookbackWindow::OneDay => "1d",
            LookbackWindow::SevenDays => "7d",
            LookbackWindow::ThirtyDays => "30d",
        }
    }

    /// Nominal bar interval in seconds for this window.
    pub fn bar_seconds(&self) -> i64 {
        match self {
            LookbackWindow::OneHour => 60,       // 1-minute bars
            LookbackWindow::FourHours => 300,    // 5-minute bars
            LookbackWindow::OneDay => 3600,      // hourly bars
            LookbackWindow::SevenDays => 3600,   // hourly bars
            LookbackWindow::ThirtyDays => 86400, // daily bars
        }
    }

    /// Total duration in seconds.
    pub fn duration_seconds(&self) -> i64 {
        match self {
            LookbackWindow::OneHour => 3600,
            LookbackWindow::FourHours => 14400,
            LookbackWindow::OneDay => 86400,
            LookbackWindow::SevenDays => 604800,
            LookbackWindow::ThirtyDays => 2592000,
        }
    }

    /// Total duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        self.duration_seconds() * 1000
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// OHLCV sample. `time` is a UTC unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PricePoint {
    /// Check the candle invariants, returning a description of the first violation.
    pub fn check(&self) -> Result<(), String> {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("non-finite value".to_string());
        }
        if values.iter().any(|v| *v < 0.0) {
            return Err("negative value".to_string());
        }
        if self.high < self.low {
            return Err(format!("high {} below low {}", self.high, self.low));
        }
        for (label, v) in [("open", self.open), ("close", self.close)] {
            if v < self.low || v > self.high {
                return Err(format!(
                    "{} {} outside [{}, {}]",
                    label, v, self.low, self.high
                ));
            }
        }
        Ok(())
    }

    /// Check whether the point satisfies all invariants.
    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }
}

/// Summary statistics over a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub first_close: f64,
    pub last_close: f64,
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub total_volume: f64,
    pub points: usize,
}

/// Validated, time-ordered OHLCV series for one asset and window.
///
/// Points are shared behind an `Arc` so snapshots handed to readers are
/// cheap to clone and can never be mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    asset: String,
    window: LookbackWindow,
    points: Arc<[PricePoint]>,
}

impl PriceSeries {
    /// Build a series from points that are already validated, sorted and deduplicated.
    pub(crate) fn from_validated(
        asset: impl Into<String>,
        window: LookbackWindow,
        points: Vec<PricePoint>,
    ) -> Self {
        Self {
            asset: asset.into(),
            window,
            points: points.into(),
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn window(&self) -> LookbackWindow {
        self.window
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closing prices in time order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Timestamp of the newest point.
    pub fn last_time(&self) -> Option<i64> {
        self.points.last().map(|p| p.time)
    }

    /// Number of intervals longer than 1.5x the median spacing.
    pub fn gap_count(&self) -> usize {
        count_gaps(&self.points)
    }

    /// Summary statistics, or `None` for an empty series.
    pub fn summary(&self) -> Option<SeriesSummary> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        let high = self.points.iter().map(|p| p.high).fold(f64::MIN, f64::max);
        let low = self.points.iter().map(|p| p.low).fold(f64::MAX, f64::min);
        let change_pct = if first.close > 0.0 {
            (last.close - first.close) / first.close * 100.0
        } else {
            0.0
        };

        Some(SeriesSummary {
            first_close: first.close,
            last_close: last.close,
            change_pct,
            high,
            low,
            total_volume: self.points.iter().map(|p| p.volume).sum(),
            points: self.points.len(),
        })
    }
}

/// Count intervals wider than 1.5x the median interval of a sorted slice.
pub(crate) fn count_gaps(points: &[PricePoint]) -> usize {
    if points.len() < 3 {
        return 0;
    }

    let mut intervals: Vec<i64> = points.windows(2).map(|w| w[1].time - w[0].time).collect();
    let mut sorted = intervals.clone();
    sorted.sort_unstable();
    let median = sorted[sorted.len() / 2];
    if median <= 0 {
        return 0;
    }

    intervals.retain(|i| (*i as f64) > median as f64 * 1.5);
    intervals.len()
}
