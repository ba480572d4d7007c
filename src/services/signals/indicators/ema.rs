//! Exponential Moving Average (EMA) indicator.

use super::TechnicalIndicator;
use crate::types::{IndicatorReading, PricePoint};

/// EMA series seeded with the SMA of the first `period` values.
///
/// Element `k` of the result is the EMA as of `values[period - 1 + k]`.
/// Empty when there are fewer than `period` values.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);

    // First EMA is SMA
    let mut ema = values.iter().take(period).sum::<f64>() / period as f64;
    out.push(ema);

    for value in &values[period..] {
        ema = (value - ema) * multiplier + ema;
        out.push(ema);
    }

    out
}

/// EMA as of the last value.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    ema_series(values, period).last().copied()
}

/// EMA (Exponential Moving Average) indicator.
///
/// Like SMA but gives more weight to recent prices.
pub struct Ema {
    period: usize,
    id: String,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            id: format!("ema{}", period),
            name: format!("EMA ({})", period),
        }
    }
}

impl TechnicalIndicator for Ema {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[PricePoint]) -> IndicatorReading {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        match ema(&closes, self.period) {
            Some(value) => IndicatorReading::Scalar { value },
            None => IndicatorReading::Undefined,
        }
    }
}
