//! Simple Moving Average (SMA) indicator.

use super::TechnicalIndicator;
use crate::types::{IndicatorReading, PricePoint};

/// Mean of the last `period` values, or `None` if there are fewer.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(values.iter().rev().take(period).sum::<f64>() / period as f64)
}

/// SMA (Simple Moving Average) indicator.
///
/// Average close over the last `period` points.
pub struct Sma {
    period: usize,
    id: String,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            id: format!("sma{}", period),
            name: format!("SMA ({})", period),
        }
    }
}

impl TechnicalIndicator for Sma {
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
        match sma(&closes, self.period) {
            Some(value) => IndicatorReading::Scalar { value },
            None => IndicatorReading::Undefined,
        }
    }
}
