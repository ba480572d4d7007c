//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use super::TechnicalIndicator;
use crate::types::{IndicatorReading, PricePoint};

/// MACD line, signal line and histogram as of the last value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValues {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Compute MACD, or `None` when the signal line cannot be formed.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValues> {
    if fast == 0 || fast >= slow || signal == 0 {
        return None;
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);
    if slow_ema.is_empty() {
        return None;
    }

    // Align the EMAs (fast starts earlier)
    let offset = slow - fast;
    let macd_line: Vec<f64> = fast_ema
        .iter()
        .skip(offset)
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_series(&macd_line, signal);
    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;

    Some(MacdValues {
        macd,
        signal,
        histogram: macd - signal,
    })
}

/// MACD indicator.
///
/// - MACD Line = EMA(fast) - EMA(slow)
/// - Signal Line = EMA(signal) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl TechnicalIndicator for Macd {
    fn id(&self) -> &str {
        "macd"
    }

    fn name(&self) -> &str {
        "MACD"
    }

    fn lookback(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    fn compute(&self, candles: &[PricePoint]) -> IndicatorReading {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        match macd(
            &closes,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        ) {
            Some(v) => IndicatorReading::Macd {
                macd: v.macd,
                signal: v.signal,
                histogram: v.histogram,
            },
            None => IndicatorReading::Undefined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_lookback_matches_definition() {
        let m = Macd::default();
        assert_eq!(m.lookback(), 34);
        let closes: Vec<f64> = (0..34).map(|i| 100.0 + i as f64).collect();
        assert!(macd(&closes, 12, 26, 9).is_some());
        assert!(macd(&closes[..33], 12, 26, 9).is_none());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let v = macd(&closes, 12, 26, 9).unwrap();
        assert!(v.macd > 0.0);
        assert!(v.histogram > 0.0, "accelerating trend keeps MACD above signal");
    }

    #[test]
    fn test_macd_flat_is_zero() {
        let v = macd(&[50.0; 60], 12, 26, 9).unwrap();
        assert!(v.macd.abs() < 1e-12);
        assert!(v.histogram.abs() < 1e-12);
    }

    #[test]
    fn test_macd_rejects_bad_periods() {
        assert!(macd(&[1.0; 100], 26, 12, 9).is_none());
    }
}
