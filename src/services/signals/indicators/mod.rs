//! Technical indicator implementations.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::BollingerBands;
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::config::IndicatorConfig;
use crate::types::{Indicator, IndicatorReading, PricePoint};

/// Trait for implementing technical indicators.
pub trait TechnicalIndicator: Send + Sync {
    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Minimum number of points required for a defined reading.
    fn lookback(&self) -> usize;

    /// Compute the reading as of the last point.
    /// Returns `Undefined` when there are fewer than `lookback()` points.
    fn compute(&self, candles: &[PricePoint]) -> IndicatorReading;

    /// Compute and wrap into an `Indicator` record.
    fn evaluate(&self, candles: &[PricePoint]) -> Indicator {
        Indicator {
            id: self.id().to_string(),
            name: self.name().to_string(),
            lookback: self.lookback(),
            reading: self.compute(candles),
        }
    }
}

/// Build the configured indicator set.
pub fn configured_indicators(cfg: &IndicatorConfig) -> Vec<Box<dyn TechnicalIndicator>> {
    let mut indicators: Vec<Box<dyn TechnicalIndicator>> = Vec::new();

    // Trend indicators
    for window in &cfg.ma_windows {
        indicators.push(Box::new(Sma::new(*window)));
        indicators.push(Box::new(Ema::new(*window)));
    }
    indicators.push(Box::new(Macd::new(
        cfg.macd_fast,
        cfg.macd_slow,
        cfg.macd_signal,
    )));
    // Momentum indicators
    indicators.push(Box::new(Rsi::new(cfg.rsi_period)));
    // Volatility indicators
    indicators.push(Box::new(BollingerBands::new(
        cfg.band_period,
        cfg.band_multiplier,
    )));

    indicators
}
