//! Volatility bands (Bollinger Bands).

use super::TechnicalIndicator;
use crate::types::{IndicatorReading, PricePoint};

/// Population standard deviation.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance: f64 =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Bollinger Bands indicator.
///
/// - Middle band: SMA(period)
/// - Upper/lower band: middle +/- multiplier * stddev
/// - Width: multiplier * stddev
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl TechnicalIndicator for BollingerBands {
    fn id(&self) -> &str {
        "bollinger"
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[PricePoint]) -> IndicatorReading {
        if self.period == 0 || candles.len() < self.period {
            return IndicatorReading::Undefined;
        }

        let closes: Vec<f64> = candles
            .iter()
            .rev()
            .take(self.period)
            .map(|c| c.close)
            .collect();

        let middle = closes.iter().sum::<f64>() / self.period as f64;
        let width = self.std_dev_multiplier * std_dev(&closes, middle);

        IndicatorReading::Band {
            middle,
            upper: middle + width,
            lower: middle - width,
            width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint {
                time: i as i64,
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_bands_width_is_scaled_std_dev() {
        // closes 2,4,4,4,5,5,7,9: mean 5, population stddev 2
        let bands = BollingerBands::new(8, 2.0);
        let reading = bands.compute(&candles(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        assert_eq!(
            reading,
            IndicatorReading::Band {
                middle: 5.0,
                upper: 9.0,
                lower: 1.0,
                width: 4.0
            }
        );
    }

    #[test]
    fn test_bands_flat_series_zero_width() {
        let reading = BollingerBands::default().compute(&candles(&[3.0; 25]));
        match reading {
            IndicatorReading::Band { width, .. } => assert_eq!(width, 0.0),
            other => panic!("expected bands, got {:?}", other),
        }
    }

    #[test]
    fn test_bands_undefined_when_short() {
        let reading = BollingerBands::default().compute(&candles(&[3.0; 19]));
        assert_eq!(reading, IndicatorReading::Undefined);
    }
}
