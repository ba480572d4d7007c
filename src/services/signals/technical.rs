//! Technical component: indicator snapshot and its normalized direction.

use crate::config::IndicatorConfig;
use crate::services::signals::indicators::{
    configured_indicators, macd::macd, rsi::rsi, sma::sma,
};
use crate::types::{Indicator, PriceSeries};
use serde::{Deserialize, Serialize};

/// Sign of `a - b` as -1, 0 or +1.
fn sign(a: f64, b: f64) -> f64 {
    if a > b {
        1.0
    } else if a < b {
        -1.0
    } else {
        0.0
    }
}

/// Sub-signals of the technical component, each in [-1, 1] when defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalBreakdown {
    /// +1 when the short MA is above the long MA, -1 below, 0 equal.
    pub trend: Option<f64>,
    /// `(RSI - 50) / 50`.
    pub momentum: Option<f64>,
    /// Sign of MACD minus its signal line.
    pub macd: Option<f64>,
}

impl TechnicalBreakdown {
    /// Equal-weight mean of the defined sub-signals.
    pub fn normalized(&self) -> Option<f64> {
        let parts: Vec<f64> = [self.trend, self.momentum, self.macd]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            return None;
        }
        let mean = parts.iter().sum::<f64>() / parts.len() as f64;
        Some(mean.clamp(-1.0, 1.0))
    }
}

/// All indicators for one series plus the normalized breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub indicators: Vec<Indicator>,
    pub breakdown: TechnicalBreakdown,
}

impl TechnicalSnapshot {
    /// Compute every configured indicator over `series`.
    pub fn compute(series: &PriceSeries, cfg: &IndicatorConfig) -> Self {
        let candles = series.points();
        let indicators = configured_indicators(cfg)
            .iter()
            .map(|i| i.evaluate(candles))
            .collect();

        let closes = series.closes();
        let trend = match (sma(&closes, cfg.trend_short), sma(&closes, cfg.trend_long)) {
            (Some(short), Some(long)) => Some(sign(short, long)),
            _ => None,
        };
        let momentum = rsi(&closes, cfg.rsi_period).map(|r| (r - 50.0) / 50.0);
        let macd = macd(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal)
            .map(|m| sign(m.macd, m.signal));

        Self {
            indicators,
            breakdown: TechnicalBreakdown {
                trend,
                momentum,
                macd,
            },
        }
    }

    /// Normalized technical value, `None` when no sub-signal is defined.
    pub fn normalized(&self) -> Option<f64> {
        self.breakdown.normalized()
    }

    pub fn indicator(&self, id: &str) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.id == id)
    }

    /// Short note for the composite breakdown.
    pub fn note(&self) -> String {
        let fmt = |v: Option<f64>| match v {
            Some(v) => format!("{:+.2}", v),
            None => "n/a".to_string(),
        };
        format!(
            "trend {}, rsi {}, macd {}",
            fmt(self.breakdown.trend),
            fmt(self.breakdown.momentum),
            fmt(self.breakdown.macd)
        )
    }
}
