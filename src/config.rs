use crate::error::ConfigError;
use crate::types::ComponentKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Price series store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceStoreConfig {
    /// Minimum number of valid points before a series is usable.
    pub min_points: usize,
    /// Cached series older than this are not used when the feed fails.
    pub max_cached_age_secs: i64,
}

impl Default for PriceStoreConfig {
    fn default() -> Self {
        Self {
            min_points: 2,
            max_cached_age_secs: 900,
        }
    }
}

/// Technical indicator periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Moving average windows reported as SMA/EMA pairs.
    pub ma_windows: Vec<usize>,
    /// Short MA of the trend pair.
    pub trend_short: usize,
    /// Long MA of the trend pair.
    pub trend_long: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub band_period: usize,
    pub band_multiplier: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_windows: vec![7, 25, 99],
            trend_short: 7,
            trend_long: 25,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            band_period: 20,
            band_multiplier: 2.0,
        }
    }
}

/// Swing detection, level clustering and template matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Minimum reversal, in percent of price, to confirm a swing point.
    pub min_swing_pct: f64,
    /// Extrema within this percent of each other form one level.
    pub level_tolerance_pct: f64,
    /// Levels with fewer touches are discarded.
    pub min_level_strength: u32,
    /// Allowed height difference between twin peaks/troughs, percent.
    pub pattern_tolerance_pct: f64,
    /// Minimum depth of the separating trough (or height of the peak), percent.
    pub min_depth_pct: f64,
    /// Allowed height difference between shoulders, percent.
    pub shoulder_tolerance_pct: f64,
    /// Max slope, as a fraction of mean price per bar, for a "flat" triangle side.
    pub flat_slope_tolerance: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_swing_pct: 2.0,
            level_tolerance_pct: 1.0,
            min_level_strength: 2,
            pattern_tolerance_pct: 1.0,
            min_depth_pct: 3.0,
            shoulder_tolerance_pct: 3.0,
            flat_slope_tolerance: 0.001,
        }
    }
}

/// Sentiment aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Decay constant for item weights, seconds.
    pub half_life_secs: i64,
    /// Coverage at which sentiment reaches full influence.
    pub coverage_saturation: u32,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            half_life_secs: 24 * 3600,
            coverage_saturation: 10,
        }
    }
}

/// Declared static weights per component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub technical: f64,
    pub pattern: f64,
    pub sentiment: f64,
    pub qualitative: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            pattern: 0.25,
            sentiment: 0.2,
            qualitative: 0.15,
        }
    }
}

impl ComponentWeights {
    pub fn get(&self, kind: ComponentKind) -> f64 {
        match kind {
            ComponentKind::Technical => self.technical,
            ComponentKind::Pattern => self.pattern,
            ComponentKind::Sentiment => self.sentiment,
            ComponentKind::Qualitative => self.qualitative,
        }
    }

    /// Sum of all declared weights.
    pub fn total(&self) -> f64 {
        ComponentKind::ALL.iter().map(|k| self.get(*k)).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ComponentKind::ALL {
            let w = self.get(kind);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidWeight(kind.name()));
            }
        }
        if self.total() <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }
        Ok(())
    }
}

/// Strength thresholds for labels. Symmetric around zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelThresholds {
    /// Boundary between Hold and Buy/Sell.
    pub weak: f64,
    /// Boundary between Buy/Sell and StrongBuy/StrongSell.
    pub strong: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            weak: 0.2,
            strong: 0.6,
        }
    }
}

/// Composite synthesis tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Multiplier on the variance of component values.
    pub disagreement_factor: f64,
    /// Distance to a level, percent of price, that counts as "near".
    pub proximity_pct: f64,
    /// Multiplier applied to a pattern value heading into a nearby level.
    pub proximity_damping: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            disagreement_factor: 1.0,
            proximity_pct: 1.0,
            proximity_damping: 0.5,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub price: PriceStoreConfig,
    pub indicators: IndicatorConfig,
    pub patterns: PatternConfig,
    pub sentiment: SentimentConfig,
    pub weights: ComponentWeights,
    pub thresholds: LabelThresholds,
    pub synthesis: SynthesisConfig,
    /// Per-collaborator timeout in milliseconds.
    pub component_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            price: PriceStoreConfig::default(),
            indicators: IndicatorConfig::default(),
            patterns: PatternConfig::default(),
            sentiment: SentimentConfig::default(),
            weights: ComponentWeights::default(),
            thresholds: LabelThresholds::default(),
            synthesis: SynthesisConfig::default(),
            component_timeout_ms: 3000,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from `AUGUR_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        let d = Self::default();

        Self {
            price: PriceStoreConfig {
                min_points: env_or("AUGUR_MIN_POINTS", d.price.min_points),
                max_cached_age_secs: env_or(
                    "AUGUR_MAX_CACHED_AGE_SECS",
                    d.price.max_cached_age_secs,
                ),
            },
            indicators: IndicatorConfig {
                trend_short: env_or("AUGUR_TREND_SHORT", d.indicators.trend_short),
                trend_long: env_or("AUGUR_TREND_LONG", d.indicators.trend_long),
                rsi_period: env_or("AUGUR_RSI_PERIOD", d.indicators.rsi_period),
                band_multiplier: env_or("AUGUR_BAND_MULTIPLIER", d.indicators.band_multiplier),
                ..d.indicators
            },
            patterns: PatternConfig {
                min_swing_pct: env_or("AUGUR_MIN_SWING_PCT", d.patterns.min_swing_pct),
                level_tolerance_pct: env_or(
                    "AUGUR_LEVEL_TOLERANCE_PCT",
                    d.patterns.level_tolerance_pct,
                ),
                min_level_strength: env_or(
                    "AUGUR_MIN_LEVEL_STRENGTH",
                    d.patterns.min_level_strength,
                ),
                pattern_tolerance_pct: env_or(
                    "AUGUR_PATTERN_TOLERANCE_PCT",
                    d.patterns.pattern_tolerance_pct,
                ),
                ..d.patterns
            },
            sentiment: SentimentConfig {
                half_life_secs: env_or("AUGUR_SENTIMENT_HALF_LIFE_SECS", d.sentiment.half_life_secs),
                coverage_saturation: env_or(
                    "AUGUR_COVERAGE_SATURATION",
                    d.sentiment.coverage_saturation,
                ),
            },
            weights: ComponentWeights {
                technical: env_or("AUGUR_WEIGHT_TECHNICAL", d.weights.technical),
                pattern: env_or("AUGUR_WEIGHT_PATTERN", d.weights.pattern),
                sentiment: env_or("AUGUR_WEIGHT_SENTIMENT", d.weights.sentiment),
                qualitative: env_or("AUGUR_WEIGHT_QUALITATIVE", d.weights.qualitative),
            },
            thresholds: d.thresholds,
            synthesis: SynthesisConfig {
                disagreement_factor: env_or(
                    "AUGUR_DISAGREEMENT_FACTOR",
                    d.synthesis.disagreement_factor,
                ),
                ..d.synthesis
            },
            component_timeout_ms: env_or("AUGUR_COMPONENT_TIMEOUT_MS", d.component_timeout_ms),
        }
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.weak) || !(0.0..=1.0).contains(&t.strong) || t.weak > t.strong {
            return Err(ConfigError::Thresholds);
        }
        if self.sentiment.half_life_secs <= 0 {
            return Err(ConfigError::OutOfRange {
                name: "sentiment half-life",
                value: self.sentiment.half_life_secs as f64,
            });
        }
        if self.price.min_points < 2 {
            return Err(ConfigError::OutOfRange {
                name: "minimum points",
                value: self.price.min_points as f64,
            });
        }
        if self.indicators.trend_short >= self.indicators.trend_long {
            return Err(ConfigError::OutOfRange {
                name: "trend short period",
                value: self.indicators.trend_short as f64,
            });
        }
        if self.indicators.macd_fast >= self.indicators.macd_slow {
            return Err(ConfigError::OutOfRange {
                name: "MACD fast period",
                value: self.indicators.macd_fast as f64,
            });
        }
        for (name, value) in [
            ("minimum swing", self.patterns.min_swing_pct),
            ("level tolerance", self.patterns.level_tolerance_pct),
            ("pattern tolerance", self.patterns.pattern_tolerance_pct),
            ("shoulder tolerance", self.patterns.shoulder_tolerance_pct),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        let damping = self.synthesis.proximity_damping;
        if !(0.0..=1.0).contains(&damping) {
            return Err(ConfigError::OutOfRange {
                name: "proximity damping",
                value: damping,
            });
        }
        let factor = self.synthesis.disagreement_factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "disagreement factor",
                value: factor,
            });
        }
        Ok(())
    }
}
