//! Composite signal services.
//!
//! Technical indicators, pattern detection, sentiment aggregation and the
//! qualitative overlay each produce one component; the synthesizer combines
//! them and the engine drives a full evaluation against live collaborators.

pub mod composite;
pub mod engine;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod qualitative;
pub mod sentiment;
pub mod technical;

pub use composite::{synthesize, ComponentInputs, PatternInput};
pub use engine::SignalEngine;
pub use indicators::{configured_indicators, TechnicalIndicator};
pub use patterns::{find_extrema, find_swing_points, PatternDetector};
pub use qualitative::{overlay, parse_market_view};
pub use sentiment::SentimentAggregator;
pub use technical::{TechnicalBreakdown, TechnicalSnapshot};
