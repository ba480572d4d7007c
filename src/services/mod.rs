pub mod price_store;
pub mod signals;

pub use price_store::{sanitize_points, IngestReport, PriceSeriesStore, SeriesLookup};
pub use signals::{
    synthesize, ComponentInputs, PatternDetector, SentimentAggregator, SignalEngine,
    TechnicalSnapshot,
};
