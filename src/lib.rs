//! Augur - Composite market signal engine

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, FeedError};
pub use services::{PriceSeriesStore, SignalEngine};
pub use types::*;
