//! Collaborator contracts consumed by the signal engine.
//!
//! Real provider clients live outside this crate; anything that can answer
//! these traits can feed an evaluation.

pub mod replay;

pub use replay::{ReplayPriceFeed, ReplayQualitativeSource, ReplaySentimentFeed};

use crate::error::FeedError;
use crate::types::{
    AssessmentContext, LookbackWindow, PricePoint, QualitativeAssessment, SentimentItem,
};
use async_trait::async_trait;

/// OHLC price history provider.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    async fn fetch_ohlc(
        &self,
        asset: &str,
        window: LookbackWindow,
    ) -> Result<Vec<PricePoint>, FeedError>;
}

/// News or social provider of pre-scored sentiment items.
#[async_trait]
pub trait SentimentFeed: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_sentiment_items(
        &self,
        asset: &str,
        window: LookbackWindow,
    ) -> Result<Vec<SentimentItem>, FeedError>;
}

/// External text-analysis collaborator producing a market assessment.
#[async_trait]
pub trait QualitativeSource: Send + Sync {
    fn name(&self) -> &str;

    async fn assess(
        &self,
        asset: &str,
        context: &AssessmentContext,
    ) -> Result<QualitativeAssessment, FeedError>;
}
