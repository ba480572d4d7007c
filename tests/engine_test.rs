//! Engine tests
//!
//! Full evaluations against in-memory collaborators: degradation when
//! inputs fail, timeouts, cached fallback and determinism.

use augur::config::{ComponentWeights, Config};
use augur::error::FeedError;
use augur::services::SignalEngine;
use augur::sources::{ReplayPriceFeed, ReplayQualitativeSource, ReplaySentimentFeed};
use augur::types::*;
use std::sync::Arc;
use std::time::Duration;

const HOUR: i64 = 3_600_000;
const START: i64 = 1_700_000_000_000;

fn uptrend(len: usize) -> Vec<PricePoint> {
    (0..len)
        .map(|i| {
            let close = 100.0 + i as f64;
            PricePoint {
                time: START + i as i64 * HOUR,
                open: close - 0.5,
                high: close + 0.5,
                low: close - 1.0,
                close,
                volume: 50.0,
            }
        })
        .collect()
}

fn last_time(points: &[PricePoint]) -> i64 {
    points.last().map(|p| p.time).unwrap()
}

fn items(score: f64, count: usize, at: i64) -> Vec<SentimentItem> {
    (0..count)
        .map(|_| SentimentItem::new(score, at, SentimentSource::News))
        .collect()
}

fn assessment(direction: f64, confidence: f64) -> QualitativeAssessment {
    QualitativeAssessment {
        direction,
        magnitude: 1.0,
        rationale: "Momentum building".to_string(),
        confidence,
    }
}

fn engine(
    config: Config,
    prices: ReplayPriceFeed,
    sentiment: Vec<ReplaySentimentFeed>,
    qualitative: ReplayQualitativeSource,
) -> Arc<SignalEngine> {
    SignalEngine::new(
        config,
        Arc::new(prices),
        sentiment
            .into_iter()
            .map(|f| Arc::new(f) as Arc<dyn augur::sources::SentimentFeed>)
            .collect(),
        Arc::new(qualitative),
    )
}

fn expect_signal(evaluation: Evaluation) -> CompositeSignal {
    match evaluation {
        Evaluation::Signal(signal) => signal,
        Evaluation::Unavailable => panic!("expected a signal"),
    }
}

#[tokio::test]
async fn test_uptrend_without_sentiment_or_qualitative() {
    let points = uptrend(30);
    let as_of = last_time(&points);
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_series("btc", points),
        vec![ReplaySentimentFeed::new("news")
            .with_error("btc", FeedError::Unavailable("down".to_string()))],
        ReplayQualitativeSource::new(),
    );

    let signal = expect_signal(engine.evaluate_at("BTC", LookbackWindow::OneDay, None, as_of).await);

    assert!(matches!(signal.label, SignalLabel::Buy | SignalLabel::StrongBuy));
    assert!(signal.breakdown[&ComponentKind::Technical].normalized.unwrap() > 0.0);
    assert_eq!(
        signal.breakdown[&ComponentKind::Pattern].status,
        ComponentStatus::NoFormation
    );
    assert_eq!(
        signal.breakdown[&ComponentKind::Sentiment].status,
        ComponentStatus::Unavailable(UnavailableReason::Failed)
    );
    assert_eq!(
        signal.breakdown[&ComponentKind::Qualitative].status,
        ComponentStatus::Unavailable(UnavailableReason::Failed)
    );
    assert!((signal.confidence - 0.4).abs() < 1e-9);
    assert_eq!(signal.asset, "btc");
    assert_eq!(signal.as_of, as_of);
}

#[tokio::test]
async fn test_price_feed_down_uses_sentiment_and_qualitative() {
    let points = uptrend(30);
    let as_of = last_time(&points);

    let degraded = engine(
        Config::default(),
        ReplayPriceFeed::new().with_error("btc", FeedError::Unavailable("503".to_string())),
        vec![ReplaySentimentFeed::new("news").with_items("btc", items(0.5, 10, as_of))],
        ReplayQualitativeSource::new().with_assessment("btc", assessment(0.5, 1.0)),
    );
    let complete = engine(
        Config::default(),
        ReplayPriceFeed::new().with_series("btc", points),
        vec![ReplaySentimentFeed::new("news").with_items("btc", items(0.5, 10, as_of))],
        ReplayQualitativeSource::new().with_assessment("btc", assessment(0.5, 1.0)),
    );

    let d = expect_signal(degraded.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    let c = expect_signal(complete.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);

    assert!((d.strength - 0.5).abs() < 1e-9);
    assert_eq!(d.label, SignalLabel::Buy);
    assert_eq!(
        d.breakdown[&ComponentKind::Technical].status,
        ComponentStatus::Unavailable(UnavailableReason::Failed)
    );
    assert_eq!(
        d.breakdown[&ComponentKind::Pattern].status,
        ComponentStatus::Unavailable(UnavailableReason::Failed)
    );
    assert!(d.confidence < c.confidence);
}

#[tokio::test]
async fn test_nothing_available_is_unavailable() {
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new(),
        vec![ReplaySentimentFeed::new("news")],
        ReplayQualitativeSource::new(),
    );
    let evaluation = engine.evaluate_at("doge", LookbackWindow::OneDay, None, START).await;
    assert_eq!(evaluation, Evaluation::Unavailable);
}

#[tokio::test]
async fn test_slow_collaborator_times_out() {
    let points = uptrend(30);
    let as_of = last_time(&points);
    let config = Config {
        component_timeout_ms: 50,
        ..Config::default()
    };
    let qualitative = Arc::new(
        ReplayQualitativeSource::new()
            .with_assessment("btc", assessment(1.0, 1.0))
            .with_delay(Duration::from_millis(2_000)),
    );
    let engine = SignalEngine::new(
        config,
        Arc::new(ReplayPriceFeed::new().with_series("btc", points)),
        Vec::new(),
        qualitative.clone(),
    );

    let started = std::time::Instant::now();
    let signal = expect_signal(engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    assert!(started.elapsed() < Duration::from_millis(1_500));

    assert_eq!(
        signal.breakdown[&ComponentKind::Qualitative].status,
        ComponentStatus::Unavailable(UnavailableReason::TimedOut)
    );
    assert_eq!(
        signal.breakdown[&ComponentKind::Sentiment].status,
        ComponentStatus::Unavailable(UnavailableReason::NoData)
    );
    assert_eq!(qualitative.calls(), 1);
    assert!(signal.breakdown[&ComponentKind::Technical].normalized.is_some());
}

#[tokio::test]
async fn test_rate_limited_sentiment_is_unavailable() {
    let points = uptrend(30);
    let as_of = last_time(&points);
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_series("btc", points),
        vec![ReplaySentimentFeed::new("reddit").with_error("btc", FeedError::RateLimited)],
        ReplayQualitativeSource::new(),
    );
    let signal = expect_signal(engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    assert_eq!(
        signal.breakdown[&ComponentKind::Sentiment].status,
        ComponentStatus::Unavailable(UnavailableReason::RateLimited)
    );
}

#[tokio::test]
async fn test_one_failing_sentiment_feed_keeps_the_other() {
    let as_of = START;
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new(),
        vec![
            ReplaySentimentFeed::new("news").with_items("btc", items(-0.4, 10, as_of)),
            ReplaySentimentFeed::new("twitter").with_error("btc", FeedError::RateLimited),
        ],
        ReplayQualitativeSource::new(),
    );
    let signal = expect_signal(engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    let sentiment = &signal.breakdown[&ComponentKind::Sentiment];
    assert_eq!(sentiment.status, ComponentStatus::Included);
    assert!((sentiment.normalized.unwrap() + 0.4).abs() < 1e-9);
    assert_eq!(signal.label, SignalLabel::Sell);
}

#[tokio::test]
async fn test_fresh_cache_covers_feed_outage() {
    let points = uptrend(30);
    let as_of = last_time(&points) + 60_000;
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_error("btc", FeedError::RateLimited),
        Vec::new(),
        ReplayQualitativeSource::new(),
    );
    engine.store().ingest("btc", LookbackWindow::OneDay, points);

    let signal = expect_signal(engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    assert_eq!(
        signal.breakdown[&ComponentKind::Technical].status,
        ComponentStatus::Included
    );
}

#[tokio::test]
async fn test_stale_cache_is_not_used() {
    let points = uptrend(30);
    let as_of = last_time(&points) + 2 * HOUR;
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_error("btc", FeedError::RateLimited),
        Vec::new(),
        ReplayQualitativeSource::new(),
    );
    engine.store().ingest("btc", LookbackWindow::OneDay, points);

    let evaluation = engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await;
    assert_eq!(evaluation, Evaluation::Unavailable);
}

fn inverted(points: &[PricePoint]) -> Vec<PricePoint> {
    points
        .iter()
        .map(|p| PricePoint {
            high: p.low - 1.0,
            ..*p
        })
        .collect()
}

#[tokio::test]
async fn test_malformed_batch_keeps_fresh_cache() {
    let points = uptrend(30);
    let as_of = last_time(&points) + 60_000;
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_series("btc", inverted(&points)),
        Vec::new(),
        ReplayQualitativeSource::new(),
    );
    engine.store().ingest("btc", LookbackWindow::OneDay, points);

    let signal = expect_signal(engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    assert_eq!(
        signal.breakdown[&ComponentKind::Technical].status,
        ComponentStatus::Included
    );
    let cached = engine.store().get_series("btc", LookbackWindow::OneDay);
    assert_eq!(cached.series().map(|s| s.len()), Some(30));
}

#[tokio::test]
async fn test_malformed_batch_without_cache() {
    let points = uptrend(30);
    let as_of = last_time(&points);
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_series("btc", inverted(&points)),
        vec![ReplaySentimentFeed::new("news").with_items("btc", items(0.4, 5, as_of))],
        ReplayQualitativeSource::new(),
    );

    let signal = expect_signal(engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    assert_eq!(
        signal.breakdown[&ComponentKind::Technical].status,
        ComponentStatus::Unavailable(UnavailableReason::Malformed)
    );
    assert_eq!(
        signal.breakdown[&ComponentKind::Pattern].status,
        ComponentStatus::Unavailable(UnavailableReason::Malformed)
    );
}

#[tokio::test]
async fn test_single_point_is_insufficient() {
    let points = uptrend(1);
    let as_of = last_time(&points);
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_series("btc", points),
        vec![ReplaySentimentFeed::new("news").with_items("btc", items(0.3, 10, as_of))],
        ReplayQualitativeSource::new(),
    );
    let signal = expect_signal(engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    assert_eq!(
        signal.breakdown[&ComponentKind::Technical].status,
        ComponentStatus::InsufficientData
    );
    assert_eq!(
        signal.breakdown[&ComponentKind::Pattern].status,
        ComponentStatus::InsufficientData
    );
}

#[tokio::test]
async fn test_repeated_evaluation_is_identical() {
    let points = uptrend(40);
    let as_of = last_time(&points);
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new().with_series("eth", points),
        vec![ReplaySentimentFeed::new("news").with_items("eth", items(0.2, 4, as_of - HOUR))],
        ReplayQualitativeSource::new().with_assessment("eth", assessment(-0.3, 0.7)),
    );

    let first = engine.evaluate_at("eth", LookbackWindow::OneDay, None, as_of).await;
    let second = engine.evaluate_at("eth", LookbackWindow::OneDay, None, as_of).await;
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_weights_override() {
    let as_of = START;
    let build = || {
        engine(
            Config::default(),
            ReplayPriceFeed::new(),
            vec![ReplaySentimentFeed::new("news").with_items("btc", items(0.8, 10, as_of))],
            ReplayQualitativeSource::new().with_assessment("btc", assessment(-0.8, 1.0)),
        )
    };

    let default = expect_signal(build().evaluate_at("btc", LookbackWindow::OneDay, None, as_of).await);
    let sentiment_heavy = ComponentWeights {
        sentiment: 0.9,
        qualitative: 0.1,
        ..ComponentWeights::default()
    };
    let heavy = expect_signal(
        build()
            .evaluate_at("btc", LookbackWindow::OneDay, Some(sentiment_heavy), as_of)
            .await,
    );
    assert!(heavy.strength > default.strength);

    let invalid = ComponentWeights {
        technical: f64::NAN,
        ..ComponentWeights::default()
    };
    let fallback = expect_signal(
        build()
            .evaluate_at("btc", LookbackWindow::OneDay, Some(invalid), as_of)
            .await,
    );
    assert_eq!(fallback, default);
}

#[tokio::test]
async fn test_concurrent_assets() {
    let btc = uptrend(30);
    let as_of = last_time(&btc);
    let eth: Vec<PricePoint> = uptrend(30)
        .into_iter()
        .rev()
        .enumerate()
        .map(|(i, p)| PricePoint {
            time: START + i as i64 * HOUR,
            ..p
        })
        .collect();
    let engine = engine(
        Config::default(),
        ReplayPriceFeed::new()
            .with_series("btc", btc)
            .with_series("eth", eth),
        Vec::new(),
        ReplayQualitativeSource::new(),
    );

    let (a, b) = tokio::join!(
        engine.evaluate_at("btc", LookbackWindow::OneDay, None, as_of),
        engine.evaluate_at("eth", LookbackWindow::OneDay, None, as_of),
    );
    assert!(expect_signal(a).strength > 0.0);
    assert!(expect_signal(b).strength < 0.0);
}
