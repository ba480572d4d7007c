//! Unit tests for types module

use augur::types::*;
use std::collections::BTreeMap;

#[test]
fn test_lookback_window_from_str() {
    assert_eq!(LookbackWindow::from_str("1h"), Some(LookbackWindow::OneHour));
    assert_eq!(LookbackWindow::from_str("4h"), Some(LookbackWindow::FourHours));
    assert_eq!(LookbackWindow::from_str("1d"), Some(LookbackWindow::OneDay));
    assert_eq!(LookbackWindow::from_str("24h"), Some(LookbackWindow::OneDay));
    assert_eq!(LookbackWindow::from_str("7d"), Some(LookbackWindow::SevenDays));
    assert_eq!(LookbackWindow::from_str("30d"), Some(LookbackWindow::ThirtyDays));
    assert_eq!(LookbackWindow::from_str("2y"), None);
}

#[test]
fn test_lookback_window_serialization() {
    let json = serde_json::to_string(&LookbackWindow::SevenDays).unwrap();
    assert_eq!(json, "\"7d\"");

    let parsed: LookbackWindow = serde_json::from_str("\"24h\"").unwrap();
    assert_eq!(parsed, LookbackWindow::OneDay);
}

#[test]
fn test_lookback_window_durations() {
    assert_eq!(LookbackWindow::OneHour.duration_seconds(), 3600);
    assert_eq!(LookbackWindow::OneDay.duration_ms(), 86_400_000);
    assert!(LookbackWindow::ThirtyDays.bar_seconds() > LookbackWindow::OneHour.bar_seconds());
}

#[test]
fn test_price_point_invariants() {
    let good = PricePoint {
        time: 0,
        open: 10.0,
        high: 12.0,
        low: 9.0,
        close: 11.0,
        volume: 5.0,
    };
    assert!(good.is_valid());

    let inverted = PricePoint {
        high: 8.0,
        ..good
    };
    assert!(!inverted.is_valid());

    let close_above_high = PricePoint {
        close: 13.0,
        ..good
    };
    assert!(close_above_high.check().unwrap_err().contains("close"));

    let negative_volume = PricePoint {
        volume: -1.0,
        ..good
    };
    assert!(!negative_volume.is_valid());

    let nan = PricePoint {
        open: f64::NAN,
        ..good
    };
    assert!(!nan.is_valid());
}

#[test]
fn test_price_point_volume_defaults() {
    let point: PricePoint =
        serde_json::from_str(r#"{"time": 1, "open": 1, "high": 1, "low": 1, "close": 1}"#).unwrap();
    assert_eq!(point.volume, 0.0);
}

#[test]
fn test_availability_serialization() {
    let value: Availability<f64> = Availability::Value(0.0);
    assert_eq!(
        serde_json::to_string(&value).unwrap(),
        r#"{"status":"value","value":0.0}"#
    );

    let missing: Availability<f64> = Availability::Unavailable(UnavailableReason::TimedOut);
    assert_eq!(
        serde_json::to_string(&missing).unwrap(),
        r#"{"status":"unavailable","value":"timed_out"}"#
    );
    assert_ne!(value, missing);
}

#[test]
fn test_availability_map_keeps_reason() {
    let missing: Availability<i32> = Availability::Unavailable(UnavailableReason::RateLimited);
    assert_eq!(
        missing.map(|v| v * 2),
        Availability::Unavailable(UnavailableReason::RateLimited)
    );
    assert_eq!(Availability::Value(2).map(|v| v * 2), Availability::Value(4));
    assert!(!Availability::<i32>::InsufficientData.is_available());
}

#[test]
fn test_signal_label_thresholds() {
    let label = |s| SignalLabel::from_strength(s, 0.2, 0.6);
    assert_eq!(label(-1.0), SignalLabel::StrongSell);
    assert_eq!(label(-0.61), SignalLabel::StrongSell);
    assert_eq!(label(-0.6), SignalLabel::Sell);
    assert_eq!(label(-0.21), SignalLabel::Sell);
    assert_eq!(label(-0.2), SignalLabel::Hold);
    assert_eq!(label(0.0), SignalLabel::Hold);
    assert_eq!(label(0.2), SignalLabel::Hold);
    assert_eq!(label(0.21), SignalLabel::Buy);
    assert_eq!(label(0.6), SignalLabel::Buy);
    assert_eq!(label(0.61), SignalLabel::StrongBuy);
    assert_eq!(label(1.0), SignalLabel::StrongBuy);
}

#[test]
fn test_signal_label_serialization() {
    assert_eq!(
        serde_json::to_string(&SignalLabel::StrongBuy).unwrap(),
        "\"strong_buy\""
    );
    assert_eq!(SignalLabel::StrongSell.label(), "Strong Sell");
}

#[test]
fn test_pattern_bias() {
    assert_eq!(PatternKind::DoubleBottom.bias(), 1.0);
    assert_eq!(PatternKind::AscendingTriangle.bias(), 1.0);
    assert_eq!(PatternKind::DoubleTop.bias(), -1.0);
    assert_eq!(PatternKind::DescendingTriangle.bias(), -1.0);
    assert_eq!(PatternKind::HeadAndShoulders.bias(), -1.0);
    assert_eq!(PatternKind::None.bias(), 0.0);
    assert_eq!(format!("{}", PatternKind::HeadAndShoulders), "head_and_shoulders");
}

#[test]
fn test_pattern_none() {
    let none = Pattern::none(10, 20);
    assert!(none.is_none());
    assert_eq!(none.confidence, 0.0);
    assert_eq!(none.signed_strength(), 0.0);

    let scan = PatternScan {
        extrema: Vec::new(),
        levels: Vec::new(),
        patterns: Vec::new(),
        start: 10,
        end: 20,
    };
    assert_eq!(scan.dominant(), none);
}

#[test]
fn test_nearest_levels() {
    let level = |price, kind| SupportResistanceLevel {
        price,
        strength: 2,
        kind,
    };
    let scan = PatternScan {
        extrema: Vec::new(),
        levels: vec![
            level(90.0, LevelKind::Support),
            level(95.0, LevelKind::Support),
            level(105.0, LevelKind::Resistance),
            level(120.0, LevelKind::Resistance),
        ],
        patterns: Vec::new(),
        start: 0,
        end: 0,
    };
    assert_eq!(scan.resistance_above(100.0).unwrap().price, 105.0);
    assert_eq!(scan.support_below(100.0).unwrap().price, 95.0);
    assert!(scan.resistance_above(130.0).is_none());
}

#[test]
fn test_sentiment_mood() {
    assert_eq!(SentimentMood::classify(0.3), SentimentMood::Positive);
    assert_eq!(SentimentMood::classify(0.05), SentimentMood::Neutral);
    assert_eq!(SentimentMood::classify(-0.04), SentimentMood::Neutral);
    assert_eq!(SentimentMood::classify(-0.3), SentimentMood::Negative);
}

#[test]
fn test_sentiment_item_source_defaults() {
    let item: SentimentItem = serde_json::from_str(r#"{"score": 0.4, "timestamp": 5}"#).unwrap();
    assert_eq!(item.source, SentimentSource::Other);
}

#[test]
fn test_market_view_unknown_trend() {
    let view: MarketView =
        serde_json::from_str(r#"{"trend": "sideways", "confidence": 0.4}"#).unwrap();
    assert_eq!(view.trend, MarketTrend::Unknown);
    assert_eq!(view.trend_strength, TrendStrength::Unknown);
}

#[test]
fn test_evaluation_unavailable_is_not_hold() {
    let json = serde_json::to_string(&Evaluation::Unavailable).unwrap();
    assert_eq!(json, r#"{"outcome":"unavailable"}"#);
    assert!(Evaluation::Unavailable.signal().is_none());
}

#[test]
fn test_composite_explain() {
    let mut breakdown = BTreeMap::new();
    breakdown.insert(
        ComponentKind::Technical,
        ComponentContribution {
            status: ComponentStatus::Included,
            normalized: Some(0.5),
            weight: 0.4,
            effective_weight: 1.0,
            contribution: 0.5,
            note: Some("trend +1.00".to_string()),
        },
    );
    breakdown.insert(
        ComponentKind::Sentiment,
        ComponentContribution {
            status: ComponentStatus::Unavailable(UnavailableReason::RateLimited),
            normalized: None,
            weight: 0.2,
            effective_weight: 0.0,
            contribution: 0.0,
            note: None,
        },
    );
    let signal = CompositeSignal {
        asset: "btc".to_string(),
        window: LookbackWindow::OneDay,
        as_of: 0,
        strength: 0.5,
        label: SignalLabel::Buy,
        confidence: 0.4,
        breakdown,
    };

    let text = signal.explain();
    assert!(text.starts_with("BTC (1d): Buy"));
    assert!(text.contains("technical: +0.50"));
    assert!(text.contains("sentiment: unavailable (rate limited)"));
    assert_eq!(signal.included().collect::<Vec<_>>(), vec![ComponentKind::Technical]);
}
