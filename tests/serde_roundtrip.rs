//! Serialization tests: reports and configuration survive a JSON round trip.

use barlens::prelude::*;
use chrono::{Days, NaiveDate};
use serde_json::Value;

fn bars(closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2023, 11, 6).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::new(start + Days::new(i as u64), c - 0.4, c + 0.8, c - 1.2, c, 2_000.0))
        .collect()
}

fn wavy(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 0.3 * i as f64 + [0.0, 3.0, 6.0, 3.0, 0.0, -3.0][i % 6])
        .collect()
}

#[test]
fn test_full_report_round_trip() {
    let report = Analyzer::with_defaults().analyze(&bars(&wavy(60))).unwrap();
    assert!(report.support.is_some() || report.resistance.is_some());

    let json = serde_json::to_string(&report).unwrap();
    let back: AnalysisReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn test_nulls_stay_null() {
    let report = Analyzer::with_defaults().analyze(&bars(&[10.0, 10.5, 11.0])).unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert!(value["indicators"]["rsi"].is_null());
    assert!(value["indicators"]["histogram"].is_null());
    assert!(value["macdTrend"].is_null());
    assert!(value["trend"].is_null());
    assert!(value["support"].is_null());
    assert!(value["resistance"].is_null());
    assert!(value["weekChange"].is_null());
    assert_eq!(value["chartPatterns"], Value::Array(vec![]));

    let back: AnalysisReport = serde_json::from_value(value).unwrap();
    assert_eq!(back, report);
    assert!(back.indicators.rsi.is_none());
}

#[test]
fn test_enum_strings() {
    let report = Analyzer::with_defaults().analyze(&bars(&wavy(60))).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    let signal = value["candlestick"]["signal"].as_str().unwrap();
    assert!(["buy", "sell", "neutral"].contains(&signal));

    if let Some(trend) = value["macdTrend"]["label"].as_str() {
        assert!(["bullish", "bearish", "neutral"].contains(&trend));
    }
    if let Some(direction) = value["support"]["direction"].as_str() {
        assert!(["up", "flat", "down"].contains(&direction));
    }
    if let Some(summary) = value["trend"].as_str() {
        assert!(["uptrend", "downtrend", "sideways"].contains(&summary));
    }
    assert!(value["candlestick"]["patternName"].is_string());
    assert!(value["asOf"].as_str().unwrap().starts_with("2024-01-"));
}

#[test]
fn test_config_round_trip() {
    let config = AnalyzerConfig {
        week_change: WeekChangeParams {
            surge: 25.0,
            ..WeekChangeParams::default()
        },
        ..AnalyzerConfig::default()
    };
    let json = serde_json::to_string_pretty(&config).unwrap();
    let back: AnalyzerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let analyzer = AnalyzerBuilder::new().config(back).build().unwrap();
    assert_eq!(analyzer.config().week_change.surge, 25.0);
}

#[test]
fn test_config_rejects_zero_period() {
    let json = r#"{ "indicators": { "rsiPeriod": 0 } }"#;
    assert!(serde_json::from_str::<AnalyzerConfig>(json).is_err());
}
