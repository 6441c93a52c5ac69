//! Property tests over arbitrary well-formed series.

use barlens::prelude::*;
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

/// (close, open offset, upper wick, lower wick) per bar
fn bar_parts() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (10.0..500.0f64, -0.05..0.05f64, 0.0..3.0f64, 0.0..3.0f64)
}

fn series(max_len: usize) -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec(bar_parts(), 1..max_len).prop_map(|parts| {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        parts
            .into_iter()
            .enumerate()
            .map(|(i, (c, drift, up, down))| {
                let o = c * (1.0 + drift);
                PriceBar::new(
                    start + Days::new(i as u64),
                    o,
                    o.max(c) + up,
                    o.min(c) - down,
                    c,
                    1_000.0,
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_short_series_has_no_indicators(bars in series(15)) {
        let report = Analyzer::with_defaults().analyze(&bars).unwrap();
        prop_assert!(report.indicators.rsi.is_none());
        prop_assert!(report.indicators.macd_line.is_none());
        prop_assert!(report.indicators.histogram.is_none());
        prop_assert!(report.chart_patterns.is_empty());
        prop_assert!(report.support.is_none() && report.resistance.is_none());
    }

    #[test]
    fn prop_analysis_is_idempotent(bars in series(80)) {
        let analyzer = Analyzer::with_defaults();
        let first = analyzer.analyze(&bars).unwrap();
        let second = analyzer.analyze(&bars).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_scores_are_bounded(bars in series(80)) {
        let report = Analyzer::with_defaults().analyze(&bars).unwrap();

        if let Some(rsi) = report.indicators.rsi {
            prop_assert!((0.0..=100.0).contains(&rsi));
        }
        prop_assert!(report.candlestick.strength <= 100);
        prop_assert!(report
            .chart_patterns
            .windows(2)
            .all(|w| w[0].reliability >= w[1].reliability));
        prop_assert!(report.chart_patterns.iter().all(|p| p.reliability <= 100));
        prop_assert!(report.recent_signals.buy + report.recent_signals.sell
            <= report.recent_signals.window);
        prop_assert_eq!(report.week_change.is_some(), bars.len() >= 5);
    }

    #[test]
    fn prop_broken_lines_are_crossed(bars in series(80)) {
        let report = Analyzer::with_defaults().analyze(&bars).unwrap();
        let close = report.latest_close;

        if let Some(support) = report.support {
            prop_assert!(support.start_point.index < support.end_point.index);
            prop_assert!(support.end_point.index < bars.len() - 1);
            if support.broken {
                prop_assert!(close < support.current_projected_price);
            }
        }
        if let Some(resistance) = report.resistance {
            if resistance.broken {
                prop_assert!(close > resistance.current_projected_price);
            }
        }
    }

    #[test]
    fn prop_flat_bar_is_indecision(price in 1.0..1_000.0f64) {
        let bar = PriceBar::new(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), price, price, price, price, 0.0);
        let finding = classify_candle(&bar, &CandleParams::default());
        prop_assert_eq!(finding.pattern, CandlePattern::Indecision);
        prop_assert_eq!(finding.strength, 30);
        prop_assert_eq!(finding.signal, SignalType::Neutral);
    }
}
