//! The assembled analysis of one price series
//!
//! Field names serialize in camelCase and every enum as its lowercase (or
//! display-name) string; downstream renderers match on both. Missing
//! history shows up as `null`, never as a placeholder value.

use chrono::NaiveDate;

use crate::detectors::{
    CandlestickFinding, ChartPatternFinding, RecentSignalTally, TrendlineFinding, WeekChange,
};
use crate::indicators::{IndicatorResult, MacdTrend, TrendSummary};
use crate::SignalType;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Date of the latest bar
    pub as_of: NaiveDate,
    pub bar_count: usize,
    pub latest_close: f64,
    pub indicators: IndicatorResult,
    pub macd_trend: Option<MacdTrend>,
    pub trend: Option<TrendSummary>,
    /// Classification of the latest bar
    pub candlestick: CandlestickFinding,
    pub recent_signals: RecentSignalTally,
    /// Highest reliability first
    pub chart_patterns: Vec<ChartPatternFinding>,
    pub support: Option<TrendlineFinding>,
    pub resistance: Option<TrendlineFinding>,
    pub week_change: Option<WeekChange>,
}

impl AnalysisReport {
    /// Every signal in the report that is not neutral: the latest candle,
    /// then the chart patterns in report order.
    pub fn directional_signals(&self) -> impl Iterator<Item = SignalType> + '_ {
        std::iter::once(self.candlestick.signal)
            .chain(self.chart_patterns.iter().map(|p| p.signal))
            .filter(|s| *s != SignalType::Neutral)
    }

    /// Net lean of the candle and chart findings: buy minus sell count.
    pub fn signal_balance(&self) -> i32 {
        self.directional_signals()
            .map(|s| if s.is_buy() { 1 } else { -1 })
            .sum()
    }

    /// Either trendline was broken by the latest close
    pub fn has_broken_line(&self) -> bool {
        self.support.is_some_and(|l| l.broken) || self.resistance.is_some_and(|l| l.broken)
    }

    /// Week change landed in a warning bucket
    pub fn has_warning(&self) -> bool {
        self.week_change.is_some_and(|w| w.is_warning)
    }
}
