//! # barlens - technical analysis for daily price bars
//!
//! Turns an oldest-first series of daily OHLCV bars into one structured
//! [`AnalysisReport`]: RSI and MACD, a classification of the latest candle,
//! multi-bar chart patterns, support/resistance trendlines and the 5-bar
//! week change. Every finding carries a [`SignalType`] and a 0..100 score.
//!
//! ## Quick Start
//!
//! ```rust
//! use barlens::prelude::*;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let bars: Vec<PriceBar> = (0..40)
//!     .map(|i| {
//!         let c = 100.0 + i as f64;
//!         PriceBar::new(start + chrono::Days::new(i), c - 0.5, c + 1.0, c - 1.0, c, 1_000.0)
//!     })
//!     .collect();
//!
//! let analyzer = AnalyzerBuilder::new().build().unwrap();
//! let report = analyzer.analyze(&bars).unwrap();
//! assert_eq!(report.bar_count, 40);
//! assert!(report.indicators.rsi.is_some());
//! ```
//!
//! Components degrade to `None` when the series is too short for them;
//! only contract violations (misordered dates, `low > high`, negative
//! volume, non-finite prices) are reported as errors.

use chrono::NaiveDate;

pub mod detectors;
pub mod indicators;
pub mod params;
pub mod report;

pub use report::AnalysisReport;

pub mod prelude {
    pub use crate::{
        // Components
        detectors::*,
        indicators::*,
        // Parameters
        params::{get_level, get_period, get_ratio, ParamMeta, ParamType, Tunable},
        // Series helpers
        closes,
        validate_series,
        // Parallel
        analyze_parallel,
        // Errors
        AnalysisError,
        AnalysisFailure,
        AnalysisOutcome,
        // Report
        AnalysisReport,
        // Engine
        Analyzer,
        AnalyzerBuilder,
        AnalyzerConfig,
        // Types
        OHLCVExt,
        Period,
        PriceBar,
        Ratio,
        Result,
        SignalType,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that reject an analysis call.
///
/// Insufficient history is never an error: components report it as `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Price series is empty")]
    EmptySeries,

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Bar at index {index} is not newer than the bar before it (series must be oldest-first)")]
    OutOfOrder { index: usize },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Look-back length in bars (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// SIGNAL VOCABULARY
// ============================================================

/// Directional classification shared by every finding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    Neutral,
}

impl SignalType {
    /// Canonical lowercase form, as used by downstream renderers.
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Buy => "buy",
            SignalType::Sell => "sell",
            SignalType::Neutral => "neutral",
        }
    }

    #[inline]
    pub fn is_buy(self) -> bool {
        matches!(self, SignalType::Buy)
    }

    #[inline]
    pub fn is_sell(self) -> bool {
        matches!(self, SignalType::Sell)
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core daily bar trait
pub trait OHLCV {
    fn date(&self) -> NaiveDate;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

impl<T: OHLCV + ?Sized> OHLCV for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }

    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }

    fn volume(&self) -> f64 {
        (**self).volume()
    }
}

/// Extension trait with computed candle geometry
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_wick(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_wick(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    /// Close at or above open. A doji counts as up.
    #[inline]
    fn is_up(&self) -> bool {
        self.close() >= self.open()
    }

    /// Body as ratio of range. Returns None if range is zero
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > 0.0).then(|| self.body() / range)
    }

    /// Validate a single bar's internal consistency
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) || self.volume().is_nan() {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) || self.volume().is_infinite() {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        let (lo, hi) = (self.low(), self.high());
        if !(lo..=hi).contains(&self.open()) || !(lo..=hi).contains(&self.close()) {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "open/close outside the high-low range",
            });
        }
        if self.volume() < 0.0 {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "negative volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV + ?Sized> OHLCVExt for T {}

/// One daily bar as produced by the price store.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for PriceBar {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Check every bar and the oldest-first ordering of a series.
///
/// Dates must be strictly increasing; a newest-first series fails at index 1.
pub fn validate_series<T: OHLCV>(bars: &[T]) -> Result<()> {
    if bars.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            AnalysisError::InvalidBar { reason, .. } => AnalysisError::InvalidBar { index: i, reason },
            other => other,
        })?;
        if i > 0 && bar.date() <= bars[i - 1].date() {
            return Err(AnalysisError::OutOfOrder { index: i });
        }
    }
    Ok(())
}

/// Close prices of a series, oldest first.
pub fn closes<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    bars.iter().map(OHLCV::close).collect()
}

#[inline]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================
// ANALYZER
// ============================================================

use detectors::{
    classify_candle, detect_chart_patterns, detect_trendlines, recent_signal_tally, week_change,
    CandleParams, ChartParams, TrendlineParams, WeekChangeParams,
};
use indicators::{compute_indicators, trend_summary, IndicatorParams, MacdBands, TrendParams};

/// Every tunable of the engine. Missing fields fall back to the defaults
/// when deserialized.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub indicators: IndicatorParams,
    pub macd_bands: MacdBands,
    pub trend: TrendParams,
    pub candle: CandleParams,
    pub chart: ChartParams,
    pub trendline: TrendlineParams,
    pub week_change: WeekChangeParams,
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()?;
        self.macd_bands.validate()?;
        self.candle.validate()?;
        self.chart.validate()?;
        self.week_change.validate()?;
        Ok(())
    }
}

/// Runs every component over one series and assembles the report.
///
/// Holds configuration only, so one instance can serve any number of
/// series from any number of threads.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: AnalyzerConfig::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze an oldest-first series.
    ///
    /// The components are independent, so they are evaluated in parallel
    /// and joined into one report. Either the whole report is produced or
    /// the call fails validation.
    pub fn analyze<T: OHLCV + Sync>(&self, bars: &[T]) -> Result<AnalysisReport> {
        if let Err(e) = validate_series(bars) {
            tracing::warn!(error = %e, bars = bars.len(), "rejecting price series");
            return Err(e);
        }

        let cfg = &self.config;
        let closes = closes(bars);
        tracing::debug!(bars = bars.len(), "analysing price series");

        let ((indicators, trend), ((candlestick, recent_signals), (chart_patterns, (lines, week)))) =
            rayon::join(
                || {
                    (
                        compute_indicators(&closes, &cfg.indicators),
                        trend_summary(&closes, &cfg.trend),
                    )
                },
                || {
                    rayon::join(
                        || {
                            let latest = &bars[bars.len() - 1];
                            (
                                classify_candle(latest, &cfg.candle),
                                recent_signal_tally(bars, &cfg.candle),
                            )
                        },
                        || {
                            rayon::join(
                                || detect_chart_patterns(bars, &cfg.chart),
                                || {
                                    rayon::join(
                                        || detect_trendlines(bars, &cfg.trendline),
                                        || week_change(bars, &cfg.week_change),
                                    )
                                },
                            )
                        },
                    )
                },
            );

        let latest = &bars[bars.len() - 1];
        let report = AnalysisReport {
            as_of: latest.date(),
            bar_count: bars.len(),
            latest_close: latest.close(),
            macd_trend: cfg.macd_bands.classify(indicators.histogram),
            indicators,
            trend,
            candlestick,
            recent_signals,
            chart_patterns,
            support: lines.support,
            resistance: lines.resistance,
            week_change: week,
        };

        tracing::debug!(
            as_of = %report.as_of,
            rsi = ?report.indicators.rsi,
            candle = report.candlestick.pattern.name(),
            chart_patterns = report.chart_patterns.len(),
            support = report.support.is_some(),
            resistance = report.resistance.is_some(),
            "analysis complete"
        );

        Ok(report)
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`Analyzer`] instances
#[derive(Debug, Clone, Default)]
pub struct AnalyzerBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a complete configuration, e.g. one loaded from a file
    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rsi_period(mut self, period: Period) -> Self {
        self.config.indicators.rsi_period = period;
        self
    }

    pub fn macd_periods(mut self, fast: Period, slow: Period, signal: Period) -> Self {
        self.config.indicators.macd_fast = fast;
        self.config.indicators.macd_slow = slow;
        self.config.indicators.macd_signal = signal;
        self
    }

    pub fn macd_bands(mut self, bands: MacdBands) -> Self {
        self.config.macd_bands = bands;
        self
    }

    pub fn trend(mut self, params: TrendParams) -> Self {
        self.config.trend = params;
        self
    }

    pub fn candle(mut self, params: CandleParams) -> Self {
        self.config.candle = params;
        self
    }

    pub fn chart(mut self, params: ChartParams) -> Self {
        self.config.chart = params;
        self
    }

    pub fn trendline(mut self, params: TrendlineParams) -> Self {
        self.config.trendline = params;
        self
    }

    pub fn week_change(mut self, params: WeekChangeParams) -> Self {
        self.config.week_change = params;
        self
    }

    /// Build the analyzer
    pub fn build(self) -> Result<Analyzer> {
        Analyzer::new(self.config)
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Report for a single instrument
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub symbol: String,
    pub report: AnalysisReport,
}

/// Rejected series for a single instrument
#[derive(Debug)]
pub struct AnalysisFailure {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Analyze many instruments in parallel. A rejected series never aborts
/// the rest of the batch.
pub fn analyze_parallel<'a, T, I>(
    analyzer: &Analyzer,
    instruments: I,
) -> (Vec<AnalysisOutcome>, Vec<AnalysisFailure>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            analyzer
                .analyze(bars)
                .map(|report| AnalysisOutcome {
                    symbol: symbol.to_string(),
                    report,
                })
                .map_err(|error| AnalysisFailure {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
pub(crate) mod test_util {
    use super::PriceBar;
    use chrono::{Days, NaiveDate};

    pub fn day(offset: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset as u64)
    }

    pub fn bar(i: usize, o: f64, h: f64, l: f64, c: f64) -> PriceBar {
        PriceBar::new(day(i), o, h, l, c, 1_000.0)
    }

    /// Bars whose open sits 0.5 below the close with a 1.0 wick each side
    pub fn from_closes(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i, c - 0.5, c + 1.0, c - 1.5, c))
            .collect()
    }
}
