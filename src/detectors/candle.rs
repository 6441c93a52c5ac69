//! Single-candle classification
//!
//! Classifies the geometry of one bar (body size, wick lengths, direction)
//! into one of a fixed set of findings, each with a signal and a strength.
//! All ratios are taken against the bar's own high-low range.
//!
//! | Shape | Up bar | Down bar |
//! |---|---|---|
//! | range below `flat_range` | Indecision (30) | Indecision (30) |
//! | both wicks long | Drifting Higher (50) | Drifting Lower (50) |
//! | long lower wick only | Bullish Reversal, buy 75 | Buying Pressure, buy 60 |
//! | long upper wick only | Selling Pressure, sell 60 | Bearish Reversal, sell 75 |
//! | large body | Strong Bullish, buy 80 | Strong Bearish, sell 80 |
//! | small body | Drifting Higher (50) | Drifting Lower (50) |
//! | medium body | Drifting Higher, buy 55 | Drifting Lower, sell 55 |

use std::collections::HashMap;

use crate::params::{get_level, get_period, get_ratio, ParamMeta, Tunable};
use crate::{AnalysisError, OHLCVExt, Period, Ratio, Result, SignalType, OHLCV};

/// Named candle shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CandlePattern {
    #[serde(rename = "Indecision")]
    Indecision,
    #[serde(rename = "Strong Bullish")]
    StrongBullish,
    #[serde(rename = "Strong Bearish")]
    StrongBearish,
    #[serde(rename = "Bullish Reversal")]
    BullishReversal,
    #[serde(rename = "Bearish Reversal")]
    BearishReversal,
    #[serde(rename = "Buying Pressure")]
    BuyingPressure,
    #[serde(rename = "Selling Pressure")]
    SellingPressure,
    #[serde(rename = "Drifting Higher")]
    DriftingHigher,
    #[serde(rename = "Drifting Lower")]
    DriftingLower,
}

impl CandlePattern {
    pub fn name(self) -> &'static str {
        match self {
            CandlePattern::Indecision => "Indecision",
            CandlePattern::StrongBullish => "Strong Bullish",
            CandlePattern::StrongBearish => "Strong Bearish",
            CandlePattern::BullishReversal => "Bullish Reversal",
            CandlePattern::BearishReversal => "Bearish Reversal",
            CandlePattern::BuyingPressure => "Buying Pressure",
            CandlePattern::SellingPressure => "Selling Pressure",
            CandlePattern::DriftingHigher => "Drifting Higher",
            CandlePattern::DriftingLower => "Drifting Lower",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            CandlePattern::Indecision => "No meaningful high-low range",
            CandlePattern::StrongBullish => "Buyers controlled the session from open to close",
            CandlePattern::StrongBearish => "Sellers controlled the session from open to close",
            CandlePattern::BullishReversal => "Lows were rejected and the bar closed higher",
            CandlePattern::BearishReversal => "Highs were rejected and the bar closed lower",
            CandlePattern::BuyingPressure => "Lows were bought back despite a lower close",
            CandlePattern::SellingPressure => "Highs were sold into despite a higher close",
            CandlePattern::DriftingHigher => "Low-conviction session with a higher close",
            CandlePattern::DriftingLower => "Low-conviction session with a lower close",
        }
    }
}

impl std::fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of one bar
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandlestickFinding {
    #[serde(rename = "patternName")]
    pub pattern: CandlePattern,
    pub description: String,
    pub signal: SignalType,
    /// 0..=100
    pub strength: u8,
}

/// Buy/sell findings among the most recent bars
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSignalTally {
    /// Number of bars actually examined
    pub window: usize,
    pub buy: usize,
    pub sell: usize,
}

/// Classifier thresholds
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CandleParams {
    /// High-low range (price units) below which a bar is indecision
    pub flat_range: f64,
    /// body / range at or above which the body is large
    pub large_body: Ratio,
    /// body / range at or below which the body is small
    pub small_body: Ratio,
    /// wick / range at or above which a wick is long
    pub long_wick: Ratio,
    /// Bars counted by the recent-signal tally
    pub tally_window: Period,
    /// Minimum strength for a finding to count in the tally
    pub tally_min_strength: u8,
}

impl Default for CandleParams {
    fn default() -> Self {
        Self {
            flat_range: 0.01,
            large_body: Ratio::new_const(0.6),
            small_body: Ratio::new_const(0.2),
            long_wick: Ratio::new_const(0.3),
            tally_window: Period::new_const(5),
            tally_min_strength: 60,
        }
    }
}

impl CandleParams {
    pub fn validate(&self) -> Result<()> {
        if !self.flat_range.is_finite() || self.flat_range <= 0.0 {
            return Err(AnalysisError::InvalidValue(
                "flat_range must be finite and positive",
            ));
        }
        if self.small_body >= self.large_body {
            return Err(AnalysisError::InvalidConfig(format!(
                "small body ratio {} must be below large body ratio {}",
                self.small_body.get(),
                self.large_body.get()
            )));
        }
        if self.tally_min_strength > 100 {
            return Err(AnalysisError::OutOfRange {
                field: "tally_min_strength",
                value: f64::from(self.tally_min_strength),
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(())
    }
}

static CANDLE_PARAMS: [ParamMeta; 6] = [
    ParamMeta::level("flat_range", 0.01, (0.005, 0.1, 0.005), "Range below which a bar is indecision"),
    ParamMeta::ratio("large_body", 0.6, (0.5, 0.8, 0.05), "Body/range ratio for a large body"),
    ParamMeta::ratio("small_body", 0.2, (0.1, 0.3, 0.05), "Body/range ratio for a small body"),
    ParamMeta::ratio("long_wick", 0.3, (0.2, 0.5, 0.05), "Wick/range ratio for a long wick"),
    ParamMeta::period("tally_window", 5.0, (3.0, 10.0, 1.0), "Bars in the recent-signal tally"),
    ParamMeta::level(
        "tally_min_strength",
        60.0,
        (50.0, 80.0, 5.0),
        "Minimum strength counted by the tally",
    ),
];

impl Tunable for CandleParams {
    fn param_meta() -> &'static [ParamMeta] {
        &CANDLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let d = Self::default();
        let min_strength = get_level(params, "tally_min_strength", f64::from(d.tally_min_strength))?;
        if !(0.0..=100.0).contains(&min_strength) || min_strength.fract() != 0.0 {
            return Err(AnalysisError::OutOfRange {
                field: "tally_min_strength",
                value: min_strength,
                min: 0.0,
                max: 100.0,
            });
        }
        let candle = Self {
            flat_range: get_level(params, "flat_range", d.flat_range)?,
            large_body: get_ratio(params, "large_body", d.large_body.get())?,
            small_body: get_ratio(params, "small_body", d.small_body.get())?,
            long_wick: get_ratio(params, "long_wick", d.long_wick.get())?,
            tally_window: get_period(params, "tally_window", d.tally_window.get())?,
            tally_min_strength: min_strength as u8,
        };
        candle.validate()?;
        Ok(candle)
    }
}

/// Classify a single bar.
///
/// Every bar gets exactly one finding; a bar with no range, or a range below
/// `flat_range`, is Indecision and never reaches a division.
pub fn classify_candle<T: OHLCV>(bar: &T, params: &CandleParams) -> CandlestickFinding {
    let range = bar.range();
    if range <= 0.0 || range < params.flat_range {
        return CandlestickFinding {
            pattern: CandlePattern::Indecision,
            description: format!(
                "{}: high-low range {:.4} is below {:.4}",
                CandlePattern::Indecision.summary(),
                range,
                params.flat_range
            ),
            signal: SignalType::Neutral,
            strength: 30,
        };
    }

    let body_ratio = bar.body() / range;
    let upper_ratio = bar.upper_wick() / range;
    let lower_ratio = bar.lower_wick() / range;

    let is_large_body = body_ratio >= params.large_body.get();
    let is_small_body = body_ratio <= params.small_body.get();
    let long_upper = upper_ratio >= params.long_wick.get();
    let long_lower = lower_ratio >= params.long_wick.get();
    let is_up = bar.is_up();

    let drifting = if is_up {
        CandlePattern::DriftingHigher
    } else {
        CandlePattern::DriftingLower
    };

    let (pattern, signal, strength) = match (long_upper, long_lower) {
        (true, true) => (drifting, SignalType::Neutral, 50),
        (false, true) if is_up => (CandlePattern::BullishReversal, SignalType::Buy, 75),
        (false, true) => (CandlePattern::BuyingPressure, SignalType::Buy, 60),
        (true, false) if !is_up => (CandlePattern::BearishReversal, SignalType::Sell, 75),
        (true, false) => (CandlePattern::SellingPressure, SignalType::Sell, 60),
        (false, false) if is_large_body && is_up => {
            (CandlePattern::StrongBullish, SignalType::Buy, 80)
        }
        (false, false) if is_large_body => (CandlePattern::StrongBearish, SignalType::Sell, 80),
        (false, false) if is_small_body => (drifting, SignalType::Neutral, 50),
        (false, false) if is_up => (drifting, SignalType::Buy, 55),
        (false, false) => (drifting, SignalType::Sell, 55),
    };

    CandlestickFinding {
        pattern,
        description: format!(
            "{}: body {:.0}% of range, upper wick {:.0}%, lower wick {:.0}%",
            pattern.summary(),
            body_ratio * 100.0,
            upper_ratio * 100.0,
            lower_ratio * 100.0
        ),
        signal,
        strength,
    }
}

/// Count buy and sell findings of at least `tally_min_strength` among the
/// last `tally_window` bars.
pub fn recent_signal_tally<T: OHLCV>(bars: &[T], params: &CandleParams) -> RecentSignalTally {
    let start = bars.len().saturating_sub(params.tally_window.get());
    let recent = &bars[start..];

    recent
        .iter()
        .map(|bar| classify_candle(bar, params))
        .filter(|f| f.strength >= params.tally_min_strength)
        .fold(
            RecentSignalTally {
                window: recent.len(),
                ..RecentSignalTally::default()
            },
            |mut tally, f| {
                match f.signal {
                    SignalType::Buy => tally.buy += 1,
                    SignalType::Sell => tally.sell += 1,
                    SignalType::Neutral => {}
                }
                tally
            },
        )
}
