//! Trend labels derived from indicator values
//!
//! MACD histogram banding and the overall close-to-close trend. Both are
//! policy thresholds, not statistics, so both are configurable.

use std::collections::HashMap;

use crate::params::{get_level, ParamMeta, Tunable};
use crate::{AnalysisError, Period, Ratio, Result};

/// Direction label for the MACD histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Bullish,
    Bearish,
    Neutral,
}

/// Banded reading of the MACD histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdTrend {
    pub label: TrendLabel,
    /// Histogram magnitude beyond the strong band
    pub strong: bool,
}

/// Histogram thresholds. Defaults: strong above 1.0, weak above 0.0,
/// mirrored for negative values.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MacdBands {
    pub strong: f64,
    pub weak: f64,
}

impl Default for MacdBands {
    fn default() -> Self {
        Self {
            strong: 1.0,
            weak: 0.0,
        }
    }
}

impl MacdBands {
    pub fn validate(&self) -> Result<()> {
        if !self.strong.is_finite() || !self.weak.is_finite() {
            return Err(AnalysisError::InvalidValue("MACD bands must be finite"));
        }
        if self.weak < 0.0 || self.strong < self.weak {
            return Err(AnalysisError::InvalidConfig(format!(
                "MACD bands need 0 <= weak ({}) <= strong ({})",
                self.weak, self.strong
            )));
        }
        Ok(())
    }

    /// Band a histogram value. `None` in, `None` out.
    pub fn classify(&self, histogram: Option<f64>) -> Option<MacdTrend> {
        let h = histogram?;
        let trend = if h > self.strong {
            MacdTrend { label: TrendLabel::Bullish, strong: true }
        } else if h > self.weak {
            MacdTrend { label: TrendLabel::Bullish, strong: false }
        } else if h < -self.strong {
            MacdTrend { label: TrendLabel::Bearish, strong: true }
        } else if h < -self.weak {
            MacdTrend { label: TrendLabel::Bearish, strong: false }
        } else {
            MacdTrend { label: TrendLabel::Neutral, strong: false }
        };
        Some(trend)
    }
}

static MACD_BAND_PARAMS: [ParamMeta; 2] = [
    ParamMeta::level("strong", 1.0, (0.0, 5.0, 0.25), "Histogram magnitude for a strong trend"),
    ParamMeta::level("weak", 0.0, (0.0, 1.0, 0.05), "Histogram magnitude for a weak trend"),
];

impl Tunable for MacdBands {
    fn param_meta() -> &'static [ParamMeta] {
        &MACD_BAND_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let defaults = Self::default();
        let bands = Self {
            strong: get_level(params, "strong", defaults.strong)?,
            weak: get_level(params, "weak", defaults.weak)?,
        };
        bands.validate()?;
        Ok(bands)
    }
}

// ============================================================
// OVERALL TREND
// ============================================================

/// Overall direction of the close series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSummary {
    Uptrend,
    Downtrend,
    Sideways,
}

/// Close-to-close change over `period` bars; beyond `threshold` either way
/// is a trend.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrendParams {
    pub period: Period,
    pub threshold: Ratio,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            period: Period::new_const(14),
            threshold: Ratio::new_const(0.02),
        }
    }
}

/// `None` with fewer than `period + 1` closes or a non-positive base close.
pub fn trend_summary(closes: &[f64], params: &TrendParams) -> Option<TrendSummary> {
    let period = params.period.get();
    if closes.len() < period + 1 {
        return None;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - period];
    if base <= 0.0 {
        return None;
    }

    let change = (last - base) / base;
    let threshold = params.threshold.get();
    Some(match change {
        c if c > threshold => TrendSummary::Uptrend,
        c if c < -threshold => TrendSummary::Downtrend,
        _ => TrendSummary::Sideways,
    })
}
