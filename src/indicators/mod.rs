//! Momentum indicators computed from close prices
//!
//! Every function here takes the full close series (oldest first) and
//! recomputes from scratch; nothing is cached between calls.
//!
//! - **RSI** - plain rolling-mean RSI (not Wilder-smoothed)
//! - **MACD** - EMA(fast) - EMA(slow) with an EMA signal line
//! - **Trend** - MACD histogram bands and the overall price trend label

pub mod macd;
pub mod rsi;
pub mod trend;

pub use macd::*;
pub use rsi::*;
pub use trend::*;

use crate::{AnalysisError, Period, Result};

/// Latest indicator values. `None` means insufficient history, never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorResult {
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub signal_line: Option<f64>,
    pub histogram: Option<f64>,
}

/// Indicator look-back periods. Defaults: RSI(14), MACD(12, 26, 9).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndicatorParams {
    pub rsi_period: Period,
    pub macd_fast: Period,
    pub macd_slow: Period,
    pub macd_signal: Period,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: Period::new_const(RSI_PERIOD),
            macd_fast: Period::new_const(MACD_FAST),
            macd_slow: Period::new_const(MACD_SLOW),
            macd_signal: Period::new_const(MACD_SIGNAL),
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<()> {
        let periods = [self.rsi_period, self.macd_fast, self.macd_slow, self.macd_signal];
        if periods.iter().any(|p| p.get() == 0) {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AnalysisError::InvalidConfig(format!(
                "MACD fast period {} must be shorter than slow period {}",
                self.macd_fast.get(),
                self.macd_slow.get()
            )));
        }
        Ok(())
    }
}

/// RSI and MACD at the latest close.
pub fn compute_indicators(closes: &[f64], params: &IndicatorParams) -> IndicatorResult {
    let macd = macd(
        closes,
        params.macd_fast.get(),
        params.macd_slow.get(),
        params.macd_signal.get(),
    );
    IndicatorResult {
        rsi: rsi(closes, params.rsi_period.get()),
        macd_line: macd.macd_line,
        signal_line: macd.signal_line,
        histogram: macd.histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_history_is_all_none() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + f64::from(i)).collect();
        let result = compute_indicators(&closes, &IndicatorParams::default());
        assert_eq!(result, IndicatorResult::default());
    }

    #[test]
    fn test_rsi_before_macd() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i % 3)).collect();
        let result = compute_indicators(&closes, &IndicatorParams::default());
        assert!(result.rsi.is_some());
        assert!(result.macd_line.is_none());
        assert!(result.histogram.is_none());
    }

    #[test]
    fn test_full_history() {
        let closes: Vec<f64> = (0..34).map(|i| 100.0 + f64::from(i) * 0.5).collect();
        let result = compute_indicators(&closes, &IndicatorParams::default());
        assert!(result.rsi.is_some());
        assert!(result.macd_line.is_some());
        assert!(result.signal_line.is_some());
        assert!(result.histogram.is_some());
    }

    #[test]
    fn test_params_reject_inverted_macd() {
        let params = IndicatorParams {
            macd_fast: Period::new_const(26),
            macd_slow: Period::new_const(26),
            ..IndicatorParams::default()
        };
        assert!(params.validate().is_err());
        assert!(IndicatorParams::default().validate().is_ok());
    }
}
