//! Five-session price change bucketing
//!
//! Compares the latest close with the close six bars back (one trading week
//! plus the reference bar) and sorts the move into a labelled bucket. The
//! outer buckets carry a warning flag.

use std::collections::HashMap;

use crate::params::{get_level, ParamMeta, Tunable};
use crate::{round2, AnalysisError, Result, OHLCV};

/// Fewest bars for a week-change reading
pub const WEEK_CHANGE_MIN_BARS: usize = 5;

/// Distance, in bars, from the reference close to the latest close
const LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekChangeLabel {
    Surge,
    Up,
    Stable,
    Down,
    Plunge,
}

impl WeekChangeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            WeekChangeLabel::Surge => "surge",
            WeekChangeLabel::Up => "up",
            WeekChangeLabel::Stable => "stable",
            WeekChangeLabel::Down => "down",
            WeekChangeLabel::Plunge => "plunge",
        }
    }

    pub fn is_warning(self) -> bool {
        matches!(self, WeekChangeLabel::Surge | WeekChangeLabel::Plunge)
    }
}

impl std::fmt::Display for WeekChangeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekChange {
    /// Percent change, 2 decimal places
    pub rate_percent: f64,
    pub label: WeekChangeLabel,
    pub is_warning: bool,
}

/// Bucket boundaries in percent
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeekChangeParams {
    pub surge: f64,
    pub up: f64,
    pub down: f64,
    pub plunge: f64,
}

impl Default for WeekChangeParams {
    fn default() -> Self {
        Self {
            surge: 30.0,
            up: 10.0,
            down: -10.0,
            plunge: -20.0,
        }
    }
}

impl WeekChangeParams {
    pub fn validate(&self) -> Result<()> {
        let ordered = [self.plunge, self.down, self.up, self.surge];
        if ordered.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidValue("week change thresholds must be finite"));
        }
        if !ordered.windows(2).all(|w| w[0] <= w[1]) {
            return Err(AnalysisError::InvalidConfig(format!(
                "week change thresholds must satisfy plunge <= down <= up <= surge, got {} / {} / {} / {}",
                self.plunge, self.down, self.up, self.surge
            )));
        }
        Ok(())
    }

    /// Bucket a percent change.
    ///
    /// Buckets are compared on whole percents (half away from zero), so
    /// 9.9 counts as 10 and -19.5 as -20.
    pub fn classify(&self, rate_percent: f64) -> WeekChangeLabel {
        let whole = rate_percent.round();
        if whole >= self.surge {
            WeekChangeLabel::Surge
        } else if whole >= self.up {
            WeekChangeLabel::Up
        } else if whole <= self.plunge {
            WeekChangeLabel::Plunge
        } else if whole <= self.down {
            WeekChangeLabel::Down
        } else {
            WeekChangeLabel::Stable
        }
    }
}

static WEEK_CHANGE_PARAMS: [ParamMeta; 4] = [
    ParamMeta::level("surge", 30.0, (20.0, 50.0, 5.0), "Percent change at or above which the move is a surge"),
    ParamMeta::level("up", 10.0, (5.0, 20.0, 1.0), "Percent change at or above which the move is up"),
    ParamMeta::level("down", -10.0, (-20.0, -5.0, 1.0), "Percent change at or below which the move is down"),
    ParamMeta::level("plunge", -20.0, (-40.0, -10.0, 5.0), "Percent change at or below which the move is a plunge"),
];

impl Tunable for WeekChangeParams {
    fn param_meta() -> &'static [ParamMeta] {
        &WEEK_CHANGE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let d = Self::default();
        let week = Self {
            surge: get_level(params, "surge", d.surge)?,
            up: get_level(params, "up", d.up)?,
            down: get_level(params, "down", d.down)?,
            plunge: get_level(params, "plunge", d.plunge)?,
        };
        week.validate()?;
        Ok(week)
    }
}

/// Percent change of the latest close against the close six bars back.
///
/// Needs at least 5 bars; with exactly 5 the first bar is the reference.
/// A zero reference close has no defined rate and yields `None`.
pub fn week_change<T: OHLCV>(bars: &[T], params: &WeekChangeParams) -> Option<WeekChange> {
    if bars.len() < WEEK_CHANGE_MIN_BARS {
        return None;
    }
    let latest = bars.len() - 1;
    let base = bars[latest.saturating_sub(LOOKBACK)].close();
    if base == 0.0 {
        return None;
    }

    let rate_percent = round2((bars[latest].close() - base) / base * 100.0);
    let label = params.classify(rate_percent);
    Some(WeekChange {
        rate_percent,
        label,
        is_warning: label.is_warning(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::from_closes;

    fn change(closes: &[f64]) -> Option<WeekChange> {
        week_change(&from_closes(closes), &WeekChangeParams::default())
    }

    #[test]
    fn test_needs_five_bars() {
        assert!(change(&[100.0, 101.0, 102.0, 103.0]).is_none());
        assert!(change(&[100.0, 101.0, 102.0, 103.0, 104.0]).is_some());
    }

    #[test]
    fn test_reference_is_six_bars_back() {
        let wc = change(&[50.0, 100.0, 1.0, 1.0, 1.0, 1.0, 130.0]).unwrap();
        assert_eq!(wc.rate_percent, 30.0);
        assert_eq!(wc.label, WeekChangeLabel::Surge);
        assert!(wc.is_warning);
    }

    #[test]
    fn test_short_series_uses_first_bar() {
        let wc = change(&[100.0, 90.0, 95.0, 99.0, 80.0]).unwrap();
        assert_eq!(wc.rate_percent, -20.0);
        assert_eq!(wc.label, WeekChangeLabel::Plunge);
        assert!(wc.is_warning);
    }

    #[test]
    fn test_boundaries() {
        let p = WeekChangeParams::default();
        assert_eq!(p.classify(30.0), WeekChangeLabel::Surge);
        assert_eq!(p.classify(29.0), WeekChangeLabel::Up);
        assert_eq!(p.classify(10.0), WeekChangeLabel::Up);
        assert_eq!(p.classify(9.9), WeekChangeLabel::Up);
        assert_eq!(p.classify(9.4), WeekChangeLabel::Stable);
        assert_eq!(p.classify(0.0), WeekChangeLabel::Stable);
        assert_eq!(p.classify(-9.4), WeekChangeLabel::Stable);
        assert_eq!(p.classify(-10.0), WeekChangeLabel::Down);
        assert_eq!(p.classify(-19.0), WeekChangeLabel::Down);
        assert_eq!(p.classify(-20.0), WeekChangeLabel::Plunge);
        assert_eq!(p.classify(-45.0), WeekChangeLabel::Plunge);
    }

    #[test]
    fn test_warning_edges_round_to_whole_percent() {
        let p = WeekChangeParams::default();
        assert_eq!(p.classify(29.4), WeekChangeLabel::Up);
        assert_eq!(p.classify(29.5), WeekChangeLabel::Surge);
        assert_eq!(p.classify(-19.4), WeekChangeLabel::Down);
        assert_eq!(p.classify(-19.5), WeekChangeLabel::Plunge);

        let surge = change(&[100.0, 100.0, 100.0, 100.0, 100.0, 129.5]).unwrap();
        assert_eq!(surge.rate_percent, 29.5);
        assert_eq!(surge.label, WeekChangeLabel::Surge);
        assert!(surge.is_warning);

        let up = change(&[100.0, 100.0, 100.0, 100.0, 100.0, 129.4]).unwrap();
        assert_eq!(up.rate_percent, 29.4);
        assert!(!up.is_warning);

        let plunge = change(&[100.0, 100.0, 100.0, 100.0, 100.0, 80.5]).unwrap();
        assert_eq!(plunge.rate_percent, -19.5);
        assert_eq!(plunge.label, WeekChangeLabel::Plunge);
        assert!(plunge.is_warning);

        let down = change(&[100.0, 100.0, 100.0, 100.0, 100.0, 80.6]).unwrap();
        assert_eq!(down.rate_percent, -19.4);
        assert_eq!(down.label, WeekChangeLabel::Down);
        assert!(!down.is_warning);
    }

    #[test]
    fn test_nine_point_nine_is_up_without_warning() {
        let wc = change(&[100.0, 100.0, 100.0, 100.0, 100.0, 109.9]).unwrap();
        assert_eq!(wc.rate_percent, 9.9);
        assert_eq!(wc.label, WeekChangeLabel::Up);
        assert!(!wc.is_warning);
    }

    #[test]
    fn test_rate_is_rounded() {
        let wc = change(&[3.0, 3.0, 3.0, 3.0, 3.0, 4.0]).unwrap();
        assert_eq!(wc.rate_percent, 33.33);
    }

    #[test]
    fn test_zero_base_is_none() {
        let bars = from_closes(&[0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(week_change(&bars, &WeekChangeParams::default()).is_none());
    }

    #[test]
    fn test_params_validation() {
        assert!(WeekChangeParams::default().validate().is_ok());
        let crossed = WeekChangeParams {
            up: -15.0,
            ..WeekChangeParams::default()
        };
        assert!(crossed.validate().is_err());
        let nan = WeekChangeParams {
            surge: f64::NAN,
            ..WeekChangeParams::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_params_by_name() {
        let mut overrides = HashMap::new();
        overrides.insert("plunge", -25.0);
        let params = WeekChangeParams::with_params(&overrides).unwrap();
        assert_eq!(params.plunge, -25.0);
        assert_eq!(params.classify(-22.0), WeekChangeLabel::Down);

        overrides.insert("down", -30.0);
        assert!(WeekChangeParams::with_params(&overrides).is_err());
    }

    #[test]
    fn test_label_strings() {
        assert_eq!(WeekChangeLabel::Plunge.to_string(), "plunge");
        assert!(!WeekChangeLabel::Down.is_warning());
    }
}
