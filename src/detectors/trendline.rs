//! Support and resistance trendlines
//!
//! Each line joins two swing points of the series with every bar except the
//! latest one, so the latest bar can break a line but never reshape it.
//! Support runs through swing lows, resistance through swing highs.

use chrono::NaiveDate;

use crate::detectors::helpers::{
    line_at, relative_slope, swing_points, swings_of, SwingKind, SwingPoint, MIN_STRUCTURE_BARS,
};
use crate::{Period, Ratio, OHLCV};

/// Slope classification of a fitted line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDirection {
    Up,
    Flat,
    Down,
}

impl LineDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            LineDirection::Up => "up",
            LineDirection::Flat => "flat",
            LineDirection::Down => "down",
        }
    }
}

impl std::fmt::Display for LineDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor of a fitted line
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendlinePoint {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendlineFinding {
    pub start_point: TrendlinePoint,
    pub end_point: TrendlinePoint,
    pub direction: LineDirection,
    /// Line value at the latest bar
    pub current_projected_price: f64,
    /// Latest close has crossed the line in the adverse direction
    pub broken: bool,
    /// Bars from the start point to the latest bar lying on the line
    pub touches: usize,
}

/// Both lines; either may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Trendlines {
    pub support: Option<TrendlineFinding>,
    pub resistance: Option<TrendlineFinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrendlineParams {
    /// Half-width of the pivot window
    pub swing_window: Period,
    /// Band around the line, relative to its value, that counts as on the line
    pub touch_tolerance: Ratio,
    /// Relative slope per bar below which the line is flat
    pub flat_slope: Ratio,
}

impl Default for TrendlineParams {
    fn default() -> Self {
        Self {
            swing_window: Period::new_const(2),
            touch_tolerance: Ratio::new_const(0.01),
            flat_slope: Ratio::new_const(0.001),
        }
    }
}

/// Fit support and resistance on an oldest-first series.
///
/// Fewer than 15 bars, or fewer than two qualifying swing points on a side,
/// leaves that side `None`.
pub fn detect_trendlines<T: OHLCV>(bars: &[T], params: &TrendlineParams) -> Trendlines {
    if bars.len() < MIN_STRUCTURE_BARS {
        return Trendlines::default();
    }

    let fit = &bars[..bars.len() - 1];
    let points = swing_points(fit, params.swing_window.get());

    let lines = Trendlines {
        support: fit_side(bars, &swings_of(&points, SwingKind::Low), Side::Support, params),
        resistance: fit_side(bars, &swings_of(&points, SwingKind::High), Side::Resistance, params),
    };
    tracing::trace!(
        swings = points.len(),
        support = lines.support.is_some(),
        resistance = lines.resistance.is_some(),
        "trendline fit"
    );
    lines
}

#[derive(Clone, Copy)]
enum Side {
    Support,
    Resistance,
}

impl Side {
    /// The extreme of a bar that this side of the market rests on
    fn price<T: OHLCV>(self, bar: &T) -> f64 {
        match self {
            Side::Support => bar.low(),
            Side::Resistance => bar.high(),
        }
    }

    /// How far `price` sits on the wrong side of `line`, as a fraction of it
    fn violation(self, price: f64, line: f64) -> f64 {
        let over = match self {
            Side::Support => line - price,
            Side::Resistance => price - line,
        };
        if line.abs() > 0.0 {
            over / line.abs()
        } else {
            over
        }
    }
}

fn fit_side<T: OHLCV>(
    bars: &[T],
    swings: &[SwingPoint],
    side: Side,
    params: &TrendlineParams,
) -> Option<TrendlineFinding> {
    let (end, earlier) = swings.split_last()?;
    let tol = params.touch_tolerance.get();

    // earliest start whose line no bar up to the end point pierces
    let start = earlier.iter().find(|start| {
        (start.index..=end.index)
            .all(|i| side.violation(side.price(&bars[i]), line_at(start, end, i)) <= tol)
    })?;

    let latest = bars.len() - 1;
    let projected = line_at(start, end, latest);

    let touches = (start.index..=latest)
        .filter(|&i| {
            let line = line_at(start, end, i);
            (side.price(&bars[i]) - line).abs() <= tol * line.abs()
        })
        .count();

    let slope = relative_slope(start, end);
    let flat = params.flat_slope.get();
    let direction = if slope >= flat {
        LineDirection::Up
    } else if slope <= -flat {
        LineDirection::Down
    } else {
        LineDirection::Flat
    };

    let broken = side.violation(bars[latest].close(), projected) > tol;

    let point = |p: &SwingPoint| TrendlinePoint {
        index: p.index,
        date: bars[p.index].date(),
        price: p.price,
    };

    Some(TrendlineFinding {
        start_point: point(start),
        end_point: point(end),
        direction,
        current_projected_price: projected,
        broken,
        touches,
    })
}
