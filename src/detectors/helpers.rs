//! Common helpers for the multi-bar detectors
//!
//! Swing-point (pivot) detection and two-point line geometry shared by the
//! chart pattern and trendline detectors.

use crate::OHLCV;

/// Minimum series length for swing-based structure (chart patterns,
/// trendlines). Shorter series yield no findings.
pub const MIN_STRUCTURE_BARS: usize = 15;

/// Which extreme a swing point marks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingKind {
    High,
    Low,
}

/// A local extreme: the bar's high for swing highs, its low for swing lows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub kind: SwingKind,
}

/// Find swing highs and lows with a centered window of `half_width` bars.
///
/// A bar is a swing high when its high is strictly above the `half_width`
/// highs before it and at least as high as the `half_width` highs after it
/// (so a flat top yields one pivot, at its first bar). Swing lows mirror
/// this. Bars closer than `half_width` to either end are never pivots.
/// Returned in index order; a bar can be both.
pub fn swing_points<T: OHLCV>(bars: &[T], half_width: usize) -> Vec<SwingPoint> {
    let n = bars.len();
    let mut points = Vec::new();
    if half_width == 0 || n < 2 * half_width + 1 {
        return points;
    }

    for i in half_width..n - half_width {
        let before = &bars[i - half_width..i];
        let after = &bars[i + 1..=i + half_width];

        let high = bars[i].high();
        if before.iter().all(|b| b.high() < high) && after.iter().all(|b| b.high() <= high) {
            points.push(SwingPoint {
                index: i,
                price: high,
                kind: SwingKind::High,
            });
        }

        let low = bars[i].low();
        if before.iter().all(|b| b.low() > low) && after.iter().all(|b| b.low() >= low) {
            points.push(SwingPoint {
                index: i,
                price: low,
                kind: SwingKind::Low,
            });
        }
    }

    points
}

/// Swing points of one kind, in index order
pub fn swings_of(points: &[SwingPoint], kind: SwingKind) -> Vec<SwingPoint> {
    points.iter().filter(|p| p.kind == kind).copied().collect()
}

/// Price per bar of the line through two swing points
#[inline]
pub fn slope(a: &SwingPoint, b: &SwingPoint) -> f64 {
    if b.index == a.index {
        return 0.0;
    }
    (b.price - a.price) / (b.index as f64 - a.index as f64)
}

/// Value at `index` of the line through two swing points
#[inline]
pub fn line_at(a: &SwingPoint, b: &SwingPoint, index: usize) -> f64 {
    a.price + slope(a, b) * (index as f64 - a.index as f64)
}

/// Slope per bar as a fraction of the starting price
#[inline]
pub fn relative_slope(a: &SwingPoint, b: &SwingPoint) -> f64 {
    let s = slope(a, b);
    if a.price > 0.0 {
        s / a.price
    } else {
        s
    }
}

/// |a - b| relative to their midpoint; 0 when both are 0
#[inline]
pub fn relative_diff(a: f64, b: f64) -> f64 {
    let mid = (a.abs() + b.abs()) / 2.0;
    if mid > 0.0 {
        (a - b).abs() / mid
    } else {
        0.0
    }
}
