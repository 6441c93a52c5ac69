//! Relative Strength Index
//!
//! Averages are simple means of the gains and losses over the trailing
//! `period` price changes, recomputed for every index. This is not the
//! Wilder-smoothed RSI most charting packages show; values differ once the
//! series is longer than `period + 1`.

use crate::round2;

/// Default RSI look-back.
pub const RSI_PERIOD: usize = 14;

/// RSI at the latest close, rounded to 2 decimals.
///
/// Needs `period + 1` closes; returns `None` below that. A window without
/// any losing change yields exactly 100.
///
/// ```
/// use barlens::indicators::rsi;
///
/// let rising: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
/// assert_eq!(rsi(&rising, 14), Some(100.0));
/// assert_eq!(rsi(&rising[..14], 14), None);
/// ```
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    Some(rsi_at(closes, closes.len() - 1, period))
}

/// RSI at every index; `None` for the first `period` closes.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| (period > 0 && i >= period).then(|| rsi_at(closes, i, period)))
        .collect()
}

fn rsi_at(closes: &[f64], index: usize, period: usize) -> f64 {
    let window = &closes[index - period..=index];
    let (gains, losses) = window.windows(2).fold((0.0, 0.0), |(g, l), w| {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            (g + delta, l)
        } else {
            (g, l - delta)
        }
    });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    round2(100.0 - 100.0 / (1.0 + rs))
}
