//! Moving Average Convergence/Divergence
//!
//! EMA(N) is seeded with the simple mean of the first N values and then
//! follows `ema[i] = v[i]·k + ema[i−1]·(1−k)` with `k = 2/(N+1)`.
//! The MACD line is EMA(fast) − EMA(slow); the signal line is the EMA of
//! the MACD line over its defined values; the histogram is their difference.

/// Default fast EMA period.
pub const MACD_FAST: usize = 12;
/// Default slow EMA period.
pub const MACD_SLOW: usize = 26;
/// Default signal EMA period.
pub const MACD_SIGNAL: usize = 9;

/// MACD values at one index.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacdPoint {
    pub macd_line: Option<f64>,
    pub signal_line: Option<f64>,
    pub histogram: Option<f64>,
}

/// SMA-seeded EMA at every index; `None` before index `period - 1`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);

    for (i, &v) in values.iter().enumerate().skip(period) {
        prev = v * k + prev * (1.0 - k);
        out[i] = Some(prev);
    }
    out
}

/// MACD at every index.
///
/// The line is defined from index `slow - 1`, the signal and histogram from
/// index `slow + signal - 2`.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<MacdPoint> {
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // Both EMAs stay defined once started, so the line is contiguous.
    let mut signal_line = vec![None; closes.len()];
    if let Some(first) = line.iter().position(Option::is_some) {
        let defined: Vec<f64> = line[first..].iter().flatten().copied().collect();
        for (offset, value) in ema_series(&defined, signal).into_iter().enumerate() {
            signal_line[first + offset] = value;
        }
    }

    line.into_iter()
        .zip(signal_line)
        .map(|(macd_line, signal_line)| MacdPoint {
            macd_line,
            signal_line,
            histogram: match (macd_line, signal_line) {
                (Some(m), Some(s)) => Some(m - s),
                _ => None,
            },
        })
        .collect()
}

/// MACD at the latest close. All fields `None` for an empty series.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdPoint {
    macd_series(closes, fast, slow, signal)
        .last()
        .copied()
        .unwrap_or_default()
}
