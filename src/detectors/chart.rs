//! Multi-bar chart pattern detection
//!
//! Swing highs and lows are matched against formation templates:
//! double top/bottom, head-and-shoulders (and inverse), and ascending,
//! descending and symmetrical triangles.
//!
//! Reliability starts from a per-template base, is scaled by how closely
//! the swing prices match the template (equal peaks, symmetric shoulders,
//! flat edges), gains a bonus when the latest close has confirmed the
//! formation, and loses points for every bar since the formation completed.

use crate::detectors::helpers::{
    relative_diff, relative_slope, swing_points, swings_of, SwingKind, SwingPoint,
    MIN_STRUCTURE_BARS,
};
use crate::{AnalysisError, Period, Ratio, Result, SignalType, OHLCV};

/// Points added when the latest close has broken the formation's trigger level
const CONFIRMATION_BONUS: f64 = 10.0;

/// Formation templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChartPattern {
    #[serde(rename = "Double Top")]
    DoubleTop,
    #[serde(rename = "Double Bottom")]
    DoubleBottom,
    #[serde(rename = "Head and Shoulders")]
    HeadAndShoulders,
    #[serde(rename = "Inverse Head and Shoulders")]
    InverseHeadAndShoulders,
    #[serde(rename = "Ascending Triangle")]
    AscendingTriangle,
    #[serde(rename = "Descending Triangle")]
    DescendingTriangle,
    #[serde(rename = "Symmetrical Triangle")]
    SymmetricalTriangle,
}

impl ChartPattern {
    pub fn name(self) -> &'static str {
        match self {
            ChartPattern::DoubleTop => "Double Top",
            ChartPattern::DoubleBottom => "Double Bottom",
            ChartPattern::HeadAndShoulders => "Head and Shoulders",
            ChartPattern::InverseHeadAndShoulders => "Inverse Head and Shoulders",
            ChartPattern::AscendingTriangle => "Ascending Triangle",
            ChartPattern::DescendingTriangle => "Descending Triangle",
            ChartPattern::SymmetricalTriangle => "Symmetrical Triangle",
        }
    }

    pub fn signal(self) -> SignalType {
        match self {
            ChartPattern::DoubleBottom
            | ChartPattern::InverseHeadAndShoulders
            | ChartPattern::AscendingTriangle => SignalType::Buy,
            ChartPattern::DoubleTop
            | ChartPattern::HeadAndShoulders
            | ChartPattern::DescendingTriangle => SignalType::Sell,
            ChartPattern::SymmetricalTriangle => SignalType::Neutral,
        }
    }

    /// Reliability of a perfect, fresh, unconfirmed match
    fn base_reliability(self) -> f64 {
        match self {
            ChartPattern::HeadAndShoulders | ChartPattern::InverseHeadAndShoulders => 80.0,
            ChartPattern::DoubleTop | ChartPattern::DoubleBottom => 70.0,
            ChartPattern::AscendingTriangle | ChartPattern::DescendingTriangle => 65.0,
            ChartPattern::SymmetricalTriangle => 55.0,
        }
    }
}

impl std::fmt::Display for ChartPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A detected formation
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPatternFinding {
    #[serde(rename = "patternName")]
    pub pattern: ChartPattern,
    pub signal: SignalType,
    /// 0..=100
    pub reliability: u8,
    pub description: String,
}

/// Template tolerances
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartParams {
    /// Half-width of the pivot window
    pub swing_window: Period,
    /// Largest relative difference between levels that should match
    pub price_tolerance: Ratio,
    /// Fewest bars between the two peaks (troughs) of a double
    pub min_spacing: Period,
    /// Smallest trough depth / head prominence, relative to price
    pub min_depth: Ratio,
    /// Relative slope per bar below which a triangle edge is flat
    pub flat_slope: Ratio,
    /// Reliability lost per bar since the formation completed
    pub age_penalty: f64,
    /// Cap on the total age penalty
    pub max_age_penalty: f64,
    /// Findings below this reliability are dropped
    pub min_reliability: u8,
}

impl Default for ChartParams {
    fn default() -> Self {
        Self {
            swing_window: Period::new_const(3),
            price_tolerance: Ratio::new_const(0.03),
            min_spacing: Period::new_const(3),
            min_depth: Ratio::new_const(0.02),
            flat_slope: Ratio::new_const(0.001),
            age_penalty: 1.0,
            max_age_penalty: 40.0,
            min_reliability: 30,
        }
    }
}

impl ChartParams {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("age_penalty", self.age_penalty),
            ("max_age_penalty", self.max_age_penalty),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: f64::MAX,
                });
            }
        }
        if self.min_reliability > 100 {
            return Err(AnalysisError::OutOfRange {
                field: "min_reliability",
                value: f64::from(self.min_reliability),
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(())
    }
}

/// Detect chart formations in an oldest-first series.
///
/// Fewer than 15 bars yields no findings. Output order is detection order
/// (doubles, head-and-shoulders, triangle; oldest first within a template)
/// stably re-sorted by reliability, highest first. Matches of the same
/// template that share a swing point are one formation: only the first in
/// that order is reported.
pub fn detect_chart_patterns<T: OHLCV>(bars: &[T], params: &ChartParams) -> Vec<ChartPatternFinding> {
    if bars.len() < MIN_STRUCTURE_BARS {
        return Vec::new();
    }

    let points = swing_points(bars, params.swing_window.get());
    let highs = swings_of(&points, SwingKind::High);
    let lows = swings_of(&points, SwingKind::Low);
    let scan = Scan { bars, params };

    let mut candidates = Vec::new();
    candidates.extend(scan.doubles(&highs, &lows, SwingKind::High));
    candidates.extend(scan.doubles(&lows, &highs, SwingKind::Low));
    candidates.extend(scan.head_and_shoulders(&highs, &lows, SwingKind::High));
    candidates.extend(scan.head_and_shoulders(&lows, &highs, SwingKind::Low));
    candidates.extend(scan.triangle(&highs, &lows));

    let mut scored: Vec<(ChartPatternFinding, Vec<usize>)> = candidates
        .into_iter()
        .map(|mut c| {
            let anchors = std::mem::take(&mut c.anchors);
            (scan.finish(c), anchors)
        })
        .filter(|(f, _)| f.reliability >= params.min_reliability)
        .collect();
    scored.sort_by(|a, b| b.0.reliability.cmp(&a.0.reliability));

    let mut kept: Vec<(ChartPatternFinding, Vec<usize>)> = Vec::with_capacity(scored.len());
    for (finding, anchors) in scored {
        let overlaps = kept.iter().any(|(k, a)| {
            k.pattern == finding.pattern && a.iter().any(|i| anchors.contains(i))
        });
        if !overlaps {
            kept.push((finding, anchors));
        }
    }
    let findings: Vec<ChartPatternFinding> = kept.into_iter().map(|(f, _)| f).collect();

    tracing::trace!(
        swings = points.len(),
        findings = findings.len(),
        "chart pattern scan"
    );
    findings
}

/// A template match before scoring
struct Candidate {
    pattern: ChartPattern,
    /// 0..=1, how closely the swing geometry fits the template
    quality: f64,
    /// Index of the last swing point of the formation
    end_index: usize,
    /// Bar indices of every swing point the formation uses
    anchors: Vec<usize>,
    confirmed: bool,
    description: String,
}

struct Scan<'a, T: OHLCV> {
    bars: &'a [T],
    params: &'a ChartParams,
}

impl<T: OHLCV> Scan<'_, T> {
    fn last_close(&self) -> f64 {
        self.bars[self.bars.len() - 1].close()
    }

    fn date(&self, p: &SwingPoint) -> chrono::NaiveDate {
        self.bars[p.index].date()
    }

    /// 1.0 for identical levels, falling to 0.0 at the tolerance
    fn level_match(&self, diff: f64) -> f64 {
        let tol = self.params.price_tolerance.get();
        if tol > 0.0 {
            (1.0 - diff / tol).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    fn finish(&self, c: Candidate) -> ChartPatternFinding {
        // a swing point needs `swing_window` bars after it to exist at all
        let confirmable_at = c.end_index + self.params.swing_window.get();
        let age = (self.bars.len() - 1).saturating_sub(confirmable_at) as f64;
        let penalty = (age * self.params.age_penalty).min(self.params.max_age_penalty);
        let bonus = if c.confirmed { CONFIRMATION_BONUS } else { 0.0 };

        let score = c.pattern.base_reliability() * c.quality + bonus - penalty;
        ChartPatternFinding {
            pattern: c.pattern,
            signal: c.pattern.signal(),
            reliability: score.clamp(0.0, 100.0).round() as u8,
            description: c.description,
        }
    }

    /// Extreme of the opposite swings strictly between two indices
    fn between(opposite: &[SwingPoint], from: usize, to: usize, kind: SwingKind) -> Option<f64> {
        let inside = opposite
            .iter()
            .filter(|p| p.index > from && p.index < to)
            .map(|p| p.price);
        match kind {
            SwingKind::High => inside.reduce(f64::max),
            SwingKind::Low => inside.reduce(f64::min),
        }
    }

    /// Double top over swing highs (`kind == High`) or double bottom over
    /// swing lows, for every consecutive pair.
    fn doubles(&self, extremes: &[SwingPoint], opposite: &[SwingPoint], kind: SwingKind) -> Vec<Candidate> {
        let mut out = Vec::new();
        let tol = self.params.price_tolerance.get();

        for pair in extremes.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if second.index - first.index < self.params.min_spacing.get() {
                continue;
            }
            let diff = relative_diff(first.price, second.price);
            if diff > tol {
                continue;
            }

            let opposite_kind = match kind {
                SwingKind::High => SwingKind::Low,
                SwingKind::Low => SwingKind::High,
            };
            let Some(middle) = Self::between(opposite, first.index, second.index, opposite_kind)
            else {
                continue;
            };

            let level = (first.price + second.price) / 2.0;
            let depth = match kind {
                SwingKind::High => level - middle,
                SwingKind::Low => middle - level,
            };
            if level <= 0.0 || depth / level < self.params.min_depth.get() {
                continue;
            }

            let (pattern, confirmed, extreme_word, middle_word) = match kind {
                SwingKind::High => (ChartPattern::DoubleTop, self.last_close() < middle, "Peaks", "trough"),
                SwingKind::Low => (ChartPattern::DoubleBottom, self.last_close() > middle, "Troughs", "peak"),
            };

            out.push(Candidate {
                pattern,
                quality: 0.5 + 0.5 * self.level_match(diff),
                end_index: second.index,
                anchors: vec![first.index, second.index],
                confirmed,
                description: format!(
                    "{} at {:.2} ({}) and {:.2} ({}) around a {:.2} {}{}",
                    extreme_word,
                    first.price,
                    self.date(&first),
                    second.price,
                    self.date(&second),
                    middle,
                    middle_word,
                    if confirmed { "; the latest close has broken through it" } else { "" }
                ),
            });
        }
        out
    }

    /// Head-and-shoulders over swing highs, or the inverse over swing lows,
    /// for every run of three consecutive extremes.
    fn head_and_shoulders(
        &self,
        extremes: &[SwingPoint],
        opposite: &[SwingPoint],
        kind: SwingKind,
    ) -> Vec<Candidate> {
        let mut out = Vec::new();
        let tol = self.params.price_tolerance.get();
        let prominence = self.params.min_depth.get();

        for run in extremes.windows(3) {
            let (left, head, right) = (run[0], run[1], run[2]);

            let stands_out = match kind {
                SwingKind::High => head.price >= left.price.max(right.price) * (1.0 + prominence),
                SwingKind::Low => head.price <= left.price.min(right.price) * (1.0 - prominence),
            };
            if !stands_out {
                continue;
            }

            let diff = relative_diff(left.price, right.price);
            if diff > tol {
                continue;
            }

            let opposite_kind = match kind {
                SwingKind::High => SwingKind::Low,
                SwingKind::Low => SwingKind::High,
            };
            let (Some(left_neck), Some(right_neck)) = (
                Self::between(opposite, left.index, head.index, opposite_kind),
                Self::between(opposite, head.index, right.index, opposite_kind),
            ) else {
                continue;
            };
            let neckline = (left_neck + right_neck) / 2.0;

            let left_span = (head.index - left.index) as f64;
            let right_span = (right.index - head.index) as f64;
            let symmetry = left_span.min(right_span) / left_span.max(right_span);

            let (pattern, confirmed) = match kind {
                SwingKind::High => (ChartPattern::HeadAndShoulders, self.last_close() < neckline),
                SwingKind::Low => (ChartPattern::InverseHeadAndShoulders, self.last_close() > neckline),
            };

            out.push(Candidate {
                pattern,
                quality: 0.4 + 0.4 * self.level_match(diff) + 0.2 * symmetry,
                end_index: right.index,
                anchors: vec![left.index, head.index, right.index],
                confirmed,
                description: format!(
                    "Shoulders at {:.2} ({}) and {:.2} ({}) around a {:.2} head ({}), neckline {:.2}{}",
                    left.price,
                    self.date(&left),
                    right.price,
                    self.date(&right),
                    head.price,
                    self.date(&head),
                    neckline,
                    if confirmed { "; the latest close has crossed the neckline" } else { "" }
                ),
            });
        }
        out
    }

    /// Triangle from the two most recent swing highs and lows.
    fn triangle(&self, highs: &[SwingPoint], lows: &[SwingPoint]) -> Option<Candidate> {
        let [.., h1, h2] = highs else {
            return None;
        };
        let [.., l1, l2] = lows else {
            return None;
        };
        // the two edges must overlap in time
        if h1.index.max(l1.index) >= h2.index.min(l2.index) {
            return None;
        }

        let flat = self.params.flat_slope.get();
        let upper = relative_slope(h1, h2);
        let lower = relative_slope(l1, l2);
        let flatness = |s: f64| if flat > 0.0 { 1.0 - (s.abs() / flat).min(1.0) } else { 1.0 };
        let close = self.last_close();

        let (pattern, quality, confirmed) = if upper.abs() < flat && lower >= flat {
            (ChartPattern::AscendingTriangle, 0.5 + 0.5 * flatness(upper), close > h2.price)
        } else if lower.abs() < flat && upper <= -flat {
            (ChartPattern::DescendingTriangle, 0.5 + 0.5 * flatness(lower), close < l2.price)
        } else if upper <= -flat && lower >= flat {
            let balance = upper.abs().min(lower.abs()) / upper.abs().max(lower.abs());
            (ChartPattern::SymmetricalTriangle, 0.5 + 0.5 * balance, false)
        } else {
            return None;
        };

        Some(Candidate {
            pattern,
            quality,
            end_index: h2.index.max(l2.index),
            anchors: vec![h1.index, h2.index, l1.index, l2.index],
            confirmed,
            description: format!(
                "Highs {:.2} -> {:.2} ({:+.2}%/bar) against lows {:.2} -> {:.2} ({:+.2}%/bar){}",
                h1.price,
                h2.price,
                upper * 100.0,
                l1.price,
                l2.price,
                lower * 100.0,
                if confirmed { "; the latest close has broken out" } else { "" }
            ),
        })
    }
}
