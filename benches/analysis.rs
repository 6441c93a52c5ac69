//! Benchmarks for the analysis engine.

use barlens::prelude::*;
use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate realistic random bars
fn generate_bars(n: usize) -> Vec<PriceBar> {
  let start = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
  let mut bars = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o = price;
    let c = (price + change).max(1.0);
    let h = o.max(c) + volatility * 0.5;
    let l = (o.min(c) - volatility * 0.5).max(0.5);

    bars.push(PriceBar::new(start + Days::new(i as u64), o, h, l, c, 1_000.0 + (i % 17) as f64 * 50.0));
    price = c;
  }

  bars
}

fn bench_indicators(c: &mut Criterion) {
  let bars = generate_bars(250);
  let closes = closes(&bars);
  let params = IndicatorParams::default();

  c.bench_function("indicators_250_bars", |b| {
    b.iter(|| {
      let _ = black_box(compute_indicators(black_box(&closes), &params));
    })
  });
}

fn bench_chart_patterns(c: &mut Criterion) {
  let bars = generate_bars(250);
  let params = ChartParams::default();

  c.bench_function("chart_patterns_250_bars", |b| {
    b.iter(|| {
      let _ = black_box(detect_chart_patterns(black_box(&bars), &params));
    })
  });
}

fn bench_trendlines(c: &mut Criterion) {
  let bars = generate_bars(250);
  let params = TrendlineParams::default();

  c.bench_function("trendlines_250_bars", |b| {
    b.iter(|| {
      let _ = black_box(detect_trendlines(black_box(&bars), &params));
    })
  });
}

fn bench_full_report(c: &mut Criterion) {
  let bars = generate_bars(250);
  let analyzer = AnalyzerBuilder::new().build().unwrap();

  c.bench_function("analyze_250_bars", |b| {
    b.iter(|| {
      let _ = black_box(analyzer.analyze(black_box(&bars)));
    })
  });
}

fn bench_scaling(c: &mut Criterion) {
  let analyzer = AnalyzerBuilder::new().build().unwrap();

  let mut group = c.benchmark_group("scaling");

  for size in [60, 250, 1000, 5000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("analyze", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(analyzer.analyze(black_box(&bars)));
      })
    });
  }

  group.finish();
}

fn bench_parallel_analysis(c: &mut Criterion) {
  let bars1 = generate_bars(250);
  let bars2 = generate_bars(500);
  let bars3 = generate_bars(750);
  let bars4 = generate_bars(1000);

  let analyzer = AnalyzerBuilder::new().build().unwrap();

  let instruments: Vec<(&str, &[PriceBar])> = vec![
    ("SYM1", bars1.as_slice()),
    ("SYM2", bars2.as_slice()),
    ("SYM3", bars3.as_slice()),
    ("SYM4", bars4.as_slice()),
  ];

  c.bench_function("parallel_analysis_4_instruments", |b| {
    b.iter(|| {
      let _ = black_box(analyze_parallel(black_box(&analyzer), black_box(instruments.clone())));
    })
  });
}

criterion_group!(
  benches,
  bench_indicators,
  bench_chart_patterns,
  bench_trendlines,
  bench_full_report,
  bench_scaling,
  bench_parallel_analysis,
);

criterion_main!(benches);
