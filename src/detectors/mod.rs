//! Price-structure detectors
//!
//! Everything here reads an oldest-first bar series and returns findings;
//! short series produce empty or `None` results, never errors.
//!
//! # Detectors
//!
//! - **Candle**: one-bar shape classification and the recent-signal tally
//! - **Chart**: swing-based formations (doubles, head-and-shoulders, triangles)
//! - **Trendline**: two-point support and resistance lines
//! - **Week change**: five-session move bucketing

pub mod helpers;

pub mod candle;
pub mod chart;
pub mod trendline;
pub mod week_change;

// Re-export all detectors for convenience
pub use candle::*;
pub use chart::*;
pub use helpers::*;
pub use trendline::*;
pub use week_change::*;
