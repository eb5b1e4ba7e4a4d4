// In crates/analytics/src/lib.rs

pub mod engine;
pub mod types;

pub use engine::{AnalyticsEngine, MetricsConfig};
pub use types::{EquityPoint, PerformanceReport, Trade};
