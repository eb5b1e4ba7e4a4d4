// In crates/api-client/src/lib.rs

use async_trait::async_trait;
use core_types::Bar;

pub mod cache;
pub mod csv_provider;
pub mod error;
pub mod okx;
pub mod types;

// Re-export public types
pub use cache::CachedProvider;
pub use csv_provider::CsvProvider;
pub use error::{Error, Result};
pub use okx::OkxClient;
pub use types::BarRequest;

/// A source of historical bars.
///
/// Implementations return bars sorted by timestamp, without duplicates and
/// clipped to the requested range. Any failure surfaces as
/// `core_types::Error::DataUnavailable`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// A short identifier for logs (e.g., "okx").
    fn name(&self) -> &'static str;

    async fn fetch_bars(&self, request: &BarRequest) -> core_types::Result<Vec<Bar>>;
}
