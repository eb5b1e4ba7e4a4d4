// In crates/app-config/src/lib.rs

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{MAX_LIMIT, AppSettings, BacktestSettings, CacheSettings, OkxSettings, ServerSettings, Settings};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let builder = Config::builder()
        .add_source(File::with_name("config/base"))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        // e.g. `APP_BACKTEST__SHORT_WINDOW=10`
        .add_source(Environment::with_prefix("APP").separator("__"));

    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    // Catch bad windows or capital at startup rather than on the first request.
    settings.pipeline_config()?;
    Ok(settings)
}
