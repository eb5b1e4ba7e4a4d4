// In crates/web-server/src/lib.rs

use std::sync::Arc;

use api_client::{BarRequest, MarketDataProvider};
use app_config::{BacktestSettings, ServerSettings};
use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use backtester::{BacktestOutcome, run_pipeline};
use chrono::Utc;
use core_types::{FillPolicy, Timeframe, TradingPair};
use execution::SimulationSettings;
use tokio::net::TcpListener;
use types::{BacktestQuery, Defaults, OptionsResponse};

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
    /// Used for any control a request leaves out.
    pub defaults: BacktestSettings,
    pub simulation: SimulationSettings,
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // The dashboard is served from elsewhere, so allow any origin.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/options", get(get_options_handler))
        .route("/backtest", get(get_backtest_handler));

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/options`
async fn get_options_handler(State(state): State<AppState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        pairs: TradingPair::ALL.to_vec(),
        timeframes: Timeframe::ALL.to_vec(),
        fill_policies: vec![FillPolicy::SignalBarClose, FillPolicy::NextBarOpen],
        defaults: Defaults::from(&state.defaults),
    })
}

/// Handler for `GET /api/backtest`
///
/// Every call fetches the bars (through the provider's cache) and re-runs the
/// whole pipeline; nothing about a previous run is kept.
async fn get_backtest_handler(
    State(state): State<AppState>,
    Query(query): Query<BacktestQuery>,
) -> Result<Json<BacktestOutcome>> {
    let resolved = query.resolve(&state.defaults, state.simulation)?;
    let request = BarRequest::latest(resolved.pair, resolved.timeframe, resolved.limit, Utc::now())?;

    let bars = state.provider.fetch_bars(&request).await?;
    tracing::info!(
        pair = %resolved.pair,
        timeframe = %resolved.timeframe,
        bars = bars.len(),
        short = resolved.config.strategy.short_window,
        long = resolved.config.strategy.long_window,
        "Running backtest request."
    );

    let outcome = run_pipeline(resolved.pair, &bars, &resolved.config)?;
    Ok(Json(outcome))
}

/// The main entry point for running the web server.
///
/// This function sets up the TCP listener and serves the application router.
/// It will run forever until the process is terminated.
pub async fn run(settings: &ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;
    tracing::info!("Web server listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServeError)
}
