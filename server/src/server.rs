//! Axum HTTP server: stateless simulation endpoints.
//!
//! Every request carries its full parameter set; the only shared state is
//! the engine configuration, shared as `Arc<AppState>`.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Service banner |
//! | GET | `/health` | Health check |
//! | GET | `/api/parametros-default` | Baseline calibration |
//! | GET | `/api/escenarios` | Shock presets |
//! | POST | `/api/simular` | One stochastic path |
//! | POST | `/api/simular-monte-carlo` | Many paths reduced to distributions |
//!
//! Errors are `{ "detail": "<message>" }`: 422 for bad input, 500 when a
//! projection cannot be computed.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fiscal_core::{
    config::EngineConfig,
    engine::SimEngine,
    error::SimError,
    monte_carlo::{MonteCarloDriver, MonteCarloResult},
    params::SimulationParameters,
    result::SimulationOutcome,
    scenario::{self, Scenario},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

pub const DEFAULT_ITERATIONS: u32 = 1000;

pub struct AppState {
    pub config: EngineConfig,
}

pub type SharedState = Arc<AppState>;

pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health_check))
        .route("/api/parametros-default", get(handle_default_parameters))
        .route("/api/escenarios", get(handle_scenarios))
        .route("/api/simular", post(handle_simulate))
        .route("/api/simular-monte-carlo", post(handle_monte_carlo))
        .layer(cors)
        .with_state(state)
}

// ── Request/Response types ──────────────────────────────────────────

#[derive(Deserialize)]
struct MonteCarloQuery {
    num_simulaciones: Option<u32>,
    semilla: Option<u64>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<SimError> for ApiError {
    fn from(e: SimError) -> Self {
        if e.is_validation() {
            Self::unprocessable(e.to_string())
        } else {
            log::error!("simulation failed: {e}");
            Self::internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

/// Raises the Monte Carlo cancel flag when the request future is dropped,
/// which is what happens when the client disconnects mid-run.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

// ── GET handlers ────────────────────────────────────────────────────

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Simulador Fiscal Boliviano API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Canonical names plus the legacy names the parameter editor reads.
async fn handle_default_parameters() -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(SimulationParameters::default().to_wire_json()?))
}

async fn handle_scenarios() -> Json<Vec<Scenario>> {
    Json(scenario::PRESETS.to_vec())
}

// ── POST handlers ───────────────────────────────────────────────────

async fn handle_simulate(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<SimulationOutcome>, ApiError> {
    let params = SimulationParameters::from_json(&body)?;
    log::info!("simular: {} years", params.anos);
    let outcome = SimEngine::new(params, state.config.clone())?.simulate()?;
    Ok(Json(outcome))
}

async fn handle_monte_carlo(
    State(state): State<SharedState>,
    query: Result<Query<MonteCarloQuery>, QueryRejection>,
    body: String,
) -> Result<Json<MonteCarloResult>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::unprocessable(e.body_text()))?;
    let iterations = query.num_simulaciones.unwrap_or(DEFAULT_ITERATIONS);
    let params = SimulationParameters::from_json(&body)?;
    log::info!("simular-monte-carlo: {iterations} iterations, {} years", params.anos);

    let driver = MonteCarloDriver::new(params, state.config.clone())?;
    let _guard = CancelOnDrop(driver.cancel_flag());
    let seed = query.semilla;

    let result = tokio::task::spawn_blocking(move || driver.run(iterations, seed))
        .await
        .map_err(|e| ApiError::internal(format!("Monte Carlo worker panicked: {e}")))??;
    Ok(Json(result))
}
