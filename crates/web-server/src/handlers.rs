use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, State},
};
use core_types::StockSnapshot;
use dashboard::DashboardState;
use serde_json::{Value, json};
use std::sync::Arc;

/// # GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// # GET /api/stock/:symbol
/// Fetches a fresh snapshot for one symbol: quote, trailing history and metrics.
pub async fn get_stock(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StockSnapshot>, AppError> {
    let snapshot = state.dashboard.load_symbol(&symbol).await?;
    Ok(Json(snapshot))
}

/// # GET /api/dashboard
/// Returns the cached dashboard, loading it first if it has never been populated.
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardState> {
    Json(state.current_or_refresh().await)
}

/// # POST /api/dashboard/refresh
pub async fn refresh_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardState> {
    Json(state.refresh().await)
}
