use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dashboard::error::DashboardError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Dashboard error: {0}")]
    Dashboard(#[from] DashboardError),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Dashboard(DashboardError::InvalidSymbol(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Dashboard(e) if e.is_not_found() => {
                tracing::debug!(error = %e, "Stock data not found.");
                (StatusCode::NOT_FOUND, "Stock data not found".to_string())
            }
            AppError::Dashboard(e) => {
                tracing::error!(error = ?e, "Failed to fetch stock data.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch stock data".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
