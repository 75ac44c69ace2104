use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(#[from] core_types::CoreError),

    #[error("Quote source error: {0}")]
    Source(#[from] api_client::error::ApiError),
}

impl DashboardError {
    /// True when the upstream source has no data for the symbol.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DashboardError::Source(api_client::error::ApiError::NotFound(_))
        )
    }
}
