use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The request did not complete within {0:?}")]
    Timeout(Duration),

    #[error("No data found for symbol '{0}'")]
    NotFound(String),

    #[error("The upstream API is rate limiting requests")]
    RateLimited,

    /// The endpoint refused the session, e.g. a missing or stale crumb.
    #[error("The upstream API refused the session: {0}")]
    Unauthorized(String),

    #[error("The upstream API returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

impl ApiError {
    /// Whether repeating the same request later could succeed.
    ///
    /// Network failures, timeouts, rate limiting and 5xx responses are transient.
    /// A missing symbol or a malformed payload will not change on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Request(e) => !e.is_builder(),
            ApiError::Timeout(_) | ApiError::RateLimited => true,
            ApiError::Upstream { status, .. } => *status >= 500,
            ApiError::NotFound(_)
            | ApiError::Unauthorized(_)
            | ApiError::Deserialization(_)
            | ApiError::InvalidData(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_of_transient_errors() {
        assert!(ApiError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(ApiError::RateLimited.is_transient());
        assert!(
            ApiError::Upstream {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );

        assert!(!ApiError::NotFound("ZZZZ".into()).is_transient());
        assert!(!ApiError::Unauthorized("Invalid Crumb".into()).is_transient());
        assert!(
            !ApiError::Upstream {
                status: 400,
                message: "bad request".into()
            }
            .is_transient()
        );
        assert!(!ApiError::Deserialization("eof".into()).is_transient());
        assert!(!ApiError::InvalidData("no rows".into()).is_transient());
    }
}
