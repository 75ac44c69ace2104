use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: the series has no bars")]
    EmptySeries,
}
