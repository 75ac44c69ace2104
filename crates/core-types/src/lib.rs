pub mod error;
pub mod raw;
pub mod structs;
pub mod symbol;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use raw::RawQuote;
pub use structs::{Bar, DerivedMetrics, Quote, Series, StockSnapshot};
pub use symbol::validate_symbol;
