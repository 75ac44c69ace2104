use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, DashboardConfig, LogFormat, LoggingConfig, QuoteSourceConfig, RetryConfig, ServerConfig,
};
pub use telemetry::init_tracing;

/// The prefix for environment overrides, e.g. `STOCKDASH__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "STOCKDASH";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_CONFIG_FILE: &str = "config";

/// Loads the application configuration.
///
/// Values are layered, lowest precedence first: built-in defaults, an optional
/// `config.toml` in the working directory, then `STOCKDASH__*` environment
/// variables. The merged result is validated before it is returned.
pub fn load_config() -> Result<Config, ConfigError> {
    load(DEFAULT_CONFIG_FILE, false, environment())
}

/// Like [`load_config`], but reads an explicit file that must exist.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    load(path, true, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("dashboard.symbols")
}

fn load(path: &str, required: bool, env: config::Environment) -> Result<Config, ConfigError> {
    let builder = with_defaults(config::Config::builder())?
        // `with_name` also accepts a bare stem such as "config" and tries the known extensions.
        .add_source(config::File::with_name(path).required(required))
        .add_source(env)
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    let builder = builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("quote_source.base_url", "https://query1.finance.yahoo.com")?
        .set_default("quote_source.timeout_secs", 10)?
        .set_default("quote_source.history_days", 30)?
        .set_default(
            "quote_source.user_agent",
            concat!("stockdash/", env!("CARGO_PKG_VERSION")),
        )?
        .set_default("quote_source.cookie_url", "https://fc.yahoo.com")?
        .set_default("retry.max_attempts", 3)?
        .set_default("retry.delay_ms", 1000)?
        .set_default(
            "dashboard.symbols",
            vec!["AAPL", "MSFT", "GOOGL", "AMZN", "META"],
        )?
        .set_default("dashboard.max_concurrent_requests", 1)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "full")?;
    Ok(builder)
}
