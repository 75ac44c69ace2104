use crate::error::CoreError;

const MAX_SYMBOL_LEN: usize = 16;

/// Checks that `symbol` looks like a ticker and returns it trimmed.
///
/// Case is preserved. Besides ASCII letters and digits, the separators used by
/// index (`^GSPC`), class-share (`BRK.B`, `BF-B`) and currency (`EURUSD=X`)
/// tickers are accepted.
pub fn validate_symbol(symbol: &str) -> Result<&str, CoreError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(
            "symbol".to_string(),
            "must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_SYMBOL_LEN {
        return Err(CoreError::InvalidInput(
            "symbol".to_string(),
            format!("'{trimmed}' is longer than {MAX_SYMBOL_LEN} characters"),
        ));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(CoreError::InvalidInput(
            "symbol".to_string(),
            format!("'{trimmed}' contains unsupported character '{bad}'"),
        ));
    }
    Ok(trimmed)
}
