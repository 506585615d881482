use crate::app_config::{AppConfig, Environment};
use crate::query::ListingCondition;
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.9,en;q=0.8";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("AUTOPRICE_ENV", "development"));

    let bind_addr = or_default("AUTOPRICE_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("AUTOPRICE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("AUTOPRICE_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default(
        "AUTOPRICE_CATALOG_PATH",
        "./config/catalog.yaml",
    ));

    let classifieds_base_url = parse_base_url(
        "AUTOPRICE_CLASSIFIEDS_BASE_URL",
        &or_default(
            "AUTOPRICE_CLASSIFIEDS_BASE_URL",
            "https://www.classifieds.example",
        ),
    )?;
    let classifieds_market = or_default("AUTOPRICE_CLASSIFIEDS_MARKET", "es");
    let tabular_base_url = parse_base_url(
        "AUTOPRICE_TABULAR_BASE_URL",
        &or_default("AUTOPRICE_TABULAR_BASE_URL", "https://www.tabular.example"),
    )?;

    let request_timeout_secs = parse_u64("AUTOPRICE_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "AUTOPRICE_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let user_agent = or_default("AUTOPRICE_USER_AGENT", DEFAULT_USER_AGENT);
    let accept_language = or_default("AUTOPRICE_ACCEPT_LANGUAGE", DEFAULT_ACCEPT_LANGUAGE);
    let inter_trim_delay_ms = parse_u64("AUTOPRICE_INTER_TRIM_DELAY_MS", "2000")?;

    let condition_raw = or_default("AUTOPRICE_CONDITION", "used");
    let condition = condition_raw
        .parse::<ListingCondition>()
        .map_err(|e| invalid("AUTOPRICE_CONDITION", e.to_string()))?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_path,
        classifieds_base_url,
        classifieds_market,
        tabular_base_url,
        request_timeout_secs,
        user_agent,
        accept_language,
        inter_trim_delay_ms,
        condition,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Validates that a base URL carries an http(s) scheme and strips any
/// trailing slash so path segments can be appended with `format!`.
fn parse_base_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("\"{raw}\" must start with http:// or https://"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
