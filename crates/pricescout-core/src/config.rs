use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the current process environment
/// without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration from an arbitrary env-var lookup.
///
/// Every variable is optional; an unset variable takes its default.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        parse_value::<u32>(var, &or_default(var, default))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        parse_value::<usize>(var, &or_default(var, default))
    };

    let parse_ratio = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = parse_value::<f64>(var, &or_default(var, default))?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(invalid(var, format!("expected a value between 0 and 1, got {value}")))
        }
    };

    let log_level = or_default("PRICESCOUT_LOG_LEVEL", "info");
    let currency = or_default("PRICESCOUT_CURRENCY", "AED").trim().to_uppercase();
    if currency.is_empty() {
        return Err(invalid("PRICESCOUT_CURRENCY", "must not be empty".to_string()));
    }

    let fetch_timeout_secs = parse_u64("PRICESCOUT_FETCH_TIMEOUT_SECS", "30")?;
    let source_timeout_secs = parse_u64("PRICESCOUT_SOURCE_TIMEOUT_SECS", "60")?;
    let max_attempts = parse_u32("PRICESCOUT_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid("PRICESCOUT_MAX_ATTEMPTS", "must be at least 1".to_string()));
    }
    let backoff_base_ms = parse_u64("PRICESCOUT_BACKOFF_BASE_MS", "1000")?;
    let backoff_jitter = parse_ratio("PRICESCOUT_BACKOFF_JITTER", "0.3")?;

    let pacing_min_ms = parse_u64("PRICESCOUT_PACING_MIN_MS", "800")?;
    let pacing_max_ms = parse_u64("PRICESCOUT_PACING_MAX_MS", "2500")?;
    if pacing_min_ms > pacing_max_ms {
        return Err(invalid(
            "PRICESCOUT_PACING_MAX_MS",
            format!("must be >= PRICESCOUT_PACING_MIN_MS ({pacing_min_ms})"),
        ));
    }

    let max_results_per_source = parse_usize("PRICESCOUT_MAX_RESULTS_PER_SOURCE", "10")?;
    let max_pages = parse_u32("PRICESCOUT_MAX_PAGES", "1")?.max(1);

    let dedup_title_threshold = parse_ratio("PRICESCOUT_DEDUP_TITLE_THRESHOLD", "0.8")?;
    let dedup_price_tolerance = parse_value::<Decimal>(
        "PRICESCOUT_DEDUP_PRICE_TOLERANCE",
        &or_default("PRICESCOUT_DEDUP_PRICE_TOLERANCE", "0.05"),
    )?;
    if dedup_price_tolerance < Decimal::ZERO {
        return Err(invalid(
            "PRICESCOUT_DEDUP_PRICE_TOLERANCE",
            "must not be negative".to_string(),
        ));
    }

    let inter_query_delay_ms = parse_u64("PRICESCOUT_INTER_QUERY_DELAY_MS", "2000")?;
    let headless = parse_bool(
        "PRICESCOUT_HEADLESS",
        &or_default("PRICESCOUT_HEADLESS", "true"),
    )?;

    Ok(AppConfig {
        log_level,
        currency,
        fetch_timeout_secs,
        source_timeout_secs,
        max_attempts,
        backoff_base_ms,
        backoff_jitter,
        pacing_min_ms,
        pacing_max_ms,
        max_results_per_source,
        max_pages,
        dedup_title_threshold,
        dedup_price_tolerance,
        inter_query_delay_ms,
        headless,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(var, e.to_string()))
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(var, format!("expected a boolean, got {other:?}"))),
    }
}

fn invalid(var: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
