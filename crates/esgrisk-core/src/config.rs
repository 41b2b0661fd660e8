use crate::app_config::{AppConfig, Environment};
use crate::{ConfigError, ScoringConfig};

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_unit = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(invalid(var, format!("{value} is outside [0, 1]")))
        }
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ESGRISK_ENV", "development"))?;

    let log_level = or_default("ESGRISK_LOG_LEVEL", "info");
    let companies_path = PathBuf::from(or_default(
        "ESGRISK_COMPANIES_PATH",
        "./config/companies.yaml",
    ));
    let taxonomy_path = lookup("ESGRISK_TAXONOMY_PATH").ok().map(PathBuf::from);

    let db_max_connections = parse_u32("ESGRISK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ESGRISK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ESGRISK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let max_concurrent_companies = parse_usize("ESGRISK_MAX_CONCURRENT_COMPANIES", "4")?;

    let window_days = parse_u32("ESGRISK_WINDOW_DAYS", "7")?;
    if window_days == 0 {
        return Err(invalid("ESGRISK_WINDOW_DAYS", "must be at least 1".to_string()));
    }

    let scoring = ScoringConfig {
        confidence_floor: parse_unit("ESGRISK_CONFIDENCE_FLOOR", "0.5")?,
        window_days,
        low_confidence_weight: parse_unit("ESGRISK_LOW_CONFIDENCE_WEIGHT", "0.5")?,
    };

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        companies_path,
        taxonomy_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        max_concurrent_companies,
        scoring,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ESGRISK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
