use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, EvaluatorKind};
use crate::ConfigError;

pub const DEFAULT_MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Mobile/15E148 Safari/604.1";
pub const DEFAULT_DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the current process environment only.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration from an arbitrary env-var lookup.
///
/// Every variable is optional; tests drive this with a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
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

    let env = parse_environment(&or_default("PRODLINK_ENV", "development"))?;
    let log_level = or_default("PRODLINK_LOG_LEVEL", "info");

    let http_timeout_secs = parse_u64("PRODLINK_HTTP_TIMEOUT_SECS", "10")?;
    if http_timeout_secs == 0 {
        return Err(invalid(
            "PRODLINK_HTTP_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }

    let mobile_user_agent = or_default("PRODLINK_MOBILE_USER_AGENT", DEFAULT_MOBILE_USER_AGENT);
    let desktop_user_agent =
        or_default("PRODLINK_DESKTOP_USER_AGENT", DEFAULT_DESKTOP_USER_AGENT);

    let content_fetch_attempts = parse_u32("PRODLINK_CONTENT_FETCH_ATTEMPTS", "3")?;
    if content_fetch_attempts == 0 {
        return Err(invalid(
            "PRODLINK_CONTENT_FETCH_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let content_fetch_backoff_ms = parse_u64("PRODLINK_CONTENT_FETCH_BACKOFF_MS", "300")?;

    let literal_evaluator =
        parse_evaluator_kind(&or_default("PRODLINK_LITERAL_EVALUATOR", "relaxed"))?;
    let node_binary = PathBuf::from(or_default("PRODLINK_NODE_BINARY", "node"));
    let eval_timeout_ms = parse_u64("PRODLINK_EVAL_TIMEOUT_MS", "10000")?;

    Ok(AppConfig {
        env,
        log_level,
        http_timeout_secs,
        mobile_user_agent,
        desktop_user_agent,
        content_fetch_attempts,
        content_fetch_backoff_ms,
        literal_evaluator,
        node_binary,
        eval_timeout_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRODLINK_ENV".to_string(),
            reason: format!(
                "unknown environment '{other}'; expected development, test, or production"
            ),
        }),
    }
}

fn parse_evaluator_kind(s: &str) -> Result<EvaluatorKind, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "relaxed" => Ok(EvaluatorKind::Relaxed),
        "node" => Ok(EvaluatorKind::Node),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRODLINK_LITERAL_EVALUATOR".to_string(),
            reason: format!("unknown evaluator '{other}'; expected relaxed or node"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
