use crate::app_config::{AppConfig, Environment};
use crate::job::DEFAULT_USER_AGENT;
use crate::ConfigError;

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

fn invalid(var: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`
/// lookup, no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;
    use std::str::FromStr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.trim().parse::<T>().map_err(|e| invalid(var, e))
    }

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ADSCOUT_ENV", "development"))?;
    let log_level = or_default("ADSCOUT_LOG_LEVEL", "info");

    let db_max_connections: u32 = parse_as(
        "ADSCOUT_DB_MAX_CONNECTIONS",
        &or_default("ADSCOUT_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "ADSCOUT_DB_MIN_CONNECTIONS",
        &or_default("ADSCOUT_DB_MIN_CONNECTIONS", "1"),
    )?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "ADSCOUT_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds ADSCOUT_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }
    let db_acquire_timeout_secs: u64 = parse_as(
        "ADSCOUT_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("ADSCOUT_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let scraper_max_pages: u32 = parse_as(
        "ADSCOUT_SCRAPER_MAX_PAGES",
        &or_default("ADSCOUT_SCRAPER_MAX_PAGES", "5"),
    )?;
    if scraper_max_pages == 0 {
        return Err(invalid("ADSCOUT_SCRAPER_MAX_PAGES", "must be at least 1"));
    }
    let scraper_delay_ms: u64 = parse_as(
        "ADSCOUT_SCRAPER_DELAY_MS",
        &or_default("ADSCOUT_SCRAPER_DELAY_MS", "2000"),
    )?;
    let scraper_user_agent = or_default("ADSCOUT_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_country = or_default("ADSCOUT_SCRAPER_COUNTRY", "BR").to_ascii_uppercase();
    let scraper_selector_timeout_secs: u64 = parse_as(
        "ADSCOUT_SCRAPER_SELECTOR_TIMEOUT_SECS",
        &or_default("ADSCOUT_SCRAPER_SELECTOR_TIMEOUT_SECS", "10"),
    )?;
    let scraper_proxy_server = optional("ADSCOUT_SCRAPER_PROXY");
    let chrome_executable = optional("ADSCOUT_CHROME_EXECUTABLE").map(PathBuf::from);

    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_base_url = or_default("ADSCOUT_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("ADSCOUT_OPENAI_MODEL", "gpt-4-turbo-preview");
    let openai_max_tokens: u32 = parse_as(
        "ADSCOUT_OPENAI_MAX_TOKENS",
        &or_default("ADSCOUT_OPENAI_MAX_TOKENS", "2000"),
    )?;
    let openai_temperature: f32 = parse_as(
        "ADSCOUT_OPENAI_TEMPERATURE",
        &or_default("ADSCOUT_OPENAI_TEMPERATURE", "0.3"),
    )?;
    if !(0.0..=2.0).contains(&openai_temperature) {
        return Err(invalid(
            "ADSCOUT_OPENAI_TEMPERATURE",
            "must be between 0.0 and 2.0",
        ));
    }
    let openai_request_timeout_secs: u64 = parse_as(
        "ADSCOUT_OPENAI_TIMEOUT_SECS",
        &or_default("ADSCOUT_OPENAI_TIMEOUT_SECS", "60"),
    )?;
    let enrich_delay_ms: u64 = parse_as(
        "ADSCOUT_ENRICH_DELAY_MS",
        &or_default("ADSCOUT_ENRICH_DELAY_MS", "1000"),
    )?;

    let scheduler_utc_offset_hours: i32 = parse_as(
        "ADSCOUT_SCHEDULER_UTC_OFFSET_HOURS",
        &or_default("ADSCOUT_SCHEDULER_UTC_OFFSET_HOURS", "-3"),
    )?;
    if !(-12..=14).contains(&scheduler_utc_offset_hours) {
        return Err(invalid(
            "ADSCOUT_SCHEDULER_UTC_OFFSET_HOURS",
            "must be between -12 and 14",
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_max_pages,
        scraper_delay_ms,
        scraper_user_agent,
        scraper_country,
        scraper_selector_timeout_secs,
        scraper_proxy_server,
        chrome_executable,
        openai_api_key,
        openai_base_url,
        openai_model,
        openai_max_tokens,
        openai_temperature,
        openai_request_timeout_secs,
        enrich_delay_ms,
        scheduler_utc_offset_hours,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "ADSCOUT_ENV",
            format!("unknown environment '{other}'"),
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
