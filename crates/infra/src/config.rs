//! Configuration loaded from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `STOCKPULSE_RECENT_WINDOW_DAYS` | `7` |
//! | `STOCKPULSE_TOP_PRODUCTS_LIMIT` | `10` |
//! | `STOCKPULSE_SPARSE_FALLBACK` | `true` |
//! | `STOCKPULSE_ALLOW_DEV_SEED` | on unless `STOCKPULSE_ENV=production` |
//! | `STOCKPULSE_LOG_FORMAT` | `json` |

use std::str::FromStr;

use thiserror::Error;

use stockpulse_analytics::{DashboardSettings, SparseFallback};
use stockpulse_observability::{LogConfig, LogFormat};

pub const RECENT_WINDOW_DAYS: &str = "STOCKPULSE_RECENT_WINDOW_DAYS";
pub const TOP_PRODUCTS_LIMIT: &str = "STOCKPULSE_TOP_PRODUCTS_LIMIT";
pub const SPARSE_FALLBACK: &str = "STOCKPULSE_SPARSE_FALLBACK";
pub const ALLOW_DEV_SEED: &str = "STOCKPULSE_ALLOW_DEV_SEED";
pub const ENVIRONMENT: &str = "STOCKPULSE_ENV";
pub const LOG_FORMAT: &str = "STOCKPULSE_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub dashboard: DashboardSettings,
    pub allow_dev_seed: bool,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dashboard: DashboardSettings::default(),
            allow_dev_seed: true,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = DashboardSettings::default();

        let recent_window_days = match get(RECENT_WINDOW_DAYS) {
            Some(raw) => {
                let days: i64 = parse(RECENT_WINDOW_DAYS, &raw)?;
                if days < 0 {
                    return Err(ConfigError::invalid(RECENT_WINDOW_DAYS, &raw, "must not be negative"));
                }
                days
            }
            None => defaults.recent_window_days,
        };

        let top_products_limit = match get(TOP_PRODUCTS_LIMIT) {
            Some(raw) => parse(TOP_PRODUCTS_LIMIT, &raw)?,
            None => defaults.top_products_limit,
        };

        let sparse_fallback = match get(SPARSE_FALLBACK) {
            Some(raw) => match parse_flag(SPARSE_FALLBACK, &raw)? {
                true => SparseFallback::Substitute,
                false => SparseFallback::Disabled,
            },
            None => defaults.sparse_fallback,
        };

        let production = get(ENVIRONMENT).is_some_and(|env| env.eq_ignore_ascii_case("production"));
        let allow_dev_seed = match get(ALLOW_DEV_SEED) {
            Some(raw) => parse_flag(ALLOW_DEV_SEED, &raw)?,
            None => !production,
        };

        let format = match get(LOG_FORMAT) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|err| ConfigError::invalid(LOG_FORMAT, &raw, err.to_string()))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            dashboard: DashboardSettings {
                recent_window_days,
                top_products_limit,
                sparse_fallback,
            },
            allow_dev_seed,
            log: LogConfig {
                format,
                ..LogConfig::default()
            },
        })
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|err| ConfigError::invalid(key, raw, err.to_string()))
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
    }
}
