//! Configuration module for pomotrack.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `POMOTRACK_API_URL` | Yes | - | Task API base URL (e.g., `https://tasks.example.com/api`) |
//! | `POMOTRACK_SESSION_TOKEN` | No | - | Session token sent as a bearer token |
//! | `POMOTRACK_TIMEOUT_SECS` | No | 30 | HTTP request timeout |
//! | `POMOTRACK_FOCUS_MINUTES` | No | 25 | Focus interval length |
//! | `POMOTRACK_SHORT_BREAK_MINUTES` | No | 5 | Short break length |
//! | `POMOTRACK_LONG_BREAK_MINUTES` | No | 15 | Long break length |
//!
//! # Example
//!
//! ```no_run
//! use pomotrack_client::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("API URL: {}", config.api_url);
//! ```

use std::env;

use thiserror::Error;

use crate::types::{
    IntervalDurations, DEFAULT_FOCUS_SECS, DEFAULT_LONG_BREAK_SECS, DEFAULT_SHORT_BREAK_SECS,
};

/// Default HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Configuration for the pomotrack client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Task API base URL, without a trailing slash.
    pub api_url: String,

    /// Optional session token for the `Authorization` header.
    pub session_token: Option<String>,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,

    /// Interval lengths.
    pub durations: IntervalDurations,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `POMOTRACK_API_URL` is not set or empty
    /// - a numeric variable is set but is not a positive integer
    pub fn from_env() -> Result<Self, ConfigError> {
        // Required: POMOTRACK_API_URL
        let api_url = env::var("POMOTRACK_API_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("POMOTRACK_API_URL".to_string()))?;

        // Optional: POMOTRACK_SESSION_TOKEN (empty counts as unset)
        let session_token = env::var("POMOTRACK_SESSION_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let timeout_secs = parse_positive("POMOTRACK_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let durations = IntervalDurations {
            focus_secs: parse_minutes("POMOTRACK_FOCUS_MINUTES", DEFAULT_FOCUS_SECS)?,
            short_break_secs: parse_minutes(
                "POMOTRACK_SHORT_BREAK_MINUTES",
                DEFAULT_SHORT_BREAK_SECS,
            )?,
            long_break_secs: parse_minutes("POMOTRACK_LONG_BREAK_MINUTES", DEFAULT_LONG_BREAK_SECS)?,
        };

        Ok(Self {
            api_url,
            session_token,
            timeout_secs,
            durations,
        })
    }
}

/// Parses an optional positive integer variable.
fn parse_positive(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(val) => {
            let parsed = val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected positive integer, got '{val}'"),
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "value must be greater than 0".to_string(),
                });
            }
            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}

/// Parses an optional minutes variable into seconds.
fn parse_minutes(key: &str, default_secs: u32) -> Result<u32, ConfigError> {
    let minutes = parse_positive(key, u64::from(default_secs / 60))?;
    u32::try_from(minutes)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{minutes} minutes is too long"),
        })
}
