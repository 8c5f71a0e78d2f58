use std::env;
use std::path::PathBuf;

use crate::error::{CrafdError, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Data sources
    pub data_path: PathBuf,
    pub themes_path: Option<PathBuf>,
    pub member_states_path: Option<PathBuf>,

    /// Offer current member states as donor candidates even when they fund nothing.
    pub include_member_states: bool,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Ok(Self {
            data_path: PathBuf::from(required_env("CRAFD_DATA_PATH")?),
            themes_path: optional_env("CRAFD_THEMES_PATH").map(PathBuf::from),
            member_states_path: optional_env("CRAFD_MEMBER_STATES_PATH").map(PathBuf::from),
            include_member_states: parse_bool(
                "CRAFD_INCLUDE_MEMBER_STATES",
                optional_env("CRAFD_INCLUDE_MEMBER_STATES").as_deref(),
            )?,
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| CrafdError::Config("WEB_PORT must be a number".to_string()))?,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| CrafdError::Config(format!("{key} environment variable is required")))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(CrafdError::Config(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}
