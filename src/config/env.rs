// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate client configuration from .env files

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Production backend used when no override is configured
pub const PRODUCTION_API_BASE: &str = "http://bapful.sjnam.site/api";

/// Local backend used in development mode
pub const DEVELOPMENT_API_BASE: &str = "http://127.0.0.1:8000";

/// Client configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL without trailing slash
    pub api_base_url: String,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Per-request timeout in seconds (default 15)
    pub request_timeout_secs: u64,

    /// Where the CLI persists the session
    pub session_file: PathBuf,

    /// Notify the backend on logout before clearing the local session
    pub remote_logout: bool,

    /// Kakao Maps SDK key (geocoding and markers)
    pub kakao_map_api_key: Option<String>,

    /// Google Maps SDK key
    pub google_maps_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: PRODUCTION_API_BASE.to_string(),
            environment: "production".to_string(),
            log_level: "info".to_string(),
            request_timeout_secs: 15,
            session_file: PathBuf::from(".bapful/session.json"),
            remote_logout: false,
            kakao_map_api_key: None,
            google_maps_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at startup
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Config::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        let base_override = env::var("BAPFUL_API_BASE_URL")
            .or_else(|_| env::var("API_BASE_URL"))
            .ok();

        Config {
            api_base_url: resolve_api_base(base_override.as_deref(), &environment),

            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),

            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),

            remote_logout: env::var("REMOTE_LOGOUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.remote_logout),

            kakao_map_api_key: non_empty_var("KAKAO_MAP_API_KEY"),

            google_maps_api_key: non_empty_var("GOOGLE_MAPS_API_KEY"),

            environment,
        }
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures the client can talk to a backend at all
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.is_empty() {
            return Err("API base URL is required".to_string());
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(format!(
                "API base URL must be http(s): {}",
                self.api_base_url
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be greater than zero".to_string());
        }

        if self.kakao_map_api_key.is_none() {
            log::warn!("KAKAO_MAP_API_KEY not configured - map search will not work");
        }

        if self.google_maps_api_key.is_none() {
            log::debug!("GOOGLE_MAPS_API_KEY not configured");
        }

        Ok(())
    }
}

/// Resolve the backend base URL
/// DOCUMENTATION: An explicit override wins (trimmed, trailing slashes removed);
/// otherwise development talks to a local backend and everything else to production
pub fn resolve_api_base(override_url: Option<&str>, environment: &str) -> String {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    if environment == "development" {
        DEVELOPMENT_API_BASE.to_string()
    } else {
        PRODUCTION_API_BASE.to_string()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
