// src/config.rs

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;

/// Number of package cards shown per page.
pub const PACKAGES_PER_PAGE: usize = 6;

/// Seconds before a password verification code may be requested again.
pub const RESEND_COOLDOWN_SECS: u64 = 60;

/// Minimum accepted password length for registration and password change.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Countdown tick period in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Grade at or above which a result is shown as a high score.
pub const HIGH_GRADE_THRESHOLD: f64 = 80.0;

/// Grade at or above which a result is shown as a medium score.
pub const MEDIUM_GRADE_THRESHOLD: f64 = 41.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token_path: PathBuf,
    pub rust_log: String,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_url = env::var("TRYOUT_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let token_path = env::var("TRYOUT_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".tryout/token"));

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let http_timeout_secs = env::var("TRYOUT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        Self {
            api_url,
            token_path,
            rust_log,
            http_timeout_secs,
        }
    }
}
