use std::net::SocketAddr;
use std::time::Duration;

use dotenvy::dotenv;
use serde::Deserialize;

use crate::error::AppError;

fn default_max_upload_bytes() -> usize {
    // 16 MB in bytes
    16 * 1024 * 1024
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend_url: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Origins granted cross-origin access. Empty means same-origin only.
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: "http://127.0.0.1:5000".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            request_timeout: default_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, AppError> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("SHEET_VIZ_BACKEND_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::Config(format!(
                    "SHEET_VIZ_BACKEND_URL must be an http(s) URL, got {:?}",
                    url
                )));
            }
            config.backend_url = url;
        }

        if let Some(addr) = lookup("SHEET_VIZ_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SHEET_VIZ_BIND_ADDR: {}", e)))?;
        }

        if let Some(secs) = lookup("SHEET_VIZ_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                AppError::Config(format!("Invalid SHEET_VIZ_REQUEST_TIMEOUT_SECS: {}", e))
            })?;
            if secs == 0 {
                return Err(AppError::Config(
                    "SHEET_VIZ_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(bytes) = lookup("SHEET_VIZ_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = bytes.parse().map_err(|e| {
                AppError::Config(format!("Invalid SHEET_VIZ_MAX_UPLOAD_BYTES: {}", e))
            })?;
        }

        if let Some(origins) = lookup("SHEET_VIZ_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
            if let Some(bad) = config
                .allowed_origins
                .iter()
                .find(|origin| axum::http::HeaderValue::from_str(origin).is_err())
            {
                return Err(AppError::Config(format!(
                    "Invalid origin in SHEET_VIZ_ALLOWED_ORIGINS: {:?}",
                    bad
                )));
            }
        }

        Ok(config)
    }
}

pub fn load_config() -> Result<Config, AppError> {
    let config = Config::new()?;
    tracing::info!(
        backend = %config.backend_url,
        timeout = ?config.request_timeout,
        "configuration loaded"
    );
    Ok(config)
}
