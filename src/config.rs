use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

pub const DEFAULT_SCRAPE_URL: &str = "https://scrape.serper.dev";
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 6000;
pub const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub serper_api_key: String,
    pub gemini_api_key: String,
    pub scrape_url: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub scrape_timeout: Duration,
    pub max_chunk_length: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source. Both API keys are
    /// required; everything else falls back to the public service defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let serper_api_key = required(&lookup, "SERPER_API_KEY")?;
        let gemini_api_key = required(&lookup, "GEMINI_API_KEY")?;

        // Load server configuration with defaults
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let scrape_timeout = match lookup("SCRAPE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| AppError::ConfigError(format!("Invalid SCRAPE_TIMEOUT_SECS: {}", e)))?,
            None => DEFAULT_SCRAPE_TIMEOUT_SECS,
        };

        let max_chunk_length = match lookup("MAX_CHUNK_LENGTH") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| AppError::ConfigError(format!("Invalid MAX_CHUNK_LENGTH: {}", e)))?,
            None => DEFAULT_MAX_CHUNK_LENGTH,
        };
        if max_chunk_length == 0 {
            return Err(AppError::ConfigError("MAX_CHUNK_LENGTH must be greater than zero".to_string()));
        }

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            serper_api_key,
            gemini_api_key,
            scrape_url: lookup("SERPER_SCRAPE_URL").unwrap_or_else(|| DEFAULT_SCRAPE_URL.to_string()),
            gemini_api_base: lookup("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_BASE.to_string()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            scrape_timeout: Duration::from_secs(scrape_timeout),
            max_chunk_length,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::ConfigError(format!("{} is not set", key))),
    }
}
