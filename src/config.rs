use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TRANSLATE_API_URL: &str = "https://libretranslate.de/translate";
pub const DEFAULT_GEOLOCATION_API_URL: &str = "https://ipapi.co";

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Persistence
    pub storage_dir: PathBuf,

    // Translation (LibreTranslate-compatible endpoint)
    pub translate_api_url: String,
    pub translate_api_key: Option<String>,

    // Geolocation
    pub geolocation_api_url: String,

    // Outbound HTTP
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: parse_env("PORT")?.unwrap_or(8080),

            storage_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),

            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATE_API_URL.to_string()),
            translate_api_key: std::env::var("TRANSLATE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),

            geolocation_api_url: std::env::var("GEOLOCATION_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEOLOCATION_API_URL.to_string()),

            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS")?.unwrap_or(10)),
        })
    }

    /// Build the shared outbound HTTP client used for translation and geolocation.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

/// Read an optional numeric variable. Unset is `None`; set but unparseable is an error.
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number, got '{}'", name, raw)),
        Err(_) => Ok(None),
    }
}
