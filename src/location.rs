use crate::config::Config;
use crate::i18n::Language;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use tracing::{debug, warn};

pub const FALLBACK_COUNTRY: &str = "Unknown";
pub const FALLBACK_COUNTRY_CODE: &str = "US";

/// Coarse caller location and the language inferred from it.
///
/// Best-effort personalization only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub country: String,
    pub country_code: String,
    pub language: Language,
}

impl GeoLocation {
    /// Result used whenever the lookup itself fails.
    pub fn fallback() -> Self {
        Self {
            country: FALLBACK_COUNTRY.to_string(),
            country_code: FALLBACK_COUNTRY_CODE.to_string(),
            language: Language::ENGLISH,
        }
    }
}

/// ipapi.co `/json/` response (only the fields we use)
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    country_name: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Failed to send geolocation request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Geolocation API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse geolocation response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Geolocation response contained no country_code")]
    MissingCountryCode,
}

/// Map an ISO 3166-1 alpha-2 country code to the language shown to its visitors.
///
/// Countries outside the table get English.
pub fn language_for_country(country_code: &str) -> Language {
    match country_code.trim().to_ascii_uppercase().as_str() {
        "KR" => Language::KOREAN,
        "US" | "GB" | "CA" | "AU" => Language::ENGLISH,
        "JP" => Language::JAPANESE,
        "CN" | "TW" | "HK" => Language::CHINESE,
        "ES" | "MX" | "AR" => Language::SPANISH,
        "FR" => Language::FRENCH,
        "DE" => Language::GERMAN,
        "RU" => Language::RUSSIAN,
        _ => Language::ENGLISH,
    }
}

/// Client for an ipapi.co-compatible geolocation endpoint.
#[derive(Debug, Clone)]
pub struct LocationDetector {
    client: reqwest::Client,
    api_url: String,
}

impl LocationDetector {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(client, config.geolocation_api_url.clone())
    }

    /// Detect the location of `ip`, or of the requesting host when `ip` is
    /// `None` or not publicly routable. Any failure yields [`GeoLocation::fallback`].
    pub async fn detect(&self, ip: Option<IpAddr>) -> GeoLocation {
        self.lookup(ip).await.unwrap_or_else(|e| {
            warn!("Location detection failed, using fallback: {}", e);
            GeoLocation::fallback()
        })
    }

    /// One geolocation request, with failures reported to the caller.
    pub async fn lookup(&self, ip: Option<IpAddr>) -> Result<GeoLocation, DetectError> {
        let url = self.lookup_url(ip);
        debug!("Looking up location via {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(DetectError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(DetectError::Status { status, body });
        }

        let parsed: IpApiResponse = response.json().await.map_err(DetectError::Decode)?;

        let country_code = parsed
            .country_code
            .filter(|code| !code.trim().is_empty())
            .ok_or(DetectError::MissingCountryCode)?;

        Ok(GeoLocation {
            country: parsed
                .country_name
                .unwrap_or_else(|| FALLBACK_COUNTRY.to_string()),
            language: language_for_country(&country_code),
            country_code,
        })
    }

    fn lookup_url(&self, ip: Option<IpAddr>) -> String {
        match ip.filter(is_public) {
            Some(ip) => format!("{}/{}/json/", self.api_url, ip),
            None => format!("{}/json/", self.api_url),
        }
    }
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(&v4),
            None => {
                let first = v6.segments()[0];
                let link_local = first & 0xffc0 == 0xfe80;
                let unique_local = first & 0xfe00 == 0xfc00;
                !(v6.is_loopback() || v6.is_unspecified() || link_local || unique_local)
            }
        },
    }
}

fn is_public_v4(v4: &Ipv4Addr) -> bool {
    !(v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_unspecified()
        || v4.is_broadcast())
}
