//! Best-effort IP geolocation against an ipapi.co-compatible service.

use std::fmt;
use std::net::IpAddr;

use serde::Deserialize;
use thiserror::Error;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geolocation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geolocation service answered HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn unknown() -> Self {
        Location {
            city: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResp {
    ip: Option<String>,
    city: Option<String>,
    country_name: Option<String>,
}

impl IpApiResp {
    fn location(&self) -> Location {
        let pick = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        Location {
            city: pick(&self.city),
            country: pick(&self.country_name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeoLocator {
    client: reqwest::Client,
    base: String,
}

impl GeoLocator {
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        GeoLocator { client, base }
    }

    async fn fetch(&self, url: String) -> Result<IpApiResp, GeoError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(GeoError::Status(resp.status()));
        }
        Ok(resp.json::<IpApiResp>().await?)
    }

    /// City and country for `ip`. Never fails: anything that is not an IP
    /// address, or any lookup problem, yields `Unknown, Unknown`.
    pub async fn locate(&self, ip: &str) -> Location {
        if ip.parse::<IpAddr>().is_err() {
            return Location::unknown();
        }
        match self.fetch(format!("{}/{}/json/", self.base, ip)).await {
            Ok(r) => r.location(),
            Err(e) => {
                tracing::warn!(%ip, "IP lookup failed: {e}");
                Location::unknown()
            }
        }
    }

    /// The caller's own public address and location, as seen by the service.
    pub async fn locate_self(&self) -> (String, Location) {
        match self.fetch(format!("{}/json/", self.base)).await {
            Ok(r) => {
                let ip = r.ip.clone().unwrap_or_else(|| UNKNOWN.to_string());
                (ip, r.location())
            }
            Err(e) => {
                tracing::warn!("own IP lookup failed: {e}");
                (UNKNOWN.to_string(), Location::unknown())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_unknown() {
        let r: IpApiResp = serde_json::from_str(r#"{"city": "Pune"}"#).unwrap();
        assert_eq!(r.location().to_string(), "Pune, Unknown");

        let r: IpApiResp = serde_json::from_str(r#"{"error": true, "reason": "Invalid IP Address"}"#).unwrap();
        assert_eq!(r.location(), Location::unknown());
        assert_eq!(r.location().to_string(), "Unknown, Unknown");
    }
}
