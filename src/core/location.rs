// src/core/location.rs
//! One-shot position acquisition with a deterministic fallback

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::environment::{LocationConfig, PositionSourceKind};
use crate::types::LocationData;

/// Istanbul city center
pub const FALLBACK_LATITUDE: f64 = 41.0082;
pub const FALLBACK_LONGITUDE: f64 = 28.9784;

pub fn fallback_location() -> LocationData {
    LocationData::new(FALLBACK_LATITUDE, FALLBACK_LONGITUDE)
}

/// Device position capability
#[rocket::async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<(f64, f64)>;
}

pub struct StaticPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[rocket::async_trait]
impl PositionSource for StaticPosition {
    async fn current_position(&self) -> Result<(f64, f64)> {
        Ok((self.latitude, self.longitude))
    }
}

/// Capability absent
pub struct NoPositionSource;

#[rocket::async_trait]
impl PositionSource for NoPositionSource {
    async fn current_position(&self) -> Result<(f64, f64)> {
        anyhow::bail!("Position capability is not available")
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Approximates the device position from its public IP address
pub struct IpGeolocation {
    client: reqwest::Client,
    url: String,
}

impl IpGeolocation {
    pub fn new(url: String, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, url })
    }
}

#[rocket::async_trait]
impl PositionSource for IpGeolocation {
    async fn current_position(&self) -> Result<(f64, f64)> {
        let response: IpLookupResponse = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to reach IP geolocation service")?
            .error_for_status()
            .context("IP geolocation service returned an error")?
            .json()
            .await
            .context("Failed to parse IP geolocation response")?;

        parse_ip_lookup(response)
    }
}

fn parse_ip_lookup(response: IpLookupResponse) -> Result<(f64, f64)> {
    if response.status != "success" {
        anyhow::bail!(
            "IP geolocation failed: {}",
            response.message.unwrap_or(response.status)
        );
    }

    match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        _ => anyhow::bail!("IP geolocation response carries no coordinates"),
    }
}

/// Build the configured capability. A static source without coordinates
/// behaves as an absent capability.
pub fn position_source_from_config(config: &LocationConfig) -> Result<Box<dyn PositionSource>> {
    let source: Box<dyn PositionSource> = match config.source {
        PositionSourceKind::Static => match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Box::new(StaticPosition {
                latitude,
                longitude,
            }),
            _ => {
                warn!("Static location source configured without coordinates");
                Box::new(NoPositionSource)
            }
        },
        PositionSourceKind::Ip => Box::new(IpGeolocation::new(
            config.ip_lookup_url.clone(),
            config.timeout_seconds,
        )?),
        PositionSourceKind::None => Box::new(NoPositionSource),
    };

    Ok(source)
}

/// Read the position once. Never fails: any error resolves to the fallback.
pub async fn acquire_location(source: &dyn PositionSource) -> LocationData {
    match source.current_position().await {
        Ok((latitude, longitude)) => {
            info!("Resolved device location: {}, {}", latitude, longitude);
            LocationData::new(latitude, longitude)
        }
        Err(e) => {
            warn!("Location error, using fallback: {}", e);
            fallback_location()
        }
    }
}
