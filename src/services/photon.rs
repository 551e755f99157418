//! Photon geocoding client (secondary provider)
//!
//! Photon answers with GeoJSON: `features[0].geometry.coordinates` is `[lon, lat]`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::services::geocoding::{FreeTextSearch, Place};
use crate::types::Coordinates;

#[derive(Debug, Deserialize)]
pub struct PhotonResponse {
    #[serde(default)]
    pub features: Vec<PhotonFeature>,
}

#[derive(Debug, Deserialize)]
pub struct PhotonFeature {
    pub geometry: PhotonGeometry,
}

#[derive(Debug, Deserialize)]
pub struct PhotonGeometry {
    pub coordinates: Vec<f64>,
}

/// Photon geocoding client
pub struct PhotonClient {
    base_url: String,
    client: reqwest::Client,
}

impl PhotonClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl FreeTextSearch for PhotonClient {
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let url = format!(
            "{}/api/?q={}&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );
        debug!("Photon request: {}", url);

        let response: PhotonResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send Photon request")?
            .json()
            .await
            .context("Failed to parse Photon response")?;

        let Some(feature) = response.features.into_iter().next() else {
            return Ok(vec![]);
        };

        let coordinates = match feature.geometry.coordinates.as_slice() {
            [lon, lat, ..] => Coordinates::new(*lat, *lon),
            _ => None,
        }
        .context("Invalid coordinates in Photon response")?;

        Ok(vec![Place::at(coordinates)])
    }

    fn name(&self) -> &'static str {
        "photon"
    }
}
