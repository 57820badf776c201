//! ApiClient — thin reqwest wrapper over the daemon's REST endpoints.
//!
//! The feed socket carries live comments; everything else (station roster,
//! detail, trend, recent-comment seed) is fetched here on demand.

use anyhow::{bail, Result};
use dock_proto::station::{StationDetail, StationList, TrendResponse};
use tracing::debug;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(bind_address: &str, port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{}:{}", bind_address, port),
        }
    }

    pub async fn stations(&self) -> Result<StationList> {
        let url = format!("{}/api/stations", self.base_url);
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            bail!("station list request failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }

    pub async fn station_detail(&self, id: i64) -> Result<StationDetail> {
        let url = format!("{}/api/stations/{}", self.base_url, id);
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            bail!("station {} request failed: {}", id, resp.status());
        }
        Ok(resp.json().await?)
    }

    pub async fn trend(&self, id: i64) -> Result<TrendResponse> {
        let url = format!("{}/api/stations/{}/trend", self.base_url, id);
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            bail!("trend for station {} failed: {}", id, resp.status());
        }
        Ok(resp.json().await?)
    }
}
