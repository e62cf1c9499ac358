//! HTTP client for the device-monitoring backend.

use color_eyre::eyre::{Result, WrapErr};
use log::*;
use reqwest::Client;

use crate::{
    config::BackendConfig,
    metrics::{DeviceStatus, MetricSnapshot},
};

#[derive(Debug, Clone)]
pub struct Backend {
    client: Client,
    status_url: String,
    metrics_url: String,
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .wrap_err("Building HTTP client")?;
        Ok(Self {
            client,
            status_url: config.status_url(),
            metrics_url: config.metrics_url(),
        })
    }

    pub fn metrics_url(&self) -> &str {
        &self.metrics_url
    }

    pub async fn status(&self) -> Result<DeviceStatus> {
        trace!(target: "Backend", "GET {}", self.status_url);
        let status = self
            .client
            .get(&self.status_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .wrap_err_with(|| format!("Decoding {}", self.status_url))?;
        Ok(status)
    }

    pub async fn snapshot(&self) -> Result<MetricSnapshot> {
        trace!(target: "Backend", "GET {}", self.metrics_url);
        let snapshot = self
            .client
            .get(&self.metrics_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .wrap_err_with(|| format!("Decoding {}", self.metrics_url))?;
        Ok(snapshot)
    }
}
