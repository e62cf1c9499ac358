//! Provides a ConfigManager to read and refresh config from files.
//!

use color_eyre::{Result, eyre::WrapErr};
use log::*;
use notify::{RecommendedWatcher, Watcher};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    event::{AppEvent, Event},
    metrics::series::DEFAULT_CAPACITY,
};

pub const DEFAULT_FILE: &str = "droidmon.toml";
pub const ENV_PREFIX: &str = "DROIDMON";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub status_path: String,
    pub metrics_path: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            status_path: "/api/status".to_string(),
            metrics_path: "/api/metrics".to_string(),
            timeout_ms: 2000,
        }
    }
}

impl BackendConfig {
    pub fn status_url(&self) -> String {
        join_url(&self.url, &self.status_path)
    }

    pub fn metrics_url(&self) -> String {
        join_url(&self.url, &self.metrics_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroidmonConfig {
    pub backend: BackendConfig,
    pub poll_interval_ms: u64,
    pub history_capacity: usize,
}

impl Default for DroidmonConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            poll_interval_ms: 1000,
            history_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl DroidmonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity.max(1)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).wrap_err("Serializing config")
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    pub file_path: PathBuf,
    config: DroidmonConfig,
    url_override: Option<String>,
    _watcher: Option<RecommendedWatcher>,
}

impl ConfigManager {
    pub fn new(
        file_path: PathBuf,
        url_override: Option<String>,
        sender: UnboundedSender<Event>,
    ) -> Result<ConfigManager> {
        let watcher = if file_path.exists() {
            let captured = sender.clone();
            let mut watcher = notify::recommended_watcher(move |_| {
                let _ = captured.send(Event::App(AppEvent::Reload));
            })?;
            info!(target: "Config", "Watching file {:?}", file_path);
            watcher.watch(&file_path, notify::RecursiveMode::NonRecursive)?;
            Some(watcher)
        } else {
            info!(target: "Config", "No config file at {:?}, using defaults", file_path);
            None
        };
        Ok(ConfigManager {
            config: Self::load(&file_path, url_override.as_deref())?,
            file_path,
            url_override,
            _watcher: watcher,
        })
    }

    pub fn current(&self) -> DroidmonConfig {
        self.config.clone()
    }

    pub fn reload(&mut self) -> Result<DroidmonConfig> {
        self.config = Self::load(&self.file_path, self.url_override.as_deref())?;
        Ok(self.current())
    }

    /// Layer the optional file, then `DROIDMON__*` environment variables,
    /// then the command line override.
    pub fn load(file_path: &PathBuf, url_override: Option<&str>) -> Result<DroidmonConfig> {
        Self::layered(file_path, url_override, environment())
    }

    fn layered(
        file_path: &PathBuf,
        url_override: Option<&str>,
        env: config::Environment,
    ) -> Result<DroidmonConfig> {
        let raw = config::Config::builder()
            .add_source(config::File::from(file_path.clone()).required(false))
            .add_source(env)
            .build()
            .wrap_err_with(|| format!("Loading config {:?}", file_path))?;
        let mut config: DroidmonConfig = raw.try_deserialize()?;
        if let Some(url) = url_override {
            config.backend.url = url.to_string();
        }
        Ok(config)
    }
}

/// `DROIDMON__POLL_INTERVAL_MS`, `DROIDMON__BACKEND__URL`, ...
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
