// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, read from a TOML file

mod notify;

pub use notify::NotifySettings;

use crate::device::{Device, DeviceLoader, RegistryFile, StaticDevices};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Period of the polling tick
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Per-request timeout for device polling
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Pause before the polling cycle is rebuilt after a fault
    #[serde(with = "humantime_serde")]
    pub restart_delay: Duration,
    /// JSON device registry; `devices` is used when absent
    pub registry: Option<PathBuf>,
    pub log: LogSettings,
    pub store: Option<StoreSettings>,
    pub notify: NotifySettings,
    pub devices: Vec<Device>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_millis(500),
            restart_delay: Duration::from_secs(5),
            registry: None,
            log: LogSettings::default(),
            store: None,
            notify: NotifySettings::default(),
            devices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    pub path: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll_interval must be positive".into()));
        }
        self.notify.validate()?;
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate device id {}",
                    device.id
                )));
            }
        }
        Ok(())
    }

    /// Relative paths are taken relative to the config file
    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(registry) = self.registry.as_mut() {
            resolve(registry);
        }
        if let Some(store) = self.store.as_mut() {
            resolve(&mut store.path);
        }
        if let Some(log) = self.log.path.as_mut() {
            resolve(log);
        }
    }

    /// Registry file when configured, otherwise the inline device list
    pub fn device_loader(&self) -> Box<dyn DeviceLoader> {
        match &self.registry {
            Some(path) => Box::new(RegistryFile::new(path)),
            None => Box::new(StaticDevices(self.devices.clone())),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
