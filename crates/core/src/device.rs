// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitored devices and the registry that lists them

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stable numeric identity of a device
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a device's status lines are delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifyTarget {
    /// Emit through the log at info level
    Log,
    /// POST a JSON document to `url`
    Webhook { url: String },
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub notify: Option<NotifyTarget>,
}

fn default_active() -> bool {
    true
}

impl Device {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: DeviceId(id),
            name: name.into(),
            address: None,
            api_key: None,
            active: true,
            notify: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_notify(mut self, target: NotifyTarget) -> Self {
        self.notify = Some(target);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Polled only when switched on and fully configured
    pub fn is_active(&self) -> bool {
        self.active && self.address.is_some() && self.api_key.is_some()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("active", &self.active)
            .field("notify", &self.notify)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse registry {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("duplicate device id {0}")]
    DuplicateId(DeviceId),
}

/// Source of the device list
pub trait DeviceLoader {
    fn load(&self) -> Result<Vec<Device>, RegistryError>;
}

/// Devices listed inline in the configuration
#[derive(Debug, Clone, Default)]
pub struct StaticDevices(pub Vec<Device>);

impl DeviceLoader for StaticDevices {
    fn load(&self) -> Result<Vec<Device>, RegistryError> {
        Ok(self.0.clone())
    }
}

/// JSON file holding an array of devices
#[derive(Debug, Clone)]
pub struct RegistryFile {
    path: PathBuf,
}

impl RegistryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeviceLoader for RegistryFile {
    fn load(&self) -> Result<Vec<Device>, RegistryError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Ordered set of monitored devices
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new(devices: Vec<Device>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        if let Some(dup) = devices.iter().find(|d| !seen.insert(d.id)) {
            return Err(RegistryError::DuplicateId(dup.id));
        }
        Ok(Self { devices })
    }

    pub fn load(loader: &dyn DeviceLoader) -> Result<Self, RegistryError> {
        Self::new(loader.load()?)
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn nth(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.is_active())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<'a> IntoIterator for &'a DeviceRegistry {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
