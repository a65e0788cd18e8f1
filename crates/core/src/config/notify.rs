// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification delivery settings

use super::ConfigError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifySettings {
    /// Lines buffered per device before new ones are dropped
    pub queue_capacity: usize,
    /// Delivery attempts per line
    pub max_attempts: u32,
    /// Lines longer than this are truncated
    pub max_length: usize,
    /// Posted once when a device is first seen
    pub greeting: Option<String>,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            max_attempts: 2,
            max_length: 140,
            greeting: Some("Howdy. I'm Prattle, your chirpy printing companion.".to_string()),
        }
    }
}

impl NotifySettings {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notify.queue_capacity must be positive".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "notify.max_attempts must be positive".into(),
            ));
        }
        if self.max_length == 0 {
            return Err(ConfigError::Invalid(
                "notify.max_length must be positive".into(),
            ));
        }
        Ok(())
    }
}
