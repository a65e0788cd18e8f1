// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two independent axes of a monitored resource's state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the resource can be reached and talked to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkAxis {
    #[default]
    Unknown,
    Good,
    Unreachable,
    Offline,
    BadPassword,
}

impl fmt::Display for NetworkAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkAxis::Unknown => "UNKNOWN",
            NetworkAxis::Good => "GOOD",
            NetworkAxis::Unreachable => "UNREACHABLE",
            NetworkAxis::Offline => "OFFLINE",
            NetworkAxis::BadPassword => "BAD_PASSWORD",
        })
    }
}

/// What the resource itself reports it is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceAxis {
    #[default]
    Unknown,
    Idle,
    Busy,
    Paused,
    Inoperable,
}

impl fmt::Display for DeviceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceAxis::Unknown => "UNKNOWN",
            DeviceAxis::Idle => "IDLE",
            DeviceAxis::Busy => "BUSY",
            DeviceAxis::Paused => "PAUSED",
            DeviceAxis::Inoperable => "INOPERABLE",
        })
    }
}

/// Current and previously evaluated value of one axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Axis<T> {
    current: T,
    previous: T,
}

impl<T: Copy + PartialEq> Axis<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            previous: initial,
        }
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn previous(&self) -> T {
        self.previous
    }

    pub fn set(&mut self, value: T) {
        self.current = value;
    }

    pub fn changed(&self) -> bool {
        self.current != self.previous
    }

    /// Record the current value as evaluated
    pub fn settle(&mut self) {
        self.previous = self.current;
    }
}
