// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! prattle-core: building blocks of the Prattle device monitor
//!
//! This crate provides:
//! - A cancellable, priority-ordered scheduler driven by a [`Clock`]
//! - The observation mapper that flattens device payloads into typed fields
//! - Deadband policies deciding which observations are worth persisting
//! - Device registry and daemon configuration

pub mod axis;
pub mod clock;
pub mod config;
pub mod deadband;
pub mod device;
pub mod field;
pub mod observation;
pub mod scheduler;
pub mod value;

pub use axis::{Axis, DeviceAxis, NetworkAxis};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError, LogSettings, NotifySettings, StoreSettings};
pub use deadband::{Deadband, DeadbandCheckers, DeadbandPolicy};
pub use device::{
    Device, DeviceId, DeviceLoader, DeviceRegistry, NotifyTarget, RegistryError, RegistryFile,
    StaticDevices,
};
pub use field::{
    Field, FieldKind, FieldSchema, InMemoryInterner, InsertTemplate, MappingError, Placeholder,
    StringInterner,
};
pub use observation::{Observation, Outcome, TransportFailure};
pub use scheduler::{ActionError, ActionHandle, Scheduler};
pub use value::Value;
