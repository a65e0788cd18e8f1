// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Prattle monitoring engine: polls devices, logs significant
//! observations and keeps each device's chatty resource model current

mod chatter;
mod cruncher;
mod error;
mod logger;
mod model;
mod monitor;
pub mod notifier;
pub mod octoprint;
mod poller;
pub mod prattle;

pub use chatter::{Chatter, CHATTER_PRIORITY};
pub use cruncher::ObservationCruncher;
pub use error::EngineError;
pub use logger::{LogOutcome, ObservationLogger};
pub use model::{Freeze, ResourceModel};
pub use monitor::{Monitor, POLL_PRIORITY};
pub use notifier::{
    Notifier, NotifierFactory, NotifyWorkers, NullNotifier, NullNotifiers, QueuedNotifier,
    TargetNotifiers,
};
pub use poller::{ObservationHandler, Poller};

#[cfg(any(test, feature = "test-support"))]
pub use notifier::RecordingNotifier;
