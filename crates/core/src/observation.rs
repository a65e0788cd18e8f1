// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One polling tick's worth of data about one device

use crate::device::DeviceId;

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_CONFLICT: u16 = 409;

/// A request that never produced a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Short name of the error kind, e.g. `Timeout` or `ConnectionFailed`
    pub class_name: String,
    pub timed_out: bool,
}

impl TransportFailure {
    pub fn new(class_name: impl Into<String>, timed_out: bool) -> Self {
        Self {
            class_name: class_name.into(),
            timed_out,
        }
    }

    pub fn timeout() -> Self {
        Self::new("Timeout", true)
    }
}

/// How the collaborating source saw the device this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    Failed(&'a TransportFailure),
    Status {
        code: u16,
        payloads: &'a [(String, serde_json::Value)],
    },
    /// Nothing was requested
    Empty,
}

/// Envelope and payloads gathered from every request made for one device.
///
/// The first transport failure wins. The status is the first one seen,
/// except that a non-200 status replaces a 200 so a partial failure is
/// never reported as success.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Observation {
    device_id: DeviceId,
    payloads: Vec<(String, serde_json::Value)>,
    status: Option<u16>,
    message: Option<String>,
    failure: Option<TransportFailure>,
}

impl Observation {
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            ..Self::default()
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Record a response to the request whose payload goes under `prefix`.
    ///
    /// `body` is the response text; it becomes the payload on 200 and the
    /// message on a 409 that becomes the status.
    pub fn record_response(&mut self, prefix: &str, status: u16, body: &str) {
        let keeps_status = match self.status {
            None => true,
            Some(STATUS_OK) => status != STATUS_OK,
            Some(_) => false,
        };
        if keeps_status {
            self.status = Some(status);
            // Only the kept status carries a message
            if status == STATUS_CONFLICT {
                self.message = Some(body.trim().to_string());
            }
        }
        if status == STATUS_OK {
            match serde_json::from_str(body) {
                Ok(payload) => self.payloads.push((prefix.to_string(), payload)),
                Err(e) => {
                    tracing::warn!(device_id = %self.device_id, prefix, error = %e, "unreadable payload")
                }
            }
        }
    }

    pub fn record_payload(&mut self, prefix: &str, payload: serde_json::Value) {
        if self.status.is_none() {
            self.status = Some(STATUS_OK);
        }
        self.payloads.push((prefix.to_string(), payload));
    }

    pub fn record_failure(&mut self, failure: TransportFailure) {
        if self.failure.is_none() {
            self.failure = Some(failure);
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn failure(&self) -> Option<&TransportFailure> {
        self.failure.as_ref()
    }

    pub fn payloads(&self) -> &[(String, serde_json::Value)] {
        &self.payloads
    }

    pub fn payload(&self, prefix: &str) -> Option<&serde_json::Value> {
        self.payloads
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, payload)| payload)
    }

    pub fn outcome(&self) -> Outcome<'_> {
        match (&self.failure, self.status) {
            (Some(failure), _) => Outcome::Failed(failure),
            (None, Some(code)) => Outcome::Status {
                code,
                payloads: &self.payloads,
            },
            (None, None) => Outcome::Empty,
        }
    }
}

#[cfg(test)]
#[path = "observation_tests.rs"]
mod tests;
