// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OctoPrint REST polling

use super::ObservationSource;
use prattle_core::{Device, Observation, TransportFailure};
use std::time::Duration;

const USER_AGENT: &str = "Raw Data Logger/1";

/// Payload prefix and API path of each request made per tick
const REQUESTS: &[(&str, &str)] = &[("PRINTER", "/api/printer"), ("JOB", "/api/job")];

/// Polls `/api/printer` and `/api/job` with the device's API key
#[derive(Clone)]
pub struct OctoPrintSource {
    agent: ureq::Agent,
}

impl OctoPrintSource {
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    fn fetch(&self, url: &str, api_key: &str) -> Result<(u16, String), ureq::Error> {
        let mut response = self
            .agent
            .get(url)
            .header("X-Api-Key", api_key)
            .header("User-Agent", USER_AGENT)
            .call()?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        Ok((status, body))
    }
}

impl ObservationSource for OctoPrintSource {
    fn observe(&self, device: &Device) -> Observation {
        let mut observation = Observation::new(device.id);
        let (Some(address), Some(api_key)) = (&device.address, &device.api_key) else {
            tracing::warn!(device_id = %device.id, "device has no address or api key");
            return observation;
        };

        for (prefix, path) in REQUESTS {
            let url = format!("http://{address}{path}");
            match self.fetch(&url, api_key) {
                Ok((status, body)) => observation.record_response(prefix, status, &body),
                Err(e) => {
                    tracing::debug!(device_id = %device.id, url, error = %e, "request failed");
                    observation.record_failure(transport_failure(&e));
                }
            }
        }
        observation
    }
}

pub(crate) fn transport_failure(error: &ureq::Error) -> TransportFailure {
    let timed_out = match error {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
        _ => false,
    };
    TransportFailure::new(error_class(error), timed_out)
}

/// Variant name of the error, e.g. `Timeout` for `Timeout(Global)`
fn error_class(error: &ureq::Error) -> String {
    let debug = format!("{error:?}");
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("Error")
        .to_string()
}

#[cfg(test)]
#[path = "octoprint_tests.rs"]
mod tests;
