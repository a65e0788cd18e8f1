// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps observations onto the row schema and stores the significant ones

use crate::octoprint::{raw_data_checkers, raw_data_schema};
use crate::poller::ObservationHandler;
use crate::EngineError;
use prattle_core::{
    DeadbandCheckers, Device, DeviceId, FieldSchema, InsertTemplate, Observation, StringInterner,
    Value,
};
use prattle_storage::{PersistenceSink, StoreError};
use std::collections::HashMap;

/// What happened to one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// Nothing changed enough to keep
    Skipped,
    Inserted,
    /// The store already had this row
    Duplicate,
}

pub struct ObservationLogger<S: PersistenceSink> {
    sink: S,
    schema: FieldSchema,
    template: InsertTemplate,
    make_checkers: fn() -> DeadbandCheckers,
    checkers: HashMap<DeviceId, DeadbandCheckers>,
}

impl<S: PersistenceSink> ObservationLogger<S> {
    /// `make_checkers` builds the policies for each newly seen device
    pub fn new(sink: S, schema: FieldSchema, make_checkers: fn() -> DeadbandCheckers) -> Self {
        let template = schema.insert_template();
        Self {
            sink,
            schema,
            template,
            make_checkers,
            checkers: HashMap::new(),
        }
    }

    /// Logger for the OctoPrint `RAW_DATA` rows
    pub fn octoprint(sink: S, interner: Box<dyn StringInterner>) -> Self {
        Self::new(sink, raw_data_schema(interner), raw_data_checkers)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Map `observation` and store it if any policy finds it significant.
    ///
    /// Payloads are ignored when the request failed. On a store error the
    /// transaction is rolled back, the baselines are left alone and the
    /// error is returned.
    pub fn map_then_log(
        &mut self,
        device: &Device,
        observation: &Observation,
    ) -> Result<LogOutcome, EngineError> {
        let schema = &mut self.schema;
        schema.reset();
        schema.set_device_id(device.id.0);
        let failure = observation.failure();
        schema.set_exception(failure.map(|f| f.class_name.as_str()));
        schema.set_http_status(observation.status());
        schema.set_http_message(observation.message());
        if failure.is_none() {
            for (prefix, payload) in observation.payloads() {
                schema.update(prefix, payload);
            }
        }

        let checkers = self
            .checkers
            .entry(device.id)
            .or_insert_with(self.make_checkers);
        if !checkers.alive(&self.schema) {
            return Ok(LogOutcome::Skipped);
        }

        let values = self.schema.value_tuple();
        match write(&mut self.sink, &self.template, &values) {
            Ok(inserted) => {
                checkers.commit(&self.schema);
                let outcome = if inserted {
                    LogOutcome::Inserted
                } else {
                    LogOutcome::Duplicate
                };
                tracing::debug!(device_id = %device.id, ?outcome, "observation logged");
                Ok(outcome)
            }
            Err(e) => {
                self.sink.rollback();
                tracing::error!(device_id = %device.id, error = %e, "store write failed, rolled back");
                Err(e.into())
            }
        }
    }
}

fn write<S: PersistenceSink>(
    sink: &mut S,
    template: &InsertTemplate,
    values: &[Option<Value>],
) -> Result<bool, StoreError> {
    let inserted = sink.execute(template, values)?;
    sink.commit()?;
    Ok(inserted)
}

impl<S: PersistenceSink + 'static> ObservationHandler for ObservationLogger<S> {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn handle(&mut self, device: &Device, observation: &Observation) -> Result<(), EngineError> {
        self.map_then_log(device, observation).map(|_| ())
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
