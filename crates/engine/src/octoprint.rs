// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What an OctoPrint observation looks like to the engine

use prattle_core::field::{DEVICE_ID_FIELD, HTTP_STATUS_FIELD, OBSERVED_FIELD};
use prattle_core::{
    DeadbandCheckers, DeadbandPolicy, DeviceAxis, FieldKind, FieldSchema, StringInterner,
};
use prattle_storage::UniqueKey;

/// Table receiving one row per significant observation
pub const RAW_DATA_TABLE: &str = "RAW_DATA";

const RAW_DATA_FIELDS: &[(&str, FieldKind)] = &[
    ("PRINTER_SD_READY", FieldKind::Bool),
    ("PRINTER_STATE_FLAGS_CLOSEDORERROR", FieldKind::Bool),
    ("PRINTER_STATE_FLAGS_ERROR", FieldKind::Bool),
    ("PRINTER_STATE_FLAGS_OPERATIONAL", FieldKind::Bool),
    ("PRINTER_STATE_FLAGS_PAUSED", FieldKind::Bool),
    ("PRINTER_STATE_FLAGS_PRINTING", FieldKind::Bool),
    ("PRINTER_STATE_FLAGS_READY", FieldKind::Bool),
    ("PRINTER_STATE_FLAGS_SDREADY", FieldKind::Bool),
    ("PRINTER_STATE_TEXT", FieldKind::StringId),
    ("PRINTER_TEMPERATURE_BED_ACTUAL", FieldKind::Float),
    ("PRINTER_TEMPERATURE_BED_OFFSET", FieldKind::Float),
    ("PRINTER_TEMPERATURE_BED_TARGET", FieldKind::Float),
    ("PRINTER_TEMPERATURE_TOOL0_ACTUAL", FieldKind::Float),
    ("PRINTER_TEMPERATURE_TOOL0_OFFSET", FieldKind::Float),
    ("PRINTER_TEMPERATURE_TOOL0_TARGET", FieldKind::Float),
    ("JOB_JOB_AVERAGEPRINTTIME", FieldKind::Float),
    ("JOB_JOB_ESTIMATEDPRINTTIME", FieldKind::Float),
    ("JOB_JOB_FILAMENT_TOOL0_LENGTH", FieldKind::Float),
    ("JOB_JOB_FILAMENT_TOOL0_VOLUME", FieldKind::Float),
    ("JOB_JOB_FILE_DATE", FieldKind::Int),
    ("JOB_JOB_FILE_NAME", FieldKind::StringId),
    ("JOB_JOB_FILE_ORIGIN", FieldKind::StringId),
    ("JOB_JOB_FILE_PATH", FieldKind::StringId),
    ("JOB_JOB_FILE_SIZE", FieldKind::Int),
    ("JOB_JOB_LASTPRINTTIME", FieldKind::Float),
    ("JOB_PROGRESS_COMPLETION", FieldKind::Float),
    ("JOB_PROGRESS_FILEPOS", FieldKind::Int),
    ("JOB_PROGRESS_PRINTTIME", FieldKind::Int),
    ("JOB_PROGRESS_PRINTTIMELEFT", FieldKind::Int),
    ("JOB_PROGRESS_PRINTTIMELEFTORIGIN", FieldKind::StringId),
    ("JOB_STATE", FieldKind::StringId),
];

/// Envelope fields plus every payload field kept from `/api/printer` and
/// `/api/job`
pub fn raw_data_schema(interner: Box<dyn StringInterner>) -> FieldSchema {
    RAW_DATA_FIELDS
        .iter()
        .fold(FieldSchema::new(RAW_DATA_TABLE, interner), |schema, (name, kind)| {
            schema.with(*name, *kind)
        })
}

/// At most one row per printer per server timestamp
pub fn raw_data_unique_keys() -> Vec<UniqueKey> {
    vec![UniqueKey::new(RAW_DATA_TABLE, &[DEVICE_ID_FIELD, OBSERVED_FIELD])]
}

/// Policies for one printer's rows.
///
/// The first observation is always kept. Counters and actual temperatures
/// drift constantly and never justify a row on their own.
pub fn raw_data_checkers() -> DeadbandCheckers {
    let mut checkers = DeadbandCheckers::new()
        .with_fixed(DeadbandPolicy::DoOnce)
        .with_policy(DEVICE_ID_FIELD, DeadbandPolicy::AnyChange)
        .with_policy(OBSERVED_FIELD, DeadbandPolicy::AlwaysDead)
        .with_policy(HTTP_STATUS_FIELD, DeadbandPolicy::AnyChange)
        .with_policy("JOB_PROGRESS_COMPLETION", DeadbandPolicy::PercentWithThreshold);
    for field in [
        "JOB_PROGRESS_FILEPOS",
        "JOB_PROGRESS_PRINTTIME",
        "JOB_PROGRESS_PRINTTIMELEFT",
        "PRINTER_TEMPERATURE_BED_ACTUAL",
        "PRINTER_TEMPERATURE_TOOL0_ACTUAL",
    ] {
        checkers = checkers.with_policy(field, DeadbandPolicy::AlwaysDead);
    }
    checkers
}

/// Device axis for the `state.text` reported by `/api/printer`
pub fn device_axis(state_text: Option<&str>) -> DeviceAxis {
    match state_text {
        Some("Operational") => DeviceAxis::Idle,
        Some("Printing") => DeviceAxis::Busy,
        Some("Paused") => DeviceAxis::Paused,
        _ => DeviceAxis::Inoperable,
    }
}

/// `PRINTER.state.text` of a set of payloads
pub fn state_text(payloads: &[(String, serde_json::Value)]) -> Option<&str> {
    payloads
        .iter()
        .find(|(prefix, _)| prefix == "PRINTER")
        .and_then(|(_, payload)| payload.pointer("/state/text"))
        .and_then(serde_json::Value::as_str)
}

#[cfg(test)]
#[path = "octoprint_tests.rs"]
mod tests;
