// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use prattle_core::{InMemoryInterner, Value};
use serde_json::json;

fn schema() -> FieldSchema {
    raw_data_schema(Box::new(InMemoryInterner::new()))
}

#[test]
fn schema_has_envelope_and_payload_fields() {
    let schema = schema();
    assert_eq!(schema.table(), RAW_DATA_TABLE);
    assert_eq!(schema.fields().len(), 5 + RAW_DATA_FIELDS.len());
    assert_eq!(schema.fields()[0].name(), DEVICE_ID_FIELD);

    let sql = schema.insert_template().to_sql();
    assert!(sql.starts_with("insert into RAW_DATA ( PRINTERID, OBSERVED,"));
    assert!(sql.contains("PRINTER_STATE_TEXT_ID"));
    assert!(sql.contains("UTC_TIMESTAMP()"));
}

#[test]
fn printer_payload_maps_onto_fields() {
    let mut schema = schema();
    let problems = schema.update(
        "PRINTER",
        &json!({
            "sd": {"ready": true},
            "state": {"text": "Printing", "flags": {"printing": true, "paused": false}},
            "temperature": {"bed": {"actual": 59.8, "target": 60, "offset": 0}}
        }),
    );

    assert!(problems.is_empty(), "{problems:?}");
    assert_eq!(schema.value("PRINTER_SD_READY"), Some(&Value::Bool(true)));
    assert_eq!(schema.value("PRINTER_STATE_FLAGS_PRINTING"), Some(&Value::Bool(true)));
    assert_eq!(schema.value("PRINTER_TEMPERATURE_BED_TARGET"), Some(&Value::Float(60.0)));
    assert!(matches!(schema.value("PRINTER_STATE_TEXT"), Some(Value::Id(_))));
}

#[test]
fn unique_key_is_printer_and_timestamp() {
    let keys = raw_data_unique_keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].table, RAW_DATA_TABLE);
    assert_eq!(keys[0].columns, vec!["PRINTERID", "OBSERVED"]);

    let template = schema().insert_template();
    for column in &keys[0].columns {
        assert!(template.columns.iter().any(|(name, _)| name == column));
    }
}

#[test]
fn checkers_bind_the_printer_policies() {
    let mut checkers = raw_data_checkers();
    let schema = schema();
    assert!(checkers.alive(&schema));

    let policy = |name: &str| checkers.binding(name).map(|deadband| deadband.policy());
    assert_eq!(policy(DEVICE_ID_FIELD), Some(DeadbandPolicy::AnyChange));
    assert_eq!(policy(OBSERVED_FIELD), Some(DeadbandPolicy::AlwaysDead));
    assert_eq!(
        policy("JOB_PROGRESS_COMPLETION"),
        Some(DeadbandPolicy::PercentWithThreshold)
    );
    assert_eq!(policy("JOB_PROGRESS_PRINTTIME"), Some(DeadbandPolicy::AlwaysDead));
    assert_eq!(policy("PRINTER_TEMPERATURE_TOOL0_ACTUAL"), Some(DeadbandPolicy::AlwaysDead));
    assert_eq!(policy("PRINTER_TEMPERATURE_TOOL0_TARGET"), Some(DeadbandPolicy::AnyChange));
}

#[test]
fn state_text_maps_to_device_axis() {
    assert_eq!(device_axis(Some("Operational")), DeviceAxis::Idle);
    assert_eq!(device_axis(Some("Printing")), DeviceAxis::Busy);
    assert_eq!(device_axis(Some("Paused")), DeviceAxis::Paused);
    assert_eq!(device_axis(Some("Offline")), DeviceAxis::Inoperable);
    assert_eq!(device_axis(None), DeviceAxis::Inoperable);
}

#[test]
fn state_text_is_read_from_the_printer_payload() {
    let payloads = vec![
        ("JOB".to_string(), json!({"state": "Printing"})),
        ("PRINTER".to_string(), json!({"state": {"text": "Printing"}})),
    ];
    assert_eq!(state_text(&payloads), Some("Printing"));
    assert_eq!(state_text(&payloads[..1]), None);
}
