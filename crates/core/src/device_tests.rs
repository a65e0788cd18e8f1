// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

fn mk3() -> Device {
    Device::new(1, "Mk3")
        .with_address("192.168.1.20")
        .with_api_key("secret")
}

#[test]
fn active_requires_address_and_key() {
    assert!(mk3().is_active());
    assert!(!mk3().inactive().is_active());
    assert!(!Device::new(2, "Bare").with_address("10.0.0.2").is_active());
    assert!(!Device::new(3, "Keyed").with_api_key("k").is_active());
}

#[test]
fn lookup_by_identity_position_and_name() {
    let registry = DeviceRegistry::new(vec![mk3(), Device::new(9, "Mini")]).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(DeviceId(9)).map(|d| d.name.as_str()), Some("Mini"));
    assert_eq!(registry.nth(0).map(|d| d.id), Some(DeviceId(1)));
    assert_eq!(registry.find_by_name("Mk3").map(|d| d.id), Some(DeviceId(1)));
    assert!(registry.get(DeviceId(5)).is_none());
    assert_eq!(registry.active().count(), 1);
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = DeviceRegistry::new(vec![mk3(), Device::new(1, "Again")]).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateId(DeviceId(1))));
}

#[test]
fn registry_file_loads_json_devices() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"id": 4, "name": "Voron", "address": "10.0.0.4", "api_key": "k",
              "notify": {{"kind": "webhook", "url": "http://hooks.local/p"}}}},
            {{"id": 5, "name": "Ender", "active": false}}
        ]"#
    )
    .unwrap();

    let registry = DeviceRegistry::load(&RegistryFile::new(file.path())).unwrap();

    let voron = registry.get(DeviceId(4)).unwrap();
    assert!(voron.is_active());
    assert_eq!(
        voron.notify,
        Some(NotifyTarget::Webhook {
            url: "http://hooks.local/p".to_string()
        })
    );
    assert!(!registry.get(DeviceId(5)).unwrap().active);
}

#[test]
fn missing_registry_file_is_an_io_error() {
    let err = DeviceRegistry::load(&RegistryFile::new("/nonexistent/devices.json")).unwrap_err();
    assert!(matches!(err, RegistryError::Io { .. }));
}

#[test]
fn debug_output_hides_api_key() {
    let rendered = format!("{:?}", mk3());
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("<redacted>"));
}
