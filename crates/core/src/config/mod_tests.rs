// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::device::{DeviceId, NotifyTarget};

#[test]
fn empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();

    assert_eq!(config.poll_interval, Duration::from_secs(5));
    assert_eq!(config.request_timeout, Duration::from_millis(500));
    assert_eq!(config.restart_delay, Duration::from_secs(5));
    assert_eq!(config.log.filter, "info");
    assert_eq!(config.notify.max_attempts, 2);
    assert_eq!(config.notify.max_length, 140);
    assert!(config.store.is_none());
    assert!(config.devices.is_empty());
}

#[test]
fn full_config_parses() {
    let config = Config::parse(
        r#"
        poll_interval = "10s"
        request_timeout = "250ms"

        [log]
        filter = "prattle=debug"

        [store]
        path = "raw.wal"

        [notify]
        queue_capacity = 8
        greeting = "hello"

        [[devices]]
        id = 1
        name = "Mk3"
        address = "192.168.1.20"
        api_key = "secret"
        notify = { kind = "webhook", url = "http://hooks.local/mk3" }

        [[devices]]
        id = 2
        name = "Mini"
        active = false
        notify = { kind = "log" }
        "#,
    )
    .unwrap();

    assert_eq!(config.poll_interval, Duration::from_secs(10));
    assert_eq!(config.request_timeout, Duration::from_millis(250));
    assert_eq!(config.notify.queue_capacity, 8);
    assert_eq!(config.notify.greeting.as_deref(), Some("hello"));
    assert_eq!(config.devices.len(), 2);
    assert_eq!(config.devices[0].id, DeviceId(1));
    assert!(config.devices[0].is_active());
    assert_eq!(config.devices[1].notify, Some(NotifyTarget::Log));
    assert!(!config.devices[1].is_active());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = Config::parse("poll_every = \"5s\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let err = Config::parse("poll_interval = \"0s\"").unwrap_err();
    assert!(err.to_string().contains("poll_interval"));
}

#[test]
fn zero_attempts_is_rejected() {
    let err = Config::parse("[notify]\nmax_attempts = 0").unwrap_err();
    assert!(err.to_string().contains("max_attempts"));
}

#[test]
fn duplicate_device_ids_are_rejected() {
    let err = Config::parse(
        r#"
        [[devices]]
        id = 1
        name = "a"
        [[devices]]
        id = 1
        name = "b"
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("duplicate device id 1"));
}

#[test]
fn load_resolves_paths_next_to_the_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prattle.toml");
    std::fs::write(&path, "registry = \"devices.json\"\n[store]\npath = \"raw.wal\"\n").unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.registry, Some(dir.path().join("devices.json")));
    assert_eq!(config.store.map(|s| s.path), Some(dir.path().join("raw.wal")));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Config::load(Path::new("/nonexistent/prattle.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn inline_devices_are_the_fallback_loader() {
    let config = Config::parse("[[devices]]\nid = 3\nname = \"c\"").unwrap();
    let devices = config.device_loader().load().unwrap();
    assert_eq!(devices.len(), 1);
}
