// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use prattle_core::field::Placeholder;

fn template() -> InsertTemplate {
    InsertTemplate {
        table: "RAW_DATA".to_string(),
        columns: vec![
            ("PRINTERID".to_string(), Placeholder::Param),
            ("OBSERVED".to_string(), Placeholder::ServerTimestamp),
        ],
    }
}

#[test]
fn clones_share_committed_rows() {
    let store = MemoryStore::new(vec![UniqueKey::new("RAW_DATA", &["PRINTERID", "OBSERVED"])]);
    let mut sink = store.clone();

    assert!(sink.execute(&template(), &[Some(Value::Int(1))]).unwrap());
    assert!(sink.execute(&template(), &[Some(Value::Int(1))]).unwrap());
    assert_eq!(store.pending(), 2);
    sink.commit().unwrap();

    assert_eq!(store.rows().len(), 2);
    assert_eq!(store.commits(), 1);
}

#[test]
fn injected_failures_fire_once() {
    let store = MemoryStore::default();
    let mut sink = store.clone();
    store.fail_next_execute(1);

    assert!(sink.execute(&template(), &[None]).is_err());
    assert!(sink.execute(&template(), &[None]).is_ok());

    store.fail_next_commit(1);
    assert!(sink.commit().is_err());
    sink.rollback();
    assert_eq!(store.rollbacks(), 1);
    assert_eq!(store.pending(), 0);
}
