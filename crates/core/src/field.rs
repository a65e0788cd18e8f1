// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observation mapper: flattens nested JSON payloads into typed, named
//! fields that line up with the columns of one insert statement.
//!
//! Paths are joined with `_` and uppercased, so `{"state": {"text": ..}}`
//! under the `PRINTER` prefix lands in the `PRINTER_STATE_TEXT` field.

use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const DEVICE_ID_FIELD: &str = "PRINTERID";
pub const OBSERVED_FIELD: &str = "OBSERVED";
pub const HTTP_STATUS_FIELD: &str = "HTTP_STATUS";
pub const HTTP_MESSAGE_FIELD: &str = "HTTP_MESSAGE";
pub const EXCEPTION_FIELD: &str = "EXCEPTION";

/// Maps repeated strings to small integer ids
pub trait StringInterner: Send {
    fn intern(&mut self, text: &str) -> u64;
}

/// Interner that hands out sequential ids starting at 1
#[derive(Debug, Default)]
pub struct InMemoryInterner {
    ids: HashMap<String, u64>,
}

impl InMemoryInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, text: &str) -> Option<u64> {
        self.ids.get(text).copied()
    }
}

impl StringInterner for InMemoryInterner {
    fn intern(&mut self, text: &str) -> u64 {
        let next = self.ids.len() as u64 + 1;
        *self.ids.entry(text.to_string()).or_insert(next)
    }
}

/// Problems found while mapping a payload. None of them abort the update.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("unrecognized path {path} with value {raw}")]
    Unrecognized { path: String, raw: String },
    #[error("cannot read {field} as {kind} from {raw}")]
    Coercion {
        field: String,
        kind: FieldKind,
        raw: String,
    },
}

/// How a raw leaf becomes a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    /// JSON scalar kept as-is
    Raw,
    /// Text replaced by an interned id; the column gets an `_ID` suffix
    StringId,
    DeviceId,
    /// Filled by the store at insert time; supplies no positional value
    Observed,
    HttpStatus,
    HttpMessage,
    Exception,
}

impl FieldKind {
    /// Envelope kinds are set directly, never from a payload path
    pub fn is_envelope(self) -> bool {
        matches!(
            self,
            FieldKind::DeviceId
                | FieldKind::Observed
                | FieldKind::HttpStatus
                | FieldKind::HttpMessage
                | FieldKind::Exception
        )
    }

    fn interned(self) -> bool {
        matches!(
            self,
            FieldKind::StringId | FieldKind::HttpMessage | FieldKind::Exception
        )
    }

    pub fn placeholder(self) -> Placeholder {
        match self {
            FieldKind::Observed => Placeholder::ServerTimestamp,
            _ => Placeholder::Param,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Bool => "bool",
            FieldKind::Int | FieldKind::DeviceId | FieldKind::HttpStatus => "int",
            FieldKind::Float => "float",
            FieldKind::Raw => "raw",
            FieldKind::StringId | FieldKind::HttpMessage | FieldKind::Exception => "string id",
            FieldKind::Observed => "timestamp",
        })
    }
}

/// One named datum of the current observation
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    value: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
        }
    }

    /// Name used for path matching and deadband binding
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> String {
        if self.kind.interned() {
            format!("{}_ID", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn always_include(&self) -> bool {
        self.kind.is_envelope()
    }

    pub fn current_value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn reset(&mut self) {
        self.value = None;
    }

    pub fn set(&mut self, value: Option<Value>) {
        self.value = value;
    }

    /// Coerce a raw JSON leaf per this field's kind. JSON null clears the
    /// field. On failure the field is left null.
    pub fn extract(
        &mut self,
        raw: &serde_json::Value,
        interner: &mut dyn StringInterner,
    ) -> Result<(), MappingError> {
        self.value = None;
        if raw.is_null() {
            return Ok(());
        }
        let value = coerce(self.kind, raw, interner).ok_or_else(|| MappingError::Coercion {
            field: self.name.clone(),
            kind: self.kind,
            raw: raw.to_string(),
        })?;
        self.value = Some(value);
        Ok(())
    }
}

fn coerce(
    kind: FieldKind,
    raw: &serde_json::Value,
    interner: &mut dyn StringInterner,
) -> Option<Value> {
    use serde_json::Value as Json;

    match kind {
        FieldKind::Bool => Some(Value::Bool(truthy(raw))),
        FieldKind::Int | FieldKind::DeviceId | FieldKind::HttpStatus => match raw {
            Json::Bool(b) => Some(Value::Int(i64::from(*b))),
            Json::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(Value::Int),
            Json::String(s) => s.trim().parse().ok().map(Value::Int),
            _ => None,
        },
        FieldKind::Float => match raw {
            Json::Bool(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
            Json::Number(n) => n.as_f64().map(Value::Float),
            Json::String(s) => s.trim().parse().ok().map(Value::Float),
            _ => None,
        },
        FieldKind::Raw => match raw {
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float)),
            Json::String(s) => Some(Value::Text(s.clone())),
            other => Some(Value::Text(other.to_string())),
        },
        FieldKind::StringId | FieldKind::HttpMessage | FieldKind::Exception => {
            let text = match raw {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(Value::Id(interner.intern(&text)))
        }
        FieldKind::Observed => None,
    }
}

fn truthy(raw: &serde_json::Value) -> bool {
    use serde_json::Value as Json;

    match raw {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
    }
}

/// How one column's value reaches the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Positional parameter taken from the value tuple
    Param,
    /// Current UTC time on the store side
    ServerTimestamp,
}

/// Column list and placeholders for one insert statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTemplate {
    pub table: String,
    pub columns: Vec<(String, Placeholder)>,
}

impl InsertTemplate {
    /// Columns that take a positional value, in order
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|(_, placeholder)| *placeholder == Placeholder::Param)
            .map(|(name, _)| name.as_str())
    }

    pub fn to_sql(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|(n, _)| n.as_str()).collect();
        let formats: Vec<&str> = self
            .columns
            .iter()
            .map(|(_, placeholder)| match placeholder {
                Placeholder::Param => "%s",
                Placeholder::ServerTimestamp => "UTC_TIMESTAMP()",
            })
            .collect();
        format!(
            "insert into {} ( {} ) values ( {} )",
            self.table,
            names.join(", "),
            formats.join(", ")
        )
    }
}

/// Ordered set of fields for one table, plus the envelope fields every
/// row carries.
pub struct FieldSchema {
    table: String,
    fields: Vec<Field>,
    by_path: HashMap<String, usize>,
    interner: Box<dyn StringInterner>,
}

impl fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("table", &self.table)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl FieldSchema {
    /// Schema holding only the envelope fields
    pub fn new(table: impl Into<String>, interner: Box<dyn StringInterner>) -> Self {
        let mut schema = Self {
            table: table.into(),
            fields: Vec::new(),
            by_path: HashMap::new(),
            interner,
        };
        for (name, kind) in [
            (DEVICE_ID_FIELD, FieldKind::DeviceId),
            (OBSERVED_FIELD, FieldKind::Observed),
            (HTTP_STATUS_FIELD, FieldKind::HttpStatus),
            (HTTP_MESSAGE_FIELD, FieldKind::HttpMessage),
            (EXCEPTION_FIELD, FieldKind::Exception),
        ] {
            schema.fields.push(Field::new(name, kind));
        }
        schema
    }

    /// Add a payload field. A name already present is left as it was.
    pub fn add(&mut self, name: impl Into<String>, kind: FieldKind) -> &mut Self {
        let name = name.into();
        if self.fields.iter().any(|f| f.name == name) {
            tracing::warn!(field = %name, "duplicate field ignored");
            return self;
        }
        if !kind.is_envelope() {
            self.by_path.insert(name.clone(), self.fields.len());
        }
        self.fields.push(Field::new(name, kind));
        self
    }

    pub fn with(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.add(name, kind);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(Field::current_value)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn reset(&mut self) {
        self.fields.iter_mut().for_each(Field::reset);
    }

    pub fn set_device_id(&mut self, id: i64) {
        if let Some(field) = self.field_mut(DEVICE_ID_FIELD) {
            field.set(Some(Value::Int(id)));
        }
    }

    pub fn set_http_status(&mut self, status: Option<u16>) {
        if let Some(field) = self.field_mut(HTTP_STATUS_FIELD) {
            field.set(status.map(|s| Value::Int(i64::from(s))));
        }
    }

    pub fn set_http_message(&mut self, message: Option<&str>) {
        self.set_interned(HTTP_MESSAGE_FIELD, message);
    }

    pub fn set_exception(&mut self, class_name: Option<&str>) {
        self.set_interned(EXCEPTION_FIELD, class_name);
    }

    fn set_interned(&mut self, name: &str, text: Option<&str>) {
        let value = text.map(|t| Value::Id(self.interner.intern(t)));
        if let Some(field) = self.field_mut(name) {
            field.set(value);
        }
    }

    /// Walk `payload` and extract every leaf into its field.
    ///
    /// Returns the problems found; each is also logged as a warning.
    pub fn update(&mut self, prefix: &str, payload: &serde_json::Value) -> Vec<MappingError> {
        let mut problems = Vec::new();
        match payload {
            serde_json::Value::Object(map) => {
                self.traverse(&prefix.to_uppercase(), map, &mut problems)
            }
            leaf => self.extract_leaf(prefix.to_uppercase(), leaf, &mut problems),
        }
        for problem in &problems {
            tracing::warn!(table = %self.table, "{problem}");
        }
        problems
    }

    fn traverse(
        &mut self,
        left: &str,
        node: &serde_json::Map<String, serde_json::Value>,
        problems: &mut Vec<MappingError>,
    ) {
        for (key, value) in node {
            let key = key.to_uppercase();
            let path = if left.is_empty() {
                key
            } else {
                format!("{left}_{key}")
            };
            match value {
                serde_json::Value::Object(child) => self.traverse(&path, child, problems),
                leaf => self.extract_leaf(path, leaf, problems),
            }
        }
    }

    fn extract_leaf(
        &mut self,
        path: String,
        leaf: &serde_json::Value,
        problems: &mut Vec<MappingError>,
    ) {
        let Some(&index) = self.by_path.get(&path) else {
            problems.push(MappingError::Unrecognized {
                path,
                raw: leaf.to_string(),
            });
            return;
        };
        if let Some(field) = self.fields.get_mut(index) {
            if let Err(e) = field.extract(leaf, self.interner.as_mut()) {
                problems.push(e);
            }
        }
    }

    pub fn insert_template(&self) -> InsertTemplate {
        InsertTemplate {
            table: self.table.clone(),
            columns: self
                .fields
                .iter()
                .map(|f| (f.column(), f.kind.placeholder()))
                .collect(),
        }
    }

    /// Positional values for [`InsertTemplate::params`], nulls included
    pub fn value_tuple(&self) -> Vec<Option<Value>> {
        self.fields
            .iter()
            .filter(|f| f.kind.placeholder() == Placeholder::Param)
            .map(|f| f.value.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "field_tests.rs"]
mod tests;
