// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-significance ("deadband") filter that decides whether a mapped
//! observation is worth persisting.

use crate::field::FieldSchema;
use crate::value::Value;

/// Smallest change of a percent field that counts
const PERCENT_THRESHOLD: f64 = 1.0;
const PERCENT_COMPLETE: f64 = 100.0;

/// Rule deciding whether a field's current value differs meaningfully
/// from the last committed one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadbandPolicy {
    /// Never significant
    AlwaysDead,
    /// Significant on the first check only, commit or not
    DoOnce,
    /// Any inequality is significant; null differs from every value
    AnyChange,
    /// Numeric delta of at least one point, or reaching/leaving 100
    PercentWithThreshold,
}

/// A policy plus the state it keeps for one field
#[derive(Debug, Clone, PartialEq)]
pub struct Deadband {
    policy: DeadbandPolicy,
    field: Option<String>,
    committed: Option<Value>,
    fired: bool,
}

impl Deadband {
    /// Unbound policy that does not look at any field
    pub fn fixed(policy: DeadbandPolicy) -> Self {
        Self {
            policy,
            field: None,
            committed: None,
            fired: false,
        }
    }

    pub fn bound(policy: DeadbandPolicy, field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::fixed(policy)
        }
    }

    pub fn policy(&self) -> DeadbandPolicy {
        self.policy
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn committed(&self) -> Option<&Value> {
        self.committed.as_ref()
    }

    pub fn is_significantly_different(&mut self, current: Option<&Value>) -> bool {
        match self.policy {
            DeadbandPolicy::AlwaysDead => false,
            DeadbandPolicy::DoOnce => !std::mem::replace(&mut self.fired, true),
            DeadbandPolicy::AnyChange => self.committed.as_ref() != current,
            DeadbandPolicy::PercentWithThreshold => {
                percent_significantly_different(self.committed.as_ref(), current)
            }
        }
    }

    /// Snapshot `current` as the new baseline
    pub fn commit(&mut self, current: Option<&Value>) {
        match self.policy {
            DeadbandPolicy::AlwaysDead | DeadbandPolicy::DoOnce => {}
            DeadbandPolicy::AnyChange | DeadbandPolicy::PercentWithThreshold => {
                self.committed = current.cloned();
            }
        }
    }
}

/// Percent rule on a `(previous, current)` pair
pub fn percent_significantly_different(previous: Option<&Value>, current: Option<&Value>) -> bool {
    let previous = previous.and_then(Value::as_f64);
    let current = current.and_then(Value::as_f64);
    match (previous, current) {
        (None, None) => false,
        (Some(_), None) | (None, Some(_)) => true,
        (Some(p), Some(c)) => {
            (c - p).abs() >= PERCENT_THRESHOLD
                || ((p == PERCENT_COMPLETE) != (c == PERCENT_COMPLETE))
        }
    }
}

/// The set of policies guarding one resource's rows.
///
/// Fixed policies run first. Named policies are attached to schema fields
/// the first time the set is used; fields without one get `AnyChange`.
#[derive(Debug, Clone, Default)]
pub struct DeadbandCheckers {
    fixed: Vec<Deadband>,
    named: Vec<(String, DeadbandPolicy)>,
    bound: Option<Vec<Deadband>>,
}

impl DeadbandCheckers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed(mut self, policy: DeadbandPolicy) -> Self {
        self.fixed.push(Deadband::fixed(policy));
        self
    }

    /// Use `policy` for `field`. The first binding for a name wins.
    pub fn with_policy(mut self, field: impl Into<String>, policy: DeadbandPolicy) -> Self {
        let field = field.into();
        if !self.named.iter().any(|(name, _)| *name == field) {
            self.named.push((field, policy));
        }
        self.bound = None;
        self
    }

    fn resolve(&mut self, schema: &FieldSchema) -> &mut Vec<Deadband> {
        let named = &self.named;
        self.bound.get_or_insert_with(|| {
            schema
                .fields()
                .iter()
                .map(|field| {
                    let policy = named
                        .iter()
                        .find(|(name, _)| name == field.name())
                        .map_or(DeadbandPolicy::AnyChange, |(_, policy)| *policy);
                    Deadband::bound(policy, field.name())
                })
                .collect()
        })
    }

    /// Binding for `field`, once resolved
    pub fn binding(&self, field: &str) -> Option<&Deadband> {
        self.bound
            .as_ref()?
            .iter()
            .find(|deadband| deadband.field() == Some(field))
    }

    /// True when any policy sees a significant difference.
    ///
    /// Stops at the first one, so later `DoOnce` policies are not consumed.
    pub fn alive(&mut self, schema: &FieldSchema) -> bool {
        if self
            .fixed
            .iter_mut()
            .any(|deadband| deadband.is_significantly_different(None))
        {
            return true;
        }
        self.resolve(schema).iter_mut().any(|deadband| {
            let current = deadband.field().and_then(|name| schema.value(name));
            deadband.is_significantly_different(current)
        })
    }

    /// Advance every baseline to the schema's current values
    pub fn commit(&mut self, schema: &FieldSchema) {
        for deadband in &mut self.fixed {
            deadband.commit(None);
        }
        for deadband in self.resolve(schema).iter_mut() {
            let current = deadband.field().and_then(|name| schema.value(name));
            deadband.commit(current);
        }
    }
}

#[cfg(test)]
#[path = "deadband_tests.rs"]
mod tests;
