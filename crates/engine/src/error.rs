// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use prattle_core::RegistryError;
use prattle_storage::StoreError;
use thiserror::Error;

/// Errors that can escape an observation cycle
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("{failed} of {total} devices failed, first: {first}")]
    Poll {
        failed: usize,
        total: usize,
        first: String,
    },
}
