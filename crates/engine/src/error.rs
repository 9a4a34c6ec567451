// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for engine control operations

use jw_core::DefinitionError;
use jw_directive::ParseError;
use jw_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the engine's control surface
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown watcher: {0}")]
    UnknownWatcher(String),
    #[error("watcher {0} is not static")]
    NotStatic(String),
    #[error("output read failed: {0}")]
    Read(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
