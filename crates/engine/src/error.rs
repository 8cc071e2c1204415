// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the content mutator, content walker, VCS driver, and job
//! orchestrator.

use cnc_forge::{PathError, TemplateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MutatorError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("destination {path} does not contain valid JSON to insert into: {message}")]
    InvalidJson { path: String, message: String },
    #[error("destination {path} does not contain valid YAML to insert into: {message}")]
    InvalidYaml { path: String, message: String },
    #[error("text marker {marker:?} not found in {path}")]
    MarkerNotFound { path: String, marker: String },
}

#[derive(Debug, Error)]
pub enum WalkerError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Mutator(#[from] MutatorError),
    #[error("glob pattern {pattern:?} is invalid: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("IO error walking {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("git {args:?} failed with status {status}: {stderr}")]
    GitCommandFailed {
        args: Vec<String>,
        status: i32,
        stderr: String,
    },
    #[error("git {args:?} produced no output and a non-zero status: treated as fatal")]
    GitCommandSilentFailure { args: Vec<String> },
    #[error("failed to spawn git: {0}")]
    GitSpawn(#[from] std::io::Error),
    #[error("VCS API request failed: {0}")]
    Transport(String),
    #[error("VCS API returned {status}: {body}")]
    ApiError { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Mutator(#[from] MutatorError),
    #[error(transparent)]
    Walker(#[from] WalkerError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
}
