// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for template rendering, recipe loading, path resolution, and
//! dynamic form resolution.

use thiserror::Error;

/// Errors raised by the Template Engine (C1).
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),
    #[error("condition did not evaluate to a boolean-ish value: {0:?}")]
    NonBooleanCondition(serde_json::Value),
}

/// Errors raised by the Path Arbiter (C2).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path escapes sandbox root: {0}")]
    Escape(String),
}

/// Errors raised while loading or validating a forge recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("invalid forge yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("field name \"{0}\" is reserved")]
    ReservedFieldName(String),
    #[error("forge file has no usable filename stem: {0}")]
    InvalidFilename(String),
    #[error("failed to read forge file {0}: {1}")]
    Io(String, #[source] std::io::Error),
}

/// Errors raised by the Dynamic Form Resolver (C8).
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("remote options request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// One field's submit-time validation failure (spec.md §6: POST's 400
/// response carries a `fields` array of these).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

/// Raised only at submit time, never while just previewing a form
/// (spec.md §7: "only surfaced at API boundary (422/400 with per-field
/// details)" — the out-of-scope API maps this to that response; the
/// resolver itself just returns it as a typed `Result`).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("{} field(s) failed validation", .0.len())]
    Fields(Vec<FieldValidationError>),
}
