// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submit-time validation for the Dynamic Form Resolver (C8): the other
//! half of spec.md §4.8's "for each forge input field" algorithm — not
//! building a preview list of widgets, but checking a fully-submitted value
//! map against every field's `required`/`validation` constraint before a job
//! is allowed to be created from it (spec.md §6: POST's 400 response
//! carries a `fields` array of exactly these).

use crate::error::{FieldValidationError, ValidationError};
use crate::form::{implicit_leading_fields, is_ready};
use crate::template::{condition, Engine};
use cnc_core::values::json_to_plain_string;
use cnc_core::{FieldSpec, Forge, Values};
use regex::Regex;

fn field_is_blank(value: Option<&serde_json::Value>) -> bool {
    match value {
        None => true,
        Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn validate_one(field: &FieldSpec, values: &Values, errors: &mut Vec<FieldValidationError>) {
    let value = values.get(&field.name);

    if field.required && field_is_blank(value) {
        errors.push(FieldValidationError {
            field: field.name.clone(),
            message: "required".to_string(),
        });
        return;
    }

    let (Some(pattern), Some(value)) = (&field.validation, value) else {
        return;
    };
    if field_is_blank(Some(value)) {
        return;
    }
    match Regex::new(pattern) {
        Ok(re) if re.is_match(&json_to_plain_string(value)) => {}
        Ok(_) => errors.push(FieldValidationError {
            field: field.name.clone(),
            message: format!("does not match {pattern:?}"),
        }),
        Err(e) => errors.push(FieldValidationError {
            field: field.name.clone(),
            message: format!("invalid validation pattern {pattern:?}: {e}"),
        }),
    }
}

/// Recurse `fields` the same way `resolve_fields` walks them for preview —
/// a field that isn't ready (unmet `requires`) or whose `condition` is
/// false isn't part of this submission's active form, so it is skipped
/// rather than reported missing.
fn collect_errors(
    engine: &Engine,
    fields: &[FieldSpec],
    values: &Values,
    errors: &mut Vec<FieldValidationError>,
) -> Result<(), ValidationError> {
    for field in fields {
        if !is_ready(field, values) {
            continue;
        }
        if !condition(engine, field.condition.as_ref(), values)? {
            continue;
        }
        validate_one(field, values, errors);
        collect_errors(engine, &field.fields, values, errors)?;
    }
    Ok(())
}

/// Validate a submitted value map against `fields`, collecting every
/// failing field rather than stopping at the first (spec.md §6's `fields`
/// error array).
pub fn validate_fields(engine: &Engine, fields: &[FieldSpec], values: &Values) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    collect_errors(engine, fields, values, &mut errors)?;
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Fields(errors))
    }
}

/// Validate a full job submission: the implicit `forge`/`craft` fields
/// plus the forge's own declared fields, exactly the set
/// [`crate::form::resolve_form`] resolves for preview.
pub fn validate_form(engine: &Engine, forge: &Forge, values: &Values) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    collect_errors(engine, &implicit_leading_fields(forge), values, &mut errors)?;
    collect_errors(engine, &forge.input.fields, values, &mut errors)?;
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Fields(errors))
    }
}
