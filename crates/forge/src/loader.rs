// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads a forge recipe from YAML and enforces the reserved-field-name
//! invariant before any job can be created from it.

use crate::error::RecipeError;
use cnc_core::{FieldSpec, Forge, RESERVED_FIELD_NAMES};
use std::path::Path;

/// Parse `yaml` into a [`Forge`], stamping `id` onto it and rejecting any
/// input field (at any nesting depth) named `forge`, `code`, or `cnc`.
pub fn load_forge_str(id: &str, yaml: &str) -> Result<Forge, RecipeError> {
    let mut forge: Forge = serde_yaml::from_str(yaml)?;
    forge.id = id.to_string();
    validate_fields(&forge.input.fields)?;
    Ok(forge)
}

/// Load a forge recipe from disk, deriving its id from the file stem
/// (`service.yaml` -> id `"service"`).
pub fn load_forge_file(path: &Path) -> Result<Forge, RecipeError> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RecipeError::InvalidFilename(path.display().to_string()))?
        .to_string();
    let contents =
        std::fs::read_to_string(path).map_err(|e| RecipeError::Io(path.display().to_string(), e))?;
    load_forge_str(&id, &contents)
}

fn validate_fields(fields: &[FieldSpec]) -> Result<(), RecipeError> {
    for field in fields {
        if RESERVED_FIELD_NAMES.contains(&field.name.as_str()) {
            return Err(RecipeError::ReservedFieldName(field.name.clone()));
        }
        validate_fields(&field.fields)?;
    }
    Ok(())
}
