// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Template engine, path arbiter, recipe loading, and dynamic form resolver
//! for the CnC-Forge execution engine.

pub mod creds;
pub mod error;
pub mod form;
pub mod loader;
pub mod path;
pub mod template;
pub mod validate;

pub use creds::{InMemoryOptionsCredsStore, InMemoryVcsCredsStore, OptionsCredsStore, VcsCredsStore};
pub use error::{FieldValidationError, FormError, PathError, RecipeError, TemplateError, ValidationError};
pub use form::{
    resolve_fields, resolve_form, FakeOptionsTransport, OptionsTransport, ReqwestOptionsTransport,
    ResolvedField, ResolvedOption, CRAFT_VALIDATION,
};
pub use loader::{load_forge_file, load_forge_str};
pub use template::{condition, each, iterate, port, transpose, Engine};
pub use validate::{validate_fields, validate_form};
