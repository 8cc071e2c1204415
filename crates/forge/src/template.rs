// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template Engine (C1): Jinja-style `{{ }}` rendering over a job's value
//! map, plus the `transpose`/`iterate`/`each`/`condition` combinators the
//! orchestrator uses to expand a Code/Change block into concrete candidates.

use crate::error::TemplateError;
use cnc_core::values::{json_to_plain_string, merged};
use cnc_core::{BlockMeta, Values};
use minijinja::Environment;
use parking_lot::RwLock;
use serde_json::Value as Json;
use std::hash::{Hash, Hasher};

/// `port(name)`: deterministic pseudo-port derived from a service name, used
/// by recipes to assign each generated service a stable local port.
///
/// Uppercases `name`, splits on the first `-`; a name with no dash is split
/// into its first two characters instead. The result is the decimal
/// concatenation of the ordinal value of each half's first character.
pub fn port(name: &str) -> i64 {
    let upper = name.to_uppercase();
    let (first, second) = match upper.split_once('-') {
        Some((a, b)) => (a.to_string(), b.to_string()),
        None => {
            let mut chars = upper.chars();
            let a = chars.next().map(|c| c.to_string()).unwrap_or_default();
            let b = chars.next().map(|c| c.to_string()).unwrap_or_default();
            (a, b)
        }
    };
    let ord = |s: &str| s.chars().next().map(|c| c as u32).unwrap_or(0);
    let digits = format!("{}{}", ord(&first), ord(&second));
    digits.parse().unwrap_or(0)
}

fn port_function(name: String) -> i64 {
    port(&name)
}

fn content_hash(s: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// A minijinja environment with compiled templates cached by content hash,
/// so recipes that reuse the same snippet across many iterated candidates
/// only pay the parse cost once.
pub struct Engine {
    env: RwLock<Environment<'static>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_function("port", port_function);
        Self {
            env: RwLock::new(env),
        }
    }

    fn cached_name(template: &str) -> String {
        format!("t{:x}", content_hash(template))
    }

    fn ensure_registered(&self, name: &str, template: &str) {
        if self.env.read().get_template(name).is_ok() {
            return;
        }
        let mut env = self.env.write();
        if env.get_template(name).is_err() {
            // minijinja caches parse errors too; registration failure surfaces at render time.
            let _ = env.add_template_owned(name.to_string(), template.to_string());
        }
    }

    /// Render `template` against `values`.
    pub fn render_str(&self, template: &str, values: &Values) -> Result<String, TemplateError> {
        let name = Self::cached_name(template);
        self.ensure_registered(&name, template);
        let env = self.env.read();
        let tmpl = env.get_template(&name)?;
        Ok(tmpl.render(minijinja::Value::from_serialize(values))?)
    }

    /// Render every string leaf of a JSON tree (used for `github:` blocks,
    /// remote-options descriptors, and other nested recipe fragments).
    pub fn render_json(&self, value: &Json, values: &Values) -> Result<Json, TemplateError> {
        match value {
            Json::String(s) => Ok(Json::String(self.render_str(s, values)?)),
            Json::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.render_json(item, values)?);
                }
                Ok(Json::Array(out))
            }
            Json::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.render_json(v, values)?);
                }
                Ok(Json::Object(out))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Python-ish truthiness for a rendered condition string: empty, `"False"`,
/// `"false"`, `"0"`, and `"None"` are falsy, everything else is truthy.
fn truthy(rendered: &str) -> bool {
    !matches!(rendered.trim(), "" | "False" | "false" | "0" | "None")
}

/// `condition(block, V)`: absent conditions default to true; a literal
/// boolean is used as-is; anything else is rendered as a template and
/// interpreted with [`truthy`].
pub fn condition(
    engine: &Engine,
    condition: Option<&Json>,
    values: &Values,
) -> Result<bool, TemplateError> {
    match condition {
        None => Ok(true),
        Some(Json::Bool(b)) => Ok(*b),
        Some(Json::String(expr)) => Ok(truthy(&engine.render_str(expr, values)?)),
        Some(other) => Ok(truthy(&json_to_plain_string(other))),
    }
}

/// `transpose(block, V)`: rename `original -> derivative` for every pair in
/// `block.transpose` whose `original` is present in `V`.
pub fn transpose(meta: &BlockMeta, values: &Values) -> Values {
    let mut out = Values::new();
    for (derivative, original) in &meta.transpose {
        if let Some(v) = values.get(original) {
            out.insert(derivative.clone(), v.clone());
        }
    }
    out
}

/// A list source iterates its elements; a string source iterates its
/// characters (Python-style `for d in "nuts"`, spec.md §8 scenario S5).
fn iterable_items(value: Option<&Json>) -> Vec<Json> {
    match value {
        Some(Json::Array(items)) => items.clone(),
        Some(Json::String(s)) => s.chars().map(|c| Json::String(c.to_string())).collect(),
        _ => Vec::new(),
    }
}

/// `iterate(block, V)`: starting from [`transpose`]'s single candidate,
/// expand the Cartesian product of every sequence-valued key in
/// `block.iterate`, processed in sorted derivative-name order.
pub fn iterate(meta: &BlockMeta, values: &Values) -> Vec<Values> {
    let mut candidates = vec![transpose(meta, values)];
    for (derivative, source_key) in &meta.iterate {
        let items = iterable_items(values.get(source_key));
        let mut next = Vec::with_capacity(candidates.len() * items.len());
        for candidate in &candidates {
            for item in &items {
                let mut expanded = candidate.clone();
                expanded.insert(derivative.clone(), item.clone());
                next.push(expanded);
            }
        }
        candidates = next;
    }
    candidates
}

/// `each(block, V)`: every iterated candidate merged over `V`, filtered by
/// [`condition`] evaluated against that merged scope.
pub fn each(
    engine: &Engine,
    meta: &BlockMeta,
    values: &Values,
) -> Result<Vec<Values>, TemplateError> {
    let mut out = Vec::new();
    for candidate in iterate(meta, values) {
        let scope = merged(values, &candidate);
        if condition(engine, meta.condition.as_ref(), &scope)? {
            out.push(scope);
        }
    }
    Ok(out)
}
