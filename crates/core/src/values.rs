// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The value map `V` threaded through rendering, iteration, and job state.

use serde_json::Value as Json;
use std::collections::HashMap;

/// `string -> scalar/list/map` value map, per spec §3/§4.1.
pub type Values = HashMap<String, Json>;

/// Merge `extra` into a copy of `base`, with `extra` winning on key collision.
///
/// This is the `V ∪ candidate` operation spec.md's `each`/`iterate`
/// pseudocode relies on throughout.
pub fn merged(base: &Values, extra: &Values) -> Values {
    let mut out = base.clone();
    for (k, v) in extra {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// `values.code == values.<craft-field> with '-' replaced by '_'` (invariant 3).
pub fn code_from_craft(craft: &str) -> String {
    craft.replace('-', "_")
}

/// Render a JSON scalar the way Python's str() would for template
/// interpolation into job ids / slugs (strings pass through, everything
/// else uses its Display-ish JSON form without quotes for strings).
pub fn json_to_plain_string(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

/// `__`-separated path lookup into nested objects/arrays (spec.md §6:
/// "selects sub-document `results` by `__`-separated path" — the same
/// separator convention `cnc_engine`'s JSON/YAML content-mutator locations
/// use, so a recipe author only has to learn one path syntax). Used to pull
/// a results list, an option value, or a title out of an arbitrarily-shaped
/// remote-options response. An empty path returns `value` unchanged; a
/// numeric segment indexes into an array.
pub fn json_path_get(value: &Json, path: &str) -> Option<Json> {
    if path.is_empty() {
        return Some(value.clone());
    }
    let mut current = value;
    for segment in path.split("__").filter(|s| !s.is_empty()) {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current.clone())
}
