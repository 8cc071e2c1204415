// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `options` descriptor on a [`crate::FieldSpec`]: either a static list
//! of choices, or a remote lookup resolved by the Dynamic Form Resolver (C8)
//! against an `OptionsTransport`.

use crate::values::json_path_get;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::HashMap;

/// A remote options source (`original_source/api/lib/service.py: Options`).
///
/// `creds` names a set of stored defaults (`cnc_forge::OptionsCredsStore`)
/// this descriptor is merged over — `url`, `method`, `headers` and the rest
/// can all live in the named credential set instead of being repeated on
/// every field that shares them; whatever this descriptor sets itself wins
/// (`Options.__init__`'s `creds.update(data)`, descriptor over defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteOptionsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creds: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Json::is_null")]
    pub params: Json,
    #[serde(default, skip_serializing_if = "Json::is_null")]
    pub body: Json,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
    /// `__`-separated path (`json_path_get`) into the response to the list
    /// of items to turn into options; empty means the response body is that
    /// list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    /// `__`-separated path read from each item to produce the option's
    /// stored value; absent means the whole item is the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
    /// `__`-separated path read from each item to produce the option's
    /// display title; absent means the whole item's plain-string form is
    /// the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl RemoteOptionsSpec {
    pub fn http_method(&self) -> &str {
        self.method.as_deref().unwrap_or("GET")
    }

    /// Name of the stored credential set this descriptor merges over
    /// (`data.get("creds", "default")`).
    pub fn creds_name(&self) -> &str {
        self.creds.as_deref().unwrap_or("default")
    }

    pub fn verify_tls(&self) -> bool {
        self.verify.unwrap_or(true)
    }

    /// Full request URL: `path` appended to `url` when set
    /// (`Options.retrieve`: `f"{self.url}/{self.path}" if self.path else self.url`).
    pub fn request_url(&self) -> String {
        let url = self.url.as_deref().unwrap_or_default();
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => format!("{}/{path}", url.trim_end_matches('/')),
            _ => url.to_string(),
        }
    }

    /// Overlay `self`'s own set fields onto `defaults` (a named credential
    /// set's stored JSON), then parse the merge back into a fully-resolved
    /// descriptor — mirrors `creds = stored.copy(); creds.update(data)`.
    pub fn merged_over(&self, defaults: &Json) -> RemoteOptionsSpec {
        let mut merged = defaults.as_object().cloned().unwrap_or_else(Map::new);
        if let Ok(Json::Object(own)) = serde_json::to_value(self) {
            for (k, v) in own {
                merged.insert(k, v);
            }
        }
        serde_json::from_value(Json::Object(merged)).unwrap_or_else(|_| self.clone())
    }

    /// Extract the options list out of a response body: `results` selects
    /// the list, then `option`/`title` pick each item's value/label
    /// (`Options.retrieve`).
    pub fn extract_options(&self, response: &Json) -> Vec<(Json, String)> {
        let items = match &self.results {
            Some(path) if !path.is_empty() => json_path_get(response, path),
            _ => Some(response.clone()),
        };
        let items = items.and_then(|v| v.as_array().cloned()).unwrap_or_default();

        items
            .iter()
            .map(|item| {
                let value = match &self.option {
                    Some(path) if !path.is_empty() => json_path_get(item, path).unwrap_or(item.clone()),
                    _ => item.clone(),
                };
                let label = match &self.title {
                    Some(path) if !path.is_empty() => json_path_get(item, path)
                        .map(|v| crate::values::json_to_plain_string(&v))
                        .unwrap_or_else(|| crate::values::json_to_plain_string(item)),
                    _ => crate::values::json_to_plain_string(item),
                };
                (value, label)
            })
            .collect()
    }
}

/// `field.options`: a fixed list of choices, or a remote lookup descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOptions {
    Remote(RemoteOptionsSpec),
    Static(Vec<Json>),
}
