// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamic Form Resolver (C8): walks a forge's input field tree, evaluating
//! per-field conditions and resolving static or remote option lists, so a
//! caller can render the next page of a wizard-style form without knowing
//! the recipe's internal structure.

use crate::creds::OptionsCredsStore;
use crate::error::FormError;
use crate::template::{condition, Engine};
use cnc_core::values::json_to_plain_string;
use cnc_core::{FieldOptions, FieldSpec, Forge, RemoteOptionsSpec, Values};
use serde_json::Value as Json;

/// Regex the implicit `craft` field validates against: a lowercase,
/// hyphenated slug no longer than 47 characters (spec.md §3's `CRAFT`
/// field — `^[a-z][a-z0-9-]{1,46}$` — doubles as the source of
/// [`cnc_core::Job::make_id`]'s truncation length).
pub const CRAFT_VALIDATION: &str = r"^[a-z][a-z0-9-]{1,46}$";

fn readonly_field(name: &str, description: String) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        description: Some(description),
        default: None,
        requires: Default::default(),
        condition: None,
        options: None,
        validation: None,
        required: false,
        readonly: true,
        trigger: false,
        fields: vec![],
    }
}

fn craft_field() -> FieldSpec {
    FieldSpec {
        name: "craft".to_string(),
        description: Some(
            "name of what to craft, used for repos, branches, change requests".to_string(),
        ),
        default: None,
        requires: Default::default(),
        condition: None,
        options: None,
        validation: Some(CRAFT_VALIDATION.to_string()),
        required: true,
        readonly: false,
        trigger: true,
        fields: vec![],
    }
}

/// One resolved choice in a field's option list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOption {
    pub value: Json,
    pub label: String,
}

/// A field with its condition already evaluated and its options (if any)
/// already fetched — everything a form renderer needs to draw one widget.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub name: String,
    pub description: Option<String>,
    pub default: Option<Json>,
    pub required: bool,
    pub readonly: bool,
    pub trigger: bool,
    pub options: Option<Vec<ResolvedOption>>,
    pub fields: Vec<ResolvedField>,
}

/// Abstraction over the out-of-scope HTTP transport a fully-resolved
/// `RemoteOptionsSpec` is fetched through, so the resolver can be tested
/// without a network. `spec` has already been merged over its named
/// credential set by the time a transport sees it.
pub trait OptionsTransport: Send + Sync {
    fn fetch(&self, spec: &RemoteOptionsSpec) -> Result<Json, FormError>;
}

/// `reqwest::blocking`-backed [`OptionsTransport`] (spec.md §5: the worker
/// loop is synchronous and single-threaded, so every transport it drives is
/// blocking rather than async).
pub struct ReqwestOptionsTransport {
    client: reqwest::blocking::Client,
}

impl Default for ReqwestOptionsTransport {
    fn default() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl OptionsTransport for ReqwestOptionsTransport {
    fn fetch(&self, spec: &RemoteOptionsSpec) -> Result<Json, FormError> {
        let url = spec.request_url();
        let method = reqwest::Method::from_bytes(spec.http_method().as_bytes())
            .unwrap_or(reqwest::Method::GET);
        let mut request = self.client.request(method, &url);
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }
        if let Some(token) = &spec.token {
            request = request.bearer_auth(token);
        } else if let Some(username) = &spec.username {
            request = request.basic_auth(username, spec.password.as_deref());
        }
        if !spec.params.is_null() {
            request = request.query(&spec.params);
        }
        if !spec.body.is_null() {
            request = request.json(&spec.body);
        }
        let to_err = |e: reqwest::Error| FormError::Transport {
            url: url.clone(),
            message: e.to_string(),
        };
        request.send().map_err(to_err)?.json::<Json>().map_err(to_err)
    }
}

/// In-memory [`OptionsTransport`] keyed by request URL, for tests and for
/// the standalone demo binary.
#[derive(Debug, Clone, Default)]
pub struct FakeOptionsTransport {
    responses: std::collections::HashMap<String, Json>,
}

impl FakeOptionsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: impl Into<String>, response: Json) -> Self {
        self.responses.insert(url.into(), response);
        self
    }
}

impl OptionsTransport for FakeOptionsTransport {
    fn fetch(&self, spec: &RemoteOptionsSpec) -> Result<Json, FormError> {
        Ok(self
            .responses
            .get(&spec.request_url())
            .cloned()
            .unwrap_or_else(|| Json::Array(vec![])))
    }
}

fn resolve_static(items: &[Json]) -> Vec<ResolvedOption> {
    items
        .iter()
        .map(|v| ResolvedOption {
            value: v.clone(),
            label: json_to_plain_string(v),
        })
        .collect()
}

/// Render `spec`'s templated fields, merge it over its named credential
/// set, fetch, then split the response into value/label pairs
/// (`original_source/api/lib/service.py: Options.__init__` + `.retrieve`).
fn resolve_remote(
    engine: &Engine,
    transport: &dyn OptionsTransport,
    creds_store: &dyn OptionsCredsStore,
    spec: &RemoteOptionsSpec,
    values: &Values,
) -> Result<Vec<ResolvedOption>, FormError> {
    let rendered = RemoteOptionsSpec {
        creds: spec.creds.clone(),
        url: spec.url.as_deref().map(|u| engine.render_str(u, values)).transpose()?,
        path: spec.path.clone(),
        method: spec.method.clone(),
        headers: spec.headers.clone(),
        params: engine.render_json(&spec.params, values)?,
        body: engine.render_json(&spec.body, values)?,
        verify: spec.verify,
        results: spec.results.clone(),
        option: spec.option.clone(),
        title: spec.title.clone(),
        username: spec.username.clone(),
        password: spec.password.clone(),
        token: spec.token.clone(),
    };
    let defaults = creds_store
        .get(rendered.creds_name())
        .unwrap_or_else(|| serde_json::json!({"verify": true}));
    let resolved = rendered.merged_over(&defaults);
    let response = transport.fetch(&resolved)?;
    Ok(resolved
        .extract_options(&response)
        .into_iter()
        .map(|(value, label)| ResolvedOption { value, label })
        .collect())
}

/// Whether every field `field` `requires` already has a non-null value
/// submitted, so it isn't offered before its prerequisites are answered.
pub(crate) fn is_ready(field: &FieldSpec, values: &Values) -> bool {
    field
        .requires
        .as_vec()
        .iter()
        .all(|name| values.get(name).is_some_and(|v| !v.is_null()))
}

/// Resolve one page of `fields` against the values submitted so far.
/// A field whose `condition` evaluates false, or whose `requires` aren't
/// all answered yet (and all of its descendants), is omitted entirely,
/// matching the form wizard's "don't ask about fields that don't apply yet"
/// behavior.
pub fn resolve_fields(
    engine: &Engine,
    transport: &dyn OptionsTransport,
    creds_store: &dyn OptionsCredsStore,
    fields: &[FieldSpec],
    values: &Values,
) -> Result<Vec<ResolvedField>, FormError> {
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        if !is_ready(field, values) {
            continue;
        }
        if !condition(engine, field.condition.as_ref(), values)? {
            continue;
        }
        let options = match &field.options {
            None => None,
            Some(FieldOptions::Static(items)) => Some(resolve_static(items)),
            Some(FieldOptions::Remote(spec)) => {
                Some(resolve_remote(engine, transport, creds_store, spec, values)?)
            }
        };
        let children = resolve_fields(engine, transport, creds_store, &field.fields, values)?;
        let default = field
            .default
            .as_ref()
            .map(|template| engine.render_json(template, values))
            .transpose()?;
        out.push(ResolvedField {
            name: field.name.clone(),
            description: field.description.clone(),
            default,
            required: field.required,
            readonly: field.readonly,
            trigger: field.trigger,
            options,
            fields: children,
        });
    }
    Ok(out)
}

/// The implicit `forge` (readonly) and `craft` (validated, required,
/// trigger) fields every forge gets ahead of its own declared fields,
/// skipping the implicit `craft` field when the forge names its own field
/// matching `input.craft` — `original_source/api/lib/service.py:
/// Service.fields`'s `"craft" not in forge.get("input", {})` check.
pub(crate) fn implicit_leading_fields(forge: &Forge) -> Vec<FieldSpec> {
    let mut leading = vec![readonly_field("forge", forge.description.clone())];
    let declares_craft = forge
        .input
        .fields
        .iter()
        .any(|f| f.name == forge.craft_field_name());
    if !declares_craft {
        leading.push(craft_field());
    }
    leading
}

/// Resolve a forge's full input form: the implicit readonly `forge` field,
/// the implicit `craft` field (unless the forge names its own craft field
/// among `input.fields`), then the forge's declared fields — exactly the
/// field list `original_source/api/lib/service.py: Service.fields` builds
/// before handing it to the form wizard.
pub fn resolve_form(
    engine: &Engine,
    transport: &dyn OptionsTransport,
    creds_store: &dyn OptionsCredsStore,
    forge: &Forge,
    values: &Values,
) -> Result<Vec<ResolvedField>, FormError> {
    let leading = implicit_leading_fields(forge);
    let mut out = resolve_fields(engine, transport, creds_store, &leading, values)?;
    out.extend(resolve_fields(engine, transport, creds_store, &forge.input.fields, values)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creds::InMemoryOptionsCredsStore;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn skips_fields_whose_condition_is_false() {
        let engine = Engine::new();
        let transport = FakeOptionsTransport::new();
        let creds = InMemoryOptionsCredsStore::new();
        let values: Values = HashMap::from([("kind".to_string(), json!("service"))]);
        let fields = vec![
            FieldSpec {
                name: "name".to_string(),
                description: None,
                default: None,
                requires: Default::default(),
                condition: None,
                options: None,
                validation: None,
                required: true,
                readonly: false,
                trigger: false,
                fields: vec![],
            },
            FieldSpec {
                name: "library_path".to_string(),
                description: None,
                default: None,
                requires: Default::default(),
                condition: Some(json!("{{ kind == 'library' }}")),
                options: None,
                validation: None,
                required: false,
                readonly: false,
                trigger: false,
                fields: vec![],
            },
        ];
        let resolved = resolve_fields(&engine, &transport, &creds, &fields, &values).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "name");
    }

    /// spec.md §4.8 step 2: a field's `default` "may be a template" and must
    /// be rendered the same way its other attributes are, not passed through
    /// as a literal `{{ craft }}-svc` string.
    #[test]
    fn renders_a_templated_default() {
        let engine = Engine::new();
        let transport = FakeOptionsTransport::new();
        let creds = InMemoryOptionsCredsStore::new();
        let values: Values = HashMap::from([("craft".to_string(), json!("widgets"))]);
        let fields = vec![FieldSpec {
            name: "service_name".to_string(),
            description: None,
            default: Some(json!("{{ craft }}-svc")),
            requires: Default::default(),
            condition: None,
            options: None,
            validation: None,
            required: false,
            readonly: false,
            trigger: false,
            fields: vec![],
        }];
        let resolved = resolve_fields(&engine, &transport, &creds, &fields, &values).unwrap();
        assert_eq!(resolved[0].default, Some(json!("widgets-svc")));
    }

    #[test]
    fn resolves_static_options_as_value_label_pairs() {
        let engine = Engine::new();
        let transport = FakeOptionsTransport::new();
        let creds = InMemoryOptionsCredsStore::new();
        let field = FieldSpec {
            name: "kind".to_string(),
            description: None,
            default: None,
            requires: Default::default(),
            condition: None,
            options: Some(FieldOptions::Static(vec![json!("service"), json!("library")])),
            validation: None,
            required: true,
            readonly: false,
            trigger: false,
            fields: vec![],
        };
        let resolved =
            resolve_fields(&engine, &transport, &creds, &[field], &Values::new()).unwrap();
        let options = resolved[0].options.as_ref().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].label, "service");
    }

    #[test]
    fn resolves_remote_options_merging_descriptor_over_named_credentials() {
        let engine = Engine::new();
        let transport = FakeOptionsTransport::new().with_response(
            "https://example.test/repos",
            json!([{"id": 1, "full_name": "acme/widgets"}]),
        );
        let creds = InMemoryOptionsCredsStore::new()
            .with_creds("default", json!({"token": "from-store"}));
        let field = FieldSpec {
            name: "repo".to_string(),
            description: None,
            default: None,
            requires: Default::default(),
            condition: None,
            options: Some(FieldOptions::Remote(RemoteOptionsSpec {
                url: Some("https://example.test/repos".to_string()),
                option: Some("id".to_string()),
                title: Some("full_name".to_string()),
                ..Default::default()
            })),
            validation: None,
            required: true,
            readonly: false,
            trigger: false,
            fields: vec![],
        };
        let resolved = resolve_fields(&engine, &transport, &creds, &[field], &Values::new()).unwrap();
        let options = resolved[0].options.as_ref().unwrap();
        assert_eq!(options[0].value, json!(1));
        assert_eq!(options[0].label, "acme/widgets");
    }

    #[test]
    fn resolve_form_injects_implicit_forge_and_craft_fields() {
        let engine = Engine::new();
        let transport = FakeOptionsTransport::new();
        let creds = InMemoryOptionsCredsStore::new();
        let forge = cnc_core::Forge {
            id: "demo".to_string(),
            description: "what to craft from".to_string(),
            input: Default::default(),
            output: Default::default(),
        };
        let resolved = resolve_form(&engine, &transport, &creds, &forge, &Values::new()).unwrap();
        let names: Vec<&str> = resolved.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["forge", "craft"]);
        assert!(resolved[0].readonly);
        assert!(resolved[1].required);
        assert!(resolved[1].trigger);
    }

    #[test]
    fn resolve_form_skips_implicit_craft_when_forge_declares_its_own() {
        let engine = Engine::new();
        let transport = FakeOptionsTransport::new();
        let creds = InMemoryOptionsCredsStore::new();
        let custom_craft = FieldSpec {
            name: "craft".to_string(),
            description: None,
            default: None,
            requires: Default::default(),
            condition: None,
            options: None,
            validation: None,
            required: true,
            readonly: false,
            trigger: true,
            fields: vec![],
        };
        let forge = cnc_core::Forge {
            id: "demo".to_string(),
            description: "what to craft from".to_string(),
            input: cnc_core::ForgeInput {
                fields: vec![custom_craft],
                craft: "craft".to_string(),
            },
            output: Default::default(),
        };
        let resolved = resolve_form(&engine, &transport, &creds, &forge, &Values::new()).unwrap();
        let names: Vec<&str> = resolved.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["forge", "craft"]);
    }

    #[test]
    fn a_field_with_unmet_requires_is_not_offered() {
        let engine = Engine::new();
        let transport = FakeOptionsTransport::new();
        let creds = InMemoryOptionsCredsStore::new();
        let field = FieldSpec {
            name: "branch".to_string(),
            description: None,
            default: None,
            requires: cnc_core::StringOrList::One("repo".to_string()),
            condition: None,
            options: None,
            validation: None,
            required: false,
            readonly: false,
            trigger: false,
            fields: vec![],
        };
        let resolved =
            resolve_fields(&engine, &transport, &creds, &[field.clone()], &Values::new()).unwrap();
        assert!(resolved.is_empty());

        let values: Values = HashMap::from([("repo".to_string(), json!("acme/widgets"))]);
        let resolved = resolve_fields(&engine, &transport, &creds, &[field], &values).unwrap();
        assert_eq!(resolved.len(), 1);
    }
}
