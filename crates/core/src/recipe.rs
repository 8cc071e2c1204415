// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forge recipe tree: [`Forge`], [`FieldSpec`], and the Code/Change/Content
//! block hierarchy that the orchestrator (C6) walks via the Template Engine
//! (C1)'s `iterate`/`transpose`/`condition`/`each`.

use crate::options::FieldOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Field names reserved by the engine; a forge declaring one of these as an
/// input field name is rejected before any job is created (invariant 4).
pub const RESERVED_FIELD_NAMES: [&str; 3] = ["forge", "code", "cnc"];

/// A scalar string or a list of strings — the shape of `requires`,
/// `include`/`exclude`/`preserve`/`transform`, each normalized to a `Vec`
/// once rendered (spec.md §4.4 step 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl Default for StringOrList {
    fn default() -> Self {
        StringOrList::Many(Vec::new())
    }
}

impl StringOrList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(s) => vec![s],
            StringOrList::Many(v) => v,
        }
    }

    pub fn as_vec(&self) -> Vec<String> {
        match self {
            StringOrList::One(s) => vec![s.clone()],
            StringOrList::Many(v) => v.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            StringOrList::One(_) => false,
            StringOrList::Many(v) => v.is_empty(),
        }
    }
}

/// The `condition`/`iterate`/`transpose` fields shared by Code, Change, and
/// Content blocks (spec.md §3, §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockMeta {
    /// Template string (or literal `true`) evaluated by `condition()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Json>,
    /// `derivative -> name-of-a-sequence-valued-key-in-V`, expanded into the
    /// Cartesian product by `iterate()`. A `BTreeMap` gives the sorted-key
    /// iteration order the spec's property 2 requires for free.
    #[serde(default)]
    pub iterate: BTreeMap<String, String>,
    /// `derivative -> original`, renamed into scope by `transpose()`.
    #[serde(default)]
    pub transpose: BTreeMap<String, String>,
}

/// `source` is either a template string path under the sandbox, or an
/// inline literal value (spec.md §4.3 policy 2, §9 "distinct sum-type
/// variant" design note).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentSource {
    Inline { value: Json },
    Path(String),
}

impl ContentSource {
    pub fn is_inline(&self) -> bool {
        matches!(self, ContentSource::Inline { .. })
    }
}

fn default_true() -> bool {
    true
}

/// One file (or directory tree, or inline value) to craft (spec.md §3, §4.3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    pub source: ContentSource,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub include: StringOrList,
    #[serde(default)]
    pub exclude: StringOrList,
    #[serde(default)]
    pub preserve: StringOrList,
    #[serde(default)]
    pub transform: StringOrList,
    /// Insertion marker/location selector. Usually a template string naming
    /// a `cnc-forge: <L>` marker (text mode) or a `__`-separated location
    /// path (json/yaml mode); a literal `true` means "append"/"anywhere"
    /// rather than searching for a specific marker (spec.md §4.1, §4.3
    /// policy 6 "L is boolean-true").
    #[serde(default)]
    pub text: Option<Json>,
    #[serde(default)]
    pub json: Option<Json>,
    #[serde(default)]
    pub yaml: Option<Json>,
    #[serde(default = "default_true")]
    pub replace: bool,
    /// Inherited down from the enclosing code block when `job.action == Remove`.
    #[serde(default)]
    pub remove: bool,
    #[serde(flatten)]
    pub meta: BlockMeta,
}

impl ContentBlock {
    /// Whether any of `text`/`json`/`yaml` is present (policy 3/6 dispatch).
    pub fn has_insertion_marker(&self) -> bool {
        self.text.is_some() || self.json.is_some() || self.yaml.is_some()
    }
}

/// A working-copy mutation scoped to zero or more [`ContentBlock`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeBlock {
    #[serde(default)]
    pub github: Option<Json>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(flatten)]
    pub meta: BlockMeta,
}

/// A repository-scoped unit of work containing ordered [`ChangeBlock`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub github: Option<Json>,
    #[serde(default)]
    pub change: Vec<ChangeBlock>,
    #[serde(flatten)]
    pub meta: BlockMeta,
}

/// One input field of a forge's dynamic form (spec.md §3, resolved by C8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<Json>,
    #[serde(default)]
    pub requires: StringOrList,
    #[serde(default)]
    pub condition: Option<Json>,
    #[serde(default)]
    pub options: Option<FieldOptions>,
    #[serde(default)]
    pub validation: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub trigger: bool,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_craft_field() -> String {
    "craft".to_string()
}

/// `forge.input` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeInput {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default = "default_craft_field")]
    pub craft: String,
}

/// `forge.output` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeOutput {
    #[serde(default)]
    pub code: Vec<CodeBlock>,
}

/// An immutable recipe (spec.md §3). `id` is the file stem, assigned by the
/// loader rather than carried in the YAML body (mirrors
/// `original_source/api/lib/service.py: Forge.forge`'s `forge["id"] = id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forge {
    #[serde(skip)]
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub input: ForgeInput,
    #[serde(default)]
    pub output: ForgeOutput,
}

impl Forge {
    /// Name of the field that supplies the job-identifying slug
    /// (`input.craft`, defaulting to `"craft"`).
    pub fn craft_field_name(&self) -> &str {
        &self.input.craft
    }
}
