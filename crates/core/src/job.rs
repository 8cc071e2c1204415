// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Job`]: a forge recipe bound to input values, tracked through the
//! Worker Loop (C7) by the Job Orchestrator (C6).

use crate::id::JobId;
use crate::recipe::CodeBlock;
use crate::values::{code_from_craft, json_to_plain_string, Values};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// What the orchestrator should do with this job's code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Commit,
    Test,
    Remove,
}

/// A job's lifecycle state. `Completed`/`Error` are terminal except for the
/// explicit `Retry` transition a caller may force via [`Job::retry`]
/// (invariant 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Created,
    Retry,
    Completed,
    Error,
}

/// A forge recipe bound to concrete input values and run to completion (or
/// failure) by the worker loop.
///
/// `output` is the immutable copy of the forge's `output.code` taken at
/// creation time; `code` is the transient working mirror the orchestrator
/// iterates and clears along with `content`/`change`/`error`/`traceback` on
/// every `Retry` (spec.md §4.6, `original_source/api/lib/service.py: CnC.patch`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub forge: String,
    pub action: Action,
    pub values: Values,
    pub output: Vec<CodeBlock>,
    #[serde(default)]
    pub code: Option<Vec<CodeBlock>>,
    pub status: JobStatus,
    /// Last content attempted — transient, kept only for recovery/debugging.
    #[serde(default)]
    pub content: Option<Json>,
    /// Last rendered VCS descriptor passed to `change()` — transient, also
    /// used by the VCS Driver's no-op cache check (spec.md §4.5).
    #[serde(default)]
    pub change: Option<Json>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub traceback: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

impl Job {
    /// `"<craft>-<forge>-<unix-seconds>"`, truncating a list-valued craft
    /// field joined with `-` to 46 characters before the suffix is appended
    /// (`original_source/api/lib/service.py: CnC.post`).
    pub fn make_id(craft_values: &[String], forge_id: &str, created_unix_secs: i64) -> JobId {
        let mut slug = craft_values.join("-");
        slug.truncate(46);
        JobId::new(format!("{slug}-{forge_id}-{created_unix_secs}"))
    }

    pub fn new(
        id: JobId,
        forge: String,
        action: Action,
        craft: &str,
        mut values: Values,
        output: Vec<CodeBlock>,
    ) -> Self {
        values.insert("code".to_string(), Json::String(code_from_craft(craft)));
        values.insert("cnc".to_string(), Json::String(id.as_str().to_string()));
        Self {
            id,
            forge,
            action,
            values,
            output,
            code: None,
            status: JobStatus::Created,
            content: None,
            change: None,
            error: None,
            traceback: None,
            links: Vec::new(),
        }
    }

    /// Force the job back to `Retry`, clearing every transient field the
    /// next `process()` pass must recompute from scratch.
    pub fn retry(&mut self) {
        self.status = JobStatus::Retry;
        self.code = None;
        self.content = None;
        self.change = None;
        self.error = None;
        self.traceback = None;
    }

    pub fn is_runnable(&self) -> bool {
        matches!(self.status, JobStatus::Created | JobStatus::Retry)
    }

    pub fn fail(&mut self, error: String, traceback: Option<String>) {
        self.status = JobStatus::Error;
        self.error = Some(error);
        self.traceback = traceback;
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.error = None;
        self.traceback = None;
    }

    /// Append `url` to `links` if it isn't already present (pull request /
    /// comment URLs accumulate across retries without duplicating).
    pub fn add_link(&mut self, url: String) {
        if !self.links.iter().any(|existing| existing == &url) {
            self.links.push(url);
        }
    }

    /// Render a value out of this job's `values` map the way job-id and
    /// slug derivation need: strings pass through untouched.
    pub fn value_as_string(&self, key: &str) -> Option<String> {
        self.values.get(key).map(json_to_plain_string)
    }
}
