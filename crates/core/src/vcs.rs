// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VCS Target descriptor and credentials (spec.md §3, §4.5) — the rendered
//! `github:` block of a Code/Change block, and the reconciliation state the
//! VCS Driver (C5) walks it through.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

/// Accepts a single string, a single map, or a list of either (spec.md §4.5
/// normalization: "`hook` and `comment` inputs accept a string, a list of
/// strings, or a list of maps"), always producing a `Vec<Json>` — one
/// element per hook/comment, normalized no further here (`hook_url`/
/// `comment_body` in `cnc-engine` read the `url`/`body` key out of each
/// element, or use a bare string element as-is).
fn one_or_many_json<'de, D>(deserializer: D) -> Result<Vec<Json>, D::Error>
where
    D: Deserializer<'de>,
{
    match Json::deserialize(deserializer)? {
        Json::Null => Ok(Vec::new()),
        Json::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

/// `github.pull_request` — opened (or updated) once a change's commits land
/// on a non-default branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestSpec {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Rendered `github:` descriptor attached to a Code or Change block.
///
/// `repo` is always `"owner/name"`; `branch` defaults to `<prefix>-<job.id>`
/// (or bare `<job.id>` when no `prefix` is given) when absent — spec.md
/// §4.5 `code()` step 2 — so a pull request is opened against that derived
/// branch unless a recipe explicitly sets `branch` equal to the base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsTarget {
    pub repo: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    /// Prefixes the derived branch name (and the `commit()` message) when
    /// `branch` is absent; has no effect when `branch` is given explicitly.
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub pull_request: Option<PullRequestSpec>,
    /// Comment bodies (or `{body: ...}` maps) to post once a pull request is
    /// linked (spec.md §4.5 `comment()`), normalized from a scalar, a single
    /// map, or a list of either.
    #[serde(default, deserialize_with = "one_or_many_json")]
    pub comment: Vec<Json>,
    #[serde(default, deserialize_with = "one_or_many_json")]
    pub hooks: Vec<Json>,
}

impl VcsTarget {
    /// The working branch to create, check out, commit to, and open a pull
    /// request against: the explicit `branch:`, or else `<prefix>-<job_id>`
    /// (bare `<job_id>` without a `prefix`) — spec.md §4.5 `code()` step 2,
    /// mirroring the original `github.py`'s `github.get("branch", cnc["id"])`.
    pub fn working_branch(&self, job_id: &str) -> String {
        self.branch.clone().unwrap_or_else(|| match &self.prefix {
            Some(prefix) => format!("{prefix}-{job_id}"),
            None => job_id.to_string(),
        })
    }

    pub fn wants_pull_request(&self) -> bool {
        self.branch.is_some() && self.pull_request.is_some()
    }
}

/// Credentials threaded to the VCS Driver's transport, kept distinct from
/// [`crate::options::RemoteOptionsSpec`]'s credential merge so a job never
/// leaks its VCS token into an options lookup or vice versa.
///
/// `user` is recorded whenever a `repo` string lacked an owner segment
/// (spec.md §4.5 normalization: "without `/` it is `<user>/<repo>`"); `host`
/// addresses both the REST API host (via `api_url`) and the SSH remote host
/// `git clone git@<host>:<path>.git` targets (spec.md §4.5 `change()`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsCreds {
    pub token: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl VcsCreds {
    pub fn base_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or("https://api.github.com")
    }

    pub fn ssh_host(&self) -> &str {
        self.host.as_deref().unwrap_or("github.com")
    }
}

/// Reconciliation state a [`VcsTarget`] passes through while the driver
/// prepares a sandbox, commits content, and links back a pull request
/// (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VcsState {
    Uninitialized,
    Resolved,
    Prepared,
    Committed,
    Linked,
}
