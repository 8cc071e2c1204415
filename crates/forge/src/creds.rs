// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stand-ins for the credential file layout spec.md §1 puts out of scope
//! (`/opt/service/secret/*.json` in `original_source/api/lib/service.py:
//! Options.config`) — a name resolves to a credential set, not a single
//! fixed value, so a recipe's `github:`/`options:` block can pick which
//! set it wants without the engine ever reading a filesystem layout
//! itself. Each trait gets one in-memory implementation, the same
//! trait-plus-test-double shape `cnc_storage::JobStore` uses for the other
//! out-of-scope external collaborator.

use cnc_core::VcsCreds;
use serde_json::Value as Json;
use std::collections::HashMap;

/// Resolves a named VCS credential set (spec.md §3 `VcsCreds`, keyed by
/// name the way `Options.config` keys its loaded files by the
/// `options_<name>.json` stem).
pub trait VcsCredsStore: Send + Sync {
    fn get(&self, name: &str) -> Option<VcsCreds>;
}

/// `HashMap`-backed [`VcsCredsStore`] for tests and the standalone demo.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVcsCredsStore {
    creds: HashMap<String, VcsCreds>,
}

impl InMemoryVcsCredsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creds(mut self, name: impl Into<String>, creds: VcsCreds) -> Self {
        self.creds.insert(name.into(), creds);
        self
    }
}

impl VcsCredsStore for InMemoryVcsCredsStore {
    fn get(&self, name: &str) -> Option<VcsCreds> {
        self.creds.get(name).cloned()
    }
}

/// Resolves a named remote-options credential set
/// (`original_source/api/lib/service.py: Options.config`'s `cls.creds`
/// class dict, loaded from `options_<name>.json` files). Stored as raw
/// JSON since a credential set need not look like a full
/// [`cnc_core::RemoteOptionsSpec`] — it typically carries only the auth
/// fields (`token`, `headers`, ...) a descriptor merges over.
pub trait OptionsCredsStore: Send + Sync {
    fn get(&self, name: &str) -> Option<Json>;
}

/// `HashMap`-backed [`OptionsCredsStore`] for tests and the standalone demo.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOptionsCredsStore {
    creds: HashMap<String, Json>,
}

impl InMemoryOptionsCredsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creds(mut self, name: impl Into<String>, creds: Json) -> Self {
        self.creds.insert(name.into(), creds);
        self
    }
}

impl OptionsCredsStore for InMemoryOptionsCredsStore {
    fn get(&self, name: &str) -> Option<Json> {
        self.creds.get(name).cloned()
    }
}
