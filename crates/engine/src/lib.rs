// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Content mutator, content walker, VCS driver, and job orchestrator for
//! the CnC-Forge execution engine.

pub mod error;
pub mod mutator;
pub mod orchestrator;
pub mod vcs;
pub mod walker;

pub use error::{MutatorError, OrchestratorError, VcsError, WalkerError};
pub use mutator::{mutate, MutateRequest, MutationOutcome};
pub use orchestrator::Orchestrator;
pub use vcs::{
    ensure_branch, ensure_comments, ensure_hooks, ensure_repo, link_pull_request, state_for,
    PullRequestInfo, ReqwestVcsTransport, RepoInfo, Sandbox, VcsTransport,
};
pub use walker::{craft, walk, WalkedFile};
