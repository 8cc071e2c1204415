// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Worker Loop (C7): one synchronous pass over every runnable job in the
//! store, processed one at a time on the calling thread.

pub mod config;

pub use config::Config;

use cnc_core::VcsCreds;
use cnc_engine::Orchestrator;
use cnc_storage::{JobStore, StorageError};

/// Prefix every job is stored under, scanned each pass.
pub const JOB_KEY_PREFIX: &str = "jobs/";

pub fn job_key(id: &str) -> String {
    format!("{JOB_KEY_PREFIX}{id}")
}

/// Process every currently-runnable job once. Returns how many jobs were
/// picked up this pass (0 means the caller should sleep).
pub fn run_once(
    store: &dyn JobStore,
    orchestrator: &Orchestrator<'_>,
    creds: &VcsCreds,
    now: i64,
) -> Result<usize, StorageError> {
    let jobs = store.scan_prefix(JOB_KEY_PREFIX, now)?;
    let mut processed = 0;
    for mut job in jobs {
        if !job.is_runnable() {
            continue;
        }
        orchestrator.process(&mut job, creds);
        store.put(&job_key(job.id.as_str()), &job, now)?;
        processed += 1;
    }
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnc_core::{Action, CodeBlock, Job, JobId, JobStatus};
    use cnc_engine::vcs::{PullRequestInfo, RepoInfo};
    use cnc_engine::{ReqwestVcsTransport, VcsTransport};
    use cnc_forge::Engine;
    use cnc_storage::InMemoryJobStore;
    use std::collections::HashMap;

    struct StubTransport;
    impl VcsTransport for StubTransport {
        fn find_repo(&self, _: &VcsCreds, _: &str) -> Result<Option<RepoInfo>, cnc_engine::VcsError> {
            unreachable!("test job has no github target")
        }
        fn create_repo(&self, _: &VcsCreds, _: &str) -> Result<RepoInfo, cnc_engine::VcsError> {
            unreachable!()
        }
        fn seed_initial_commit(&self, _: &VcsCreds, _: &str, _: &str) -> Result<(), cnc_engine::VcsError> {
            unreachable!()
        }
        fn list_branches(&self, _: &VcsCreds, _: &str) -> Result<Vec<String>, cnc_engine::VcsError> {
            unreachable!()
        }
        fn create_branch(&self, _: &VcsCreds, _: &str, _: &str, _: &str) -> Result<(), cnc_engine::VcsError> {
            unreachable!()
        }
        fn list_hook_urls(&self, _: &VcsCreds, _: &str) -> Result<Vec<String>, cnc_engine::VcsError> {
            unreachable!()
        }
        fn create_hook(&self, _: &VcsCreds, _: &str, _: &str) -> Result<(), cnc_engine::VcsError> {
            unreachable!()
        }
        fn open_pull_request(
            &self,
            _: &VcsCreds,
            _: &str,
            _: &cnc_core::PullRequestSpec,
            _: &str,
            _: &str,
        ) -> Result<PullRequestInfo, cnc_engine::VcsError> {
            unreachable!()
        }
        fn update_pull_request(
            &self,
            _: &VcsCreds,
            _: &str,
            _: u64,
            _: &cnc_core::PullRequestSpec,
        ) -> Result<PullRequestInfo, cnc_engine::VcsError> {
            unreachable!()
        }
        fn find_open_pull_request(
            &self,
            _: &VcsCreds,
            _: &str,
            _: &str,
        ) -> Result<Option<PullRequestInfo>, cnc_engine::VcsError> {
            Ok(None)
        }
        fn add_comment(
            &self,
            _: &VcsCreds,
            _: &str,
            _: u64,
            _: &str,
        ) -> Result<String, cnc_engine::VcsError> {
            Ok(String::new())
        }
        fn list_issue_comments(&self, _: &VcsCreds, _: &str, _: u64) -> Result<Vec<String>, cnc_engine::VcsError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn run_once_processes_every_runnable_job_and_persists_the_result() {
        let store = InMemoryJobStore::new();
        let job = Job::new(
            JobId::new("demo-forge1-1"),
            "forge1".to_string(),
            Action::Commit,
            "demo",
            HashMap::new(),
            vec![CodeBlock::default()],
        );
        store.put(&job_key(job.id.as_str()), &job, 1_000).unwrap();

        let engine = Engine::new();
        let transport = StubTransport;
        let sandbox_dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(&engine, &transport, sandbox_dir.path());
        let creds = VcsCreds {
            token: "t".to_string(),
            user: None,
            host: None,
            api_url: None,
        };

        let processed = run_once(&store, &orchestrator, &creds, 1_000).unwrap();
        assert_eq!(processed, 1);

        let stored = store.get(&job_key("demo-forge1-1"), 1_000).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        let _ = ReqwestVcsTransport::default();
    }

    #[test]
    fn run_once_skips_completed_jobs() {
        let store = InMemoryJobStore::new();
        let mut job = Job::new(
            JobId::new("demo-forge1-2"),
            "forge1".to_string(),
            Action::Commit,
            "demo",
            HashMap::new(),
            Vec::new(),
        );
        job.complete();
        store.put(&job_key(job.id.as_str()), &job, 1_000).unwrap();

        let engine = Engine::new();
        let transport = StubTransport;
        let sandbox_dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(&engine, &transport, sandbox_dir.path());
        let creds = VcsCreds {
            token: "t".to_string(),
            user: None,
            host: None,
            api_url: None,
        };

        let processed = run_once(&store, &orchestrator, &creds, 1_000).unwrap();
        assert_eq!(processed, 0);
    }
}
