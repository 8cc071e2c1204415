// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Orchestrator (C6): drives one [`Job`] to completion by walking its
//! code blocks, reconciling each against a VCS target, crafting content
//! into a sandbox, and committing/pushing/linking a pull request.
//!
//! `process` never propagates a per-job failure to its caller — it records
//! the error and traceback on the job itself (mirroring the worker's
//! record-and-move-on contract) and only returns `Err` for failures that
//! indicate the recipe itself is malformed in a way no retry will fix.

use crate::error::OrchestratorError;
use crate::mutator::MutationOutcome;
use crate::vcs::{self, Sandbox, VcsTransport};
use crate::walker;
use cnc_core::{Action, ChangeBlock, CodeBlock, Job, JobStatus, VcsCreds, VcsTarget, Values};
use cnc_forge::{each, Engine};
use std::fs;
use std::path::Path;

pub struct Orchestrator<'a> {
    pub engine: &'a Engine,
    pub vcs_transport: &'a dyn VcsTransport,
    /// Root under which each job gets its own `<sandbox_root>/<job.id>/`
    /// working directory (spec.md §4.3 Sandbox, §4.5 `commit()`).
    pub sandbox_root: &'a Path,
}

impl<'a> Orchestrator<'a> {
    pub fn new(engine: &'a Engine, vcs_transport: &'a dyn VcsTransport, sandbox_root: &'a Path) -> Self {
        Self { engine, vcs_transport, sandbox_root }
    }

    /// Run `job` to completion (or failure) against `creds`.
    pub fn process(&self, job: &mut Job, creds: &VcsCreds) {
        if job.code.is_none() {
            job.code = Some(job.output.clone());
        }
        let code_blocks = job.code.clone().unwrap_or_default();
        let action = job.action;
        let retrying = job.status == JobStatus::Retry;
        let job_dir = self.sandbox_root.join(job.id.as_str());

        for code_block in &code_blocks {
            if let Err(e) = self.run_code(job, code_block, action, retrying, creds, &job_dir) {
                job.fail(e.to_string(), Some(format!("{e:?}")));
                return;
            }
        }
        job.complete();

        // spec.md invariant 6: a `test` job leaves only its preserved
        // `code-<N>/` snapshots behind; every other action's sandbox is
        // gone once the job has completed.
        if action == Action::Test {
            let _ = fs::remove_dir_all(job_dir.join("source"));
            let _ = fs::remove_dir_all(job_dir.join("destination"));
        } else {
            let _ = fs::remove_dir_all(&job_dir);
        }
    }

    fn run_code(
        &self,
        job: &mut Job,
        code_block: &CodeBlock,
        action: Action,
        retrying: bool,
        creds: &VcsCreds,
        job_dir: &Path,
    ) -> Result<(), OrchestratorError> {
        for candidate in each(self.engine, &code_block.meta, &job.values)? {
            let Some(github_template) = &code_block.github else {
                continue;
            };
            let rendered_github = self.engine.render_json(github_template, &candidate)?;

            if !retrying && job.change.as_ref() == Some(&rendered_github) {
                continue;
            }

            let mut target: VcsTarget = serde_json::from_value(rendered_github.clone())
                .map_err(|e| crate::error::VcsError::Transport(e.to_string()))?;

            let ensure = action != Action::Test;
            let Some(repo_info) = vcs::ensure_repo(self.vcs_transport, creds, &target.repo, ensure)? else {
                // Only reachable under `test` against a repo that doesn't exist yet
                // (spec.md §4.5 `code()` step 3): nothing to snapshot, move on.
                job.change = Some(rendered_github);
                continue;
            };
            let default_branch = &repo_info.default_branch;
            let base_branch = target.base.clone().unwrap_or_else(|| default_branch.clone());

            if ensure {
                // spec.md §4.5 `code()` step 2: when the recipe names no
                // explicit `branch`, derive the working branch from the job
                // id (honoring an optional `prefix`) — mirroring the
                // original `github.py`'s `github.get("branch", cnc["id"])` —
                // so non-`test` jobs land their commits on a dedicated
                // branch and open a pull request against it, rather than
                // committing straight onto the repo's default branch.
                let working_branch = target.working_branch(job.id.as_str());
                vcs::ensure_hooks(self.vcs_transport, creds, &target.repo, &target.hooks)?;
                vcs::ensure_branch(self.vcs_transport, creds, &target.repo, &base_branch, default_branch)?;
                vcs::ensure_branch(self.vcs_transport, creds, &target.repo, &working_branch, &base_branch)?;
                target.branch = Some(working_branch);
            }

            let mut sandbox = Sandbox::prepare(job_dir, creds, &target, &repo_info)?;

            let mut changed = false;
            for change_block in &code_block.change {
                changed |= self.run_change(&mut sandbox, change_block, action, creds, &candidate, job_dir)?;
            }

            if action == Action::Test {
                // spec.md §4.5 `commit()`: never push under `test` — keep the
                // rendered tree as a `code-<N>/` snapshot instead.
                sandbox.snapshot_for_test(job_dir)?;
            } else if changed {
                let pushed = sandbox.commit_all("cnc-forge: generated changes")?;
                if pushed {
                    let branch = target.branch.as_deref().unwrap_or(&repo_info.default_branch);
                    sandbox.push(branch)?;
                    if let Some(pr) =
                        vcs::link_pull_request(self.vcs_transport, creds, &target, &repo_info.default_branch)?
                    {
                        vcs::ensure_comments(self.vcs_transport, creds, &target.repo, pr.number, &target.comment)?;
                        job.add_link(pr.html_url);
                    }
                }
            }

            job.change = Some(rendered_github);
        }
        Ok(())
    }

    /// Resolve `change_block`'s own `github:` target, if it has one, into a
    /// second read-only clone on `sandbox` before crafting its content
    /// (spec.md §4.5 `change()`: a change's source repo is never the same
    /// checkout as the enclosing code block's destination when the two
    /// `github:` blocks name different repos).
    fn run_change(
        &self,
        sandbox: &mut Sandbox,
        change_block: &ChangeBlock,
        action: Action,
        creds: &VcsCreds,
        values: &Values,
        job_dir: &Path,
    ) -> Result<bool, OrchestratorError> {
        if let Some(github_template) = &change_block.github {
            let rendered = self.engine.render_json(github_template, values)?;
            let target: VcsTarget = serde_json::from_value(rendered)
                .map_err(|e| crate::error::VcsError::Transport(e.to_string()))?;
            let clone_url = self
                .vcs_transport
                .find_repo(creds, &target.repo)?
                .map(|info| info.clone_url)
                .unwrap_or_default();
            sandbox.clone_source(job_dir, creds, &target, &clone_url)?;
        }

        let mut changed = false;
        for candidate in each(self.engine, &change_block.meta, values)? {
            for content_block in &change_block.content {
                let mut effective = content_block.clone();
                if action == Action::Remove {
                    effective.remove = true;
                }
                let outcomes = walker::craft(
                    self.engine,
                    sandbox.source_root(),
                    sandbox.destination_root(),
                    &effective,
                    &candidate,
                )?;
                changed |= outcomes
                    .iter()
                    .any(|outcome| !matches!(outcome, MutationOutcome::Skipped));
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{PullRequestInfo, RepoInfo};
    use cnc_core::{BlockMeta, ContentBlock, ContentSource, JobId, PullRequestSpec};
    use std::collections::HashMap;

    struct NoopTransport;
    impl VcsTransport for NoopTransport {
        fn find_repo(&self, _: &VcsCreds, _: &str) -> Result<Option<RepoInfo>, crate::error::VcsError> {
            Ok(Some(RepoInfo {
                default_branch: "main".to_string(),
                clone_url: String::new(),
                has_branches: true,
            }))
        }
        fn create_repo(&self, _: &VcsCreds, _: &str) -> Result<RepoInfo, crate::error::VcsError> {
            unreachable!("test repo always resolves via find_repo")
        }
        fn seed_initial_commit(&self, _: &VcsCreds, _: &str, _: &str) -> Result<(), crate::error::VcsError> {
            unreachable!()
        }
        fn list_branches(&self, _: &VcsCreds, _: &str) -> Result<Vec<String>, crate::error::VcsError> {
            Ok(vec!["main".to_string()])
        }
        fn create_branch(&self, _: &VcsCreds, _: &str, _: &str, _: &str) -> Result<(), crate::error::VcsError> {
            Ok(())
        }
        fn list_hook_urls(&self, _: &VcsCreds, _: &str) -> Result<Vec<String>, crate::error::VcsError> {
            Ok(Vec::new())
        }
        fn create_hook(&self, _: &VcsCreds, _: &str, _: &str) -> Result<(), crate::error::VcsError> {
            Ok(())
        }
        fn open_pull_request(
            &self,
            _: &VcsCreds,
            _: &str,
            _: &PullRequestSpec,
            _: &str,
            _: &str,
        ) -> Result<PullRequestInfo, crate::error::VcsError> {
            unreachable!("test never reaches PR creation without a sandbox")
        }
        fn update_pull_request(
            &self,
            _: &VcsCreds,
            _: &str,
            _: u64,
            _: &PullRequestSpec,
        ) -> Result<PullRequestInfo, crate::error::VcsError> {
            unreachable!()
        }
        fn find_open_pull_request(
            &self,
            _: &VcsCreds,
            _: &str,
            _: &str,
        ) -> Result<Option<PullRequestInfo>, crate::error::VcsError> {
            Ok(None)
        }
        fn add_comment(
            &self,
            _: &VcsCreds,
            _: &str,
            _: u64,
            _: &str,
        ) -> Result<String, crate::error::VcsError> {
            Ok(String::new())
        }
        fn list_issue_comments(&self, _: &VcsCreds, _: &str, _: u64) -> Result<Vec<String>, crate::error::VcsError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn craft_writes_content_block_into_sandbox_root() {
        let engine = Engine::new();
        let dir = tempfile::tempdir().unwrap();
        let sandbox_root = dir.path();

        let content = ContentBlock {
            source: ContentSource::Inline {
                value: serde_json::json!("hello"),
            },
            destination: Some("NOTES.md".to_string()),
            include: Default::default(),
            exclude: Default::default(),
            preserve: Default::default(),
            transform: Default::default(),
            text: None,
            json: None,
            yaml: None,
            replace: true,
            remove: false,
            meta: BlockMeta::default(),
        };

        // run_code/run_change require a real git remote to prepare a
        // Sandbox; exercised here is the content-crafting step they drive.
        let outcomes = walker::craft(&engine, sandbox_root, sandbox_root, &content, &Values::new()).unwrap();
        assert_eq!(outcomes, vec![MutationOutcome::Written]);
        assert!(sandbox_root.join("NOTES.md").exists());
    }

    #[test]
    fn process_marks_job_completed_when_no_github_targets() {
        let engine = Engine::new();
        let transport = NoopTransport;
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(&engine, &transport, dir.path());
        let mut job = Job::new(
            JobId::new("demo-forge1-1"),
            "forge1".to_string(),
            Action::Commit,
            "demo",
            HashMap::new(),
            vec![CodeBlock::default()],
        );
        let creds = VcsCreds { token: "t".to_string(), user: None, host: None, api_url: None };
        orchestrator.process(&mut job, &creds);
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error.is_none());
    }
}
