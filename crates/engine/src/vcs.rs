// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VCS Driver (C5): resolves a rendered `github:` descriptor against a
//! GitHub-style HTTP API, prepares a local sandbox via `git` subprocess
//! calls, commits and pushes content changes, and links back a pull
//! request. The driver walks each target through
//! `Uninitialized -> Resolved -> Prepared -> Committed -> Linked`.
//!
//! `git` is always invoked as a subprocess (never through a git library),
//! and every HTTP call is blocking — the worker loop (C7) is single-
//! threaded and synchronous by design.

use crate::error::VcsError;
use cnc_core::{PullRequestSpec, VcsCreds, VcsState, VcsTarget};
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What the VCS API told us about a repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub default_branch: String,
    pub clone_url: String,
    /// Whether the repo already has at least one branch — a freshly
    /// created repo with none needs a seed commit before `git clone`
    /// has anything to check out (spec.md §4.5 `repo(ensure)`).
    pub has_branches: bool,
}

/// What the VCS API told us about an opened (or updated) pull request.
#[derive(Debug, Clone)]
pub struct PullRequestInfo {
    pub number: u64,
    pub html_url: String,
}

/// Abstraction over the out-of-scope GitHub-style HTTP API.
pub trait VcsTransport: Send + Sync {
    /// Look a repo up by `owner/name`, paginating `user/repos`/`org/repos`
    /// style listings as needed. `None` means it doesn't exist yet.
    fn find_repo(&self, creds: &VcsCreds, repo: &str) -> Result<Option<RepoInfo>, VcsError>;
    /// Create `repo` (`orgs/<org>/repos` for an org-qualified name, else
    /// `user/repos`), private by default.
    fn create_repo(&self, creds: &VcsCreds, repo: &str) -> Result<RepoInfo, VcsError>;
    /// Seed a first commit on a branch-less repo so it has a default
    /// branch to clone.
    fn seed_initial_commit(&self, creds: &VcsCreds, repo: &str, default_branch: &str) -> Result<(), VcsError>;
    fn list_branches(&self, creds: &VcsCreds, repo: &str) -> Result<Vec<String>, VcsError>;
    fn create_branch(&self, creds: &VcsCreds, repo: &str, new_branch: &str, from_branch: &str) -> Result<(), VcsError>;
    /// Webhook URLs already registered on the repo.
    fn list_hook_urls(&self, creds: &VcsCreds, repo: &str) -> Result<Vec<String>, VcsError>;
    fn create_hook(&self, creds: &VcsCreds, repo: &str, url: &str) -> Result<(), VcsError>;
    fn open_pull_request(
        &self,
        creds: &VcsCreds,
        repo: &str,
        spec: &PullRequestSpec,
        head: &str,
        base: &str,
    ) -> Result<PullRequestInfo, VcsError>;
    fn update_pull_request(
        &self,
        creds: &VcsCreds,
        repo: &str,
        number: u64,
        spec: &PullRequestSpec,
    ) -> Result<PullRequestInfo, VcsError>;
    fn find_open_pull_request(
        &self,
        creds: &VcsCreds,
        repo: &str,
        head: &str,
    ) -> Result<Option<PullRequestInfo>, VcsError>;
    fn add_comment(
        &self,
        creds: &VcsCreds,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> Result<String, VcsError>;
    /// Bodies of comments already posted on `issue_number`, so `ensure_comments`
    /// can skip ones that are already there (spec.md §4.5 `comment()`: "post
    /// only those not already present").
    fn list_issue_comments(&self, creds: &VcsCreds, repo: &str, issue_number: u64) -> Result<Vec<String>, VcsError>;
}

/// `reqwest::blocking`-backed transport against a real GitHub-compatible API.
pub struct ReqwestVcsTransport {
    client: reqwest::blocking::Client,
}

impl Default for ReqwestVcsTransport {
    fn default() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

/// `"org/name"` splits into `(Some("org"), "name")`; a bare `"name"` has no
/// owner segment (spec.md §4.5 normalization: "without `/` it is
/// `<user>/<repo>`").
fn split_owner(repo: &str) -> (Option<&str>, &str) {
    match repo.split_once('/') {
        Some((owner, name)) => (Some(owner), name),
        None => (None, repo),
    }
}

impl ReqwestVcsTransport {
    fn request(
        &self,
        creds: &VcsCreds,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, VcsError> {
        let url = format!("{}{}", creds.base_url(), path);
        let mut builder = self
            .client
            .request(method, &url)
            .bearer_auth(&creds.token)
            .header("User-Agent", "cncd")
            .header("Accept", "application/vnd.github+json");
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder
            .send()
            .map_err(|e| VcsError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .json::<serde_json::Value>()
            .map_err(|e| VcsError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(VcsError::ApiError {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }
        Ok(body)
    }

    /// Page through `user/repos` until `repo` is found or a page comes back
    /// empty (spec.md §4.5 `repo(ensure)`: "paginate … page=1, increment
    /// until empty").
    fn paginate_find_repo(&self, creds: &VcsCreds, repo: &str) -> Result<Option<RepoInfo>, VcsError> {
        let mut page = 1u32;
        loop {
            let body = self.request(
                creds,
                reqwest::Method::GET,
                &format!("/user/repos?per_page=100&page={page}"),
                None,
            )?;
            let Some(items) = body.as_array() else {
                return Ok(None);
            };
            if items.is_empty() {
                return Ok(None);
            }
            for item in items {
                if item["full_name"].as_str() == Some(repo) {
                    return Ok(Some(repo_info_from_json(item)));
                }
            }
            page += 1;
        }
    }
}

fn repo_info_from_json(body: &Json) -> RepoInfo {
    RepoInfo {
        default_branch: body["default_branch"].as_str().unwrap_or("main").to_string(),
        clone_url: body["clone_url"].as_str().unwrap_or_default().to_string(),
        has_branches: body["size"].as_u64().unwrap_or(1) > 0,
    }
}

impl VcsTransport for ReqwestVcsTransport {
    fn find_repo(&self, creds: &VcsCreds, repo: &str) -> Result<Option<RepoInfo>, VcsError> {
        match self.request(creds, reqwest::Method::GET, &format!("/repos/{repo}"), None) {
            Ok(body) => Ok(Some(repo_info_from_json(&body))),
            Err(VcsError::ApiError { status: 404, .. }) => self.paginate_find_repo(creds, repo),
            Err(e) => Err(e),
        }
    }

    fn create_repo(&self, creds: &VcsCreds, repo: &str) -> Result<RepoInfo, VcsError> {
        let (owner, name) = split_owner(repo);
        let path = match owner {
            Some(org) => format!("/orgs/{org}/repos"),
            None => "/user/repos".to_string(),
        };
        let visibility = if owner.is_some() { "internal" } else { "private" };
        let body = self.request(
            creds,
            reqwest::Method::POST,
            &path,
            Some(serde_json::json!({"name": name, "private": true, "visibility": visibility})),
        )?;
        Ok(RepoInfo {
            has_branches: false,
            ..repo_info_from_json(&body)
        })
    }

    fn seed_initial_commit(&self, creds: &VcsCreds, repo: &str, default_branch: &str) -> Result<(), VcsError> {
        use base64::Engine as _;
        let content = base64::engine::general_purpose::STANDARD.encode(b"cnc-forge\n");
        self.request(
            creds,
            reqwest::Method::PUT,
            &format!("/repos/{repo}/contents/CNC"),
            Some(serde_json::json!({
                "message": "cnc-forge: initial commit",
                "content": content,
                "branch": default_branch,
            })),
        )?;
        Ok(())
    }

    fn list_branches(&self, creds: &VcsCreds, repo: &str) -> Result<Vec<String>, VcsError> {
        let body = self.request(creds, reqwest::Method::GET, &format!("/repos/{repo}/branches"), None)?;
        Ok(body
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|b| b["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create_branch(&self, creds: &VcsCreds, repo: &str, new_branch: &str, from_branch: &str) -> Result<(), VcsError> {
        let base_ref = self.request(
            creds,
            reqwest::Method::GET,
            &format!("/repos/{repo}/git/refs/heads/{from_branch}"),
            None,
        )?;
        let sha = base_ref["object"]["sha"].as_str().unwrap_or_default().to_string();
        self.request(
            creds,
            reqwest::Method::POST,
            &format!("/repos/{repo}/git/refs"),
            Some(serde_json::json!({"ref": format!("refs/heads/{new_branch}"), "sha": sha})),
        )?;
        Ok(())
    }

    fn list_hook_urls(&self, creds: &VcsCreds, repo: &str) -> Result<Vec<String>, VcsError> {
        let body = self.request(creds, reqwest::Method::GET, &format!("/repos/{repo}/hooks"), None)?;
        Ok(body
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|h| h["config"]["url"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create_hook(&self, creds: &VcsCreds, repo: &str, url: &str) -> Result<(), VcsError> {
        self.request(
            creds,
            reqwest::Method::POST,
            &format!("/repos/{repo}/hooks"),
            Some(serde_json::json!({
                "name": "web",
                "active": true,
                "config": {"url": url, "content_type": "json"},
            })),
        )?;
        Ok(())
    }

    fn open_pull_request(
        &self,
        creds: &VcsCreds,
        repo: &str,
        spec: &PullRequestSpec,
        head: &str,
        base: &str,
    ) -> Result<PullRequestInfo, VcsError> {
        let body = self.request(
            creds,
            reqwest::Method::POST,
            &format!("/repos/{repo}/pulls"),
            Some(serde_json::json!({
                "title": spec.title,
                "body": spec.body,
                "head": head,
                "base": base,
            })),
        )?;
        Ok(PullRequestInfo {
            number: body["number"].as_u64().unwrap_or_default(),
            html_url: body["html_url"].as_str().unwrap_or_default().to_string(),
        })
    }

    fn update_pull_request(
        &self,
        creds: &VcsCreds,
        repo: &str,
        number: u64,
        spec: &PullRequestSpec,
    ) -> Result<PullRequestInfo, VcsError> {
        let body = self.request(
            creds,
            reqwest::Method::PATCH,
            &format!("/repos/{repo}/pulls/{number}"),
            Some(serde_json::json!({"title": spec.title, "body": spec.body})),
        )?;
        Ok(PullRequestInfo {
            number,
            html_url: body["html_url"].as_str().unwrap_or_default().to_string(),
        })
    }

    fn find_open_pull_request(
        &self,
        creds: &VcsCreds,
        repo: &str,
        head: &str,
    ) -> Result<Option<PullRequestInfo>, VcsError> {
        let (owner, _) = repo.split_once('/').unwrap_or((repo, ""));
        let query = format!("/repos/{repo}/pulls?state=open&head={owner}:{head}");
        let body = self.request(creds, reqwest::Method::GET, &query, None)?;
        Ok(body.as_array().and_then(|items| items.first()).map(|pr| {
            PullRequestInfo {
                number: pr["number"].as_u64().unwrap_or_default(),
                html_url: pr["html_url"].as_str().unwrap_or_default().to_string(),
            }
        }))
    }

    fn add_comment(
        &self,
        creds: &VcsCreds,
        repo: &str,
        issue_number: u64,
        body_text: &str,
    ) -> Result<String, VcsError> {
        let body = self.request(
            creds,
            reqwest::Method::POST,
            &format!("/repos/{repo}/issues/{issue_number}/comments"),
            Some(serde_json::json!({"body": body_text})),
        )?;
        Ok(body["html_url"].as_str().unwrap_or_default().to_string())
    }

    fn list_issue_comments(&self, creds: &VcsCreds, repo: &str, issue_number: u64) -> Result<Vec<String>, VcsError> {
        let body = self.request(
            creds,
            reqwest::Method::GET,
            &format!("/repos/{repo}/issues/{issue_number}/comments"),
            None,
        )?;
        Ok(body
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|c| c["body"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn git_output(cwd: &Path, args: &[&str]) -> Result<String, VcsError> {
    let output = Command::new("git").args(args).current_dir(cwd).output()?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let owned_args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    if stderr.trim().is_empty() && stdout.trim().is_empty() {
        return Err(VcsError::GitCommandSilentFailure { args: owned_args });
    }
    Err(VcsError::GitCommandFailed {
        args: owned_args,
        status: output.status.code().unwrap_or(-1),
        stderr,
    })
}

/// Remote to `git clone` for `repo`. The original daemon always clones over
/// SSH (`git clone git@<host>:<path>.git`, authenticated by the host's
/// configured deploy key, never by the REST API token) and ignores whatever
/// clone URL the API reported; a `clone_url` that doesn't look like that API
/// shape (a local path, an already-SSH remote — the shape test fixtures use
/// for their bare-repo "remotes") is used as-is, and a blank one (the
/// `ensure=false`/not-yet-existing path under `test`) falls back to the same
/// SSH form (spec.md §4.5 `code()`/`change()`).
fn ssh_clone_url(creds: &VcsCreds, clone_url: &str, repo: &str) -> String {
    if clone_url.is_empty() || clone_url.starts_with("https://") || clone_url.starts_with("http://") {
        return format!("git@{}:{repo}.git", creds.ssh_host());
    }
    clone_url.to_string()
}

/// Wipe `dest` (ignoring a not-found error — there may be nothing there yet)
/// and `git clone` `repo` into it fresh.
fn clone_into(dest: &Path, creds: &VcsCreds, clone_url: &str, repo: &str, branch: Option<&str>) -> Result<(), VcsError> {
    let _ = fs::remove_dir_all(dest);
    fs::create_dir_all(dest)?;
    let url = ssh_clone_url(creds, clone_url, repo);
    match branch {
        Some(branch) => git_output(dest, &["clone", "--branch", branch, &url, "."])?,
        None => git_output(dest, &["clone", &url, "."])?,
    };
    Ok(())
}

/// A cloned working copy of the repo a Code block's `github:` target names,
/// plus — only when a Change block carries its own `github:` target — a
/// second, independently cloned working copy of the template source it
/// reads from (spec.md §4.5 `change()`: a change's source repo is resolved
/// and cloned read-only, never created, separate from the destination the
/// enclosing code block already checked out).
///
/// Both trees live under the caller's per-job directory
/// (`<sandbox_dir>/<job.id>/{destination,source}`) rather than an anonymous
/// temp directory, so a `test` action can rename `destination/` into a
/// sibling `code-<N>/` snapshot that survives after the `Sandbox` is
/// dropped (spec.md §4.5 `commit()`, invariant 6).
pub struct Sandbox {
    destination_root: PathBuf,
    source_root: Option<PathBuf>,
}

impl Sandbox {
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// The tree content sources resolve against: the change-level source
    /// clone if one was made, otherwise the same destination checkout.
    pub fn source_root(&self) -> &Path {
        self.source_root.as_deref().unwrap_or(&self.destination_root)
    }

    /// Clone `repo` at `default_branch` into `job_dir/destination`, then
    /// create (or switch to) the target branch if one was requested.
    pub fn prepare(job_dir: &Path, creds: &VcsCreds, target: &VcsTarget, repo_info: &RepoInfo) -> Result<Self, VcsError> {
        let destination_root = job_dir.join("destination");
        clone_into(&destination_root, creds, &repo_info.clone_url, &target.repo, Some(&repo_info.default_branch))?;
        if let Some(branch) = &target.branch {
            git_output(&destination_root, &["checkout", branch])?;
        }
        Ok(Self { destination_root, source_root: None })
    }

    /// Clone a separate, read-only template-source repo into
    /// `job_dir/source` for a Change block whose own `github:` target
    /// differs from the enclosing Code block's.
    pub fn clone_source(
        &mut self,
        job_dir: &Path,
        creds: &VcsCreds,
        target: &VcsTarget,
        clone_url: &str,
    ) -> Result<(), VcsError> {
        let source_root = job_dir.join("source");
        clone_into(&source_root, creds, clone_url, &target.repo, target.branch.as_deref())?;
        self.source_root = Some(source_root);
        Ok(())
    }

    /// Stage and commit every change. Returns `false` (no-op, no commit
    /// created) when `git status --porcelain` reports a clean tree.
    pub fn commit_all(&self, message: &str) -> Result<bool, VcsError> {
        git_output(&self.destination_root, &["add", "-A"])?;
        let status = git_output(&self.destination_root, &["status", "--porcelain"])?;
        if status.trim().is_empty() {
            return Ok(false);
        }
        git_output(&self.destination_root, &["commit", "-m", message])?;
        Ok(true)
    }

    pub fn push(&self, branch: &str) -> Result<(), VcsError> {
        git_output(&self.destination_root, &["push", "origin", &format!("HEAD:{branch}"), "-u"])?;
        Ok(())
    }

    /// spec.md §4.5 `commit()`: under a `test` action, `destination/` is
    /// never pushed — it is renamed to the smallest-numbered free
    /// `code-<N>/` sibling under `job_dir` and left there for inspection,
    /// instead of being wiped with the rest of the job's sandbox.
    pub fn snapshot_for_test(&mut self, job_dir: &Path) -> Result<PathBuf, VcsError> {
        let mut n = 0u64;
        let snapshot = loop {
            let candidate = job_dir.join(format!("code-{n}"));
            if !candidate.exists() {
                break candidate;
            }
            n += 1;
        };
        fs::rename(&self.destination_root, &snapshot)?;
        Ok(snapshot)
    }
}

/// `repo(ensure)` (spec.md §4.5): find the repo, optionally creating it
/// (private, under its org if `path` is org-qualified) and seeding an
/// initial commit when a freshly created repo has no branches yet.
pub fn ensure_repo(
    transport: &dyn VcsTransport,
    creds: &VcsCreds,
    repo: &str,
    ensure: bool,
) -> Result<Option<RepoInfo>, VcsError> {
    if let Some(info) = transport.find_repo(creds, repo)? {
        return Ok(Some(info));
    }
    if !ensure {
        return Ok(None);
    }
    let info = transport.create_repo(creds, repo)?;
    if !info.has_branches {
        transport.seed_initial_commit(creds, repo, &info.default_branch)?;
    }
    Ok(Some(info))
}

/// `branch(new, base)` (spec.md §4.5): create `new` on top of `base`'s
/// current commit if it doesn't already exist.
pub fn ensure_branch(
    transport: &dyn VcsTransport,
    creds: &VcsCreds,
    repo: &str,
    branch: &str,
    base: &str,
) -> Result<(), VcsError> {
    if branch == base {
        return Ok(());
    }
    let branches = transport.list_branches(creds, repo)?;
    if branches.iter().any(|b| b == branch) {
        return Ok(());
    }
    transport.create_branch(creds, repo, branch, base)
}

fn hook_url(hook: &Json) -> String {
    match hook {
        Json::String(s) => s.clone(),
        Json::Object(map) => map
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// `hook()` (spec.md §4.5): list current hooks, post only those not
/// already present.
pub fn ensure_hooks(
    transport: &dyn VcsTransport,
    creds: &VcsCreds,
    repo: &str,
    hooks: &[Json],
) -> Result<(), VcsError> {
    if hooks.is_empty() {
        return Ok(());
    }
    let existing = transport.list_hook_urls(creds, repo)?;
    for hook in hooks {
        let url = hook_url(hook);
        if url.is_empty() || existing.iter().any(|u| u == &url) {
            continue;
        }
        transport.create_hook(creds, repo, &url)?;
    }
    Ok(())
}

fn comment_body(comment: &Json) -> String {
    match comment {
        Json::String(s) => s.clone(),
        Json::Object(map) => map
            .get("body")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// `comment()` (spec.md §4.5): list comments already on `issue_number`, post
/// only those not already present. `issue_number` is the pull request's own
/// number — on GitHub-shaped APIs a PR *is* an issue, so its PR number is
/// also its issue number (spec.md §4.5: "attach to the issue number parsed
/// from the PR URL's trailing segment" names the same value a different way).
pub fn ensure_comments(
    transport: &dyn VcsTransport,
    creds: &VcsCreds,
    repo: &str,
    issue_number: u64,
    comments: &[Json],
) -> Result<(), VcsError> {
    if comments.is_empty() {
        return Ok(());
    }
    let existing = transport.list_issue_comments(creds, repo, issue_number)?;
    for comment in comments {
        let body = comment_body(comment);
        if body.is_empty() || existing.iter().any(|b| b == &body) {
            continue;
        }
        transport.add_comment(creds, repo, issue_number, &body)?;
    }
    Ok(())
}

/// Open a pull request for `target` if one doesn't already exist on its
/// head branch, otherwise update the existing one's title/body.
pub fn link_pull_request(
    transport: &dyn VcsTransport,
    creds: &VcsCreds,
    target: &VcsTarget,
    base_branch: &str,
) -> Result<Option<PullRequestInfo>, VcsError> {
    let (Some(branch), Some(spec)) = (&target.branch, &target.pull_request) else {
        return Ok(None);
    };
    if let Some(existing) = transport.find_open_pull_request(creds, &target.repo, branch)? {
        return Ok(Some(transport.update_pull_request(
            creds,
            &target.repo,
            existing.number,
            spec,
        )?));
    }
    let base = target.base.clone().unwrap_or_else(|| base_branch.to_string());
    Ok(Some(transport.open_pull_request(creds, &target.repo, spec, branch, &base)?))
}

/// Current reconciliation state of `target` given what's known so far.
pub fn state_for(target: &VcsTarget, prepared: bool, committed: bool, linked: bool) -> VcsState {
    if linked {
        VcsState::Linked
    } else if committed {
        VcsState::Committed
    } else if prepared {
        VcsState::Prepared
    } else if target.repo.is_empty() {
        VcsState::Uninitialized
    } else {
        VcsState::Resolved
    }
}
