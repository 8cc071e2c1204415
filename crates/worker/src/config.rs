// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration, read entirely from the environment.

use std::path::PathBuf;

const DEFAULT_SLEEP_SECONDS: f64 = 5.0;

/// Everything the worker loop needs to run, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long to sleep between polls when a pass finds no runnable job
    /// (`SLEEP` env var, seconds, default 5.0).
    pub sleep_seconds: f64,
    pub storage_dir: PathBuf,
    /// Root under which each job gets its own `<sandbox_dir>/<job.id>/`
    /// working tree (`destination/`, `source/`, and — for `test` actions —
    /// preserved `code-<N>/` snapshots). `CNC_SANDBOX_DIR`, default
    /// `sandbox`.
    pub sandbox_dir: PathBuf,
    pub vcs_token: Option<String>,
    pub vcs_user: Option<String>,
    pub vcs_host: Option<String>,
    pub vcs_api_url: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            sleep_seconds: std::env::var("SLEEP")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(DEFAULT_SLEEP_SECONDS),
            storage_dir: std::env::var("CNC_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("jobs")),
            sandbox_dir: std::env::var("CNC_SANDBOX_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("sandbox")),
            vcs_token: std::env::var("GITHUB_TOKEN").ok(),
            vcs_user: std::env::var("GITHUB_USER").ok(),
            vcs_host: std::env::var("GITHUB_HOST").ok(),
            vcs_api_url: std::env::var("GITHUB_API_URL").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_seconds_falls_back_to_default_when_unset_or_unparseable() {
        assert_eq!(
            std::env::var("SLEEP")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(DEFAULT_SLEEP_SECONDS),
            DEFAULT_SLEEP_SECONDS,
        );
    }

    #[test]
    fn parses_sleep_seconds_from_string() {
        let parsed: f64 = "2.5".parse().unwrap();
        assert_eq!(parsed, 2.5);
    }
}
