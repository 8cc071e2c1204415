// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FileJobStore`: one JSON file per job under a root directory, for a
//! worker deployment that wants durability without standing up an external
//! KV store.

use crate::error::StorageError;
use crate::job_store::{JobStore, DEFAULT_TTL_SECONDS};
use cnc_core::Job;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
struct FileRecord {
    inserted_at: i64,
    job: Job,
}

pub struct FileJobStore {
    root: PathBuf,
}

impl FileJobStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn is_expired(inserted_at: i64, now: i64) -> bool {
        now.saturating_sub(inserted_at) > DEFAULT_TTL_SECONDS
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }

    fn read(&self, path: &Path) -> Result<FileRecord, StorageError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// `/` would otherwise escape the store's root directory when a caller's
/// key is itself a path-like prefix (e.g. `"jobs/demo-1"`).
fn sanitize_key(key: &str) -> String {
    key.replace(['/', '\\'], "_")
}

impl JobStore for FileJobStore {
    fn put(&self, key: &str, job: &Job, now: i64) -> Result<(), StorageError> {
        let record = FileRecord {
            inserted_at: now,
            job: job.clone(),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        fs::write(self.path_for(key), contents)?;
        Ok(())
    }

    fn get(&self, key: &str, now: i64) -> Result<Option<Job>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let record = self.read(&path)?;
        if Self::is_expired(record.inserted_at, now) {
            fs::remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(record.job))
    }

    fn scan_prefix(&self, prefix: &str, now: i64) -> Result<Vec<Job>, StorageError> {
        let sanitized_prefix = sanitize_key(prefix);
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.starts_with(&sanitized_prefix) {
                continue;
            }
            let record = self.read(&entry.path())?;
            if Self::is_expired(record.inserted_at, now) {
                fs::remove_file(entry.path())?;
                continue;
            }
            out.push(record.job);
        }
        Ok(out)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnc_core::{Action, JobId};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_job(id: &str) -> Job {
        Job::new(
            JobId::new(id),
            "forge1".to_string(),
            Action::Commit,
            "demo",
            HashMap::new(),
            Vec::new(),
        )
    }

    #[test]
    fn put_then_get_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let store = FileJobStore::new(dir.path()).unwrap();
        let job = sample_job("demo-forge1-1");
        store.put("demo-forge1-1", &job, 1_000).unwrap();
        let fetched = store.get("demo-forge1-1", 1_000).unwrap().unwrap();
        assert_eq!(fetched.id, job.id);
    }

    #[test]
    fn expired_record_is_purged_on_get() {
        let dir = tempdir().unwrap();
        let store = FileJobStore::new(dir.path()).unwrap();
        store.put("demo-1", &sample_job("demo-1"), 1_000).unwrap();
        let fetched = store
            .get("demo-1", 1_000 + DEFAULT_TTL_SECONDS + 1)
            .unwrap();
        assert!(fetched.is_none());
        assert!(!store.path_for("demo-1").exists());
    }

    #[test]
    fn scan_prefix_sanitizes_slashes_in_keys() {
        let dir = tempdir().unwrap();
        let store = FileJobStore::new(dir.path()).unwrap();
        store.put("jobs/demo-1", &sample_job("demo-1"), 1_000).unwrap();
        store.put("jobs/demo-2", &sample_job("demo-2"), 1_000).unwrap();
        let scanned = store.scan_prefix("jobs/", 1_000).unwrap();
        assert_eq!(scanned.len(), 2);
    }
}
