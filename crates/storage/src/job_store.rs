// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`JobStore`] trait and its in-memory implementation — an abstraction
//! over the out-of-scope KV/queue transport the worker loop (C7) polls.
//!
//! Every record carries the epoch-second timestamp it was last written at;
//! a record older than [`DEFAULT_TTL_SECONDS`] is treated as absent and
//! purged lazily on the next access that would have returned it.

use crate::error::StorageError;
use cnc_core::Job;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Jobs older than this are expired out of the store (24 hours).
pub const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;

pub fn epoch_seconds_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Abstraction over wherever jobs actually live (a KV store or queue in a
/// full deployment). The worker loop only needs `put`/`get`/`scan_prefix`.
pub trait JobStore: Send + Sync {
    fn put(&self, key: &str, job: &Job, now: i64) -> Result<(), StorageError>;
    fn get(&self, key: &str, now: i64) -> Result<Option<Job>, StorageError>;
    /// All non-expired jobs whose key starts with `prefix`, in unspecified order.
    fn scan_prefix(&self, prefix: &str, now: i64) -> Result<Vec<Job>, StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

struct Record {
    inserted_at: i64,
    job: Job,
}

/// `JobStore` backed by a process-local map. Used by tests and by the
/// standalone worker binary when no external KV store is configured.
#[derive(Default)]
pub struct InMemoryJobStore {
    records: RwLock<HashMap<String, Record>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_expired(inserted_at: i64, now: i64) -> bool {
        now.saturating_sub(inserted_at) > DEFAULT_TTL_SECONDS
    }
}

impl JobStore for InMemoryJobStore {
    fn put(&self, key: &str, job: &Job, now: i64) -> Result<(), StorageError> {
        self.records.write().insert(
            key.to_string(),
            Record {
                inserted_at: now,
                job: job.clone(),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str, now: i64) -> Result<Option<Job>, StorageError> {
        let mut records = self.records.write();
        match records.get(key) {
            Some(record) if Self::is_expired(record.inserted_at, now) => {
                records.remove(key);
                Ok(None)
            }
            Some(record) => Ok(Some(record.job.clone())),
            None => Ok(None),
        }
    }

    fn scan_prefix(&self, prefix: &str, now: i64) -> Result<Vec<Job>, StorageError> {
        let mut records = self.records.write();
        let expired: Vec<String> = records
            .iter()
            .filter(|(k, r)| k.starts_with(prefix) && Self::is_expired(r.inserted_at, now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            records.remove(&key);
        }
        Ok(records
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(_, r)| r.job.clone())
            .collect())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.records.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnc_core::{Action, Job, JobId};
    use std::collections::HashMap as StdMap;

    fn sample_job(id: &str) -> Job {
        Job::new(
            JobId::new(id),
            "forge1".to_string(),
            Action::Commit,
            "demo",
            StdMap::new(),
            Vec::new(),
        )
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = InMemoryJobStore::new();
        let job = sample_job("demo-forge1-1");
        store.put("demo-forge1-1", &job, 1_000).unwrap();
        let fetched = store.get("demo-forge1-1", 1_000).unwrap();
        assert_eq!(fetched.unwrap().id, job.id);
    }

    #[test]
    fn get_returns_none_past_ttl() {
        let store = InMemoryJobStore::new();
        let job = sample_job("demo-forge1-1");
        store.put("demo-forge1-1", &job, 1_000).unwrap();
        let fetched = store
            .get("demo-forge1-1", 1_000 + DEFAULT_TTL_SECONDS + 1)
            .unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn scan_prefix_filters_by_key_prefix() {
        let store = InMemoryJobStore::new();
        store.put("jobs/demo-1", &sample_job("demo-1"), 1_000).unwrap();
        store.put("jobs/demo-2", &sample_job("demo-2"), 1_000).unwrap();
        store.put("other/demo-3", &sample_job("demo-3"), 1_000).unwrap();
        let scanned = store.scan_prefix("jobs/", 1_000).unwrap();
        assert_eq!(scanned.len(), 2);
    }

    #[test]
    fn delete_removes_the_record() {
        let store = InMemoryJobStore::new();
        store.put("demo-1", &sample_job("demo-1"), 1_000).unwrap();
        store.delete("demo-1").unwrap();
        assert!(store.get("demo-1", 1_000).unwrap().is_none());
    }
}
