// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cncd`: the CnC-Forge worker binary. Polls a job store for runnable jobs
//! and drives each one to completion through the orchestrator, one at a
//! time, on a single thread (spec.md §5).

use std::time::Duration;

use cnc_core::VcsCreds;
use cnc_engine::{Orchestrator, ReqwestVcsTransport};
use cnc_forge::Engine;
use cnc_storage::{epoch_seconds_now, FileJobStore, JobStore};
use cnc_worker::Config;

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    setup_logging();

    let config = Config::load();
    tracing::info!(
        sleep_seconds = config.sleep_seconds,
        storage_dir = %config.storage_dir.display(),
        sandbox_dir = %config.sandbox_dir.display(),
        "starting cncd worker loop",
    );

    let store = FileJobStore::new(&config.storage_dir)?;
    let engine = Engine::new();
    let transport = ReqwestVcsTransport::default();
    let orchestrator = Orchestrator::new(&engine, &transport, &config.sandbox_dir);
    let creds = VcsCreds {
        token: config.vcs_token.clone().unwrap_or_default(),
        user: config.vcs_user.clone(),
        host: config.vcs_host.clone(),
        api_url: config.vcs_api_url.clone(),
    };
    let sleep_duration = Duration::from_secs_f64(config.sleep_seconds.max(0.0));

    loop {
        let now = epoch_seconds_now();
        match cnc_worker::run_once(&store, &orchestrator, &creds, now) {
            Ok(0) => std::thread::sleep(sleep_duration),
            Ok(processed) => tracing::info!(processed, "processed jobs this pass"),
            Err(error) => {
                tracing::error!(%error, "worker pass failed, retrying after sleep");
                std::thread::sleep(sleep_duration);
            }
        }
    }
}
