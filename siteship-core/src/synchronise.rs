//! High-level pipeline: conditional remote sync of a compiled output folder.
//!
//! This module provides the top-level orchestration for publishing local
//! files to a remote destination. It implements a coordinated pipeline that:
//!   - Enumerates local files from the configured glob set (sequential)
//!   - Queries the remote modification time per file and decides
//!     Upload/Skip (sequential; staleness policy lives in [`crate::plan`])
//!   - Executes uploads with bounded concurrency via a [`RemoteStore`]
//!   - Aggregates and returns a report of what moved, what was current,
//!     and what failed.
//!
//! # Major Types
//! - [`SyncReport`]: output report for downstream display and exit codes
//! - [`FileFailure`]: one per-file failure, path plus cause
//! - [`CancelToken`]: cooperative cancellation handle
//!
//! # Responsibilities
//! - A single file's failure never aborts the batch: it is recorded and the
//!   remaining files are still attempted.
//! - Connection and authentication are the remote client's constructor
//!   problem; by the time this function runs, a failed session has already
//!   surfaced as a fatal error, before any transfer.
//! - The report is deterministic for identical inputs and remote state:
//!   completion order of concurrent uploads does not leak into it.
//!
//! # Cancellation
//! After [`CancelToken::cancel`], no new transfer starts. Transfers already
//! in flight are allowed to complete and are reported normally; files that
//! never started are reported under `cancelled`.
//!
//! # Error Handling
//! Fatal conditions (bad globs, enumeration I/O) return immediately with a
//! [`SyncError`]; per-file conditions accumulate into the report. Callers
//! surface the report to users and derive the process exit code from it.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::contract::RemoteStore;
use crate::error::SyncResult;
use crate::manifest;
use crate::plan::{self, Action, TransferDecision};

/// One file that could not be transferred, with its cause.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub cause: String,
}

/// Aggregated result of one sync run.
///
/// Vectors are sorted by path, so two runs against identical inputs and
/// remote state produce identical reports.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    /// Total files matched by the glob configuration.
    pub matched: usize,
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FileFailure>,
    /// Files whose transfer never started because cancellation was requested.
    pub cancelled: Vec<String>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }
}

/// Cooperative cancellation handle shared between the caller and the
/// in-flight sync. Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Outcome {
    Uploaded(String),
    Failed(FileFailure),
    Cancelled(String),
}

/// Entrypoint: run one conditional sync against `remote`.
pub async fn synchronise<R>(
    config: &SyncConfig,
    remote: &R,
    cancel: &CancelToken,
) -> SyncResult<SyncReport>
where
    R: RemoteStore,
{
    info!(
        destination_root = %config.destination_root,
        "[SYNC] Starting conditional remote sync"
    );

    // --- Step 1: enumerate the local manifest ---
    let entries = manifest::collect(&config.root, &config.local_globs)?;
    let matched = entries.len();
    info!(matched, "[SYNC] Local manifest enumerated");

    // --- Steps 2-3: query remote state and decide per file ---
    let mut failed: Vec<FileFailure> = Vec::new();
    let mut decisions: Vec<TransferDecision> = Vec::new();

    for entry in &entries {
        let relative = match manifest::relative_path(&entry.path, &config.base_path) {
            Ok(relative) => relative,
            Err(e) => {
                error!(path = %entry.path.display(), error = %e, "[SYNC] Path resolution failed");
                failed.push(FileFailure {
                    path: entry.path.display().to_string(),
                    cause: e.to_string(),
                });
                continue;
            }
        };
        let remote_path = join_remote(&config.destination_root, &relative);
        match remote.modified_time(&remote_path).await {
            Ok(state) => {
                let action = plan::decide(entry, state);
                if action == Action::Skip {
                    debug!(path = %relative, "[SYNC] Remote is current, skipping");
                }
                decisions.push(TransferDecision {
                    relative_path: relative,
                    action,
                });
            }
            Err(e) => {
                error!(path = %relative, error = %e, "[SYNC] Remote state query failed");
                failed.push(FileFailure {
                    path: relative,
                    cause: format!("remote state query failed: {e}"),
                });
            }
        }
    }

    let (pending, current): (Vec<TransferDecision>, Vec<TransferDecision>) = decisions
        .into_iter()
        .partition(|d| d.action == Action::Upload);
    let mut skipped: Vec<String> = current.into_iter().map(|d| d.relative_path).collect();
    info!(
        uploads = pending.len(),
        skipped = skipped.len(),
        "[SYNC] Transfer decisions computed"
    );

    // --- Step 4: execute uploads, bounded concurrency ---
    let outcomes = futures::stream::iter(pending.into_iter().map(|decision| {
        let relative = decision.relative_path;
        let local_path = config
            .root
            .join(&config.base_path)
            .join(relative.split('/').collect::<std::path::PathBuf>());
        let remote_path = join_remote(&config.destination_root, &relative);
        let timeout = config.transfer_timeout;
        async move {
            if cancel.is_cancelled() {
                return Outcome::Cancelled(relative);
            }
            match upload_one(remote, &remote_path, &local_path, timeout).await {
                Ok(()) => {
                    info!(path = %relative, "[SYNC] Uploaded");
                    Outcome::Uploaded(relative)
                }
                Err(cause) => {
                    error!(path = %relative, cause = %cause, "[SYNC] Transfer failed");
                    Outcome::Failed(FileFailure {
                        path: relative,
                        cause,
                    })
                }
            }
        }
    }))
    .buffer_unordered(config.concurrency_limit.max(1))
    .collect::<Vec<_>>()
    .await;

    let mut uploaded = Vec::new();
    let mut cancelled = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Uploaded(path) => uploaded.push(path),
            Outcome::Failed(failure) => failed.push(failure),
            Outcome::Cancelled(path) => cancelled.push(path),
        }
    }

    // Completion order of concurrent uploads must not leak into the report.
    uploaded.sort();
    skipped.sort();
    cancelled.sort();
    failed.sort_by(|a, b| a.path.cmp(&b.path));

    let report = SyncReport {
        matched,
        uploaded,
        skipped,
        failed,
        cancelled,
    };
    info!(
        uploaded = report.uploaded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        cancelled = report.cancelled.len(),
        "[SYNC] Sync complete"
    );
    Ok(report)
}

async fn upload_one<R>(
    remote: &R,
    remote_path: &str,
    local: &Path,
    timeout: Duration,
) -> Result<(), String>
where
    R: RemoteStore,
{
    if let Some(parent) = remote_parent(remote_path) {
        remote
            .ensure_dir(parent)
            .await
            .map_err(|e| format!("creating remote directory '{parent}': {e}"))?;
    }
    match tokio::time::timeout(timeout, remote.upload(remote_path, local)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!(
            "transfer timed out after {}s",
            timeout.as_secs()
        )),
    }
}

/// Join the destination root and a relative path with a single separator.
fn join_remote(root: &str, relative: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() && !root.starts_with('/') {
        relative.to_string()
    } else {
        format!("{trimmed}/{relative}")
    }
}

/// The directory portion of a remote path, if any.
fn remote_parent(path: &str) -> Option<&str> {
    match path.rsplit_once('/') {
        Some(("", _)) | None => None,
        Some((parent, _)) => Some(parent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_remote_handles_trailing_slash() {
        assert_eq!(join_remote("/www/site/", "css/app.css"), "/www/site/css/app.css");
        assert_eq!(join_remote("/www/site", "index.html"), "/www/site/index.html");
    }

    #[test]
    fn join_remote_handles_server_root() {
        assert_eq!(join_remote("/", "index.html"), "/index.html");
        assert_eq!(join_remote("", "index.html"), "index.html");
    }

    #[test]
    fn remote_parent_of_nested_path() {
        assert_eq!(remote_parent("/www/site/css/app.css"), Some("/www/site/css"));
        assert_eq!(remote_parent("site/index.html"), Some("site"));
        assert_eq!(remote_parent("index.html"), None);
        assert_eq!(remote_parent("/index.html"), None);
    }

    #[test]
    fn cancel_token_is_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
