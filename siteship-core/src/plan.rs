//! Transfer decisions: which manifest entries actually need to move.
//!
//! A remote file is stale relative to its local counterpart when it is absent
//! or strictly older by modification time. Staleness is always computed
//! against a fresh remote query; nothing is cached between runs.

use chrono::{DateTime, Utc};

use crate::manifest::FileManifestEntry;

/// Outcome of comparing a local file against its remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Upload,
    Skip,
}

/// A per-file decision, keyed by the remote-relative path.
#[derive(Debug, Clone)]
pub struct TransferDecision {
    pub relative_path: String,
    pub action: Action,
}

/// Decide whether `local` must be uploaded given the remote state.
///
/// `None` means the file does not exist remotely and is always uploaded.
/// Equal timestamps skip: only a strictly newer local file travels.
pub fn decide(local: &FileManifestEntry, remote_modified: Option<DateTime<Utc>>) -> Action {
    match remote_modified {
        None => Action::Upload,
        Some(remote) if remote < local.modified => Action::Upload,
        Some(_) => Action::Skip,
    }
}
