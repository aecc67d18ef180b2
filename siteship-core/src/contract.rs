//! # contract: interface between the sync pipeline and the remote side
//!
//! This module defines the single trait ([`RemoteStore`]) the orchestration
//! layer speaks to. A concrete implementation owns connection handling,
//! authentication and transport (the CLI crate ships an FTP one); tests use
//! the generated mock or a hand-rolled in-memory fake.
//!
//! ## Interface & Extensibility
//! - Implement [`RemoteStore`] to add a new transfer backend (SFTP, S3, ...).
//! - All methods are async and return boxed errors; the orchestration layer
//!   turns them into per-file failures, so implementors only need to surface
//!   a descriptive cause.
//! - Paths are remote-absolute, `/`-separated strings; the trait is agnostic
//!   of how the backend maps them.
//!
//! ## Mocking & Testing
//! The trait is annotated for `mockall`, so consumers can generate
//! deterministic mocks for unit and integration tests.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::{automock, predicate::*};

/// Error type for remote operations (simple boxed error).
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for querying and writing files on the remote destination.
///
/// Implementations must support concurrent use up to the configured
/// concurrency limit, either over one shared session or a pool of them.
/// Connection and authentication belong to the implementor's constructor:
/// by the time a `RemoteStore` value exists, the session is usable.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Modification time of the remote file, or `None` if it does not exist.
    async fn modified_time(&self, path: &str) -> Result<Option<DateTime<Utc>>, RemoteError>;

    /// Create the remote directory, including intermediate segments.
    /// Must be idempotent: an already-existing directory is not an error.
    async fn ensure_dir(&self, path: &str) -> Result<(), RemoteError>;

    /// Stream the local file's bytes to the remote path.
    /// The parent directory is guaranteed to exist by the caller.
    async fn upload(&self, path: &str, local: &Path) -> Result<(), RemoteError>;
}
