use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Credentials for the remote host.
///
/// `Debug` is implemented by hand so the password never reaches logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for one conditional remote sync run.
///
/// Globs are anchored at `root`; inclusion patterns come in source order and
/// `!`-prefixed patterns are exclusions that always win. Every matched file
/// must live beneath `base_path`; the remote path of a file is
/// `destination_root` joined with the file's path relative to `base_path`.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory the glob patterns are resolved against.
    pub root: PathBuf,
    /// Ordered inclusion/exclusion patterns, e.g. `["dist/**", "!dist/tmp/**"]`.
    pub local_globs: Vec<String>,
    /// Prefix stripped from matched files to form the remote-relative path.
    pub base_path: PathBuf,
    /// Remote directory the relative paths are planted under.
    pub destination_root: String,
    pub credentials: Credentials,
    /// Upper bound on simultaneously in-flight transfers.
    pub concurrency_limit: usize,
    /// Safety margin per file; expiry is recorded as a transfer failure.
    pub transfer_timeout: Duration,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            root = %self.root.display(),
            base_path = %self.base_path.display(),
            destination_root = %self.destination_root,
            globs = self.local_globs.len(),
            concurrency_limit = self.concurrency_limit,
            "Loaded sync configuration"
        );
        debug!(?self, "Sync configuration (full debug)");
    }
}

/// Configuration for the build side of the pipeline.
///
/// The style/script/image/serve tasks are pure delegation: each holds the
/// external command line that does the actual work. Asset copy is native and
/// driven by the same glob semantics as the sync manifest.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root the build tasks run in.
    pub root: PathBuf,
    /// Compiled output folder, relative to `root`.
    pub dist_dir: PathBuf,
    pub styles_command: String,
    pub scripts_command: String,
    pub images_command: String,
    pub serve_command: String,
    /// Globs selecting static assets to copy verbatim into `dist_dir`.
    pub asset_globs: Vec<String>,
    /// Base stripped from asset paths when planting them under `dist_dir`.
    pub asset_base: PathBuf,
}

impl BuildConfig {
    pub fn trace_loaded(&self) {
        info!(
            root = %self.root.display(),
            dist_dir = %self.dist_dir.display(),
            "Loaded build configuration"
        );
        debug!(?self, "Build configuration (full debug)");
    }
}
