/// `load_config` module: resolves the named environment variables into the
/// core configuration structs.
///
/// This is the only place where the process environment is read and mapped
/// to rich, strongly-typed internal structs. The invocation surface takes no
/// arguments: credentials, destination roots and the compiled output folder
/// all come from named variables (a `.env` file is honored by `main`), and
/// the glob set is a fixed constant shape anchored on the output folder.
///
/// # Errors
/// Missing or unparsable required values fail with a
/// [`SyncError::Configuration`] naming the variable, before any connection
/// attempt. Build-side commands all have defaults and cannot fail to load.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use siteship_core::config::{BuildConfig, Credentials, SyncConfig};
use siteship_core::error::SyncError;

/// Which destination root a sync run publishes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployTarget {
    Staging,
    Production,
}

impl DeployTarget {
    pub fn name(&self) -> &'static str {
        match self {
            DeployTarget::Staging => "staging",
            DeployTarget::Production => "production",
        }
    }

    fn root_var(&self) -> &'static str {
        match self {
            DeployTarget::Staging => "FTP_STAGING_ROOT",
            DeployTarget::Production => "FTP_PRODUCTION_ROOT",
        }
    }
}

fn require(name: &str) -> Result<String, SyncError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(SyncError::Configuration {
            name: name.to_string(),
            message: "environment variable is set but empty".to_string(),
        }),
        Err(_) => Err(SyncError::missing_env(name)),
    }
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, SyncError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| SyncError::Configuration {
            name: name.to_string(),
            message: format!("'{raw}' is not a valid value"),
        }),
    }
}

/// The fixed glob shape for deployment: everything under the output folder
/// except its scratch subdirectory.
pub fn deploy_globs(dist_dir: &str) -> Vec<String> {
    vec![format!("{dist_dir}/**"), format!("!{dist_dir}/tmp/**")]
}

/// Resolve the sync configuration for `target` from the environment.
pub fn deploy_config(target: DeployTarget) -> Result<SyncConfig, SyncError> {
    let credentials = Credentials {
        host: require("FTP_HOST")?,
        user: require("FTP_USER")?,
        password: require("FTP_PASSWORD")?,
    };
    let destination_root = require(target.root_var())?;
    let dist_dir = optional("DIST_DIR", "dist");
    let concurrency_limit: usize = parse_var("SYNC_CONCURRENCY", 10)?;
    if concurrency_limit == 0 {
        return Err(SyncError::Configuration {
            name: "SYNC_CONCURRENCY".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    let timeout_secs: u64 = parse_var("SYNC_TIMEOUT_SECS", 30)?;

    info!(
        target = target.name(),
        host = %credentials.host,
        "Resolved deploy configuration from environment"
    );
    Ok(SyncConfig {
        root: PathBuf::from("."),
        local_globs: deploy_globs(&dist_dir),
        base_path: PathBuf::from(dist_dir),
        destination_root,
        credentials,
        concurrency_limit,
        transfer_timeout: Duration::from_secs(timeout_secs),
    })
}

/// Resolve the build configuration. Every task command has a default and
/// can be overridden through its environment variable.
pub fn build_config() -> BuildConfig {
    let dist_dir = optional("DIST_DIR", "dist");
    BuildConfig {
        root: PathBuf::from("."),
        dist_dir: PathBuf::from(&dist_dir),
        styles_command: optional(
            "STYLES_CMD",
            &format!("npx sass src/styles:{dist_dir}/styles --no-source-map"),
        ),
        scripts_command: optional(
            "SCRIPTS_CMD",
            &format!("npx esbuild src/scripts/main.js --bundle --minify --outfile={dist_dir}/scripts/main.js"),
        ),
        images_command: optional(
            "IMAGES_CMD",
            &format!("npx imagemin-cli src/images --out-dir={dist_dir}/images"),
        ),
        serve_command: optional(
            "SERVE_CMD",
            &format!("npx browser-sync start --server {dist_dir} --files {dist_dir}"),
        ),
        asset_globs: vec!["static/**".to_string()],
        asset_base: PathBuf::from("static"),
    }
}
