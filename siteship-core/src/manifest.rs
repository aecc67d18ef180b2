//! Local file enumeration: globs in, concrete manifest out.
//!
//! Patterns are resolved against a root directory. A leading `!` marks an
//! exclusion; exclusions always win over inclusions regardless of their
//! position in the pattern list. The result is the manifest: the concrete,
//! ordered set of files a sync run will consider.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// One local file matched by the glob configuration.
#[derive(Debug, Clone)]
pub struct FileManifestEntry {
    /// Path relative to the enumeration root.
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    pub size: u64,
}

/// Enumerate files under `root` matching `globs`.
///
/// Inclusion patterns are compiled before exclusions, so an exclusion beats
/// any inclusion it overlaps with. Entries come back sorted by path, which
/// keeps downstream reports deterministic.
pub fn collect(root: &Path, globs: &[String]) -> SyncResult<Vec<FileManifestEntry>> {
    let mut builder = OverrideBuilder::new(root);
    // Two passes: inclusions first, exclusions second. The matcher gives the
    // last matching pattern precedence, which is exactly "exclusions win".
    for pattern in globs.iter().filter(|g| !g.starts_with('!')) {
        builder.add(pattern).map_err(|e| SyncError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }
    for pattern in globs.iter().filter(|g| g.starts_with('!')) {
        builder.add(pattern).map_err(|e| SyncError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }
    let overrides = builder.build().map_err(|e| SyncError::Pattern {
        pattern: globs.join(", "),
        message: e.to_string(),
    })?;

    let mut entries = Vec::new();
    for result in WalkBuilder::new(root).standard_filters(false).build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        if !overrides.matched(&relative, false).is_whitelist() {
            continue;
        }
        let metadata = std::fs::metadata(entry.path())?;
        let modified = DateTime::<Utc>::from(metadata.modified()?);
        entries.push(FileManifestEntry {
            path: relative,
            modified,
            size: metadata.len(),
        });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        root = %root.display(),
        matched = entries.len(),
        "Manifest enumeration complete"
    );
    Ok(entries)
}

/// Compute the `/`-separated path of `path` relative to `base`.
///
/// Stripping a common prefix is injective, so two distinct manifest entries
/// can never collide on the same relative path.
pub fn relative_path(path: &Path, base: &Path) -> SyncResult<String> {
    let stripped = path
        .strip_prefix(base)
        .map_err(|_| SyncError::PathResolution {
            path: path.to_path_buf(),
            base: base.to_path_buf(),
        })?;
    if stripped.as_os_str().is_empty() {
        return Err(SyncError::PathResolution {
            path: path.to_path_buf(),
            base: base.to_path_buf(),
        });
    }
    let parts: Vec<String> = stripped
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"content").unwrap();
    }

    #[test]
    fn collects_files_matching_inclusions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dist/index.html");
        touch(dir.path(), "dist/css/app.css");
        touch(dir.path(), "notes.txt");

        let entries = collect(dir.path(), &["dist/**".to_string()]).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("dist/css/app.css"),
                PathBuf::from("dist/index.html"),
            ]
        );
    }

    #[test]
    fn exclusions_win_regardless_of_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dist/index.html");
        touch(dir.path(), "dist/tmp/x.txt");

        // Exclusion listed before the inclusion still wins.
        let globs = vec!["!dist/tmp/**".to_string(), "dist/**".to_string()];
        let entries = collect(dir.path(), &globs).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("dist/index.html")]);
    }

    #[test]
    fn empty_glob_set_matches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dist/index.html");
        let entries = collect(dir.path(), &[]).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn invalid_pattern_is_a_fatal_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect(dir.path(), &["dist/{".to_string()]).unwrap_err();
        assert!(matches!(err, SyncError::Pattern { .. }));
    }

    #[test]
    fn relative_path_strips_base_and_uses_forward_slashes() {
        let rel = relative_path(Path::new("dist/css/app.css"), Path::new("dist")).unwrap();
        assert_eq!(rel, "css/app.css");
    }

    #[test]
    fn relative_path_outside_base_fails() {
        let err = relative_path(Path::new("other/file.txt"), Path::new("dist")).unwrap_err();
        assert!(matches!(err, SyncError::PathResolution { .. }));
    }

    #[test]
    fn distinct_files_never_collide() {
        let a = relative_path(Path::new("dist/a/x.txt"), Path::new("dist")).unwrap();
        let b = relative_path(Path::new("dist/a_x.txt"), Path::new("dist")).unwrap();
        assert_ne!(a, b);
    }
}
