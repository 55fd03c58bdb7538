//! File system utilities

use std::path::{Path, PathBuf};

/// Locate the configured downloader executable
///
/// Bare program names are left for `PATH` lookup. Relative paths are tried
/// against the working directory first and then against the directory that
/// holds the running binary, which is where bundled tools are installed.
/// When nothing exists the configured path is returned unchanged and the
/// spawn reports the failure.
pub fn resolve_executable(configured: &str) -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_executable_in(configured, exe_dir.as_deref())
}

pub fn resolve_executable_in(configured: &str, exe_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(configured);
    if path.is_absolute() || path.components().count() <= 1 {
        return path;
    }
    if path.exists() {
        return path;
    }
    if let Some(dir) = exe_dir {
        let bundled = dir.join(&path);
        if bundled.exists() {
            tracing::debug!("Using bundled downloader at {:?}", bundled);
            return bundled;
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bare_names_are_left_for_path_lookup() {
        assert_eq!(resolve_executable_in("yt-dlp", None), PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let dir = TempDir::new().unwrap();
        let absolute = dir.path().join("youtube-dl");
        let configured = absolute.to_string_lossy().to_string();
        assert_eq!(resolve_executable_in(&configured, None), absolute);
    }

    #[test]
    fn test_relative_path_falls_back_to_binary_dir() {
        let dir = TempDir::new().unwrap();
        let resources = dir.path().join("bundle-test-resources");
        std::fs::create_dir_all(&resources).unwrap();
        std::fs::write(resources.join("youtube-dl"), b"#!/bin/sh\n").unwrap();

        let resolved =
            resolve_executable_in("bundle-test-resources/youtube-dl", Some(dir.path()));
        assert_eq!(resolved, resources.join("youtube-dl"));
    }

    #[test]
    fn test_unresolvable_path_is_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_executable_in("missing-resources/youtube-dl", Some(dir.path()));
        assert_eq!(resolved, PathBuf::from("missing-resources/youtube-dl"));
    }
}
