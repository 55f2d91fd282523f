//! Asset path resolution.

use std::path::{Path, PathBuf};

/// Environment variable naming the directory relative asset paths live under.
pub const ASSET_ROOT_ENV: &str = "SPROUT_ASSET_ROOT";

/// Resolves an asset path against `SPROUT_ASSET_ROOT`.
///
/// Absolute paths and unset (or empty) roots leave `path` untouched.
pub fn resolve(path: &Path) -> PathBuf {
    let root = std::env::var_os(ASSET_ROOT_ENV).filter(|r| !r.is_empty());
    resolve_with(root.as_deref().map(Path::new), path)
}

fn resolve_with(root: Option<&Path>, path: &Path) -> PathBuf {
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}
