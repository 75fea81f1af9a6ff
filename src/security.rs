// SPDX-License-Identifier: MIT
//! Path guard for caller-supplied project paths.
//!
//! The editor API takes relative paths from the browser and resolves them
//! against the projects root. Everything goes through [`safe_path`] first; a
//! path that escapes the root is an access violation, not a not-found.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Result};

/// Resolve `relative_path` against `projects_root`, refusing anything that
/// would land outside the root.
///
/// Normalization is purely lexical — `.` and `..` are folded without touching
/// the filesystem, so the guard also rejects paths whose target does not
/// exist yet (e.g. a save creating a new file).
pub fn safe_path(projects_root: &Path, relative_path: &Path) -> Result<PathBuf> {
    if relative_path.is_absolute() {
        bail!(
            "path traversal: absolute path not allowed: {}",
            relative_path.display()
        );
    }

    let resolved = normalize_path(&projects_root.join(relative_path));
    let root = normalize_path(projects_root);
    if !resolved.starts_with(&root) {
        bail!(
            "path traversal: {} escapes the projects root {}",
            relative_path.display(),
            projects_root.display()
        );
    }

    Ok(resolved)
}

/// Fold `.` and `..` components lexically. Unlike `std::fs::canonicalize`
/// this never fails and never follows symlinks; `..` at the root is dropped.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}
