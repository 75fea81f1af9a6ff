// SPDX-License-Identifier: MIT
//! Project registry — enumerates the AR demos under the projects root.
//!
//! A project is a directory directly under the root that contains an
//! `index.html` entry file. Each scan reads the tree fresh (no caching) and
//! degrades on failure: a missing root is created, unreadable entries are
//! skipped, and a broken metadata sidecar shrinks one descriptor rather than
//! failing the scan. A scan never returns an error to its caller.

mod metadata;

pub use metadata::{Instructions, ProjectMetadata};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

/// File that marks a directory as a project.
pub const ENTRY_FILE: &str = "index.html";
/// Per-project metadata sidecar.
pub const METADATA_FILE: &str = "metadata.json";

/// One gallery entry, as returned by [`ProjectRegistry::scan`] and serialized
/// onto the wire.
///
/// Metadata fields are merged in field-by-field ([`ProjectMetadata`] is a
/// validated partial record), so sidecar keys can never collide with `id`,
/// `name`, `path`, `lastModified`, or `hasMetadata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    /// Folder name lowercased, whitespace runs collapsed to a hyphen. Two
    /// folders may normalize to the same id; both are returned and listing
    /// order decides which one a caller indexing by id ends up with.
    pub id: String,
    /// Raw folder name, unmodified.
    pub name: String,
    /// Browser-servable URL of the entry file.
    pub path: String,
    #[serde(flatten)]
    pub metadata: Option<ProjectMetadata>,
    /// Modification time of the entry file. `None` only if the stat failed.
    pub last_modified: Option<DateTime<Utc>>,
    /// True when the sidecar parsed or was just synthesized; false when a
    /// sidecar exists on disk but is malformed.
    pub has_metadata: bool,
}

/// Derive a project id from its folder name: lowercase, each whitespace run
/// replaced by a single hyphen.
pub fn normalize_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_run {
                id.push('-');
                in_run = true;
            }
        } else {
            id.push(c);
            in_run = false;
        }
    }
    id
}

/// Stateless scanner over one projects root.
pub struct ProjectRegistry {
    projects_dir: PathBuf,
}

impl ProjectRegistry {
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Enumerate eligible projects, creating default metadata sidecars where
    /// absent. Order is whatever the host directory listing yields — callers
    /// must not depend on it.
    pub fn scan(&self) -> Vec<ProjectDescriptor> {
        let mut projects = Vec::new();

        if !self.projects_dir.exists() {
            if let Err(e) = fs::create_dir_all(&self.projects_dir) {
                error!(dir = %self.projects_dir.display(), err = %e, "cannot create projects root");
            } else {
                debug!(dir = %self.projects_dir.display(), "created empty projects root");
            }
            return projects;
        }

        let entries = match fs::read_dir(&self.projects_dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %self.projects_dir.display(), err = %e, "cannot list projects root");
                return projects;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(err = %e, "unreadable directory entry — skipping");
                    continue;
                }
            };
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let entry_file = dir.join(ENTRY_FILE);
            if !entry_file.is_file() {
                debug!(dir = %dir.display(), "no entry file — not a project");
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = metadata::reconcile(&dir, &name);
            let has_metadata = meta.is_some();
            let last_modified = fs::metadata(&entry_file)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .map_err(|e| warn!(project = %name, err = %e, "cannot stat entry file"))
                .ok();

            projects.push(ProjectDescriptor {
                id: normalize_id(&name),
                path: format!("/projects/{name}/{ENTRY_FILE}"),
                name,
                metadata: meta,
                last_modified,
                has_metadata,
            });
        }

        projects
    }

    /// Raw listing of the projects root, files and ineligible folders
    /// included. Used by the debug scan endpoint.
    pub fn raw_listing(&self) -> Vec<String> {
        match fs::read_dir(&self.projects_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(e) => {
                warn!(dir = %self.projects_dir.display(), err = %e, "cannot list projects root");
                Vec::new()
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn make_project(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ENTRY_FILE), "<html><title>demo</title></html>").unwrap();
        dir
    }

    #[test]
    fn test_missing_root_is_created_and_scan_is_empty() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("does").join("not").join("exist");
        let registry = ProjectRegistry::new(&root);

        let projects = registry.scan();
        assert!(projects.is_empty());
        assert!(root.is_dir(), "scan should create the projects root");
    }

    #[test]
    fn test_folder_without_entry_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("bar")).unwrap();
        fs::write(tmp.path().join("bar").join("notes.txt"), "x").unwrap();
        make_project(tmp.path(), "foo");

        let projects = ProjectRegistry::new(tmp.path()).scan();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "foo");
    }

    #[test]
    fn test_plain_files_under_root_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.md"), "not a project").unwrap();

        let projects = ProjectRegistry::new(tmp.path()).scan();
        assert!(projects.is_empty());
    }

    #[test]
    fn test_scan_synthesizes_default_metadata() {
        let tmp = TempDir::new().unwrap();
        let dir = make_project(tmp.path(), "foo");

        let projects = ProjectRegistry::new(tmp.path()).scan();
        assert_eq!(projects.len(), 1);
        let p = &projects[0];
        assert_eq!(p.id, "foo");
        assert_eq!(p.name, "foo");
        assert_eq!(p.path, "/projects/foo/index.html");
        assert!(p.has_metadata);
        assert!(p.last_modified.is_some());

        let meta = p.metadata.as_ref().expect("default metadata");
        assert_eq!(meta.description.as_deref(), Some("foo AR experience"));
        assert_eq!(meta.author.as_deref(), Some("AR Projects Team"));
        assert_eq!(meta.technologies, vec!["A-Frame", "AR.js", "WebXR"]);
        assert_eq!(meta.instructions, vec!["Allow camera access when prompted"]);

        // Sidecar persisted on disk
        let sidecar = dir.join(METADATA_FILE);
        assert!(sidecar.is_file());
        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
        assert_eq!(on_disk["author"], "AR Projects Team");
        assert_eq!(on_disk["version"], "1.0.0");
    }

    #[test]
    fn test_scan_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = make_project(tmp.path(), "foo");
        let registry = ProjectRegistry::new(tmp.path());

        let first = registry.scan();
        let sidecar_bytes = fs::read(dir.join(METADATA_FILE)).unwrap();
        let second = registry.scan();

        assert_eq!(first, second);
        assert_eq!(
            sidecar_bytes,
            fs::read(dir.join(METADATA_FILE)).unwrap(),
            "second scan must not rewrite an existing sidecar"
        );
    }

    #[test]
    fn test_existing_sidecar_is_read_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let dir = make_project(tmp.path(), "foo");
        fs::write(
            dir.join(METADATA_FILE),
            r#"{"description": "hand written", "author": "me", "rating": 5}"#,
        )
        .unwrap();

        let projects = ProjectRegistry::new(tmp.path()).scan();
        let meta = projects[0].metadata.as_ref().unwrap();
        assert_eq!(meta.description.as_deref(), Some("hand written"));
        assert_eq!(meta.author.as_deref(), Some("me"));
        assert_eq!(meta.extra["rating"], 5);
    }

    #[test]
    fn test_malformed_sidecar_degrades_and_is_left_untouched() {
        let tmp = TempDir::new().unwrap();
        let dir = make_project(tmp.path(), "foo");
        let garbage = b"{ not json at all".to_vec();
        fs::write(dir.join(METADATA_FILE), &garbage).unwrap();

        let projects = ProjectRegistry::new(tmp.path()).scan();
        assert_eq!(projects.len(), 1);
        assert!(!projects[0].has_metadata);
        assert!(projects[0].metadata.is_none());
        assert_eq!(
            fs::read(dir.join(METADATA_FILE)).unwrap(),
            garbage,
            "malformed sidecar must be left byte-for-byte intact"
        );
    }

    #[test]
    fn test_normalized_id_collision_returns_both() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path(), "My Demo");
        make_project(tmp.path(), "my-demo");

        let projects = ProjectRegistry::new(tmp.path()).scan();
        assert_eq!(projects.len(), 2);
        assert!(projects.iter().all(|p| p.id == "my-demo"));
        // Raw names survive even when ids collide
        let mut names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["My Demo", "my-demo"]);
    }

    #[test]
    fn test_end_to_end_single_eligible_project() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path(), "foo");
        fs::create_dir(tmp.path().join("bar")).unwrap();

        let projects = ProjectRegistry::new(tmp.path()).scan();
        assert_eq!(projects.len(), 1);
        let p = &projects[0];
        assert_eq!(p.id, "foo");
        assert_eq!(p.name, "foo");
        assert_eq!(p.path, "/projects/foo/index.html");
        assert!(p.has_metadata);
        let meta = p.metadata.as_ref().unwrap();
        assert!(meta.description.is_some());
        assert!(meta.author.is_some());
        assert!(!meta.technologies.is_empty());
        assert!(!meta.instructions.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_readonly_project_still_served_with_in_memory_default() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = make_project(tmp.path(), "foo");
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits don't bind for root — nothing to observe there.
        if fs::write(dir.join(".probe"), b"x").is_ok() {
            let _ = fs::remove_file(dir.join(".probe"));
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let projects = ProjectRegistry::new(tmp.path()).scan();
        assert_eq!(projects.len(), 1);
        // Write failed, but the synthesized default still backs the response.
        assert!(projects[0].has_metadata);
        assert!(!dir.join(METADATA_FILE).exists());

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_normalize_id_examples() {
        assert_eq!(normalize_id("My Demo"), "my-demo");
        assert_eq!(normalize_id("ar object"), "ar-object");
        assert_eq!(normalize_id("Tabs\tand  spaces"), "tabs-and-spaces");
        assert_eq!(normalize_id(" padded "), "-padded-");
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path(), "foo");

        let projects = ProjectRegistry::new(tmp.path()).scan();
        let wire = serde_json::to_value(&projects[0]).unwrap();
        assert_eq!(wire["id"], "foo");
        assert_eq!(wire["hasMetadata"], true);
        assert!(wire["lastModified"].is_string());
        // Metadata fields merge to the top level, with no nested object
        assert_eq!(wire["author"], "AR Projects Team");
        assert!(wire.get("metadata").is_none());
    }

    proptest! {
        #[test]
        fn prop_normalize_id_is_idempotent(name in "\\PC{0,40}") {
            let once = normalize_id(&name);
            prop_assert_eq!(normalize_id(&once), once);
        }

        #[test]
        fn prop_normalize_id_has_no_whitespace(name in "\\PC{0,40}") {
            prop_assert!(!normalize_id(&name).chars().any(char::is_whitespace));
        }
    }
}
