//! One-way schema migrations for on-disk documents.
//!
//! Two independent migrations are supported: upgrading a single
//! `commit.json`'s `data_version` to [`crate::model::CURRENT_COMMIT_DATA_VERSION`],
//! and promoting a legacy mesh-level `commits_index.json` into per-branch
//! indexes. Both are lazy (run on demand, not eagerly on every scan) and
//! idempotent: a document already at the current version is left alone, and
//! a `.backup` is written before any original is overwritten or moved.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde_json::{json, Value};

use crate::atomic::write_json;
use crate::error::EngineError;
use crate::model::{BranchCommitsIndex, LegacyCommitsIndex, CURRENT_COMMIT_DATA_VERSION};

const LEGACY_INDEX_FILE: &str = "commits_index.json";

/// Caches whether a repository root still has legacy mesh-level commit
/// indexes, to avoid re-scanning the tree on every request. Mirrors the
/// reference implementation's module-level migration-status cache.
#[derive(Default)]
pub struct MigrationCache {
    needed: DashMap<PathBuf, bool>,
}

impl MigrationCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `root` has at least one mesh with a legacy
    /// `commits_index.json` awaiting promotion to per-branch indexes.
    ///
    /// # Errors
    /// Returns an error if `root` exists but cannot be read.
    pub fn check_migration_needed(&self, root: &Path) -> Result<bool, EngineError> {
        if let Some(cached) = self.needed.get(root) {
            return Ok(*cached);
        }

        let needed = legacy_index_paths(root)?.next().is_some();
        self.needed.insert(root.to_path_buf(), needed);
        Ok(needed)
    }

    /// Drop the cached answer for `root`, or every cached root if `root` is
    /// `None`. Call after a migration completes so the next check re-scans.
    pub fn clear(&self, root: Option<&Path>) {
        match root {
            Some(root) => {
                self.needed.remove(root);
            }
            None => self.needed.clear(),
        }
    }
}

/// Promote every mesh-level `commits_index.json` under `root` into
/// per-branch `commits_index.json` files, backing up each original as
/// `commits_index.json.backup`.
///
/// Returns the number of branch indexes written. A mesh whose legacy index
/// names a branch with no corresponding directory skips that branch with a
/// warning rather than failing the whole migration.
///
/// # Errors
/// Returns an error if a legacy index cannot be parsed, or a branch index
/// cannot be written.
pub fn migrate_commit_indexes_to_branches(root: &Path) -> Result<usize, EngineError> {
    if !root.exists() {
        return Ok(0);
    }

    let mut migrated = 0usize;
    for old_index_path in legacy_index_paths(root)? {
        let mesh_dir = old_index_path
            .parent()
            .expect("legacy index path always has a parent")
            .to_path_buf();
        let mesh_name = mesh_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let contents = fs::read_to_string(&old_index_path)?;
        let old_index: LegacyCommitsIndex = serde_json::from_str(&contents)?;

        let mut by_branch: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for commit in old_index.commits {
            let branch = if commit.branch.is_empty() {
                "main".to_owned()
            } else {
                commit.branch.clone()
            };
            by_branch.entry(branch).or_default().push(commit);
        }

        for (branch, commits) in by_branch {
            let branch_dir = mesh_dir.join(&branch);
            if !branch_dir.is_dir() {
                tracing::warn!(mesh = %mesh_name, branch = %branch, "branch directory missing, skipping legacy index entries");
                continue;
            }
            let new_index = BranchCommitsIndex {
                commits,
                last_updated: old_index.last_updated.clone(),
                migrated_from: "mesh_level".to_owned(),
            };
            write_json(&branch_dir.join(LEGACY_INDEX_FILE), &new_index)?;
            migrated += 1;
        }

        let backup_path = old_index_path.with_extension("json.backup");
        if let Err(e) = fs::rename(&old_index_path, &backup_path) {
            tracing::warn!(path = %old_index_path.display(), error = %e, "failed to back up legacy commit index");
        }
    }

    Ok(migrated)
}

/// Upgrade a single commit's `commit.json` to
/// [`CURRENT_COMMIT_DATA_VERSION`], backing up the original as
/// `commit.json.backup` the first time it is touched.
///
/// A missing `commit.json` is not an error: it simply has nothing to
/// migrate. A document already at the current version is left untouched.
///
/// # Errors
/// Returns an error if the existing document cannot be parsed or the
/// upgraded document cannot be written.
pub fn migrate_commit_data_format(commit_dir: &Path) -> Result<(), EngineError> {
    let commit_file = commit_dir.join("commit.json");
    if !commit_file.is_file() {
        return Ok(());
    }

    let contents = fs::read_to_string(&commit_file)?;
    let mut data: Value = serde_json::from_str(&contents)?;

    let current_version = data
        .get("data_version")
        .and_then(Value::as_str)
        .unwrap_or("1.0")
        .to_owned();

    if current_version == CURRENT_COMMIT_DATA_VERSION {
        return Ok(());
    }

    tracing::info!(dir = %commit_dir.display(), from = %current_version, to = CURRENT_COMMIT_DATA_VERSION, "migrating commit data format");

    let backup_file = commit_file.with_extension("json.backup");
    if !backup_file.exists() {
        fs::copy(&commit_file, &backup_file)?;
    }

    let object = data
        .as_object_mut()
        .ok_or_else(|| EngineError::Schema {
            path: commit_file.clone(),
            detail: "commit.json is not a JSON object".to_owned(),
        })?;

    object.insert(
        "data_version".to_owned(),
        Value::String(CURRENT_COMMIT_DATA_VERSION.to_owned()),
    );
    object.entry("exported_components").or_insert_with(|| {
        json!({
            "geometry": true,
            "transform": true,
            "materials": true,
            "uv_layout": true,
        })
    });

    write_json(&commit_file, &data)?;
    Ok(())
}

/// Run [`migrate_commit_data_format`] over every commit of every branch of
/// every mesh under `root`.
///
/// Returns `(migrated, failed)` counts. A single commit failing to migrate
/// is logged and counted, not propagated, so one corrupt commit cannot
/// block the rest of the tree.
///
/// # Errors
/// Returns an error only if `root` itself cannot be read.
pub fn migrate_all_commits(root: &Path) -> Result<(usize, usize), EngineError> {
    if !root.exists() {
        return Ok((0, 0));
    }

    let mut migrated = 0usize;
    let mut failed = 0usize;
    for mesh_dir in subdirectories(root)? {
        for branch_dir in subdirectories(&mesh_dir)? {
            if branch_dir.file_name().and_then(|n| n.to_str()) == Some(".backup") {
                continue;
            }
            for commit_dir in subdirectories(&branch_dir)? {
                match migrate_commit_data_format(&commit_dir) {
                    Ok(()) => migrated += 1,
                    Err(e) => {
                        tracing::error!(dir = %commit_dir.display(), error = %e, "failed to migrate commit");
                        failed += 1;
                    }
                }
            }
        }
    }
    Ok((migrated, failed))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            out.push(entry.path());
        }
    }
    Ok(out)
}

fn legacy_index_paths(root: &Path) -> Result<impl Iterator<Item = PathBuf>, EngineError> {
    let mut found = Vec::new();
    for mesh_dir in subdirectories(root)? {
        let candidate = mesh_dir.join(LEGACY_INDEX_FILE);
        if candidate.is_file() {
            found.push(candidate);
        }
    }
    Ok(found.into_iter())
}
