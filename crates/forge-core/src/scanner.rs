//! Repository scanner: derives the forest view from the ground-truth
//! filesystem.
//!
//! Every listing function here treats a missing directory as an empty
//! result rather than an error, and skips unreadable entries with a
//! warning instead of failing the whole scan — a single permission-denied
//! subdirectory must not take down a `rescan`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::atomic::read_json_opt;
use crate::clock::now_iso8601;
use crate::error::EngineError;
use crate::model::{BranchEntry, CommitSummary, CorrectPointerDoc, Forest, MeshEntry};
use crate::paths::{Paths, FOREST_FILE};

/// List every mesh directly under the repository root, sorted
/// lexicographically. An absent root is treated as an empty repository.
///
/// # Errors
/// Returns an error only if the root exists but cannot be read.
pub fn list_meshes(paths: &Paths) -> Result<Vec<String>, EngineError> {
    list_subdirectories(paths.root(), |name| name != FOREST_FILE)
}

/// List every branch of a mesh, sorted lexicographically. A missing mesh
/// directory yields an empty list, not an error.
///
/// # Errors
/// Returns an error only if the mesh directory exists but cannot be read.
pub fn list_branches(paths: &Paths, mesh: &str) -> Result<Vec<String>, EngineError> {
    list_subdirectories(&paths.mesh_dir(mesh), |_| true)
}

/// List every commit of a branch, newest first (reverse lexicographic,
/// since identifiers are timestamp-shaped and monotonic). A missing branch
/// directory yields an empty list, not an error.
///
/// # Errors
/// Returns an error only if the branch directory exists but cannot be read.
pub fn list_commits(paths: &Paths, mesh: &str, branch: &str) -> Result<Vec<String>, EngineError> {
    let mut commits = list_subdirectories(&paths.branch_dir(mesh, branch), |_| true)?;
    commits.reverse();
    Ok(commits)
}

/// Read a mesh's correct-pointer branch name, if `correct.json` exists.
///
/// Accepts either the current key `current_branch` or the legacy key
/// `correct_branch` (handled transparently by [`CorrectPointerDoc`]'s serde
/// alias).
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed.
pub fn read_correct(paths: &Paths, mesh: &str) -> Result<Option<String>, EngineError> {
    let doc: Option<CorrectPointerDoc> = read_json_opt(&paths.correct_path(mesh))?;
    Ok(doc.map(|d| d.current_branch))
}

/// Rebuild the full forest index from the filesystem.
///
/// # Errors
/// Returns an error if any directory under the root cannot be read.
pub fn build_forest(paths: &Paths) -> Result<Forest, EngineError> {
    let mut meshes = BTreeMap::new();
    for mesh in list_meshes(paths)? {
        let mut branches = BTreeMap::new();
        for branch in list_branches(paths, &mesh)? {
            let commits = list_commits(paths, &mesh, &branch)?
                .into_iter()
                .map(CommitSummary::bare)
                .collect();
            branches.insert(branch, BranchEntry { commits });
        }
        let correct_branch = read_correct(paths, &mesh)?;
        meshes.insert(
            mesh,
            MeshEntry {
                correct_branch,
                branches,
            },
        );
    }
    Ok(Forest {
        schema_version: crate::model::SCHEMA_VERSION.to_owned(),
        updated_at: now_iso8601(),
        meshes,
    })
}

// ---------------------------------------------------------------------------
// Internal helper
// ---------------------------------------------------------------------------

/// List immediate subdirectories of `dir`, sorted lexicographically.
///
/// A missing `dir` yields an empty list. An entry that cannot be classified
/// (permission denied, stale handle) is skipped with a warning rather than
/// failing the whole scan.
fn list_subdirectories(
    dir: &Path,
    keep: impl Fn(&str) -> bool,
) -> Result<Vec<String>, EngineError> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut out = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "skipping entry with unreadable file type");
                continue;
            }
        };
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if keep(&name) {
            out.push(name);
        }
    }
    out.sort();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
