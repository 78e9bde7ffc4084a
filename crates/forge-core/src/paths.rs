//! Path resolution: mapping logical mesh/branch/commit names to filesystem
//! paths under a repository root, via a character-class sanitizer.
//!
//! No path ever contains a `..` segment derived from user input, because
//! `sanitize` strips every character outside `[A-Za-z0-9._-]` before the
//! name ever reaches a `PathBuf`.

use std::path::{Path, PathBuf};

/// The name used when sanitisation would otherwise produce an empty string.
pub const UNTITLED: &str = "untitled";

/// The reserved root-level file name that is never treated as a mesh.
pub const FOREST_FILE: &str = "forest.json";

/// Sanitise a logical name into a safe filesystem path segment.
///
/// 1. Trim surrounding whitespace.
/// 2. Replace every run of spaces with a single underscore.
/// 3. Drop every character outside `[A-Za-z0-9._-]`.
/// 4. If the result is empty, fall back to [`UNTITLED`].
///
/// Idempotent: `sanitize(sanitize(s)) == sanitize(s)` for all `s`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let trimmed = name.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut last_was_space = false;
    for c in trimmed.chars() {
        if c == ' ' {
            if !last_was_space {
                out.push('_');
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
            out.push(c);
        }
    }
    if out.is_empty() {
        UNTITLED.to_owned()
    } else {
        out
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Resolves logical names into filesystem paths rooted at a repository root.
///
/// All methods sanitise their inputs; callers never need to sanitise before
/// calling.
#[derive(Clone, Debug)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Create a path resolver for the given repository root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path to the repository-wide forest index.
    #[must_use]
    pub fn forest_path(&self) -> PathBuf {
        self.root.join(FOREST_FILE)
    }

    /// The path to the engine configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("engine.toml")
    }

    /// The directory for a mesh.
    #[must_use]
    pub fn mesh_dir(&self, mesh: &str) -> PathBuf {
        self.root.join(sanitize(mesh))
    }

    /// The path to a mesh's correct-pointer document.
    #[must_use]
    pub fn correct_path(&self, mesh: &str) -> PathBuf {
        self.mesh_dir(mesh).join("correct.json")
    }

    /// The directory for a branch within a mesh.
    #[must_use]
    pub fn branch_dir(&self, mesh: &str, branch: &str) -> PathBuf {
        self.mesh_dir(mesh).join(sanitize(branch))
    }

    /// The legacy mesh-level consolidated commit index (pre-migration layout).
    #[must_use]
    pub fn legacy_commits_index_path(&self, mesh: &str) -> PathBuf {
        self.mesh_dir(mesh).join("commits_index.json")
    }

    /// The per-branch commit index maintained by collaborators.
    #[must_use]
    pub fn branch_commits_index_path(&self, mesh: &str, branch: &str) -> PathBuf {
        self.branch_dir(mesh, branch).join("commits_index.json")
    }

    /// The directory for a single commit within a branch.
    #[must_use]
    pub fn commit_dir(&self, mesh: &str, branch: &str, commit_id: &str) -> PathBuf {
        self.branch_dir(mesh, branch).join(sanitize(commit_id))
    }

    /// The path to a commit's manifest document.
    #[must_use]
    pub fn commit_json_path(&self, mesh: &str, branch: &str, commit_id: &str) -> PathBuf {
        self.commit_dir(mesh, branch, commit_id).join("commit.json")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
