//! The repository engine: ties path resolution, atomic writes, scanning,
//! migration, and per-mesh locking into the small set of operations the
//! HTTP surface dispatches to.
//!
//! Every mutating method here acquires the affected mesh's lock, performs
//! its filesystem mutation through the Path Resolver and Atomic Writer,
//! rebuilds and persists the forest, then releases the lock — the
//! dispatch rule of the design's HTTP Surface component.

use std::path::{Path, PathBuf};

use crate::clock::now_iso8601;
use crate::commit_id;
use crate::config::RepoConfig;
use crate::error::EngineError;
use crate::lock::MeshLocks;
use crate::migration::{self, MigrationCache};
use crate::model::{CommitDocument, CorrectPointerDoc, Forest};
use crate::paths::{sanitize, Paths};
use crate::scanner;

/// Outcome of a branch-creation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchCreated {
    pub mesh: String,
    pub branch: String,
}

/// Outcome of a commit-creation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitCreated {
    pub mesh: String,
    pub branch: String,
    pub commit_id: String,
    pub document: CommitDocument,
}

/// The repository engine bound to a single on-disk root.
pub struct Repository {
    paths: Paths,
    config: RepoConfig,
    locks: MeshLocks,
    migration_cache: MigrationCache,
}

impl Repository {
    /// Open a repository rooted at `root`, loading `engine.toml` if present.
    ///
    /// # Errors
    /// Returns an error if `engine.toml` exists but cannot be parsed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        let config = RepoConfig::load(&root)?;
        Ok(Self {
            paths: Paths::new(root),
            config,
            locks: MeshLocks::new(),
            migration_cache: MigrationCache::new(),
        })
    }

    /// The repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Run any pending lazy migrations for this root, then rebuild and
    /// persist the forest from the ground-truth filesystem.
    ///
    /// This is the `rescan` recovery primitive: callers invoke it whenever
    /// they suspect the persisted forest has drifted from the filesystem.
    /// Both migration patterns run here: the mesh-level commit-index
    /// promotion (gated by [`MigrationCache`] so it only re-scans the tree
    /// once per process until something changes) and the per-commit
    /// `data_version` upgrade (cheap to re-run: a commit already at the
    /// current version is a no-op), since a caller invoking `rescan` is
    /// exactly the "first touch" this crate has no other occasion to apply
    /// commit-document migration on.
    ///
    /// # Errors
    /// Returns an error if the tree cannot be scanned or the forest cannot
    /// be written.
    pub fn rescan(&self) -> Result<Forest, EngineError> {
        if self.migration_cache.check_migration_needed(self.root())? {
            migration::migrate_commit_indexes_to_branches(self.root())?;
            self.migration_cache.clear(Some(self.root()));
        }
        let (migrated, failed) = migration::migrate_all_commits(self.root())?;
        if migrated > 0 || failed > 0 {
            tracing::info!(migrated, failed, "commit document migration complete");
        }
        self.rebuild_and_persist_forest()
    }

    /// List every mesh in the repository.
    ///
    /// # Errors
    /// Returns an error if the root exists but cannot be read.
    pub fn list_meshes(&self) -> Result<Vec<String>, EngineError> {
        scanner::list_meshes(&self.paths)
    }

    /// List every branch of `mesh`.
    ///
    /// # Errors
    /// Returns an error if the mesh directory exists but cannot be read.
    pub fn list_branches(&self, mesh: &str) -> Result<Vec<String>, EngineError> {
        scanner::list_branches(&self.paths, mesh)
    }

    /// List every commit of `branch` within `mesh`, newest first.
    ///
    /// # Errors
    /// Returns an error if the branch directory exists but cannot be read.
    pub fn list_commits(&self, mesh: &str, branch: &str) -> Result<Vec<String>, EngineError> {
        scanner::list_commits(&self.paths, mesh, branch)
    }

    /// Read `mesh`'s correct-pointer branch name, if set.
    ///
    /// # Errors
    /// Returns an error if `correct.json` exists but cannot be parsed.
    pub fn read_correct(&self, mesh: &str) -> Result<Option<String>, EngineError> {
        scanner::read_correct(&self.paths, mesh)
    }

    /// Read the persisted forest, rebuilding it if no forest has ever been
    /// written for this root.
    ///
    /// # Errors
    /// Returns an error if the forest cannot be read or (on first build)
    /// the tree cannot be scanned.
    pub fn read_forest(&self) -> Result<Forest, EngineError> {
        match crate::atomic::read_json_opt(&self.paths.forest_path())? {
            Some(forest) => Ok(forest),
            None => self.rebuild_and_persist_forest(),
        }
    }

    /// Create `branch` on `mesh` if it does not already exist.
    ///
    /// Idempotent: a pre-existing branch directory is a success.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the forest
    /// cannot be rebuilt and persisted.
    pub fn create_branch(&self, mesh: &str, branch: &str) -> Result<BranchCreated, EngineError> {
        let mesh = sanitize(mesh);
        let branch = sanitize(branch);
        let _guard = self.locks.lock(&mesh);

        std::fs::create_dir_all(self.paths.branch_dir(&mesh, &branch))?;
        self.rebuild_and_persist_forest()?;

        Ok(BranchCreated { mesh, branch })
    }

    /// Delete `branch` on `mesh`, unless it is the mesh's correct pointer.
    ///
    /// Best-effort idempotent: deleting an already-absent branch succeeds.
    ///
    /// # Errors
    /// Returns [`EngineError::CorrectBranchUndeletable`] if `branch` is the
    /// mesh's current correct pointer, or a filesystem error.
    pub fn delete_branch(&self, mesh: &str, branch: &str) -> Result<(), EngineError> {
        let mesh = sanitize(mesh);
        let branch = sanitize(branch);
        let _guard = self.locks.lock(&mesh);

        if let Some(current) = scanner::read_correct(&self.paths, &mesh)? {
            if current == branch {
                return Err(EngineError::CorrectBranchUndeletable { mesh, branch });
            }
        }

        let dir = self.paths.branch_dir(&mesh, &branch);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir)?;
        }
        self.rebuild_and_persist_forest()?;
        Ok(())
    }

    /// Point `mesh`'s correct pointer at `branch`.
    ///
    /// # Errors
    /// Returns [`EngineError::BranchNotFound`] if `branch` does not exist
    /// on disk, or a filesystem error.
    pub fn set_correct(&self, mesh: &str, branch: &str) -> Result<CorrectPointerDoc, EngineError> {
        let mesh = sanitize(mesh);
        let branch = sanitize(branch);
        let _guard = self.locks.lock(&mesh);

        let branches = scanner::list_branches(&self.paths, &mesh)?;
        if !branches.iter().any(|b| b == &branch) {
            return Err(EngineError::BranchNotFound { mesh, branch });
        }

        let doc = CorrectPointerDoc::new(branch, now_iso8601());
        crate::atomic::write_json(&self.paths.correct_path(&mesh), &doc)?;
        self.rebuild_and_persist_forest()?;
        Ok(doc)
    }

    /// Mint a new commit on `branch` of `mesh` and write its manifest.
    ///
    /// # Errors
    /// Returns an error if the branch's existing commits cannot be listed
    /// or the commit manifest or forest cannot be written.
    pub fn create_commit(
        &self,
        mesh: &str,
        branch: &str,
        message: Option<String>,
        tag: Option<String>,
    ) -> Result<CommitCreated, EngineError> {
        let mesh = sanitize(mesh);
        let branch = sanitize(branch);
        let _guard = self.locks.lock(&mesh);

        let existing = scanner::list_commits(&self.paths, &mesh, &branch)?;
        let commit_id = commit_id::mint(&existing, self.config.commit.collision_suffix);

        let document = CommitDocument::new(&mesh, &branch, now_iso8601(), message, tag, None);
        crate::atomic::write_json(
            &self.paths.commit_json_path(&mesh, &branch, &commit_id),
            &document,
        )?;
        self.rebuild_and_persist_forest()?;

        Ok(CommitCreated {
            mesh,
            branch,
            commit_id,
            document,
        })
    }

    /// Delete a commit. Best-effort idempotent: deleting an already-absent
    /// commit succeeds.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be removed or the forest
    /// cannot be rebuilt and persisted.
    pub fn delete_commit(
        &self,
        mesh: &str,
        branch: &str,
        commit_id: &str,
    ) -> Result<(), EngineError> {
        let mesh = sanitize(mesh);
        let branch = sanitize(branch);
        let commit_id = sanitize(commit_id);
        let _guard = self.locks.lock(&mesh);

        let dir = self.paths.commit_dir(&mesh, &branch, &commit_id);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir)?;
        }
        self.rebuild_and_persist_forest()?;
        Ok(())
    }

    fn rebuild_and_persist_forest(&self) -> Result<Forest, EngineError> {
        let forest = scanner::build_forest(&self.paths)?;
        crate::atomic::write_json(&self.paths.forest_path(), &forest)?;
        Ok(forest)
    }
}
