//! Per-mesh concurrency controller.
//!
//! Write operations that touch a single mesh (branch create/delete, correct
//! pointer moves, commit create/delete) must be serialised against each
//! other, while writes to different meshes must proceed in parallel. This
//! mirrors the `commit_locks: DashMap<BranchId, Mutex<()>>` pattern used for
//! per-branch commit serialisation in the pack's transaction manager,
//! keyed here by mesh name instead of branch id since the correct pointer
//! and branch directory both live at mesh scope.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

/// A guard held while a mesh's critical section is active. Dropping it
/// releases the mesh lock.
pub struct MeshGuard {
    _lock: parking_lot::lock_api::ArcMutexGuard<parking_lot::RawMutex, ()>,
}

/// Maps mesh names to a lightweight mutex guarding that mesh's write
/// critical section.
///
/// Entries are never removed: a mesh that is deleted and recreated with the
/// same name reuses the same mutex, which is harmless since the mutex
/// guards ordering only, not any mesh-specific state.
#[derive(Default)]
pub struct MeshLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MeshLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for `mesh`, blocking the current thread until it is
    /// available. The returned guard releases the lock on drop.
    #[must_use]
    pub fn lock(&self, mesh: &str) -> MeshGuard {
        let entry = self
            .locks
            .entry(mesh.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = Mutex::lock_arc(&entry);
        MeshGuard { _lock: guard }
    }
}
