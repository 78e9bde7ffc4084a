//! Serde document shapes for the three schema-bearing documents the engine
//! owns: the forest index, the per-mesh correct pointer, and the per-commit
//! manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The current schema version stamped on forest and correct-pointer documents.
pub const SCHEMA_VERSION: &str = "1.0";

/// The current `data_version` written into new `commit.json` documents.
pub const CURRENT_COMMIT_DATA_VERSION: &str = "1.1";

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// Per-commit metadata as it appears inside a forest or branch listing.
///
/// Forests rebuilt by the scanner only ever populate `id`; the remaining
/// fields are null there. Collaborators that maintain their own richer
/// `commits_index.json` may populate them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// The commit identifier (`YYYY-MM-DD_HH-MM-SS`, possibly suffixed).
    pub id: String,
    /// ISO-8601 creation timestamp, if known.
    #[serde(default)]
    pub datetime: Option<String>,
    /// Commit message, if known.
    #[serde(default)]
    pub message: Option<String>,
    /// Commit tag, if known.
    #[serde(default)]
    pub tag: Option<String>,
}

impl CommitSummary {
    /// A bare summary carrying only the commit id, as produced by a rescan.
    #[must_use]
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            datetime: None,
            message: None,
            tag: None,
        }
    }
}

/// A single branch's commit list within a mesh entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchEntry {
    /// Commits in the branch, newest first.
    pub commits: Vec<CommitSummary>,
}

/// A single mesh's summary within the forest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshEntry {
    /// The mesh's correct branch, if one is set.
    pub correct_branch: Option<String>,
    /// Branches owned by this mesh, keyed by sanitised name.
    pub branches: BTreeMap<String, BranchEntry>,
}

/// The repository-wide forest index persisted at `<root>/forest.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forest {
    /// Document schema version, currently always [`SCHEMA_VERSION`].
    pub schema_version: String,
    /// UTC instant this forest was built, ISO-8601.
    pub updated_at: String,
    /// Meshes keyed by sanitised name, in lexicographic order.
    pub meshes: BTreeMap<String, MeshEntry>,
}

impl Forest {
    /// An empty forest stamped with the given timestamp.
    #[must_use]
    pub fn empty(updated_at: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_owned(),
            updated_at: updated_at.into(),
            meshes: BTreeMap::new(),
        }
    }

    /// Compare two forests for equality ignoring their `updated_at` stamps.
    ///
    /// Used by the idempotence tests in §8: two rebuilds of the same tree
    /// must agree on everything except the timestamp.
    #[must_use]
    pub fn eq_ignoring_timestamp(&self, other: &Self) -> bool {
        self.schema_version == other.schema_version && self.meshes == other.meshes
    }
}

// ---------------------------------------------------------------------------
// Correct pointer
// ---------------------------------------------------------------------------

/// The per-mesh `correct.json` document.
///
/// On read, the legacy key `correct_branch` is accepted as an alias for
/// `current_branch`; new writes always use `current_branch`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectPointerDoc {
    /// Document schema version.
    pub schema_version: String,
    /// The sanitised name of the branch this mesh currently points at.
    #[serde(alias = "correct_branch")]
    pub current_branch: String,
    /// UTC instant this pointer was last written, ISO-8601.
    pub updated_at: String,
}

impl CorrectPointerDoc {
    /// Build a new correct-pointer document for `branch`, stamped `now`.
    #[must_use]
    pub fn new(branch: impl Into<String>, now: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_owned(),
            current_branch: branch.into(),
            updated_at: now.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commit document
// ---------------------------------------------------------------------------

/// The per-commit `commit.json` manifest.
///
/// Application-defined keys beyond the four required ones are preserved
/// verbatim in `extra` — the engine treats commit payloads as opaque except
/// for this schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDocument {
    /// Schema version of this commit document.
    pub data_version: String,
    /// ISO-8601 UTC creation timestamp.
    pub datetime: String,
    /// Sanitised branch name (must match the containing directory).
    pub branch: String,
    /// Sanitised mesh name (must match the containing directory).
    pub mesh_name: String,
    /// Optional commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional commit tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Optional parent commit id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Any additional application-defined keys, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CommitDocument {
    /// Build a new commit document at the current data version.
    #[must_use]
    pub fn new(
        mesh: impl Into<String>,
        branch: impl Into<String>,
        commit_id_datetime: impl Into<String>,
        message: Option<String>,
        tag: Option<String>,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            data_version: CURRENT_COMMIT_DATA_VERSION.to_owned(),
            datetime: commit_id_datetime.into(),
            branch: branch.into(),
            mesh_name: mesh.into(),
            message,
            tag,
            parent_id,
            extra: serde_json::Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Legacy mesh-level commit index (pre-migration layout)
// ---------------------------------------------------------------------------

/// A single entry in the legacy consolidated `commits_index.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCommitIndexEntry {
    /// The commit identifier.
    pub id: String,
    /// Which branch the commit belongs to.
    pub branch: String,
    /// Any additional fields, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The legacy mesh-level consolidated commit index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCommitsIndex {
    /// All commits across all branches of the mesh.
    #[serde(default)]
    pub commits: Vec<LegacyCommitIndexEntry>,
    /// Free-form timestamp carried over from the legacy format.
    #[serde(default)]
    pub last_updated: String,
}

/// The per-branch commit index written by the migration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCommitsIndex {
    /// Commits belonging to this branch.
    pub commits: Vec<LegacyCommitIndexEntry>,
    /// Carried over from the legacy index.
    pub last_updated: String,
    /// Marks this index as produced by the migration, for diagnostics.
    pub migrated_from: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
mod tests {
    use super::*;

    #[test]
    fn correct_pointer_reads_legacy_key() {
        let json = r#"{"schema_version":"1.0","correct_branch":"main","updated_at":"t"}"#;
        let doc: CorrectPointerDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.current_branch, "main");
    }

    #[test]
    fn correct_pointer_reads_current_key() {
        let json = r#"{"schema_version":"1.0","current_branch":"main","updated_at":"t"}"#;
        let doc: CorrectPointerDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.current_branch, "main");
    }

    #[test]
    fn correct_pointer_writes_current_key_only() {
        let doc = CorrectPointerDoc::new("main", "t");
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("current_branch"));
        assert!(!json.contains("correct_branch"));
    }

    #[test]
    fn commit_document_preserves_unknown_keys() {
        let json = r#"{
            "data_version": "1.0",
            "datetime": "t",
            "branch": "main",
            "mesh_name": "M",
            "exported_components": {"geometry": true}
        }"#;
        let doc: CommitDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.extra.get("exported_components").unwrap()["geometry"], true);

        let round_tripped = serde_json::to_value(&doc).unwrap();
        assert_eq!(round_tripped["exported_components"]["geometry"], true);
    }

    #[test]
    fn forest_equality_ignores_timestamp() {
        let mut a = Forest::empty("t1");
        let mut b = Forest::empty("t2");
        a.meshes.insert("M".to_owned(), MeshEntry::default());
        b.meshes.insert("M".to_owned(), MeshEntry::default());
        assert!(a.eq_ignoring_timestamp(&b));
    }

    #[test]
    fn forest_meshes_serialize_in_sorted_order() {
        let mut forest = Forest::empty("t");
        forest.meshes.insert("zebra".to_owned(), MeshEntry::default());
        forest.meshes.insert("alpha".to_owned(), MeshEntry::default());
        let json = serde_json::to_string(&forest).unwrap();
        let alpha_pos = json.find("alpha").unwrap();
        let zebra_pos = json.find("zebra").unwrap();
        assert!(alpha_pos < zebra_pos);
    }
}
