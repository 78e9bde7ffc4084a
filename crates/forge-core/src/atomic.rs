//! Crash-safe document persistence: write-to-temp-then-rename.
//!
//! Every structured document in the repository (`commit.json`, `correct.json`,
//! `forest.json`) goes through [`write_json`] so that a concurrent reader
//! always observes either the prior committed bytes or the new ones, never a
//! partial write.

use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::error::EngineError;

/// Serialise `document` to pretty JSON and persist it atomically at `path`.
///
/// Creates parent directories as needed, writes to a sibling temp file on
/// the same filesystem, flushes and fsyncs the file descriptor, then renames
/// the temp file over `path`. On any failure the temp file is removed and
/// the prior file at `path` (if any) is left untouched.
///
/// # Errors
/// Returns an error if the document cannot be serialised, the parent
/// directory cannot be created, or any filesystem step fails.
pub fn write_json<T: Serialize>(path: &Path, document: &T) -> Result<(), EngineError> {
    let parent = path.parent().ok_or_else(|| EngineError::Validation {
        detail: format!("path '{}' has no parent directory", path.display()),
    })?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    let bytes = serde_json::to_vec_pretty(document)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| EngineError::Io(e.error))?;
    Ok(())
}

/// Read and parse a JSON document at `path`, or `None` if it does not exist.
///
/// Takes no lock; callers tolerate seeing either the previously-committed
/// state or the most recently committed one, never a torn write.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or fails to parse.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, EngineError> {
    match File::open(path) {
        Ok(file) => {
            let value = serde_json::from_reader(file)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let doc = json!({"a": 1, "b": "two"});

        write_json(&path, &doc).unwrap();
        let read: serde_json::Value = read_json_opt(&path).unwrap().unwrap();
        assert_eq!(read, doc);
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        let read: Option<serde_json::Value> = read_json_opt(&path).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("doc.json");
        write_json(&path, &json!({"x": true})).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &json!({"v": 1})).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path() != path)
            .collect();
        assert!(
            leftovers.is_empty(),
            "expected no temp files, found {leftovers:?}"
        );
    }

    #[test]
    fn second_write_replaces_first_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &json!({"v": 1})).unwrap();
        write_json(&path, &json!({"v": 2})).unwrap();

        let read: serde_json::Value = read_json_opt(&path).unwrap().unwrap();
        assert_eq!(read, json!({"v": 2}));
    }

    #[test]
    fn writing_same_payload_twice_is_observably_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let doc = json!({"stable": true, "n": 42});
        write_json(&path, &doc).unwrap();
        let first_bytes = fs::read(&path).unwrap();
        write_json(&path, &doc).unwrap();
        let second_bytes = fs::read(&path).unwrap();
        assert_eq!(first_bytes, second_bytes);
    }
}
