//! Unified error type for the repository engine.
//!
//! Defines [`EngineError`], the error type returned by every operation in
//! this crate. Error messages are self-contained: a caller (an HTTP handler,
//! a CLI command) should be able to turn a variant directly into a response
//! without consulting additional context.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Unified error type for repository engine operations.
///
/// Maps onto the taxonomy of validation, not-found, conflict, filesystem,
/// and schema failures. Callers that expose this over HTTP should use
/// [`EngineError::kind`] to pick a status code.
#[derive(Debug)]
pub enum EngineError {
    /// A request body or path parameter failed validation.
    Validation {
        /// Human-readable description of what was wrong.
        detail: String,
    },

    /// The named branch does not exist on disk.
    BranchNotFound {
        /// Sanitised mesh name.
        mesh: String,
        /// Sanitised branch name.
        branch: String,
    },

    /// The branch is the mesh's correct pointer and cannot be deleted.
    CorrectBranchUndeletable {
        /// Sanitised mesh name.
        mesh: String,
        /// Sanitised branch name.
        branch: String,
    },

    /// A persisted document failed schema validation on read.
    Schema {
        /// Path to the offending document.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// A filesystem syscall failed (permissions, out of space, I/O).
    Io(std::io::Error),

    /// JSON (de)serialisation failed.
    Json(serde_json::Error),

    /// TOML configuration failed to parse.
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { detail } => write!(f, "validation failed: {detail}"),
            Self::BranchNotFound { mesh, branch } => {
                write!(
                    f,
                    "branch '{branch}' not found on mesh '{mesh}'.\n  To fix: create it first with POST /mesh/{mesh}/branch."
                )
            }
            Self::CorrectBranchUndeletable { mesh, branch } => {
                write!(
                    f,
                    "branch '{branch}' is the correct pointer for mesh '{mesh}' and cannot be deleted.\n  To fix: move the correct pointer to another branch first with POST /mesh/{mesh}/correct."
                )
            }
            Self::Schema { path, detail } => {
                write!(f, "document '{}' failed validation: {detail}", path.display())
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Config { path, detail } => {
                write!(f, "configuration error in '{}': {detail}", path.display())
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Coarse error category, used by HTTP surfaces to pick a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request.
    Validation,
    /// Named resource does not exist.
    NotFound,
    /// Logical rule violated.
    Conflict,
    /// Filesystem or serialisation failure.
    Internal,
}

impl EngineError {
    /// Classify this error for status-code mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::BranchNotFound { .. } => ErrorKind::NotFound,
            Self::CorrectBranchUndeletable { .. } => ErrorKind::Conflict,
            Self::Schema { .. } | Self::Io(_) | Self::Json(_) | Self::Config { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
mod tests {
    use super::*;

    #[test]
    fn display_branch_not_found() {
        let err = EngineError::BranchNotFound {
            mesh: "statue".to_owned(),
            branch: "nope".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("statue"));
        assert!(msg.contains("nope"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn display_correct_branch_undeletable() {
        let err = EngineError::CorrectBranchUndeletable {
            mesh: "statue".to_owned(),
            branch: "main".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("correct pointer"));
        assert!(msg.contains("main"));
    }

    #[test]
    fn kind_mapping() {
        assert_eq!(
            EngineError::Validation { detail: String::new() }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::BranchNotFound {
                mesh: "m".to_owned(),
                branch: "b".to_owned()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::CorrectBranchUndeletable {
                mesh: "m".to_owned(),
                branch: "b".to_owned()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::Io(std::io::Error::other("boom")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
