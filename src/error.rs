// error.rs
use std::{io, path::PathBuf};
use thiserror::Error;

/// Error types for glob operations
///
/// Validation errors are raised before any I/O happens. Missing-path errors
/// are normally recovered by the readers (see [`is_enoent_code_error`]);
/// everything else is fatal for the task that produced it.
#[derive(Error, Debug)]
pub enum GlobError {
    /// Input patterns are missing or malformed
    #[error("Patterns must be a string or an array of strings")]
    InvalidPatterns,

    /// I/O error from filesystem operations on a specific path
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Walkdir traversal error
    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Pattern could not be compiled into a matcher
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Brace expansion exceeded maximum depth
    #[error("Brace expansion exceeded maximum depth")]
    BraceExpansionDepth,

    /// Brace expansion exceeded maximum number of expansions
    #[error("Brace expansion exceeded maximum expansions")]
    BraceExpansionCount,

    /// Regex pattern too complex or too long
    #[error("Regex pattern too complex or long")]
    RegexTooComplex,

    /// Symlink cycle detected while following symlinked directories
    #[error("Symlink cycle detected at {0}")]
    SymlinkCycle(PathBuf),

    /// A background traversal task panicked or was cancelled
    #[error("Task failed: {0}")]
    Join(String),
}

impl GlobError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GlobError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Returns `true` when the error means "path not found"
///
/// Such errors come from entries removed between listing and stat, or from
/// base directories that do not exist. Readers treat the affected subtree as
/// absent instead of failing the task.
pub fn is_enoent_code_error(err: &GlobError) -> bool {
    match err {
        GlobError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
        GlobError::Walkdir(e) => e
            .io_error()
            .map(|io| io.kind() == io::ErrorKind::NotFound)
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enoent_is_recognized() {
        let err = GlobError::io("missing", io::Error::from(io::ErrorKind::NotFound));
        assert!(is_enoent_code_error(&err));
    }

    #[test]
    fn other_errors_are_not_enoent() {
        let err = GlobError::io("locked", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!is_enoent_code_error(&err));
        assert!(!is_enoent_code_error(&GlobError::InvalidPatterns));
    }

    #[test]
    fn validation_message() {
        assert_eq!(
            GlobError::InvalidPatterns.to_string(),
            "Patterns must be a string or an array of strings"
        );
    }
}
