//! Error taxonomy shared by every tool.
//!
//! Each layer has its own error enum; they converge on [`ToolError`], and
//! callers branch on [`ToolError::kind`] rather than on message text.

use crate::config::{ConfigError, EncodingError};
use crate::edit::EditError;
use crate::mutation::MutationError;
use crate::safety::SafetyError;
use crate::symbols::BackendError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Path absent
    NotFound,
    /// Wrong path kind, e.g. a directory where a file is expected
    InvalidTarget,
    /// Illegal parameter, path outside the project, ignored path
    Validation,
    /// Pattern matched zero times
    NoMatch,
    /// Pattern matched more than once without `allow_multiple`
    TooManyMatches,
    /// Multiline match that re-matches within its own tail
    AmbiguousMatch,
    /// Payload exceeds a configured maximum
    ContentTooLarge,
    /// Underlying file system failure
    Io,
    /// Failure reported by the symbol backend
    Backend,
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{message}: {path}")]
    InvalidTarget { path: PathBuf, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("no matches found in '{path}'")]
    NoMatch { path: String },

    #[error("expression matches {count} occurrences in '{path}'")]
    TooManyMatches { path: String, count: usize },

    #[error("match is ambiguous in '{path}' (multiline match at byte {offset} re-matches its own tail)")]
    AmbiguousMatch { path: String, offset: usize },

    #[error("content too long ({len} characters, max {max})")]
    ContentTooLarge { len: usize, max: usize },

    #[error("failed to write {path}: {source}")]
    Edit {
        path: PathBuf,
        #[source]
        source: EditError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding error in {path}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: EncodingError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::NotFound { .. } => ErrorKind::NotFound,
            ToolError::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            ToolError::Validation(_) | ToolError::Config(_) | ToolError::Encoding { .. } => {
                ErrorKind::Validation
            }
            ToolError::NoMatch { .. } => ErrorKind::NoMatch,
            ToolError::TooManyMatches { .. } => ErrorKind::TooManyMatches,
            ToolError::AmbiguousMatch { .. } => ErrorKind::AmbiguousMatch,
            ToolError::ContentTooLarge { .. } => ErrorKind::ContentTooLarge,
            ToolError::Edit { .. } | ToolError::Io { .. } => ErrorKind::Io,
            ToolError::Backend(BackendError::SymbolNotFound { .. }) => ErrorKind::NotFound,
            ToolError::Backend(BackendError::InvalidArgument(_)) => ErrorKind::Validation,
            ToolError::Backend(_) => ErrorKind::Backend,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ToolError::Validation(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the edited path to a pure mutation failure.
    pub fn from_mutation(path: &str, error: MutationError) -> Self {
        match error {
            MutationError::InvalidMode(mode) => {
                ToolError::Validation(format!("invalid mode: '{mode}'"))
            }
            MutationError::InvalidPattern { message } => {
                ToolError::Validation(format!("invalid pattern: {message}"))
            }
            MutationError::NoMatch => ToolError::NoMatch {
                path: path.to_string(),
            },
            MutationError::TooManyMatches { count } => ToolError::TooManyMatches {
                path: path.to_string(),
                count,
            },
            MutationError::AmbiguousMatch { offset } => ToolError::AmbiguousMatch {
                path: path.to_string(),
                offset,
            },
        }
    }
}

impl From<SafetyError> for ToolError {
    fn from(e: SafetyError) -> Self {
        match e {
            SafetyError::NotFound { path } => ToolError::NotFound { path },
            SafetyError::Canonicalize { path, source } => ToolError::Io { path, source },
            other => ToolError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_errors_keep_their_kind() {
        let err = ToolError::from_mutation("a.rs", MutationError::TooManyMatches { count: 3 });
        assert_eq!(err.kind(), ErrorKind::TooManyMatches);
        assert_eq!(err.to_string(), "expression matches 3 occurrences in 'a.rs'");

        let err = ToolError::from_mutation("a.rs", MutationError::InvalidMode("fuzzy".into()));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn safety_errors_map_to_validation_or_not_found() {
        let err: ToolError = SafetyError::NotFound {
            path: PathBuf::from("x"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: ToolError = SafetyError::Ignored {
            path: PathBuf::from("target/x"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn backend_symbol_not_found_is_not_found() {
        let err: ToolError = BackendError::SymbolNotFound {
            name_path: "Foo/bar".into(),
            relative_path: "src/lib.rs".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
