use crate::edit::EditError;
use crate::symbols::descriptor::SymbolDescriptor;
use crate::symbols::kind::KindFilter;
use crate::ts::TreeSitterError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("symbol '{name_path}' not found in {relative_path}")]
    SymbolNotFound {
        name_path: String,
        relative_path: String,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("no symbol support for {path}")]
    Unsupported { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: TreeSitterError,
    },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("{0}")]
    Other(String),
}

/// Parameters of a symbol search.
#[derive(Debug, Clone, Default)]
pub struct SymbolQuery<'a> {
    /// Name-path pattern, see [`crate::symbols::NamePathPattern`]
    pub pattern: &'a str,
    pub kinds: KindFilter,
    pub substring_matching: bool,
    /// Restrict the search to a file or directory; `None` searches the project
    pub within_path: Option<&'a str>,
}

/// A symbol containing a reference, and the zero-indexed line it is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHit {
    pub symbol: SymbolDescriptor,
    pub line: usize,
}

/// Source of symbol information for the symbol tools.
///
/// Implementations report every symbol with `location.relative_path` set and
/// may always fill `body`; shaping for output happens in
/// [`crate::symbols::SymbolQueryAdapter`].
pub trait SymbolBackend {
    /// Top-level symbols of one file, children populated `depth` levels deep.
    fn overview(&self, relative_path: &str, depth: usize) -> Result<Vec<SymbolDescriptor>, BackendError>;

    fn find(&self, query: &SymbolQuery<'_>) -> Result<Vec<SymbolDescriptor>, BackendError>;

    /// Symbols referencing the unique symbol `name_path` declared in `relative_path`.
    fn find_references(
        &self,
        name_path: &str,
        relative_path: &str,
        kinds: &KindFilter,
    ) -> Result<Vec<ReferenceHit>, BackendError>;

    /// Rename a symbol across the project, returning a status message.
    fn rename(&self, name_path: &str, relative_path: &str, new_name: &str) -> Result<String, BackendError>;
}
