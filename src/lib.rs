//! symedit: file mutation and symbol navigation for coding-agent tools
//!
//! A project-scoped toolbox that edits files with regex or literal
//! replacement and line-range operations, and answers symbol queries
//! (overview, find, references, rename) through a pluggable backend.
//!
//! # Architecture
//!
//! Every file edit runs inside a [`FileEditTransaction`]: the path is
//! validated against the [`ProjectGuard`], the content is snapshotted, the
//! edit is computed in memory, and the result is written atomically (tempfile
//! + fsync + rename). A failing edit leaves the file byte-identical.
//!
//! Symbol queries go through [`SymbolQueryAdapter`], which normalizes any
//! [`SymbolBackend`] into sanitized records. [`RustSymbolBackend`] is the
//! built-in tree-sitter backend.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use symedit::Toolbox;
//!
//! # fn main() -> Result<(), symedit::ToolError> {
//! let toolbox = Toolbox::open(".")?;
//! toolbox.call(
//!     "replace_content",
//!     json!({
//!         "relative_path": "src/lib.rs",
//!         "needle": "old_name",
//!         "repl": "new_name",
//!         "mode": "literal",
//!         "allow_multiple_occurrences": true,
//!     }),
//! )?;
//! let overview = toolbox.call("get_symbols_overview", json!({"relative_path": "src/lib.rs"}))?;
//! println!("{overview}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod edit;
pub mod error;
pub mod lines;
pub mod mutation;
pub mod output;
pub mod pool;
pub mod project;
pub mod safety;
pub mod symbols;
pub mod tools;
pub mod transaction;
pub mod ts;

// Re-exports
pub use config::{load_for_project, ConfigError, ProjectConfig, TextEncoding};
pub use context::{MatchedLines, ReferenceContextStitcher};
pub use edit::{Edit, EditError};
pub use error::{ErrorKind, ToolError};
pub use lines::LineRangeEditor;
pub use mutation::{mutate, EditMode, EditRequest, MutationError};
pub use output::{limit_length, to_json};
pub use project::{Project, TextAccessor};
pub use safety::{ProjectGuard, SafetyError};
pub use symbols::{
    BackendError, KindFilter, RustSymbolBackend, SymbolBackend, SymbolDescriptor, SymbolKind,
    SymbolQueryAdapter,
};
pub use tools::{Toolbox, SUCCESS_RESULT};
pub use transaction::{with_edited_file, EditOutcome, FileEditTransaction};
pub use ts::{RustParser, TreeSitterError};
