//! Tree-sitter parsing of Rust sources for the built-in symbol backend.

pub mod errors;
pub mod parser;

pub use errors::TreeSitterError;
pub use parser::{ParsedSource, RustParser};
