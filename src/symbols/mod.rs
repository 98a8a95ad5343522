//! Symbol navigation: descriptors, the backend seam, and the adapter that
//! shapes backend answers for tool output.

pub mod adapter;
pub mod backend;
pub mod descriptor;
pub mod kind;
pub mod name_path;
pub mod rust_backend;

pub use adapter::SymbolQueryAdapter;
pub use backend::{BackendError, ReferenceHit, SymbolBackend, SymbolQuery};
pub use descriptor::{
    sanitize, BodyLocation, ReferenceDescriptor, SymbolDescriptor, SymbolLocation, SymbolRecord,
};
pub use kind::{KindFilter, SymbolKind};
pub use name_path::NamePathPattern;
pub use rust_backend::RustSymbolBackend;
