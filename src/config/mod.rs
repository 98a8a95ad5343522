pub mod loader;
pub mod schema;

pub use loader::{load_for_project, load_from_path, load_from_str, ConfigError, CONFIG_FILE_NAME};
pub use schema::{
    EncodingError, ProjectConfig, TextEncoding, ValidationError, ValidationIssue,
    DEFAULT_MAX_ANSWER_CHARS, DEFAULT_MEMORIES_DIR,
};
