use serde::Deserialize;
use std::fmt;

/// Default cap on tool answers, in characters.
pub const DEFAULT_MAX_ANSWER_CHARS: i64 = 150_000;

/// Default location of memory notes, relative to the project root.
pub const DEFAULT_MEMORIES_DIR: &str = ".symedit/memories";

/// Per-project settings, read from `.symedit.toml` at the project root.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub encoding: TextEncoding,
    /// Glob patterns (project-relative) excluded from reads and edits.
    #[serde(default)]
    pub ignored_paths: Vec<String>,
    /// Reject every mutating tool.
    #[serde(default)]
    pub read_only: bool,
    /// Used when a tool call does not pass `max_answer_chars`.
    #[serde(default = "default_max_answer_chars")]
    pub default_max_answer_chars: i64,
    /// Upper bound on staged content; unlimited when absent.
    #[serde(default)]
    pub max_write_chars: Option<usize>,
    #[serde(default = "default_memories_dir")]
    pub memories_dir: String,
}

fn default_max_answer_chars() -> i64 {
    DEFAULT_MAX_ANSWER_CHARS
}

fn default_memories_dir() -> String {
    DEFAULT_MEMORIES_DIR.to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::default(),
            ignored_paths: Vec::new(),
            read_only: false,
            default_max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
            max_write_chars: None,
            memories_dir: default_memories_dir(),
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for pattern in &self.ignored_paths {
            if pattern.trim().is_empty() {
                issues.push(ValidationIssue::EmptyIgnorePattern);
            } else if let Err(e) = globset::Glob::new(pattern) {
                issues.push(ValidationIssue::InvalidIgnorePattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                });
            }
        }

        if self.max_write_chars == Some(0) {
            issues.push(ValidationIssue::InvalidValue {
                field: "max_write_chars",
                message: "must be positive when set".to_string(),
            });
        }

        let memories = std::path::Path::new(&self.memories_dir);
        if self.memories_dir.trim().is_empty() || memories.is_absolute() {
            issues.push(ValidationIssue::InvalidValue {
                field: "memories_dir",
                message: "must be a non-empty project-relative path".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// Text encoding used to decode files on read and encode them on commit.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl TextEncoding {
    pub fn decode(self, bytes: Vec<u8>) -> Result<String, EncodingError> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes).map_err(|e| EncodingError::Decode {
                encoding: self,
                offset: e.utf8_error().valid_up_to(),
            }),
            TextEncoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Latin1 => text
                .char_indices()
                .map(|(offset, c)| {
                    u8::try_from(u32::from(c)).map_err(|_| EncodingError::Unrepresentable {
                        encoding: self,
                        character: c,
                        offset,
                    })
                })
                .collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("file is not valid {encoding} (first bad byte at offset {offset})")]
    Decode { encoding: TextEncoding, offset: usize },

    #[error("character {character:?} at byte {offset} cannot be encoded as {encoding}")]
    Unrepresentable {
        encoding: TextEncoding,
        character: char,
        offset: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyIgnorePattern,
    InvalidIgnorePattern { pattern: String, message: String },
    InvalidValue { field: &'static str, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyIgnorePattern => write!(f, "ignored_paths contains an empty pattern"),
            ValidationIssue::InvalidIgnorePattern { pattern, message } => {
                write!(f, "invalid ignore pattern '{pattern}': {message}")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid value for '{field}': {message}")
            }
        }
    }
}
