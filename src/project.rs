//! The project context threaded through every tool call: root, path
//! legality, configuration and raw text access.

use crate::config::{self, ProjectConfig};
use crate::error::ToolError;
use crate::safety::ProjectGuard;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw text access used by the context stitcher and the tool layer.
pub trait TextAccessor {
    /// Full decoded content of a project-relative file.
    fn read_file(&self, relative_path: &str) -> Result<String, ToolError>;

    /// Lines `start_line..=end_line` (zero-indexed, clamped to the file), joined with `\n`.
    fn read_line_range(
        &self,
        relative_path: &str,
        start_line: usize,
        end_line: usize,
    ) -> Result<String, ToolError>;
}

#[derive(Debug, Clone)]
pub struct Project {
    guard: ProjectGuard,
    config: ProjectConfig,
}

impl Project {
    /// Open a project, reading `.symedit.toml` from its root when present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let root = root.as_ref();
        let config = config::load_for_project(root)?;
        Self::with_config(root, config)
    }

    pub fn with_config(root: impl AsRef<Path>, config: ProjectConfig) -> Result<Self, ToolError> {
        let guard = ProjectGuard::new(root, &config.ignored_paths)?;
        Ok(Self { guard, config })
    }

    pub fn root(&self) -> &Path {
        self.guard.project_root()
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn guard(&self) -> &ProjectGuard {
        &self.guard
    }

    /// Absolute location of a project-relative path (no checks).
    pub fn resolve(&self, relative_path: &str) -> PathBuf {
        self.guard.resolve(relative_path)
    }

    pub fn relative_path_exists(&self, relative_path: &str) -> bool {
        self.resolve(relative_path).exists()
    }

    /// Check that `relative_path` exists inside the project (and is not
    /// ignored when `require_not_ignored`), returning its canonical path.
    pub fn validate_relative_path(
        &self,
        relative_path: &str,
        require_not_ignored: bool,
    ) -> Result<PathBuf, ToolError> {
        Ok(self.guard.validate_path(relative_path, require_not_ignored)?)
    }

    /// Like [`Self::validate_relative_path`] but additionally requires a regular file.
    pub fn validate_file(&self, relative_path: &str, require_not_ignored: bool) -> Result<PathBuf, ToolError> {
        let path = self.validate_relative_path(relative_path, require_not_ignored)?;
        if path.is_dir() {
            return Err(ToolError::InvalidTarget {
                path,
                message: "expected a file, got a directory".to_string(),
            });
        }
        Ok(path)
    }

    pub fn is_ignored_path(&self, path: impl AsRef<Path>) -> bool {
        self.guard.is_ignored(path)
    }

    /// Rejects mutating tools when the project is configured read-only.
    pub fn ensure_writable(&self) -> Result<(), ToolError> {
        if self.config.read_only {
            return Err(ToolError::validation(format!(
                "project at {} is read-only; editing tools are disabled",
                self.root().display()
            )));
        }
        Ok(())
    }

    /// Fails `ContentTooLarge` when `content` exceeds `max_write_chars`.
    pub fn check_write_size(&self, content: &str) -> Result<(), ToolError> {
        if let Some(max) = self.config.max_write_chars {
            let len = content.chars().count();
            if len > max {
                return Err(ToolError::ContentTooLarge { len, max });
            }
        }
        Ok(())
    }

    /// Decode a file at an already validated absolute path.
    pub(crate) fn read_absolute(&self, path: &Path) -> Result<String, ToolError> {
        let bytes = fs::read(path).map_err(|source| ToolError::io(path, source))?;
        self.config
            .encoding
            .decode(bytes)
            .map_err(|source| ToolError::Encoding {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Encode text with the project's encoding.
    pub(crate) fn encode(&self, path: &Path, text: &str) -> Result<Vec<u8>, ToolError> {
        self.config
            .encoding
            .encode(text)
            .map_err(|source| ToolError::Encoding {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl TextAccessor for Project {
    fn read_file(&self, relative_path: &str) -> Result<String, ToolError> {
        let path = self.validate_file(relative_path, true)?;
        self.read_absolute(&path)
    }

    fn read_line_range(
        &self,
        relative_path: &str,
        start_line: usize,
        end_line: usize,
    ) -> Result<String, ToolError> {
        let content = self.read_file(relative_path)?;
        Ok(content
            .lines()
            .skip(start_line)
            .take(end_line.saturating_sub(start_line).saturating_add(1))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
