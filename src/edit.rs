//! Verified byte-span edits and the atomic write they share with
//! [`crate::transaction`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// A byte-span replacement that checks the text it overwrites.
///
/// Symbol renames compile down to a batch of these, one span per occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    /// Absolute path of the file to edit
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Text that must currently occupy the span
    pub expected_before: String,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at {file}:{byte_start} (expected {expected:?}, found {found:?})")]
    BeforeTextMismatch {
        file: PathBuf,
        byte_start: usize,
        expected: String,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in file of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("overlapping edits at byte {byte_start} in {file}")]
    Overlap { file: PathBuf, byte_start: usize },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl Edit {
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: expected_before.into(),
        }
    }

    fn validate(&self, content: &str) -> Result<(), EditError> {
        if self.byte_start > self.byte_end
            || self.byte_end > content.len()
            || !content.is_char_boundary(self.byte_start)
            || !content.is_char_boundary(self.byte_end)
        {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                file_len: content.len(),
            });
        }

        let current = &content[self.byte_start..self.byte_end];
        if current != self.expected_before {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                byte_start: self.byte_start,
                expected: self.expected_before.clone(),
                found: current.to_string(),
            });
        }
        Ok(())
    }

    /// Apply edits grouped per file; each file is verified in full and then
    /// written once, atomically. Returns the number of files written.
    ///
    /// Files are independent: a failure on one file leaves files already
    /// written in place.
    pub fn apply_batch(mut edits: Vec<Edit>) -> Result<usize, EditError> {
        // Group by file, descending byte_start within a file.
        edits.sort_by(|a, b| a.file.cmp(&b.file).then(b.byte_start.cmp(&a.byte_start)));

        let mut files_written = 0;
        for group in edits.chunk_by(|a, b| a.file == b.file) {
            apply_file_edits(group)?;
            files_written += 1;
        }
        Ok(files_written)
    }
}

/// Apply edits to a single file; assumes descending `byte_start` order.
fn apply_file_edits(edits: &[Edit]) -> Result<(), EditError> {
    let Some(first) = edits.first() else {
        return Ok(());
    };
    let file = &first.file;
    let bytes = fs::read(file)?;
    let mut content = std::str::from_utf8(&bytes)?.to_string();

    for edit in edits {
        edit.validate(&content)?;
    }

    for window in edits.windows(2) {
        let (later, earlier) = (&window[0], &window[1]);
        if earlier.byte_end > later.byte_start {
            return Err(EditError::Overlap {
                file: file.clone(),
                byte_start: later.byte_start,
            });
        }
    }

    // Bottom-to-top keeps earlier offsets valid.
    for edit in edits {
        content.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
    }

    atomic_write(file, content.as_bytes())?;
    debug!("Applied {} span edits to {}", edits.len(), file.display());
    Ok(())
}

/// Atomic file write: tempfile + fsync + rename, then bump the mtime.
///
/// Either the full write lands or the original file is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;

    // Same directory keeps the rename on one filesystem.
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original permissions; NamedTempFile creates 0600 files.
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_validation_invalid_range() {
        let edit = Edit::new("test.txt", 5, 20, "replacement", "");
        let result = edit.validate("hello world");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));
    }

    #[test]
    fn test_edit_validation_inverted_range() {
        let edit = Edit::new("test.txt", 10, 5, "replacement", "");
        let result = edit.validate("hello world");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));
    }

    #[test]
    fn test_edit_validation_mismatch() {
        let edit = Edit::new("test.txt", 0, 5, "howdy", "jello");
        let result = edit.validate("hello world");
        assert!(matches!(result, Err(EditError::BeforeTextMismatch { .. })));
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, b"original content").unwrap();

        atomic_write(&file_path, b"modified content").unwrap();

        let new_content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(new_content, "modified content");
        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_batch_edits_same_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, b"line1\nline2\nline3\n").unwrap();

        let edits = vec![
            Edit::new(&file_path, 0, 5, "LINE1", "line1"),
            Edit::new(&file_path, 6, 11, "LINE2", "line2"),
            Edit::new(&file_path, 12, 17, "LINE3", "line3"),
        ];

        let files = Edit::apply_batch(edits).unwrap();
        assert_eq!(files, 1);

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "LINE1\nLINE2\nLINE3\n");
    }

    #[test]
    fn test_batch_rejects_overlap_without_writing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, b"abcdef").unwrap();

        let edits = vec![
            Edit::new(&file_path, 0, 4, "x", "abcd"),
            Edit::new(&file_path, 2, 6, "y", "cdef"),
        ];

        let result = Edit::apply_batch(edits);
        assert!(matches!(result, Err(EditError::Overlap { .. })));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "abcdef");
    }
}
