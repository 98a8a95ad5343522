//! Scoped single-file edit transactions.
//!
//! A transaction snapshots one file, lets the caller stage replacement
//! content, and either commits it with one atomic write or discards it.
//! Dropping a transaction without committing is an abort.

use crate::edit::atomic_write;
use crate::error::ToolError;
use crate::project::Project;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of committing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditOutcome reports whether the file was written"]
pub enum EditOutcome {
    /// The staged content replaced the file
    Applied { path: PathBuf, bytes_written: usize },
    /// Nothing was staged, or the staged content equals the original
    Unchanged { path: PathBuf },
}

/// Original and staged content of the file under edit.
#[derive(Debug)]
struct FileSnapshot {
    original_content: String,
    staged_content: Option<String>,
}

pub struct FileEditTransaction<'p> {
    project: &'p Project,
    relative_path: String,
    path: PathBuf,
    require_not_ignored: bool,
    snapshot: FileSnapshot,
    finished: bool,
}

impl<'p> FileEditTransaction<'p> {
    /// Validate `relative_path` and snapshot its current content.
    pub fn begin(
        project: &'p Project,
        relative_path: &str,
        require_not_ignored: bool,
    ) -> Result<Self, ToolError> {
        let path = project.validate_file(relative_path, require_not_ignored)?;
        let original_content = project.read_absolute(&path)?;

        debug!("Started transaction for: {}", path.display());

        Ok(Self {
            project,
            relative_path: relative_path.to_string(),
            path,
            require_not_ignored,
            snapshot: FileSnapshot {
                original_content,
                staged_content: None,
            },
            finished: false,
        })
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_content(&self) -> &str {
        &self.snapshot.original_content
    }

    pub fn staged_content(&self) -> Option<&str> {
        self.snapshot.staged_content.as_deref()
    }

    /// Stage the content that `commit` will write.
    ///
    /// Content over the project's `max_write_chars` is refused.
    pub fn stage(&mut self, content: String) -> Result<(), ToolError> {
        self.project.check_write_size(&content)?;
        self.snapshot.staged_content = Some(content);
        Ok(())
    }

    /// Write the staged content in one atomic replacement.
    pub fn commit(mut self) -> Result<EditOutcome, ToolError> {
        self.finished = true;

        let Some(staged) = self.snapshot.staged_content.take() else {
            debug!("Nothing staged for: {}", self.path.display());
            return Ok(EditOutcome::Unchanged {
                path: self.path.clone(),
            });
        };
        if staged == self.snapshot.original_content {
            debug!("Staged content identical for: {}", self.path.display());
            return Ok(EditOutcome::Unchanged {
                path: self.path.clone(),
            });
        }

        let bytes = self.project.encode(&self.path, &staged)?;
        let path = self
            .project
            .guard()
            .revalidate(&self.path, self.require_not_ignored)?;
        atomic_write(&path, &bytes).map_err(|source| ToolError::Edit {
            path: path.clone(),
            source,
        })?;

        info!("Committed edit to {} ({} bytes)", self.relative_path, bytes.len());
        Ok(EditOutcome::Applied {
            path,
            bytes_written: bytes.len(),
        })
    }

    /// Discard the staged content; the file is not touched.
    pub fn abort(mut self) {
        self.finished = true;
        debug!("Transaction aborted for: {}", self.path.display());
    }
}

impl Drop for FileEditTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                "Transaction dropped without commit, discarding: {}",
                self.path.display()
            );
        }
    }
}

/// Run `edit` on the file's content inside a transaction and commit the result.
///
/// Any error from `edit` (or from staging) aborts and leaves the file as it was.
pub fn with_edited_file<F>(
    project: &Project,
    relative_path: &str,
    require_not_ignored: bool,
    edit: F,
) -> Result<EditOutcome, ToolError>
where
    F: FnOnce(&str) -> Result<String, ToolError>,
{
    let mut transaction = FileEditTransaction::begin(project, relative_path, require_not_ignored)?;
    let updated = edit(transaction.original_content())?;
    transaction.stage(updated)?;
    transaction.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectConfig, TextEncoding};
    use crate::error::ErrorKind;
    use std::fs;

    fn setup(content: &[u8], config: ProjectConfig) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file.txt"), content).unwrap();
        let project = Project::with_config(dir.path(), config).unwrap();
        (dir, project)
    }

    #[test]
    fn commit_writes_staged_content() {
        let (dir, project) = setup(b"old\n", ProjectConfig::default());
        let mut tx = FileEditTransaction::begin(&project, "file.txt", true).unwrap();
        assert_eq!(tx.original_content(), "old\n");
        tx.stage("new\n".to_string()).unwrap();

        let outcome = tx.commit().unwrap();
        assert!(matches!(outcome, EditOutcome::Applied { bytes_written: 4, .. }));
        assert_eq!(fs::read_to_string(dir.path().join("file.txt")).unwrap(), "new\n");
    }

    #[test]
    fn abort_and_drop_leave_file_untouched() {
        let (dir, project) = setup(b"old\n", ProjectConfig::default());

        let mut tx = FileEditTransaction::begin(&project, "file.txt", true).unwrap();
        tx.stage("new\n".to_string()).unwrap();
        tx.abort();

        {
            let mut tx = FileEditTransaction::begin(&project, "file.txt", true).unwrap();
            tx.stage("newer\n".to_string()).unwrap();
        }

        assert_eq!(fs::read_to_string(dir.path().join("file.txt")).unwrap(), "old\n");
    }

    #[test]
    fn failing_edit_aborts() {
        let (dir, project) = setup(b"old\n", ProjectConfig::default());
        let result = with_edited_file(&project, "file.txt", true, |_| {
            Err(ToolError::validation("boom"))
        });
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(dir.path().join("file.txt")).unwrap(), "old\n");
    }

    #[test]
    fn identical_content_is_unchanged() {
        let (_dir, project) = setup(b"same", ProjectConfig::default());
        let outcome = with_edited_file(&project, "file.txt", true, |c| Ok(c.to_string())).unwrap();
        assert!(matches!(outcome, EditOutcome::Unchanged { .. }));
    }

    #[test]
    fn oversized_content_is_refused() {
        let config = ProjectConfig {
            max_write_chars: Some(3),
            ..ProjectConfig::default()
        };
        let (dir, project) = setup(b"abc", config);
        let err = with_edited_file(&project, "file.txt", true, |_| Ok("abcd".to_string())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContentTooLarge);
        assert_eq!(fs::read_to_string(dir.path().join("file.txt")).unwrap(), "abc");
    }

    #[test]
    fn commit_uses_project_encoding() {
        let config = ProjectConfig {
            encoding: TextEncoding::Latin1,
            ..ProjectConfig::default()
        };
        let (dir, project) = setup(&[b'c', b'a', b'f', 0xE9], config);
        with_edited_file(&project, "file.txt", true, |c| Ok(c.replace("café", "café!"))).unwrap();
        assert_eq!(
            fs::read(dir.path().join("file.txt")).unwrap(),
            vec![b'c', b'a', b'f', 0xE9, b'!']
        );
    }

    #[test]
    fn unencodable_content_fails_before_write() {
        let config = ProjectConfig {
            encoding: TextEncoding::Latin1,
            ..ProjectConfig::default()
        };
        let (dir, project) = setup(b"plain", config);
        let err = with_edited_file(&project, "file.txt", true, |_| Ok("snow ☃".to_string())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(fs::read(dir.path().join("file.txt")).unwrap(), b"plain");
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, project) = setup(b"", ProjectConfig::default());
        let err = FileEditTransaction::begin(&project, "missing.txt", true).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
