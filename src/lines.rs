//! Zero-indexed line editing.
//!
//! The pure helpers ([`delete_line_range`], [`insert_before_line`]) work on
//! strings; [`LineRangeEditor`] wraps each of them in its own transaction.

use crate::error::ToolError;
use crate::project::Project;
use crate::transaction::{with_edited_file, EditOutcome};
use tracing::debug;

/// Remove lines `start..=end`. Line endings of the remaining lines are kept as-is.
pub fn delete_line_range(content: &str, start: usize, end: usize) -> Result<String, ToolError> {
    if start > end {
        return Err(ToolError::validation(format!(
            "invalid line range: start line {start} is after end line {end}"
        )));
    }
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    if end >= lines.len() {
        return Err(ToolError::validation(format!(
            "line range {start}..={end} is out of bounds (file has {} lines)",
            lines.len()
        )));
    }

    let mut updated = String::with_capacity(content.len());
    for line in lines[..start].iter().chain(&lines[end + 1..]) {
        updated.push_str(line);
    }
    Ok(updated)
}

/// Insert `text` before zero-indexed `line`; `line == line count` appends.
///
/// `text` is expected to end with a newline (see [`normalize_inserted`]).
pub fn insert_before_line(content: &str, line: usize, text: &str) -> Result<String, ToolError> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    if line > lines.len() {
        return Err(ToolError::validation(format!(
            "cannot insert at line {line} (file has {} lines)",
            lines.len()
        )));
    }

    let mut updated = String::with_capacity(content.len() + text.len() + 1);
    for existing in &lines[..line] {
        updated.push_str(existing);
    }
    // Appending after a last line without terminator must not glue the two together.
    if line == lines.len() && !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(text);
    for existing in &lines[line..] {
        updated.push_str(existing);
    }
    Ok(updated)
}

/// Inserted content always ends with a newline.
pub fn normalize_inserted(content: &str) -> String {
    if content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}

/// Line-indexed edits on project files, one transaction per operation.
pub struct LineRangeEditor<'p> {
    project: &'p Project,
}

impl<'p> LineRangeEditor<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self { project }
    }

    /// Delete the inclusive, zero-indexed range `start..=end`.
    pub fn delete_lines(&self, relative_path: &str, start: usize, end: usize) -> Result<EditOutcome, ToolError> {
        debug!("Deleting lines {start}..={end} in {relative_path}");
        with_edited_file(self.project, relative_path, true, |content| {
            delete_line_range(content, start, end)
        })
    }

    /// Insert `content` (newline-terminated) before zero-indexed `line`.
    pub fn insert_at_line(&self, relative_path: &str, line: usize, content: &str) -> Result<EditOutcome, ToolError> {
        let text = normalize_inserted(content);
        debug!("Inserting {} bytes before line {line} in {relative_path}", text.len());
        with_edited_file(self.project, relative_path, true, |original| {
            insert_before_line(original, line, &text)
        })
    }

    /// Delete `start..=end`, then insert `content` at `start`.
    ///
    /// The insert is only attempted once the delete has committed. The two
    /// steps are separate transactions: if the insert fails (oversized or
    /// unencodable content), the file keeps the deletion and nothing is
    /// inserted.
    pub fn replace_lines(
        &self,
        relative_path: &str,
        start: usize,
        end: usize,
        content: &str,
    ) -> Result<EditOutcome, ToolError> {
        self.delete_lines(relative_path, start, end)?;
        self.insert_at_line(relative_path, start, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;

    #[test]
    fn delete_first_two_lines() {
        let updated = delete_line_range("line1\nline2\nline3\n", 0, 1).unwrap();
        assert_eq!(updated, "line3\n");
    }

    #[test]
    fn delete_keeps_crlf_endings() {
        let updated = delete_line_range("a\r\nb\r\nc\r\n", 1, 1).unwrap();
        assert_eq!(updated, "a\r\nc\r\n");
    }

    #[test]
    fn delete_last_line_without_terminator() {
        let updated = delete_line_range("a\nb", 1, 1).unwrap();
        assert_eq!(updated, "a\n");
    }

    #[test]
    fn delete_rejects_bad_ranges() {
        assert_eq!(
            delete_line_range("a\nb\n", 1, 0).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            delete_line_range("a\nb\n", 0, 2).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn insert_in_the_middle() {
        let updated = insert_before_line("a\nc\n", 1, "b\n").unwrap();
        assert_eq!(updated, "a\nb\nc\n");
    }

    #[test]
    fn insert_at_end_adds_missing_newline() {
        assert_eq!(insert_before_line("a\nb", 2, "c\n").unwrap(), "a\nb\nc\n");
        assert_eq!(insert_before_line("", 0, "x\n").unwrap(), "x\n");
    }

    #[test]
    fn insert_past_end_fails() {
        let err = insert_before_line("a\n", 2, "x\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn normalize_adds_single_newline_only_when_missing() {
        assert_eq!(normalize_inserted("x"), "x\n");
        assert_eq!(normalize_inserted("x\n"), "x\n");
        assert_eq!(normalize_inserted("x\n\n"), "x\n\n");
    }

    #[test]
    fn replace_equals_delete_then_insert() {
        let dir = tempfile::tempdir().unwrap();
        let content = "l0\nl1\nl2\nl3\nl4\nl5\n";
        fs::write(dir.path().join("a.txt"), content).unwrap();
        fs::write(dir.path().join("b.txt"), content).unwrap();
        let project = Project::open(dir.path()).unwrap();
        let editor = LineRangeEditor::new(&project);

        editor.delete_lines("a.txt", 2, 4).unwrap();
        editor.insert_at_line("a.txt", 2, "X\n").unwrap();
        editor.replace_lines("b.txt", 2, 4, "X").unwrap();

        let a = fs::read_to_string(dir.path().join("a.txt")).unwrap();
        let b = fs::read_to_string(dir.path().join("b.txt")).unwrap();
        assert_eq!(a, "l0\nl1\nX\nl5\n");
        assert_eq!(a, b);
    }

    #[test]
    fn failed_delete_skips_insert() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "only\n").unwrap();
        let project = Project::open(dir.path()).unwrap();

        let err = LineRangeEditor::new(&project)
            .replace_lines("a.txt", 3, 5, "X")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "only\n");
    }
}
