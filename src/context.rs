//! Numbered source snippets around a line of interest.

use crate::error::ToolError;
use crate::project::TextAccessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The line the snippet is about
    Match,
    /// Surrounding context
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    /// Zero-indexed line number in the file
    pub line_number: usize,
    pub text: String,
    pub kind: LineKind,
}

impl TextLine {
    pub fn format(&self) -> String {
        let prefix = match self.kind {
            LineKind::Match => "  >",
            LineKind::Context => "...",
        };
        format!("{prefix}{:>4}:{}", self.line_number, self.text)
    }
}

/// A run of consecutive lines, some of which matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedLines {
    pub lines: Vec<TextLine>,
}

impl MatchedLines {
    /// Build from the lines of a file: `first..=last` are matches, padded by
    /// `before`/`after` lines of context clamped to the file.
    pub fn around(lines: &[&str], first: usize, last: usize, before: usize, after: usize) -> Self {
        let start = first.saturating_sub(before);
        let end = last.saturating_add(after).min(lines.len().saturating_sub(1));
        let lines = (start..=end)
            .filter_map(|n| {
                lines.get(n).map(|text| TextLine {
                    line_number: n,
                    text: text.to_string(),
                    kind: if (first..=last).contains(&n) {
                        LineKind::Match
                    } else {
                        LineKind::Context
                    },
                })
            })
            .collect();
        Self { lines }
    }

    pub fn to_display_string(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::format)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fetches a few lines around a reference so results stay small but
/// disambiguating when symbol bodies are not included.
pub struct ReferenceContextStitcher<'a, A: TextAccessor + ?Sized> {
    accessor: &'a A,
}

impl<'a, A: TextAccessor + ?Sized> ReferenceContextStitcher<'a, A> {
    pub fn new(accessor: &'a A) -> Self {
        Self { accessor }
    }

    /// Lines `line - before ..= line + after` of `relative_path`, numbered.
    pub fn matched_lines(
        &self,
        relative_path: &str,
        line: usize,
        before: usize,
        after: usize,
    ) -> Result<MatchedLines, ToolError> {
        let start = line.saturating_sub(before);
        let text = self
            .accessor
            .read_line_range(relative_path, start, line.saturating_add(after))?;
        if text.is_empty() && line > 0 {
            return Ok(MatchedLines { lines: Vec::new() });
        }

        let lines = text
            .split('\n')
            .enumerate()
            .map(|(offset, text)| {
                let line_number = start + offset;
                TextLine {
                    line_number,
                    text: text.to_string(),
                    kind: if line_number == line {
                        LineKind::Match
                    } else {
                        LineKind::Context
                    },
                }
            })
            .collect();
        Ok(MatchedLines { lines })
    }

    pub fn stitch(
        &self,
        relative_path: &str,
        line: usize,
        before: usize,
        after: usize,
    ) -> Result<String, ToolError> {
        Ok(self
            .matched_lines(relative_path, line, before, after)?
            .to_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemoryFiles(HashMap<&'static str, &'static str>);

    impl TextAccessor for MemoryFiles {
        fn read_file(&self, relative_path: &str) -> Result<String, ToolError> {
            self.0
                .get(relative_path)
                .map(|s| s.to_string())
                .ok_or_else(|| ToolError::NotFound {
                    path: relative_path.into(),
                })
        }

        fn read_line_range(&self, relative_path: &str, start: usize, end: usize) -> Result<String, ToolError> {
            let content = self.read_file(relative_path)?;
            Ok(content
                .lines()
                .skip(start)
                .take(end.saturating_sub(start).saturating_add(1))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    fn files() -> MemoryFiles {
        MemoryFiles(HashMap::from([("a.rs", "fn a() {\n    b();\n}\nfn b() {}\n")]))
    }

    #[test]
    fn stitch_marks_reference_line() {
        let files = files();
        let block = ReferenceContextStitcher::new(&files).stitch("a.rs", 1, 1, 1).unwrap();
        assert_eq!(block, "...   0:fn a() {\n  >   1:    b();\n...   2:}");
    }

    #[test]
    fn stitch_clamps_at_file_start() {
        let files = files();
        let lines = ReferenceContextStitcher::new(&files)
            .matched_lines("a.rs", 0, 2, 0)
            .unwrap();
        assert_eq!(lines.lines.len(), 1);
        assert_eq!(lines.lines[0].kind, LineKind::Match);
    }

    #[test]
    fn around_pads_multi_line_matches() {
        let source = ["a", "b", "c", "d", "e"];
        let block = MatchedLines::around(&source, 1, 2, 1, 5);
        let kinds: Vec<_> = block.lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Context,
                LineKind::Match,
                LineKind::Match,
                LineKind::Context,
                LineKind::Context
            ]
        );
    }

    #[test]
    fn huge_context_is_clamped_to_the_file() {
        let source = ["a", "b", "c"];
        let block = MatchedLines::around(&source, 1, 1, usize::MAX, usize::MAX);
        assert_eq!(block.lines.len(), 3);
        assert_eq!(block.lines[1].kind, LineKind::Match);

        let files = files();
        let lines = ReferenceContextStitcher::new(&files)
            .matched_lines("a.rs", 3, 0, usize::MAX)
            .unwrap();
        assert_eq!(lines.lines.len(), 1);
    }
}
