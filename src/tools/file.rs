use crate::cache::get_or_compile_pattern;
use crate::context::MatchedLines;
use crate::edit::atomic_write;
use crate::error::ToolError;
use crate::lines::LineRangeEditor;
use crate::mutation::{mutate, EditMode};
use crate::output::to_json;
use crate::symbols::SymbolBackend;
use crate::tools::params::{
    CreateTextFileParams, DeleteLinesParams, FindFileParams, InsertAtLineParams, ListDirParams,
    ReadFileParams, ReplaceContentParams, ReplaceLinesParams, SearchForPatternParams,
};
use crate::tools::{Toolbox, SUCCESS_RESULT};
use crate::transaction::{with_edited_file, EditOutcome};
use globset::{Glob, GlobMatcher};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

impl<B: SymbolBackend> Toolbox<B> {
    pub fn read_file(&self, params: ReadFileParams) -> Result<String, ToolError> {
        let path = self.project.validate_file(&params.relative_path, true)?;
        let content = self.project.read_absolute(&path)?;

        let lines: Vec<&str> = content.lines().collect();
        let start = params.start_line.min(lines.len());
        let end = match params.end_line {
            Some(end) => end.saturating_add(1).clamp(start, lines.len()),
            None => lines.len(),
        };
        Ok(self.limit(lines[start..end].join("\n"), params.max_answer_chars))
    }

    pub fn create_text_file(&self, params: CreateTextFileParams) -> Result<String, ToolError> {
        let overwrite = self.project.relative_path_exists(&params.relative_path);
        let path = self
            .project
            .guard()
            .validate_new_path(&params.relative_path, overwrite)?;
        if path.is_dir() {
            return Err(ToolError::InvalidTarget {
                path,
                message: "expected a file, got a directory".to_string(),
            });
        }
        self.project.check_write_size(&params.content)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ToolError::io(parent, source))?;
        }
        let bytes = self.project.encode(&path, &params.content)?;
        atomic_write(&path, &bytes).map_err(|source| ToolError::Edit {
            path: path.clone(),
            source,
        })?;
        info!(
            "{} {} ({} bytes)",
            if overwrite { "Overwrote" } else { "Created" },
            params.relative_path,
            bytes.len()
        );
        Ok(SUCCESS_RESULT.to_string())
    }

    /// `{"dirs": [...], "files": [...]}`, or an error object when the
    /// directory does not exist.
    pub fn list_dir(&self, params: ListDirParams) -> Result<String, ToolError> {
        if !self.project.relative_path_exists(&params.relative_path) {
            let answer = json!({
                "error": format!("Directory not found: {}", params.relative_path),
                "project_root": self.project.root().display().to_string(),
                "hint": "Check if the path is correct relative to the project root",
            });
            return to_json(&answer);
        }

        let dir = self
            .project
            .validate_relative_path(&params.relative_path, params.skip_ignored_files)?;
        if !dir.is_dir() {
            return Err(ToolError::InvalidTarget {
                path: dir,
                message: "expected a directory, got a file".to_string(),
            });
        }

        let max_depth = if params.recursive { usize::MAX } else { 1 };
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in self.walk(&dir, max_depth, params.skip_ignored_files)? {
            let Some(relative) = self.project.guard().relativize(&entry.path) else {
                continue;
            };
            if entry.is_dir {
                dirs.push(relative);
            } else {
                files.push(relative);
            }
        }

        let answer = to_json(&json!({ "dirs": dirs, "files": files }))?;
        Ok(self.limit(answer, params.max_answer_chars))
    }

    /// Files under `relative_path` whose name matches `file_mask`.
    pub fn find_file(&self, params: FindFileParams) -> Result<String, ToolError> {
        let dir = self.project.validate_relative_path(&params.relative_path, true)?;
        let matcher = compile_glob(&params.file_mask)?;

        let files: Vec<String> = self
            .walk(&dir, usize::MAX, true)?
            .into_iter()
            .filter(|e| !e.is_dir)
            .filter(|e| e.path.file_name().is_some_and(|name| matcher.is_match(name)))
            .filter_map(|e| self.project.guard().relativize(&e.path))
            .collect();
        to_json(&json!({ "files": files }))
    }

    /// Regex search over non-ignored files; `{path: [display blocks]}`.
    ///
    /// The pattern is compiled with `.` matching newlines, so a match may
    /// span several lines; each match becomes one block of numbered lines.
    pub fn search_for_pattern(&self, params: SearchForPatternParams) -> Result<String, ToolError> {
        let regex = get_or_compile_pattern(&params.substring_pattern)
            .map_err(|e| ToolError::validation(format!("invalid pattern: {e}")))?;
        let include = optional_glob(&params.paths_include_glob)?;
        let exclude = optional_glob(&params.paths_exclude_glob)?;

        let base = if params.relative_path.is_empty() {
            self.project.root().to_path_buf()
        } else {
            self.project.validate_relative_path(&params.relative_path, true)?
        };

        let mut results = Map::new();
        for entry in self.walk(&base, usize::MAX, true)? {
            if entry.is_dir {
                continue;
            }
            let Some(relative) = self.project.guard().relativize(&entry.path) else {
                continue;
            };
            if params.restrict_search_to_code_files && !is_code_file(&entry.path) {
                continue;
            }
            if include.as_ref().is_some_and(|g| !g.is_match(&relative))
                || exclude.as_ref().is_some_and(|g| g.is_match(&relative))
            {
                continue;
            }
            let content = match self.project.read_absolute(&entry.path) {
                Ok(content) => content,
                Err(e) => {
                    debug!("Skipping {relative}: {e}");
                    continue;
                }
            };

            let lines: Vec<&str> = content.lines().collect();
            let blocks: Vec<Value> = regex
                .find_iter(&content)
                .map(|m| {
                    let first = content[..m.start()].matches('\n').count();
                    let last = first + m.as_str().trim_end_matches('\n').matches('\n').count();
                    MatchedLines::around(
                        &lines,
                        first,
                        last,
                        params.context_lines_before,
                        params.context_lines_after,
                    )
                    .to_display_string()
                    .into()
                })
                .collect();
            if !blocks.is_empty() {
                results.insert(relative, Value::Array(blocks));
            }
        }

        let answer = to_json(&results)?;
        Ok(self.limit(answer, params.max_answer_chars))
    }

    pub fn replace_content(&self, params: ReplaceContentParams) -> Result<String, ToolError> {
        let mode: EditMode = params
            .mode
            .parse()
            .map_err(|e| ToolError::from_mutation(&params.relative_path, e))?;
        self.replace_in_file(
            &params.relative_path,
            &params.needle,
            &params.repl,
            mode,
            params.allow_multiple_occurrences,
            true,
        )?;
        Ok(SUCCESS_RESULT.to_string())
    }

    /// Pattern replacement inside one transaction.
    pub(crate) fn replace_in_file(
        &self,
        relative_path: &str,
        needle: &str,
        repl: &str,
        mode: EditMode,
        allow_multiple: bool,
        require_not_ignored: bool,
    ) -> Result<EditOutcome, ToolError> {
        with_edited_file(&self.project, relative_path, require_not_ignored, |content| {
            let outcome = mutate(content, needle, mode, repl, allow_multiple)
                .map_err(|e| ToolError::from_mutation(relative_path, e))?;
            debug!("Replaced {} occurrences in {relative_path}", outcome.occurrences);
            Ok(outcome.updated_content)
        })
    }

    pub fn delete_lines(&self, params: DeleteLinesParams) -> Result<String, ToolError> {
        LineRangeEditor::new(&self.project).delete_lines(&params.relative_path, params.start_line, params.end_line)?;
        Ok(SUCCESS_RESULT.to_string())
    }

    pub fn insert_at_line(&self, params: InsertAtLineParams) -> Result<String, ToolError> {
        LineRangeEditor::new(&self.project).insert_at_line(&params.relative_path, params.line, &params.content)?;
        Ok(SUCCESS_RESULT.to_string())
    }

    pub fn replace_lines(&self, params: ReplaceLinesParams) -> Result<String, ToolError> {
        LineRangeEditor::new(&self.project).replace_lines(
            &params.relative_path,
            params.start_line,
            params.end_line,
            &params.content,
        )?;
        Ok(SUCCESS_RESULT.to_string())
    }

    /// Entries below `dir` (not `dir` itself), sorted by name. A file yields
    /// just itself.
    fn walk(&self, dir: &Path, max_depth: usize, skip_ignored: bool) -> Result<Vec<WalkEntry>, ToolError> {
        if dir.is_file() {
            return Ok(vec![WalkEntry {
                path: dir.to_path_buf(),
                is_dir: false,
            }]);
        }
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !skip_ignored || !self.project.is_ignored_path(e.path()));

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                ToolError::io(path, e.into())
            })?;
            entries.push(WalkEntry {
                is_dir: entry.file_type().is_dir(),
                path: entry.into_path(),
            });
        }
        Ok(entries)
    }
}

struct WalkEntry {
    path: PathBuf,
    is_dir: bool,
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher, ToolError> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| ToolError::validation(format!("invalid glob '{pattern}': {e}")))
}

fn is_code_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("rs")
}

/// An empty pattern means no filter.
fn optional_glob(pattern: &str) -> Result<Option<GlobMatcher>, ToolError> {
    if pattern.is_empty() {
        Ok(None)
    } else {
        compile_glob(pattern).map(Some)
    }
}
