//! Named parameters of each tool, deserialized from a JSON object.
//!
//! `max_answer_chars: None` falls back to the project's configured default.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadFileParams {
    pub relative_path: String,
    #[serde(default)]
    pub start_line: usize,
    /// Inclusive; `None` reads to the end of the file
    #[serde(default)]
    pub end_line: Option<usize>,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTextFileParams {
    pub relative_path: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListDirParams {
    pub relative_path: String,
    pub recursive: bool,
    #[serde(default)]
    pub skip_ignored_files: bool,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindFileParams {
    /// Glob matched against file names, e.g. `*.rs`
    pub file_mask: String,
    pub relative_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchForPatternParams {
    pub substring_pattern: String,
    #[serde(default)]
    pub context_lines_before: usize,
    #[serde(default)]
    pub context_lines_after: usize,
    /// Only search files the symbol backend understands (`.rs`)
    #[serde(default)]
    pub restrict_search_to_code_files: bool,
    #[serde(default)]
    pub paths_include_glob: String,
    #[serde(default)]
    pub paths_exclude_glob: String,
    #[serde(default)]
    pub relative_path: String,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceContentParams {
    pub relative_path: String,
    pub needle: String,
    pub repl: String,
    /// `literal` or `regex`
    pub mode: String,
    #[serde(default)]
    pub allow_multiple_occurrences: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteLinesParams {
    pub relative_path: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertAtLineParams {
    pub relative_path: String,
    pub line: usize,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceLinesParams {
    pub relative_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetSymbolsOverviewParams {
    pub relative_path: String,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindSymbolParams {
    pub name_path_pattern: String,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub relative_path: String,
    #[serde(default)]
    pub include_body: bool,
    #[serde(default)]
    pub include_kinds: Vec<i64>,
    #[serde(default)]
    pub exclude_kinds: Vec<i64>,
    #[serde(default)]
    pub substring_matching: bool,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindReferencingSymbolsParams {
    pub name_path: String,
    pub relative_path: String,
    #[serde(default)]
    pub include_kinds: Vec<i64>,
    #[serde(default)]
    pub exclude_kinds: Vec<i64>,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameSymbolParams {
    pub name_path: String,
    pub relative_path: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteMemoryParams {
    pub memory_file_name: String,
    pub content: String,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadMemoryParams {
    pub memory_file_name: String,
    #[serde(default)]
    pub max_answer_chars: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListMemoriesParams {}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteMemoryParams {
    pub memory_file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditMemoryParams {
    pub memory_file_name: String,
    pub needle: String,
    pub repl: String,
    pub mode: String,
    #[serde(default)]
    pub allow_multiple_occurrences: bool,
}
