//! The tool surface: named tools taking JSON parameters and returning text.
//!
//! Mutating tools answer [`SUCCESS_RESULT`]; queries answer ordered-key JSON
//! capped at `max_answer_chars` characters.

mod file;
mod memory;
pub mod params;
mod symbol;

use crate::error::ToolError;
use crate::output::limit_length;
use crate::project::Project;
use crate::symbols::{RustSymbolBackend, SymbolBackend, SymbolQueryAdapter};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Answer of every successful mutating tool.
pub const SUCCESS_RESULT: &str = "OK";

/// Static description of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub can_edit: bool,
}

const fn tool(name: &'static str, description: &'static str, can_edit: bool) -> ToolInfo {
    ToolInfo {
        name,
        description,
        can_edit,
    }
}

pub const TOOLS: &[ToolInfo] = &[
    tool("read_file", "Read a file or an inclusive range of its lines", false),
    tool("create_text_file", "Create or overwrite a text file", true),
    tool("list_dir", "List files and directories", false),
    tool("find_file", "Find files whose name matches a glob", false),
    tool("search_for_pattern", "Regex search with context lines", false),
    tool("replace_content", "Replace literal or regex matches in a file", true),
    tool("delete_lines", "Delete an inclusive range of lines", true),
    tool("insert_at_line", "Insert content before a line", true),
    tool("replace_lines", "Replace an inclusive range of lines", true),
    tool("get_symbols_overview", "Top-level symbols of a file", false),
    tool("find_symbol", "Find symbols by name path pattern", false),
    tool("find_referencing_symbols", "Symbols referencing a symbol", false),
    tool("rename_symbol", "Rename a symbol across the project", true),
    tool("write_memory", "Write a named memory note", false),
    tool("read_memory", "Read a named memory note", false),
    tool("list_memories", "List memory notes", false),
    tool("delete_memory", "Delete a memory note", false),
    tool("edit_memory", "Replace content in a memory note", false),
];

pub fn tool_info(name: &str) -> Option<&'static ToolInfo> {
    TOOLS.iter().find(|t| t.name == name)
}

/// A project plus a symbol backend, dispatching tool calls by name.
pub struct Toolbox<B: SymbolBackend> {
    project: Project,
    backend: B,
}

impl Toolbox<RustSymbolBackend> {
    /// Open a project with the built-in Rust backend.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let project = Project::open(root)?;
        let backend = RustSymbolBackend::new(project.clone());
        Ok(Self::new(project, backend))
    }
}

impl<B: SymbolBackend> Toolbox<B> {
    pub fn new(project: Project, backend: B) -> Self {
        Self { project, backend }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether `name` is a known tool that modifies files.
    pub fn can_edit(name: &str) -> bool {
        tool_info(name).is_some_and(|t| t.can_edit)
    }

    pub fn tool_names() -> impl Iterator<Item = &'static str> {
        TOOLS.iter().map(|t| t.name)
    }

    /// Run tool `name` with a JSON object of named parameters.
    pub fn call(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let info = tool_info(name).ok_or_else(|| ToolError::validation(format!("unknown tool: '{name}'")))?;
        if info.can_edit {
            self.project.ensure_writable()?;
        }
        debug!("Calling tool {name}");

        match name {
            "read_file" => self.read_file(parse_params(name, args)?),
            "create_text_file" => self.create_text_file(parse_params(name, args)?),
            "list_dir" => self.list_dir(parse_params(name, args)?),
            "find_file" => self.find_file(parse_params(name, args)?),
            "search_for_pattern" => self.search_for_pattern(parse_params(name, args)?),
            "replace_content" => self.replace_content(parse_params(name, args)?),
            "delete_lines" => self.delete_lines(parse_params(name, args)?),
            "insert_at_line" => self.insert_at_line(parse_params(name, args)?),
            "replace_lines" => self.replace_lines(parse_params(name, args)?),
            "get_symbols_overview" => self.get_symbols_overview(parse_params(name, args)?),
            "find_symbol" => self.find_symbol(parse_params(name, args)?),
            "find_referencing_symbols" => self.find_referencing_symbols(parse_params(name, args)?),
            "rename_symbol" => self.rename_symbol(parse_params(name, args)?),
            "write_memory" => self.write_memory(parse_params(name, args)?),
            "read_memory" => self.read_memory(parse_params(name, args)?),
            "list_memories" => self.list_memories(parse_params(name, args)?),
            "delete_memory" => self.delete_memory(parse_params(name, args)?),
            "edit_memory" => self.edit_memory(parse_params(name, args)?),
            _ => Err(ToolError::validation(format!("unknown tool: '{name}'"))),
        }
    }

    fn symbols(&self) -> SymbolQueryAdapter<'_, B> {
        SymbolQueryAdapter::new(&self.backend, &self.project)
    }

    /// Effective answer cap for a call.
    fn answer_limit(&self, max_answer_chars: Option<i64>) -> i64 {
        max_answer_chars.unwrap_or(self.project.config().default_max_answer_chars)
    }

    fn limit(&self, answer: String, max_answer_chars: Option<i64>) -> String {
        limit_length(answer, self.answer_limit(max_answer_chars))
    }
}

/// `null` counts as an empty parameter object.
fn parse_params<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(args)
        .map_err(|e| ToolError::validation(format!("invalid parameters for {tool}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn edit_capability_is_advertised() {
        assert!(Toolbox::<RustSymbolBackend>::can_edit("replace_content"));
        assert!(Toolbox::<RustSymbolBackend>::can_edit("rename_symbol"));
        // Memories stay writable in read-only projects.
        assert!(!Toolbox::<RustSymbolBackend>::can_edit("write_memory"));
        assert!(!Toolbox::<RustSymbolBackend>::can_edit("edit_memory"));
        assert!(!Toolbox::<RustSymbolBackend>::can_edit("delete_memory"));
        assert!(!Toolbox::<RustSymbolBackend>::can_edit("find_symbol"));
        assert!(!Toolbox::<RustSymbolBackend>::can_edit("no_such_tool"));
    }

    #[test]
    fn tool_names_are_unique() {
        let mut names: Vec<_> = Toolbox::<RustSymbolBackend>::tool_names().collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn unknown_tools_and_bad_params_are_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let toolbox = Toolbox::open(dir.path()).unwrap();

        let err = toolbox.call("format_disk", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = toolbox
            .call("read_file", json!({"relative_path": "a", "bogus": 1}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = toolbox.call("read_file", Value::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
