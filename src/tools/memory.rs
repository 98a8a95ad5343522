//! Markdown memory notes kept under the project's memories directory.

use crate::edit::atomic_write;
use crate::error::ToolError;
use crate::mutation::EditMode;
use crate::output::to_json;
use crate::symbols::SymbolBackend;
use crate::tools::params::{
    DeleteMemoryParams, EditMemoryParams, ListMemoriesParams, ReadMemoryParams, WriteMemoryParams,
};
use crate::tools::{Toolbox, SUCCESS_RESULT};
use std::fs;
use tracing::info;

const MEMORY_EXTENSION: &str = "md";

impl<B: SymbolBackend> Toolbox<B> {
    /// Project-relative path of a memory; `name` may carry the `.md` suffix.
    fn memory_relative_path(&self, name: &str) -> Result<String, ToolError> {
        let stem = name.strip_suffix(".md").unwrap_or(name);
        if stem.is_empty() || stem == "." || stem == ".." || stem.contains(['/', '\\']) {
            return Err(ToolError::validation(format!("invalid memory name: '{name}'")));
        }
        let dir = self.project.config().memories_dir.trim_end_matches('/');
        Ok(format!("{dir}/{stem}.{MEMORY_EXTENSION}"))
    }

    /// Content longer than `max_answer_chars` fails `ContentTooLarge`.
    pub fn write_memory(&self, params: WriteMemoryParams) -> Result<String, ToolError> {
        let len = params.content.chars().count();
        let max = self.answer_limit(params.max_answer_chars);
        if let Ok(max) = usize::try_from(max) {
            if max > 0 && len > max {
                return Err(ToolError::ContentTooLarge { len, max });
            }
        }

        let relative = self.memory_relative_path(&params.memory_file_name)?;
        let path = self.project.guard().validate_new_path(&relative, false)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ToolError::io(parent, source))?;
        }
        let bytes = self.project.encode(&path, &params.content)?;
        atomic_write(&path, &bytes).map_err(|source| ToolError::Edit {
            path: path.clone(),
            source,
        })?;
        info!("Wrote memory {relative}");
        Ok(SUCCESS_RESULT.to_string())
    }

    pub fn read_memory(&self, params: ReadMemoryParams) -> Result<String, ToolError> {
        let relative = self.memory_relative_path(&params.memory_file_name)?;
        let path = self.project.validate_file(&relative, false)?;
        let content = self.project.read_absolute(&path)?;
        Ok(self.limit(content, params.max_answer_chars))
    }

    /// Sorted memory names, without extension, as a JSON array.
    pub fn list_memories(&self, _params: ListMemoriesParams) -> Result<String, ToolError> {
        let dir = self.project.resolve(&self.project.config().memories_dir);
        let mut names = Vec::new();
        if dir.is_dir() {
            let entries = fs::read_dir(&dir).map_err(|source| ToolError::io(&dir, source))?;
            for entry in entries {
                let path = entry.map_err(|source| ToolError::io(&dir, source))?.path();
                if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(MEMORY_EXTENSION) {
                    if let Some(stem) = path.file_stem() {
                        names.push(stem.to_string_lossy().into_owned());
                    }
                }
            }
        }
        names.sort();
        to_json(&names)
    }

    pub fn delete_memory(&self, params: DeleteMemoryParams) -> Result<String, ToolError> {
        let relative = self.memory_relative_path(&params.memory_file_name)?;
        let path = self.project.validate_file(&relative, false)?;
        fs::remove_file(&path).map_err(|source| ToolError::io(&path, source))?;
        info!("Deleted memory {relative}");
        Ok(SUCCESS_RESULT.to_string())
    }

    /// `replace_content` on a memory file, skipping the ignore check.
    pub fn edit_memory(&self, params: EditMemoryParams) -> Result<String, ToolError> {
        let relative = self.memory_relative_path(&params.memory_file_name)?;
        let mode: EditMode = params
            .mode
            .parse()
            .map_err(|e| ToolError::from_mutation(&relative, e))?;
        self.replace_in_file(
            &relative,
            &params.needle,
            &params.repl,
            mode,
            params.allow_multiple_occurrences,
            false,
        )?;
        Ok(SUCCESS_RESULT.to_string())
    }
}
