use crate::error::ToolError;
use crate::output::to_json;
use crate::symbols::SymbolBackend;
use crate::tools::params::{
    FindReferencingSymbolsParams, FindSymbolParams, GetSymbolsOverviewParams, RenameSymbolParams,
};
use crate::tools::Toolbox;

impl<B: SymbolBackend> Toolbox<B> {
    pub fn get_symbols_overview(&self, params: GetSymbolsOverviewParams) -> Result<String, ToolError> {
        let records = self.symbols().overview(&params.relative_path, params.depth)?;
        Ok(self.limit(to_json(&records)?, params.max_answer_chars))
    }

    pub fn find_symbol(&self, params: FindSymbolParams) -> Result<String, ToolError> {
        let records = self.symbols().find(
            &params.name_path_pattern,
            &params.include_kinds,
            &params.exclude_kinds,
            params.substring_matching,
            Some(params.relative_path.as_str()),
            params.depth,
            params.include_body,
        )?;
        Ok(self.limit(to_json(&records)?, params.max_answer_chars))
    }

    pub fn find_referencing_symbols(&self, params: FindReferencingSymbolsParams) -> Result<String, ToolError> {
        let records = self.symbols().find_references(
            &params.name_path,
            &params.relative_path,
            &params.include_kinds,
            &params.exclude_kinds,
            false,
        )?;
        Ok(self.limit(to_json(&records)?, params.max_answer_chars))
    }

    /// Answers the backend's status text unchanged.
    pub fn rename_symbol(&self, params: RenameSymbolParams) -> Result<String, ToolError> {
        self.symbols()
            .rename(&params.name_path, &params.relative_path, &params.new_name)
    }
}
