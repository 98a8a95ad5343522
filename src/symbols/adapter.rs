use crate::context::ReferenceContextStitcher;
use crate::error::ToolError;
use crate::project::Project;
use crate::symbols::backend::{SymbolBackend, SymbolQuery};
use crate::symbols::descriptor::{ReferenceDescriptor, SymbolRecord};
use crate::symbols::kind::KindFilter;
use tracing::debug;

const REFERENCE_CONTEXT_BEFORE: usize = 1;
const REFERENCE_CONTEXT_AFTER: usize = 1;

/// Normalizes backend answers into sanitized records.
pub struct SymbolQueryAdapter<'a, B: SymbolBackend + ?Sized> {
    backend: &'a B,
    project: &'a Project,
}

impl<'a, B: SymbolBackend + ?Sized> SymbolQueryAdapter<'a, B> {
    pub fn new(backend: &'a B, project: &'a Project) -> Self {
        Self { backend, project }
    }

    pub fn overview(&self, relative_path: &str, depth: usize) -> Result<Vec<SymbolRecord>, ToolError> {
        if !self.project.relative_path_exists(relative_path) {
            return Err(ToolError::NotFound {
                path: relative_path.into(),
            });
        }
        self.project.validate_file(relative_path, true)?;

        let symbols = self.backend.overview(relative_path, depth)?;
        debug!("{} top-level symbols in {relative_path}", symbols.len());
        Ok(symbols
            .iter()
            .map(|s| s.truncated(depth).to_sanitized_record(depth, false))
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn find(
        &self,
        name_path_pattern: &str,
        include_kinds: &[i64],
        exclude_kinds: &[i64],
        substring_matching: bool,
        within_path: Option<&str>,
        depth: usize,
        include_body: bool,
    ) -> Result<Vec<SymbolRecord>, ToolError> {
        let kinds = KindFilter::from_codes(include_kinds, exclude_kinds)?;
        let within_path = within_path.filter(|p| !p.is_empty());
        if let Some(path) = within_path {
            self.project.validate_relative_path(path, true)?;
        }

        let query = SymbolQuery {
            pattern: name_path_pattern,
            kinds: kinds.clone(),
            substring_matching,
            within_path,
        };
        let symbols = self.backend.find(&query)?;
        Ok(symbols
            .iter()
            .filter(|s| kinds.allows(s.kind))
            .map(|s| s.to_sanitized_record(depth, include_body))
            .collect())
    }

    /// One record per referencing symbol.
    ///
    /// Without bodies, each record carries the reference line and one line of
    /// context on either side under `content_around_reference`.
    pub fn find_references(
        &self,
        name_path: &str,
        relative_path: &str,
        include_kinds: &[i64],
        exclude_kinds: &[i64],
        include_body: bool,
    ) -> Result<Vec<SymbolRecord>, ToolError> {
        let kinds = KindFilter::from_codes(include_kinds, exclude_kinds)?;
        self.project.validate_file(relative_path, true)?;

        let hits = self.backend.find_references(name_path, relative_path, &kinds)?;
        let stitcher = ReferenceContextStitcher::new(self.project);
        let mut records = Vec::with_capacity(hits.len());
        for hit in hits.into_iter().filter(|h| kinds.allows(h.symbol.kind)) {
            let context_snippet = match (include_body, hit.symbol.relative_path()) {
                (false, Some(path)) => Some(stitcher.stitch(
                    path,
                    hit.line,
                    REFERENCE_CONTEXT_BEFORE,
                    REFERENCE_CONTEXT_AFTER,
                )?),
                _ => None,
            };
            let reference = ReferenceDescriptor {
                symbol: hit.symbol,
                line: hit.line,
                context_snippet,
            };
            records.push(reference.to_record(include_body));
        }
        Ok(records)
    }

    pub fn rename(&self, name_path: &str, relative_path: &str, new_name: &str) -> Result<String, ToolError> {
        self.project.validate_file(relative_path, true)?;
        Ok(self.backend.rename(name_path, relative_path, new_name)?)
    }
}
