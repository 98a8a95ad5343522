//! Built-in symbol backend for Rust sources, driven by tree-sitter.
//!
//! Symbols come from item nodes (functions, types, traits, impls, modules,
//! consts, statics, type aliases). References are identifier nodes whose
//! text equals the target's name and whose syntactic role fits the target:
//! members of a type are only reached through `.name`, `Owner::name`,
//! `Self::name` or a declaration inside a matching impl, free items only
//! through bare or lowercase-qualified paths. No name resolution beyond
//! that is attempted.

use crate::edit::Edit;
use crate::pool::with_parser;
use crate::project::Project;
use crate::symbols::backend::{BackendError, ReferenceHit, SymbolBackend, SymbolQuery};
use crate::symbols::descriptor::{BodyLocation, SymbolDescriptor, SymbolLocation};
use crate::symbols::kind::{KindFilter, SymbolKind};
use crate::symbols::name_path::NamePathPattern;
use crate::ts::{ParsedSource, TreeSitterError};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use tree_sitter::{Node, Point};
use walkdir::WalkDir;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

const IDENTIFIER_NODES: &[&str] = &["identifier", "type_identifier", "field_identifier"];

const DECLARATION_NODES: &[&str] = &[
    "function_item",
    "function_signature_item",
    "struct_item",
    "union_item",
    "enum_item",
    "enum_variant",
    "trait_item",
    "mod_item",
    "const_item",
    "static_item",
    "type_item",
    "associated_type",
];

/// The type (or trait) whose items a symbol or occurrence belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Owner {
    name: String,
    /// Implemented trait; a trait body is its own trait.
    trait_name: Option<String>,
}

impl Owner {
    fn of_type(name: &str) -> Self {
        Self {
            name: name.to_string(),
            trait_name: None,
        }
    }

    /// Owner introduced by an `impl`, `trait` or type declaration node.
    fn of_container(parsed: &ParsedSource<'_>, node: Node<'_>) -> Option<Self> {
        match node.kind() {
            "struct_item" | "union_item" | "enum_item" => {
                Some(Self::of_type(parsed.node_text(node.child_by_field_name("name")?)))
            }
            "impl_item" => Some(Self {
                name: parsed.node_text(type_name_node(node.child_by_field_name("type")?)).to_string(),
                trait_name: node
                    .child_by_field_name("trait")
                    .map(|t| parsed.node_text(type_name_node(t)).to_string()),
            }),
            "trait_item" => {
                let name = parsed.node_text(node.child_by_field_name("name")?).to_string();
                Some(Self {
                    trait_name: Some(name.clone()),
                    name,
                })
            }
            _ => None,
        }
    }

    fn answers_to(&self, qualifier: &str) -> bool {
        self.name == qualifier || self.trait_name.as_deref() == Some(qualifier)
    }

    fn shares_items_with(&self, other: &Owner) -> bool {
        self.name == other.name || (self.trait_name.is_some() && self.trait_name == other.trait_name)
    }
}

#[derive(Debug, Clone)]
struct ItemSymbol {
    name: String,
    name_path: String,
    kind: SymbolKind,
    name_bytes: Range<usize>,
    name_point: Point,
    span: Range<usize>,
    start_row: usize,
    end_row: usize,
    owner: Option<Owner>,
    children: Vec<ItemSymbol>,
}

impl ItemSymbol {
    fn descriptor(&self, relative_path: &str, source: &str, depth: usize) -> SymbolDescriptor {
        SymbolDescriptor {
            name: self.name.clone(),
            name_path: self.name_path.clone(),
            kind: self.kind,
            location: SymbolLocation {
                relative_path: Some(relative_path.to_string()),
                line: self.name_point.row,
                column: self.name_point.column,
            },
            body_location: Some(BodyLocation {
                start_line: self.start_row,
                end_line: self.end_row,
            }),
            body: Some(source[self.span.clone()].to_string()),
            children: if depth == 0 {
                Vec::new()
            } else {
                self.children
                    .iter()
                    .map(|c| c.descriptor(relative_path, source, depth - 1))
                    .collect()
            },
        }
    }

    fn walk<'s>(&'s self, out: &mut Vec<&'s ItemSymbol>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }

    fn innermost_at(&self, byte: usize) -> Option<&ItemSymbol> {
        if !self.span.contains(&byte) {
            return None;
        }
        self.children
            .iter()
            .find_map(|c| c.innermost_at(byte))
            .or(Some(self))
    }
}

/// How an identifier is used at its position.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Role {
    Bare,
    /// `x.name`, a field declaration or a struct literal field.
    Member,
    /// `qualifier::name`; `qualifier` is the last segment of the path.
    Path { qualifier: String },
    /// The name of an item or variant declaration.
    Declaration,
}

/// Identifier-like token in a parsed file.
#[derive(Debug, Clone)]
struct Occurrence {
    bytes: Range<usize>,
    row: usize,
    role: Role,
    /// Innermost enclosing `impl`, `trait` or type declaration.
    owner: Option<Owner>,
}

/// The symbol being searched for or renamed.
struct Target {
    name: String,
    owner: Option<Owner>,
    path: PathBuf,
    name_bytes: Range<usize>,
}

impl Target {
    fn new(file: &SourceFile, symbol: &ItemSymbol) -> Self {
        Self {
            name: symbol.name.clone(),
            owner: symbol.owner.clone(),
            path: file.path.clone(),
            name_bytes: symbol.name_bytes.clone(),
        }
    }

    fn is_declaration(&self, file: &SourceFile, occurrence: &Occurrence) -> bool {
        file.path == self.path && occurrence.bytes == self.name_bytes
    }

    fn is_referenced_by(&self, file: &SourceFile, occurrence: &Occurrence) -> bool {
        if self.is_declaration(file, occurrence) {
            return true;
        }
        match (&self.owner, &occurrence.role) {
            (Some(_), Role::Member) => true,
            (Some(owner), Role::Path { qualifier }) => {
                owner.answers_to(qualifier)
                    || (qualifier == "Self" && occurrence.owner.as_ref().is_some_and(|o| o.name == owner.name))
            }
            (Some(owner), Role::Declaration) => occurrence
                .owner
                .as_ref()
                .is_some_and(|o| o.shares_items_with(owner)),
            (Some(_), Role::Bare) => false,
            (None, Role::Bare) => true,
            (None, Role::Member) => false,
            // `module::name`, never `Type::name`.
            (None, Role::Path { qualifier }) => !qualifier.starts_with(char::is_uppercase),
            (None, Role::Declaration) => occurrence.owner.is_none(),
        }
    }
}

/// One parsed `.rs` file.
struct SourceFile {
    relative_path: String,
    path: PathBuf,
    source: String,
    symbols: Vec<ItemSymbol>,
    identifiers: Vec<Occurrence>,
}

impl SourceFile {
    fn all_symbols(&self) -> Vec<&ItemSymbol> {
        let mut out = Vec::new();
        for symbol in &self.symbols {
            symbol.walk(&mut out);
        }
        out
    }

    fn occurrences_of<'s>(&'s self, target: &'s Target) -> impl Iterator<Item = &'s Occurrence> + 's {
        self.identifiers
            .iter()
            .filter(move |o| self.source[o.bytes.clone()] == target.name)
            .filter(move |o| target.is_referenced_by(self, o))
    }

    /// Pseudo-symbol standing for the file itself.
    fn file_symbol(&self) -> SymbolDescriptor {
        let name = Path::new(&self.relative_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.relative_path.clone());
        SymbolDescriptor {
            name: name.clone(),
            name_path: name,
            kind: SymbolKind::File,
            location: SymbolLocation {
                relative_path: Some(self.relative_path.clone()),
                line: 0,
                column: 0,
            },
            body_location: Some(BodyLocation {
                start_line: 0,
                end_line: self.source.lines().count().saturating_sub(1),
            }),
            body: Some(self.source.clone()),
            children: Vec::new(),
        }
    }

    fn enclosing_symbol(&self, byte: usize) -> SymbolDescriptor {
        self.symbols
            .iter()
            .find_map(|s| s.innermost_at(byte))
            .map(|s| s.descriptor(&self.relative_path, &self.source, 0))
            .unwrap_or_else(|| self.file_symbol())
    }
}

pub struct RustSymbolBackend {
    project: Project,
}

impl RustSymbolBackend {
    pub fn new(project: Project) -> Self {
        Self { project }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    fn load(&self, relative_path: &str) -> Result<SourceFile, BackendError> {
        let path = self.project.resolve(relative_path);
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            return Err(BackendError::Unsupported { path });
        }
        self.load_path(&path)
    }

    fn load_path(&self, path: &Path) -> Result<SourceFile, BackendError> {
        let bytes = fs::read(path).map_err(|source| BackendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = self
            .project
            .config()
            .encoding
            .decode(bytes)
            .map_err(|e| BackendError::Other(format!("{}: {e}", path.display())))?;
        let relative_path = self
            .project
            .guard()
            .relativize(path)
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let parse_error = |source: TreeSitterError| BackendError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let tree = with_parser(|parser| parser.parse(&source))
            .map_err(parse_error)?
            .map_err(parse_error)?;

        let (symbols, identifiers) = {
            let parsed = ParsedSource {
                source: &source,
                tree,
            };
            if parsed.has_errors() {
                warn!("Syntax errors in {relative_path}; symbol information may be incomplete");
            }
            let mut symbols = Vec::new();
            collect_items(&parsed, parsed.root_node(), None, None, &mut symbols);
            let mut identifiers = Vec::new();
            collect_identifiers(&parsed, parsed.root_node(), None, &mut identifiers);
            (symbols, identifiers)
        };

        Ok(SourceFile {
            relative_path,
            path: path.to_path_buf(),
            source,
            symbols,
            identifiers,
        })
    }

    /// Non-ignored `.rs` files under `within` (or the whole project), sorted.
    fn source_files(&self, within: Option<&str>) -> Result<Vec<PathBuf>, BackendError> {
        let base = match within {
            Some(rel) => self.project.resolve(rel),
            None => self.project.root().to_path_buf(),
        };

        let mut files = Vec::new();
        let walker = WalkDir::new(&base)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.project.is_ignored_path(e.path()));
        for entry in walker {
            let entry = entry.map_err(|e| BackendError::Io {
                path: e.path().map_or_else(|| base.clone(), Path::to_path_buf),
                source: e.into(),
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("rs")
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Parsed project files under `within`. Files that cannot be read or
    /// decoded are skipped with a warning.
    fn parsed_files(&self, within: Option<&str>) -> Result<impl Iterator<Item = SourceFile> + '_, BackendError> {
        let paths = self.source_files(within)?;
        Ok(paths.into_iter().filter_map(|path| match self.load_path(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                None
            }
        }))
    }

    /// The single symbol in `file` whose name path matches `name_path` exactly.
    fn resolve_unique<'f>(&self, file: &'f SourceFile, name_path: &str) -> Result<&'f ItemSymbol, BackendError> {
        let pattern = NamePathPattern::parse(name_path);
        let candidates: Vec<_> = file
            .all_symbols()
            .into_iter()
            .filter(|s| pattern.matches(&s.name_path, false))
            .collect();
        match candidates.as_slice() {
            [] => Err(BackendError::SymbolNotFound {
                name_path: name_path.to_string(),
                relative_path: file.relative_path.clone(),
            }),
            [symbol] => Ok(*symbol),
            many => Err(BackendError::InvalidArgument(format!(
                "name path '{name_path}' matches {} symbols in {}: {}",
                many.len(),
                file.relative_path,
                many.iter()
                    .map(|s| s.name_path.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl SymbolBackend for RustSymbolBackend {
    fn overview(&self, relative_path: &str, depth: usize) -> Result<Vec<SymbolDescriptor>, BackendError> {
        let file = self.load(relative_path)?;
        Ok(file
            .symbols
            .iter()
            .map(|s| s.descriptor(&file.relative_path, &file.source, depth))
            .collect())
    }

    fn find(&self, query: &SymbolQuery<'_>) -> Result<Vec<SymbolDescriptor>, BackendError> {
        let pattern = NamePathPattern::parse(query.pattern);
        if pattern.is_empty() {
            return Err(BackendError::InvalidArgument(
                "name path pattern must not be empty".to_string(),
            ));
        }

        let mut found = Vec::new();
        for file in self.parsed_files(query.within_path)? {
            found.extend(
                file.all_symbols()
                    .into_iter()
                    .filter(|s| query.kinds.allows(s.kind))
                    .filter(|s| pattern.matches(&s.name_path, query.substring_matching))
                    .map(|s| s.descriptor(&file.relative_path, &file.source, usize::MAX)),
            );
        }
        debug!("Pattern '{}' matched {} symbols", query.pattern, found.len());
        Ok(found)
    }

    fn find_references(
        &self,
        name_path: &str,
        relative_path: &str,
        kinds: &KindFilter,
    ) -> Result<Vec<ReferenceHit>, BackendError> {
        let target_file = self.load(relative_path)?;
        let target = Target::new(&target_file, self.resolve_unique(&target_file, name_path)?);

        let mut hits = Vec::new();
        // One hit per referencing symbol, keyed by file and symbol start.
        let mut seen = BTreeSet::new();
        for file in self.parsed_files(None)? {
            for occurrence in file.occurrences_of(&target) {
                if target.is_declaration(&file, occurrence) {
                    continue;
                }
                let symbol = file.enclosing_symbol(occurrence.bytes.start);
                if !kinds.allows(symbol.kind) {
                    continue;
                }
                let key = (
                    file.relative_path.clone(),
                    symbol.name_path.clone(),
                    symbol.body_location.map(|b| b.start_line),
                );
                if seen.insert(key) {
                    hits.push(ReferenceHit {
                        symbol,
                        line: occurrence.row,
                    });
                }
            }
        }
        debug!("Found {} symbols referencing {name_path}", hits.len());
        Ok(hits)
    }

    fn rename(&self, name_path: &str, relative_path: &str, new_name: &str) -> Result<String, BackendError> {
        if !IDENTIFIER.is_match(new_name) {
            return Err(BackendError::InvalidArgument(format!(
                "'{new_name}' is not a valid Rust identifier"
            )));
        }
        let target_file = self.load(relative_path)?;
        let target = Target::new(&target_file, self.resolve_unique(&target_file, name_path)?);
        let old_name = target.name.clone();
        if old_name == new_name {
            return Ok(format!("Symbol '{name_path}' is already named '{new_name}'"));
        }

        let mut edits = Vec::new();
        for file in self.parsed_files(None)? {
            edits.extend(file.occurrences_of(&target).map(|o| {
                Edit::new(
                    file.path.clone(),
                    o.bytes.start,
                    o.bytes.end,
                    new_name,
                    old_name.as_str(),
                )
            }));
        }

        let occurrences = edits.len();
        let files = Edit::apply_batch(edits)?;
        info!("Renamed {old_name} to {new_name}: {occurrences} occurrences in {files} files");
        Ok(format!(
            "Successfully renamed '{old_name}' to '{new_name}' ({occurrences} occurrences in {files} files)"
        ))
    }
}

fn collect_items(
    parsed: &ParsedSource<'_>,
    container: Node<'_>,
    parent: Option<&str>,
    owner: Option<&Owner>,
    out: &mut Vec<ItemSymbol>,
) {
    let mut cursor = container.walk();
    for node in container.named_children(&mut cursor) {
        if let Some(item) = item_symbol(parsed, node, parent, owner) {
            out.push(item);
        }
    }
}

fn item_symbol(
    parsed: &ParsedSource<'_>,
    node: Node<'_>,
    parent: Option<&str>,
    owner: Option<&Owner>,
) -> Option<ItemSymbol> {
    let kind = match node.kind() {
        "function_item" if owner.is_some() => SymbolKind::Method,
        "function_item" => SymbolKind::Function,
        "function_signature_item" => SymbolKind::Method,
        "struct_item" | "union_item" => SymbolKind::Struct,
        "enum_item" => SymbolKind::Enum,
        "trait_item" => SymbolKind::Interface,
        "impl_item" => SymbolKind::Object,
        "mod_item" => SymbolKind::Module,
        "const_item" => SymbolKind::Constant,
        "static_item" => SymbolKind::Variable,
        "type_item" | "associated_type" => SymbolKind::TypeParameter,
        _ => return None,
    };
    let name_node = if node.kind() == "impl_item" {
        type_name_node(node.child_by_field_name("type")?)
    } else {
        node.child_by_field_name("name")?
    };

    let mut symbol = new_symbol(parsed, node, name_node, kind, parent, owner);
    let body = node.child_by_field_name("body");
    match (node.kind(), body) {
        ("struct_item" | "union_item", Some(body)) if body.kind() == "field_declaration_list" => {
            let fields = LeafKind {
                node_kind: "field_declaration",
                kind: SymbolKind::Field,
            };
            symbol.children = leaf_symbols(parsed, body, fields, &symbol.name_path, &Owner::of_type(&symbol.name));
        }
        ("enum_item", Some(body)) => {
            let variants = LeafKind {
                node_kind: "enum_variant",
                kind: SymbolKind::EnumMember,
            };
            symbol.children = leaf_symbols(parsed, body, variants, &symbol.name_path, &Owner::of_type(&symbol.name));
        }
        ("trait_item" | "impl_item", Some(body)) => {
            let path = symbol.name_path.clone();
            let members = Owner::of_container(parsed, node);
            collect_items(parsed, body, Some(path.as_str()), members.as_ref(), &mut symbol.children);
        }
        ("mod_item", Some(body)) => {
            let path = symbol.name_path.clone();
            collect_items(parsed, body, Some(path.as_str()), None, &mut symbol.children);
        }
        _ => {}
    }
    Some(symbol)
}

#[derive(Clone, Copy)]
struct LeafKind {
    node_kind: &'static str,
    kind: SymbolKind,
}

/// Fields and enum variants: named children of `body` with kind `leaf.node_kind`.
fn leaf_symbols(
    parsed: &ParsedSource<'_>,
    body: Node<'_>,
    leaf: LeafKind,
    parent: &str,
    owner: &Owner,
) -> Vec<ItemSymbol> {
    let mut cursor = body.walk();
    let symbols = body
        .named_children(&mut cursor)
        .filter(|n| n.kind() == leaf.node_kind)
        .filter_map(|n| {
            let name_node = n.child_by_field_name("name")?;
            Some(new_symbol(parsed, n, name_node, leaf.kind, Some(parent), Some(owner)))
        })
        .collect();
    symbols
}

fn new_symbol(
    parsed: &ParsedSource<'_>,
    node: Node<'_>,
    name_node: Node<'_>,
    kind: SymbolKind,
    parent: Option<&str>,
    owner: Option<&Owner>,
) -> ItemSymbol {
    let name = parsed.node_text(name_node).to_string();
    let name_path = match parent {
        Some(p) => format!("{p}/{name}"),
        None => name.clone(),
    };
    ItemSymbol {
        name,
        name_path,
        kind,
        name_bytes: name_node.byte_range(),
        name_point: name_node.start_position(),
        span: node.byte_range(),
        start_row: node.start_position().row,
        end_row: node.end_position().row,
        owner: owner.cloned(),
        children: Vec::new(),
    }
}

/// `impl<T> Foo<T>`, `impl a::Foo` and `&Foo` are all named `Foo`.
fn type_name_node(node: Node<'_>) -> Node<'_> {
    match node.kind() {
        "generic_type" | "reference_type" => node.child_by_field_name("type").map_or(node, type_name_node),
        "scoped_type_identifier" | "scoped_identifier" => node.child_by_field_name("name").unwrap_or(node),
        _ => node,
    }
}

fn collect_identifiers(
    parsed: &ParsedSource<'_>,
    node: Node<'_>,
    owner: Option<&Owner>,
    out: &mut Vec<Occurrence>,
) {
    if IDENTIFIER_NODES.contains(&node.kind()) {
        out.push(Occurrence {
            bytes: node.byte_range(),
            row: node.start_position().row,
            role: occurrence_role(parsed, node),
            owner: owner.cloned(),
        });
    }
    let nested = Owner::of_container(parsed, node);
    let owner = nested.as_ref().or(owner);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_identifiers(parsed, child, owner, out);
    }
}

fn occurrence_role(parsed: &ParsedSource<'_>, node: Node<'_>) -> Role {
    if node.kind() == "field_identifier" {
        return Role::Member;
    }
    let Some(parent) = node.parent() else {
        return Role::Bare;
    };
    let is_name = parent
        .child_by_field_name("name")
        .is_some_and(|n| n.id() == node.id());

    match parent.kind() {
        "scoped_identifier" | "scoped_type_identifier" if is_name => Role::Path {
            qualifier: parent
                .child_by_field_name("path")
                .map(|p| parsed.node_text(type_name_node(p)).to_string())
                .unwrap_or_default(),
        },
        "shorthand_field_initializer" => Role::Member,
        // Macro arguments are plain token trees.
        "token_tree" => match node.prev_sibling() {
            Some(prev) if prev.kind() == "." => Role::Member,
            Some(prev) if prev.kind() == "::" => Role::Path {
                qualifier: prev
                    .prev_sibling()
                    .map(|q| parsed.node_text(q).to_string())
                    .unwrap_or_default(),
            },
            _ => Role::Bare,
        },
        kind if is_name && DECLARATION_NODES.contains(&kind) => Role::Declaration,
        _ => Role::Bare,
    }
}
