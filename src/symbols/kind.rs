use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Symbol kinds, numbered as in the Language Server Protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    File = 1,
    Module = 2,
    Namespace = 3,
    Package = 4,
    Class = 5,
    Method = 6,
    Property = 7,
    Field = 8,
    Constructor = 9,
    Enum = 10,
    Interface = 11,
    Function = 12,
    Variable = 13,
    Constant = 14,
    String = 15,
    Number = 16,
    Boolean = 17,
    Array = 18,
    Object = 19,
    Key = 20,
    Null = 21,
    EnumMember = 22,
    Struct = 23,
    Event = 24,
    Operator = 25,
    TypeParameter = 26,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 26] = [
        SymbolKind::File,
        SymbolKind::Module,
        SymbolKind::Namespace,
        SymbolKind::Package,
        SymbolKind::Class,
        SymbolKind::Method,
        SymbolKind::Property,
        SymbolKind::Field,
        SymbolKind::Constructor,
        SymbolKind::Enum,
        SymbolKind::Interface,
        SymbolKind::Function,
        SymbolKind::Variable,
        SymbolKind::Constant,
        SymbolKind::String,
        SymbolKind::Number,
        SymbolKind::Boolean,
        SymbolKind::Array,
        SymbolKind::Object,
        SymbolKind::Key,
        SymbolKind::Null,
        SymbolKind::EnumMember,
        SymbolKind::Struct,
        SymbolKind::Event,
        SymbolKind::Operator,
        SymbolKind::TypeParameter,
    ];

    /// The integer code used on the wire.
    pub fn code(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for SymbolKind {
    type Error = ToolError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        code.checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| SymbolKind::ALL.get(idx).copied())
            .ok_or_else(|| {
                ToolError::validation(format!(
                    "unknown symbol kind {code} (expected an integer between 1 and 26)"
                ))
            })
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Include/exclude sets of kinds; an empty set places no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindFilter {
    pub include: BTreeSet<SymbolKind>,
    pub exclude: BTreeSet<SymbolKind>,
}

impl KindFilter {
    /// Validate raw integer codes from a tool call.
    pub fn from_codes(include: &[i64], exclude: &[i64]) -> Result<Self, ToolError> {
        let parse = |codes: &[i64]| {
            codes
                .iter()
                .map(|&code| SymbolKind::try_from(code))
                .collect::<Result<BTreeSet<_>, _>>()
        };
        Ok(Self {
            include: parse(include)?,
            exclude: parse(exclude)?,
        })
    }

    pub fn allows(&self, kind: SymbolKind) -> bool {
        (self.include.is_empty() || self.include.contains(&kind)) && !self.exclude.contains(&kind)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}
