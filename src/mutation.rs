//! Pattern replacement over in-memory content.
//!
//! [`mutate`] is pure: it never touches the file system. The tool layer runs
//! it inside a [`crate::transaction::FileEditTransaction`] so that a failure
//! leaves the file untouched.

use crate::cache::get_or_compile_pattern;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// `$!N` tokens in a replacement template.
static BACKREFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$!(\d+)").expect("backreference pattern is valid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("invalid mode: '{0}' (expected 'literal' or 'regex')")]
    InvalidMode(String),

    #[error("invalid pattern: {message}")]
    InvalidPattern { message: String },

    #[error("pattern matched 0 locations")]
    NoMatch,

    #[error("pattern matched {count} locations, expected exactly 1")]
    TooManyMatches { count: usize },

    #[error("multiline match at byte {offset} is ambiguous")]
    AmbiguousMatch { offset: usize },
}

/// How the needle of an edit is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Every metacharacter is escaped before compilation
    Literal,
    /// The needle is compiled verbatim
    Regex,
}

impl FromStr for EditMode {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "literal" => Ok(EditMode::Literal),
            "regex" => Ok(EditMode::Regex),
            other => Err(MutationError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditMode::Literal => write!(f, "literal"),
            EditMode::Regex => write!(f, "regex"),
        }
    }
}

/// A single pattern-replacement request against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub path: String,
    pub pattern: String,
    pub replacement: String,
    pub mode: EditMode,
    pub allow_multiple: bool,
}

impl EditRequest {
    /// Run the request against `content`.
    pub fn apply_to(&self, content: &str) -> Result<MatchOutcome, MutationError> {
        mutate(
            content,
            &self.pattern,
            self.mode,
            &self.replacement,
            self.allow_multiple,
        )
    }
}

/// Result of a successful substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "MatchOutcome carries the updated content"]
pub struct MatchOutcome {
    pub updated_content: String,
    pub occurrences: usize,
}

/// Compile `pattern` according to `mode`.
pub fn compile(pattern: &str, mode: EditMode) -> Result<Regex, MutationError> {
    let source = match mode {
        EditMode::Literal => regex::escape(pattern),
        EditMode::Regex => pattern.to_string(),
    };
    get_or_compile_pattern(&source).map_err(|e| MutationError::InvalidPattern {
        message: e.to_string(),
    })
}

/// Replace every match of `pattern` in `content`.
///
/// Fails when nothing matches, when more than one occurrence matches and
/// `allow_multiple` is false, or when a multiline match is ambiguous.
pub fn mutate(
    content: &str,
    pattern: &str,
    mode: EditMode,
    replacement: &str,
    allow_multiple: bool,
) -> Result<MatchOutcome, MutationError> {
    let regex = compile(pattern, mode)?;

    let mut updated = String::with_capacity(content.len());
    let mut last_end = 0;
    let mut occurrences = 0;

    for caps in regex.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        ensure_unambiguous(&regex, whole.as_str(), whole.start())?;

        updated.push_str(&content[last_end..whole.start()]);
        updated.push_str(&expand_backreferences(replacement, &caps));
        last_end = whole.end();
        occurrences += 1;
    }
    updated.push_str(&content[last_end..]);

    if occurrences == 0 {
        return Err(MutationError::NoMatch);
    }
    if !allow_multiple && occurrences > 1 {
        return Err(MutationError::TooManyMatches { count: occurrences });
    }

    Ok(MatchOutcome {
        updated_content: updated,
        occurrences,
    })
}

/// A match spanning lines must not match again once its first character is
/// dropped; otherwise which span gets replaced depends on where the scan began.
fn ensure_unambiguous(regex: &Regex, matched: &str, offset: usize) -> Result<(), MutationError> {
    if !matched.contains('\n') {
        return Ok(());
    }
    let mut chars = matched.chars();
    chars.next();
    if regex.is_match(chars.as_str()) {
        return Err(MutationError::AmbiguousMatch { offset });
    }
    Ok(())
}

/// Expand `$!N` tokens with capture group `N` of the current match.
///
/// Groups that did not participate (or do not exist) leave the token as-is.
pub fn expand_backreferences(template: &str, caps: &Captures<'_>) -> String {
    BACKREFERENCE
        .replace_all(template, |token: &Captures<'_>| {
            token[1]
                .parse::<usize>()
                .ok()
                .and_then(|group| caps.get(group))
                .map_or_else(|| token[0].to_string(), |m| m.as_str().to_string())
        })
        .into_owned()
}
