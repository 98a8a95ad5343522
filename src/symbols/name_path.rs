//! Name-path patterns such as `Parser/parse` or `/Parser`.
//!
//! A pattern without a leading `/` matches any symbol whose name path ends
//! with the pattern's segments. A leading `/` anchors the pattern at the top
//! level of a file. Only the last segment may match by substring.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePathPattern {
    segments: Vec<String>,
    absolute: bool,
}

impl NamePathPattern {
    pub fn parse(pattern: &str) -> Self {
        let trimmed = pattern.trim();
        let absolute = trimmed.starts_with('/');
        let segments = trimmed
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments, absolute }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment: the name of the symbol being looked for.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn matches(&self, name_path: &str, substring: bool) -> bool {
        let Some((leaf, ancestors)) = self.segments.split_last() else {
            return false;
        };
        let candidate: Vec<&str> = name_path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((candidate_leaf, candidate_ancestors)) = candidate.split_last() else {
            return false;
        };

        if self.absolute && candidate.len() != self.segments.len() {
            return false;
        }
        if candidate_ancestors.len() < ancestors.len() {
            return false;
        }
        let tail = &candidate_ancestors[candidate_ancestors.len() - ancestors.len()..];
        if tail.iter().zip(ancestors).any(|(c, p)| *c != p) {
            return false;
        }

        if substring {
            candidate_leaf.contains(leaf.as_str())
        } else {
            *candidate_leaf == leaf
        }
    }
}
