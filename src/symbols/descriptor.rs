use crate::symbols::kind::SymbolKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Ordered-key mapping handed back to callers.
pub type SymbolRecord = Map<String, Value>;

/// Position of a symbol's name identifier (zero-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolLocation {
    pub relative_path: Option<String>,
    pub line: usize,
    pub column: usize,
}

/// Line span of a symbol's full definition (zero-indexed, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyLocation {
    pub start_line: usize,
    pub end_line: usize,
}

/// A code symbol as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDescriptor {
    pub name: String,
    /// Hierarchical identifier, e.g. `Parser/parse`
    pub name_path: String,
    pub kind: SymbolKind,
    pub location: SymbolLocation,
    pub body_location: Option<BodyLocation>,
    pub body: Option<String>,
    pub children: Vec<SymbolDescriptor>,
}

impl SymbolDescriptor {
    pub fn relative_path(&self) -> Option<&str> {
        self.location.relative_path.as_deref()
    }

    /// Copy of this symbol with children kept only `depth` levels deep.
    pub fn truncated(&self, depth: usize) -> SymbolDescriptor {
        SymbolDescriptor {
            children: if depth == 0 {
                Vec::new()
            } else {
                self.children.iter().map(|c| c.truncated(depth - 1)).collect()
            },
            ..self.clone()
        }
    }

    /// This symbol and all of its descendants, depth-first.
    pub fn flatten(&self) -> Vec<&SymbolDescriptor> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }

    /// Internal record, still carrying `name` and `location`.
    pub fn to_record(&self, depth: usize, include_body: bool) -> SymbolRecord {
        let mut record = SymbolRecord::new();
        record.insert("name".to_string(), json!(self.name));
        record.insert("name_path".to_string(), json!(self.name_path));
        record.insert("kind".to_string(), json!(self.kind));
        record.insert("location".to_string(), json!(self.location));
        if let Some(body_location) = &self.body_location {
            record.insert("body_location".to_string(), json!(body_location));
        }
        if include_body {
            if let Some(body) = &self.body {
                record.insert("body".to_string(), json!(body));
            }
        }
        if depth > 0 && !self.children.is_empty() {
            let children = self
                .children
                .iter()
                .map(|c| Value::Object(c.to_record(depth - 1, include_body)))
                .collect();
            record.insert("children".to_string(), Value::Array(children));
        }
        record
    }

    /// Outward-facing record: see [`sanitize`].
    pub fn to_sanitized_record(&self, depth: usize, include_body: bool) -> SymbolRecord {
        sanitize(self.to_record(depth, include_body))
    }
}

/// Hoist `location.relative_path` to a top-level `relative_path` and drop the
/// internal `name`/`location` keys, recursively through `children`.
pub fn sanitize(record: SymbolRecord) -> SymbolRecord {
    let mut out = SymbolRecord::new();
    for (key, value) in record {
        match key.as_str() {
            "name" => {}
            "location" => {
                if let Some(path) = value.get("relative_path").filter(|p| !p.is_null()) {
                    out.insert("relative_path".to_string(), path.clone());
                }
            }
            "children" => {
                let children = match value {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|item| match item {
                            Value::Object(map) => Value::Object(sanitize(map)),
                            other => other,
                        })
                        .collect(),
                    other => vec![other],
                };
                out.insert(key, Value::Array(children));
            }
            _ => {
                out.insert(key, value);
            }
        }
    }
    out
}

/// A symbol that references some target, with the referencing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDescriptor {
    pub symbol: SymbolDescriptor,
    /// Zero-indexed line of the reference
    pub line: usize,
    /// Numbered lines around the reference, when bodies are not included
    pub context_snippet: Option<String>,
}

impl ReferenceDescriptor {
    pub fn to_record(&self, include_body: bool) -> SymbolRecord {
        let mut record = self.symbol.to_sanitized_record(0, include_body);
        if let Some(snippet) = &self.context_snippet {
            record.insert("content_around_reference".to_string(), json!(snippet));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method() -> SymbolDescriptor {
        SymbolDescriptor {
            name: "parse".to_string(),
            name_path: "Parser/parse".to_string(),
            kind: SymbolKind::Method,
            location: SymbolLocation {
                relative_path: Some("src/parser.rs".to_string()),
                line: 4,
                column: 11,
            },
            body_location: Some(BodyLocation {
                start_line: 4,
                end_line: 6,
            }),
            body: Some("fn parse(&self) {}".to_string()),
            children: Vec::new(),
        }
    }

    fn parser() -> SymbolDescriptor {
        SymbolDescriptor {
            name: "Parser".to_string(),
            name_path: "Parser".to_string(),
            kind: SymbolKind::Object,
            location: SymbolLocation {
                relative_path: Some("src/parser.rs".to_string()),
                line: 3,
                column: 5,
            },
            body_location: None,
            body: None,
            children: vec![method()],
        }
    }

    #[test]
    fn sanitized_record_hoists_path_and_drops_internal_keys() {
        let record = method().to_sanitized_record(0, false);
        let keys: Vec<_> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name_path", "kind", "relative_path", "body_location"]);
        assert_eq!(record["relative_path"], "src/parser.rs");
        assert_eq!(record["kind"], "Method");
    }

    #[test]
    fn body_only_when_requested() {
        assert!(method().to_sanitized_record(0, true).contains_key("body"));
        assert!(!method().to_sanitized_record(0, false).contains_key("body"));
    }

    #[test]
    fn children_respect_depth_and_are_sanitized() {
        assert!(!parser().to_sanitized_record(0, false).contains_key("children"));

        let record = parser().to_sanitized_record(1, false);
        let child = &record["children"][0];
        assert_eq!(child["name_path"], "Parser/parse");
        assert!(child.get("name").is_none());
        assert!(child.get("location").is_none());
    }

    #[test]
    fn missing_path_is_not_hoisted() {
        let mut symbol = method();
        symbol.location.relative_path = None;
        let record = symbol.to_sanitized_record(0, false);
        assert!(!record.contains_key("relative_path"));
        assert!(!record.contains_key("location"));
    }

    #[test]
    fn truncated_and_flatten() {
        let p = parser();
        assert!(p.truncated(0).children.is_empty());
        assert_eq!(p.truncated(1).children.len(), 1);
        let names: Vec<_> = p.flatten().iter().map(|s| s.name_path.as_str()).collect();
        assert_eq!(names, vec!["Parser", "Parser/parse"]);
    }

    #[test]
    fn reference_record_carries_snippet() {
        let reference = ReferenceDescriptor {
            symbol: method(),
            line: 5,
            context_snippet: Some("  >   5:x".to_string()),
        };
        let record = reference.to_record(false);
        assert_eq!(record["content_around_reference"], "  >   5:x");
        assert!(!record.contains_key("location"));
    }
}
