//! Symbol tools over a scripted backend: output shaping, filtering and
//! reference context do not depend on the real parser.

use serde_json::{json, Value};
use std::cell::RefCell;
use std::fs;
use symedit::symbols::{
    BackendError, BodyLocation, KindFilter, ReferenceHit, SymbolBackend, SymbolDescriptor,
    SymbolKind, SymbolLocation, SymbolQuery,
};
use symedit::{ErrorKind, Project, Toolbox};
use tempfile::TempDir;

const LIB: &str = "struct Config;\n\nfn load() -> Config {\n    Config\n}\n";

fn symbol(name_path: &str, kind: SymbolKind, line: usize, children: Vec<SymbolDescriptor>) -> SymbolDescriptor {
    let name = name_path.rsplit('/').next().unwrap().to_string();
    SymbolDescriptor {
        name,
        name_path: name_path.to_string(),
        kind,
        location: SymbolLocation {
            relative_path: Some("src/lib.rs".to_string()),
            line,
            column: 3,
        },
        body_location: Some(BodyLocation {
            start_line: line,
            end_line: line,
        }),
        body: Some(format!("// body of {name_path}")),
        children,
    }
}

/// Answers from fixed data and ignores the kind filter it is given.
#[derive(Default)]
struct FakeBackend {
    renamed: RefCell<Vec<(String, String)>>,
}

impl SymbolBackend for FakeBackend {
    fn overview(&self, _relative_path: &str, _depth: usize) -> Result<Vec<SymbolDescriptor>, BackendError> {
        Ok(vec![
            symbol(
                "Config",
                SymbolKind::Struct,
                0,
                vec![symbol("Config/path", SymbolKind::Field, 0, Vec::new())],
            ),
            symbol("load", SymbolKind::Function, 2, Vec::new()),
        ])
    }

    fn find(&self, _query: &SymbolQuery<'_>) -> Result<Vec<SymbolDescriptor>, BackendError> {
        self.overview("src/lib.rs", 1)
    }

    fn find_references(
        &self,
        name_path: &str,
        relative_path: &str,
        _kinds: &KindFilter,
    ) -> Result<Vec<ReferenceHit>, BackendError> {
        if name_path != "Config" {
            return Err(BackendError::SymbolNotFound {
                name_path: name_path.to_string(),
                relative_path: relative_path.to_string(),
            });
        }
        Ok(vec![
            ReferenceHit {
                symbol: symbol("load", SymbolKind::Function, 2, Vec::new()),
                line: 3,
            },
            ReferenceHit {
                symbol: symbol("Config", SymbolKind::Struct, 0, Vec::new()),
                line: 0,
            },
        ])
    }

    fn rename(&self, name_path: &str, _relative_path: &str, new_name: &str) -> Result<String, BackendError> {
        self.renamed
            .borrow_mut()
            .push((name_path.to_string(), new_name.to_string()));
        Ok(format!("renamed {name_path} -> {new_name}"))
    }
}

fn toolbox() -> (TempDir, Toolbox<FakeBackend>) {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), LIB).unwrap();
    let project = Project::open(dir.path()).unwrap();
    (dir, Toolbox::new(project, FakeBackend::default()))
}

fn call(toolbox: &Toolbox<FakeBackend>, tool: &str, args: Value) -> Value {
    serde_json::from_str(&toolbox.call(tool, args).unwrap()).unwrap()
}

#[test]
fn overview_records_are_sanitized() {
    let (_dir, toolbox) = toolbox();
    let records = call(&toolbox, "get_symbols_overview", json!({"relative_path": "src/lib.rs"}));

    assert_eq!(
        records[0],
        json!({
            "name_path": "Config",
            "kind": "Struct",
            "relative_path": "src/lib.rs",
            "body_location": {"start_line": 0, "end_line": 0},
        })
    );
    assert_eq!(records.as_array().unwrap().len(), 2);
}

#[test]
fn overview_depth_adds_sanitized_children() {
    let (_dir, toolbox) = toolbox();
    let records = call(
        &toolbox,
        "get_symbols_overview",
        json!({"relative_path": "src/lib.rs", "depth": 1}),
    );
    let child = &records[0]["children"][0];
    assert_eq!(child["name_path"], "Config/path");
    assert_eq!(child["relative_path"], "src/lib.rs");
    assert!(child.get("location").is_none());
}

#[test]
fn overview_checks_the_path_first() {
    let (_dir, toolbox) = toolbox();
    let err = toolbox
        .call("get_symbols_overview", json!({"relative_path": "src/missing.rs"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = toolbox
        .call("get_symbols_overview", json!({"relative_path": "src"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
}

#[test]
fn overview_answer_is_truncated() {
    let (_dir, toolbox) = toolbox();
    let answer = toolbox
        .call(
            "get_symbols_overview",
            json!({"relative_path": "src/lib.rs", "max_answer_chars": 10}),
        )
        .unwrap();
    assert!(answer.starts_with("[{\"name_pa\n... [truncated: 10 of "));
}

#[test]
fn find_reapplies_kind_filter() {
    let (_dir, toolbox) = toolbox();
    let records = call(
        &toolbox,
        "find_symbol",
        json!({"name_path_pattern": "load", "include_kinds": [12]}),
    );
    let names: Vec<_> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name_path"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["load"]);

    let records = call(
        &toolbox,
        "find_symbol",
        json!({"name_path_pattern": "x", "exclude_kinds": [12, 23]}),
    );
    assert_eq!(records, json!([]));
}

#[test]
fn find_without_kind_filters_keeps_every_candidate() {
    let (_dir, toolbox) = toolbox();
    let records = call(
        &toolbox,
        "find_symbol",
        json!({"name_path_pattern": "x", "include_kinds": [], "exclude_kinds": []}),
    );
    let names: Vec<_> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name_path"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Config", "load"]);
}

#[test]
fn find_body_only_on_request() {
    let (_dir, toolbox) = toolbox();
    let records = call(&toolbox, "find_symbol", json!({"name_path_pattern": "load"}));
    assert!(records[1].get("body").is_none());

    let records = call(
        &toolbox,
        "find_symbol",
        json!({"name_path_pattern": "load", "include_body": true}),
    );
    assert_eq!(records[1]["body"], "// body of load");
}

#[test]
fn unknown_kind_codes_are_rejected() {
    let (_dir, toolbox) = toolbox();
    let err = toolbox
        .call("find_symbol", json!({"name_path_pattern": "load", "include_kinds": [99]}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn references_carry_context_lines() {
    let (_dir, toolbox) = toolbox();
    let records = call(
        &toolbox,
        "find_referencing_symbols",
        json!({"name_path": "Config", "relative_path": "src/lib.rs"}),
    );

    assert_eq!(records[0]["name_path"], "load");
    assert_eq!(
        records[0]["content_around_reference"],
        "...   2:fn load() -> Config {\n  >   3:    Config\n...   4:}"
    );
    assert_eq!(records[1]["content_around_reference"], "  >   0:struct Config;\n...   1:");
}

#[test]
fn reference_kind_filter_applies_to_referencing_symbols() {
    let (_dir, toolbox) = toolbox();
    let records = call(
        &toolbox,
        "find_referencing_symbols",
        json!({"name_path": "Config", "relative_path": "src/lib.rs", "exclude_kinds": [23]}),
    );
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[test]
fn backend_symbol_not_found_surfaces_as_not_found() {
    let (_dir, toolbox) = toolbox();
    let err = toolbox
        .call(
            "find_referencing_symbols",
            json!({"name_path": "Nope", "relative_path": "src/lib.rs"}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn rename_returns_backend_status_verbatim() {
    let (_dir, toolbox) = toolbox();
    let answer = toolbox
        .call(
            "rename_symbol",
            json!({"name_path": "Config", "relative_path": "src/lib.rs", "new_name": "Settings"}),
        )
        .unwrap();
    assert_eq!(answer, "renamed Config -> Settings");
    assert_eq!(
        toolbox.backend().renamed.borrow().as_slice(),
        &[("Config".to_string(), "Settings".to_string())]
    );
}
