use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use symedit::tools::TOOLS;
use symedit::{ToolError, Toolbox};

#[derive(Parser)]
#[command(name = "symedit")]
#[command(about = "File editing and symbol navigation tools for coding agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root (defaults to $SYMEDIT_PROJECT, then the current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call any tool by name with a JSON object of parameters
    Call {
        tool: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Replace literal or regex matches in a file
    Replace {
        relative_path: String,
        needle: String,
        repl: String,

        /// `literal` or `regex`
        #[arg(short, long, default_value = "literal")]
        mode: String,

        /// Replace every occurrence instead of requiring exactly one
        #[arg(long)]
        allow_multiple: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Delete the inclusive, zero-indexed line range START..=END
    DeleteLines {
        relative_path: String,
        start_line: usize,
        end_line: usize,

        #[arg(short, long)]
        diff: bool,
    },

    /// Insert content before a zero-indexed line
    Insert {
        relative_path: String,
        line: usize,
        content: String,

        #[arg(short, long)]
        diff: bool,
    },

    /// Replace the inclusive, zero-indexed line range START..=END
    ReplaceLines {
        relative_path: String,
        start_line: usize,
        end_line: usize,
        content: String,

        #[arg(short, long)]
        diff: bool,
    },

    /// Top-level symbols of a file
    Overview {
        relative_path: String,

        #[arg(long, default_value_t = 0)]
        depth: usize,
    },

    /// Find symbols by name path pattern
    Find {
        name_path_pattern: String,

        /// Restrict the search to a file or directory
        #[arg(long, default_value = "")]
        within: String,

        #[arg(long, default_value_t = 0)]
        depth: usize,

        /// Include symbol bodies
        #[arg(long)]
        body: bool,

        /// Match the last name path segment by substring
        #[arg(long)]
        substring: bool,

        /// Symbol kind codes to include (LSP numbering)
        #[arg(long = "include-kind")]
        include_kinds: Vec<i64>,

        /// Symbol kind codes to exclude (LSP numbering)
        #[arg(long = "exclude-kind")]
        exclude_kinds: Vec<i64>,
    },

    /// Symbols referencing a symbol
    Refs {
        name_path: String,
        relative_path: String,
    },

    /// Rename a symbol across the project
    Rename {
        name_path: String,
        relative_path: String,
        new_name: String,
    },

    /// List available tools
    Tools,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    if let Commands::Tools = cli.command {
        cmd_tools();
        return Ok(());
    }

    let project_root = resolve_project(cli.project)?;
    let toolbox = Toolbox::open(&project_root)
        .with_context(|| format!("failed to open project at {}", project_root.display()))?;

    match run(&toolbox, cli.command) {
        Ok(answer) => {
            println!("{answer}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", format!("error[{:?}]:", e.kind()).red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Warnings and above on stderr unless `RUST_LOG` says otherwise.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the project root.
///
/// Priority order:
/// 1. Explicit --project flag
/// 2. SYMEDIT_PROJECT environment variable
/// 3. Current directory
fn resolve_project(cli_project: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_project {
        return path
            .canonicalize()
            .with_context(|| format!("project directory not found: {}", path.display()));
    }

    if let Ok(env_path) = env::var("SYMEDIT_PROJECT") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: SYMEDIT_PROJECT is set but path doesn't exist: {env_path}").yellow()
        );
    }

    Ok(env::current_dir()?)
}

fn run(toolbox: &Toolbox<symedit::RustSymbolBackend>, command: Commands) -> Result<String, ToolError> {
    match command {
        Commands::Call { tool, args } => {
            let args: Value = serde_json::from_str(&args)
                .map_err(|e| ToolError::validation(format!("--args is not valid JSON: {e}")))?;
            toolbox.call(&tool, args)
        }
        Commands::Replace {
            relative_path,
            needle,
            repl,
            mode,
            allow_multiple,
            diff,
        } => with_diff(toolbox, &relative_path, diff, || {
            toolbox.call(
                "replace_content",
                json!({
                    "relative_path": relative_path,
                    "needle": needle,
                    "repl": repl,
                    "mode": mode,
                    "allow_multiple_occurrences": allow_multiple,
                }),
            )
        }),
        Commands::DeleteLines {
            relative_path,
            start_line,
            end_line,
            diff,
        } => with_diff(toolbox, &relative_path, diff, || {
            toolbox.call(
                "delete_lines",
                json!({
                    "relative_path": relative_path,
                    "start_line": start_line,
                    "end_line": end_line,
                }),
            )
        }),
        Commands::Insert {
            relative_path,
            line,
            content,
            diff,
        } => with_diff(toolbox, &relative_path, diff, || {
            toolbox.call(
                "insert_at_line",
                json!({
                    "relative_path": relative_path,
                    "line": line,
                    "content": content,
                }),
            )
        }),
        Commands::ReplaceLines {
            relative_path,
            start_line,
            end_line,
            content,
            diff,
        } => with_diff(toolbox, &relative_path, diff, || {
            toolbox.call(
                "replace_lines",
                json!({
                    "relative_path": relative_path,
                    "start_line": start_line,
                    "end_line": end_line,
                    "content": content,
                }),
            )
        }),
        Commands::Overview { relative_path, depth } => toolbox.call(
            "get_symbols_overview",
            json!({ "relative_path": relative_path, "depth": depth }),
        ),
        Commands::Find {
            name_path_pattern,
            within,
            depth,
            body,
            substring,
            include_kinds,
            exclude_kinds,
        } => toolbox.call(
            "find_symbol",
            json!({
                "name_path_pattern": name_path_pattern,
                "relative_path": within,
                "depth": depth,
                "include_body": body,
                "substring_matching": substring,
                "include_kinds": include_kinds,
                "exclude_kinds": exclude_kinds,
            }),
        ),
        Commands::Refs {
            name_path,
            relative_path,
        } => toolbox.call(
            "find_referencing_symbols",
            json!({ "name_path": name_path, "relative_path": relative_path }),
        ),
        Commands::Rename {
            name_path,
            relative_path,
            new_name,
        } => toolbox.call(
            "rename_symbol",
            json!({
                "name_path": name_path,
                "relative_path": relative_path,
                "new_name": new_name,
            }),
        ),
        Commands::Tools => {
            cmd_tools();
            Ok(String::new())
        }
    }
}

/// Run an edit, printing a diff of `relative_path` afterwards when asked.
fn with_diff<F>(
    toolbox: &Toolbox<symedit::RustSymbolBackend>,
    relative_path: &str,
    show_diff: bool,
    edit: F,
) -> Result<String, ToolError>
where
    F: FnOnce() -> Result<String, ToolError>,
{
    if !show_diff {
        return edit();
    }

    let file = toolbox.project().resolve(relative_path);
    let before = fs::read_to_string(&file).ok();
    let answer = edit()?;
    if let (Some(before), Ok(after)) = (before, fs::read_to_string(&file)) {
        if before != after {
            display_diff(Path::new(relative_path), &before, &after);
        }
    }
    Ok(answer)
}

/// Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{sign}");
    }
}

fn cmd_tools() {
    for tool in TOOLS {
        let marker = if tool.can_edit {
            "edit".yellow()
        } else {
            "read".green()
        };
        println!("{:<26} [{}] {}", tool.name.bold(), marker, tool.description);
    }
}
