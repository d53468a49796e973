//! Minimal CLI: infer → (ts | decls | shapes)
use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use crate::codegen::Codegen;
use crate::inference::infer;
use crate::ir::Warning;
use crate::options::{DEFAULT_MAX_DEPTH, DEFAULT_ROOT_NAME, DeclarationStyle, Options, ReferencePolicy};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer structure from JSON/NDJSON samples and emit TypeScript declarations
#[derive(Parser, Debug)]
#[command(name = "json-decl", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer and emit TypeScript interfaces (or classes)
    Ts(TsOut),
    /// infer and print the resolved declaration IR as JSON
    Decls(DeclsOut),
    /// infer and print the pruned shape graph (debug view)
    Shapes(ShapesOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths, quoted glob patterns, or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct InferSettings {
    /// name of the root declaration
    #[arg(long, default_value = DEFAULT_ROOT_NAME)]
    root_name: String,

    /// classify RFC 3339 / YYYY-MM-DD strings as Date
    #[arg(long)]
    detect_dates: bool,

    /// maximum nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// what to do with `key[Target]` annotations whose target is never declared: drop, keep or error
    #[arg(long, default_value = "drop")]
    references: ReferencePolicy,
}

#[derive(clap::Parser, Debug)]
struct TsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    infer_settings: InferSettings,

    /// emit `class` declarations (with `extends`) instead of interfaces
    #[arg(long)]
    classes: bool,

    /// output .ts file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DeclsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    infer_settings: InferSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ShapesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    infer_settings: InferSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every input document, after pointer selection, combined into one value.
    fn load(&self) -> anyhow::Result<Value> {
        let mut docs = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let label = source_path.to_string_lossy().to_string();
            let source = read_source(&source_path).with_context(|| format!("failed to read {label}"))?;
            docs.extend(self.parse_documents(&label, &source)?);
        }
        tracing::debug!(documents = docs.len(), "loaded input");
        combine(docs)
    }

    /// Documents in one source: one per non-blank line under `--ndjson`,
    /// otherwise the whole source. Each goes through pointer selection.
    fn parse_documents(&self, label: &str, source: &str) -> anyhow::Result<Vec<Value>> {
        if !self.ndjson {
            let value = serde_json::from_str::<Value>(source)
                .with_context(|| format!("failed to parse JSON source file ({label})"))?;
            return Ok(vec![self.select(value, label)?]);
        }
        let mut docs = Vec::new();
        for (line_no, line) in source.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
            let value =
                serde_json::from_str::<Value>(line).with_context(|| format!("failed to parse {label}:{}", line_no + 1))?;
            docs.push(self.select(value, label)?);
        }
        Ok(docs)
    }

    fn select(&self, value: Value, label: &str) -> anyhow::Result<Value> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(value);
        };
        match value.pointer(pointer) {
            Some(node) => Ok(node.clone()),
            None => bail!("JSON pointer {pointer} matches nothing in {label}"),
        }
    }
}

/// Several documents are combined into one root array so they unify as
/// samples of one shape.
fn combine(mut docs: Vec<Value>) -> anyhow::Result<Value> {
    match docs.len() {
        0 => bail!("no input documents"),
        1 => Ok(docs.remove(0)),
        _ => Ok(Value::Array(docs.into_iter().flat_map(samples).collect())),
    }
}

/// A top-level array contributes its elements, anything else itself.
fn samples(doc: Value) -> Vec<Value> {
    match doc {
        Value::Array(xs) => xs,
        other => vec![other],
    }
}

impl InferSettings {
    fn options(&self) -> Options {
        Options::new()
            .with_root_name(self.root_name.clone())
            .with_date_detection(self.detect_dates)
            .with_max_depth(self.max_depth)
            .with_reference_policy(self.references)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Ts(target) => {
                let value = target.input_settings.load()?;
                let style = if target.classes { DeclarationStyle::Class } else { DeclarationStyle::Interface };
                let options = target.infer_settings.options().with_style(style);

                let resolution = crate::declarations(&value, &options)?;
                report(&resolution.warnings);

                let mut cg = Codegen::new(options.style);
                cg.emit(&resolution);
                write_output(target.out.as_ref(), &cg.into_string())
            }
            Command::Decls(target) => {
                let value = target.input_settings.load()?;
                let resolution = crate::declarations(&value, &target.infer_settings.options())?;
                report(&resolution.warnings);
                let src = serde_json::to_string_pretty(&resolution)?;
                write_output(target.out.as_ref(), &src)
            }
            Command::Shapes(target) => {
                let value = target.input_settings.load()?;
                let graph = infer(&value, &target.infer_settings.options())?;
                let src = serde_json::to_string_pretty(&graph.to_json())?;
                write_output(target.out.as_ref(), &src)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(warnings: &[Warning]) {
    for warning in warnings {
        let message = match warning {
            Warning::NameCollision { target, assigned } => {
                format!("`{target}` names two different shapes; the second is declared as `{assigned}`")
            }
            Warning::UnresolvedReference { declaration, field, target } => {
                format!("{declaration}.{field} references undeclared `{target}`")
            }
            Warning::ConflictingParent { child, parent, kept } => {
                format!("`{child}` already extends `{kept}`; ignoring `{parent}`")
            }
            Warning::DuplicateKey { declaration, key } => {
                format!("{declaration}.{key} clashes with a sibling key once its annotation is stripped; kept verbatim")
            }
        };
        eprintln!("{}: {message}", "warning".yellow().bold());
    }
}

fn write_output(out: Option<&PathBuf>, src: &str) -> anyhow::Result<()> {
    let Some(out) = out else {
        println!("{src}");
        return Ok(());
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
}

fn read_source(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
