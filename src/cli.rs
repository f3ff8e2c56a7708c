//! CLI: declarations → schema, documents → validation report
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use json_conform::{
    build_schema, validate, Schema, Severity, TypeUniverse, ValidationError, ValidationResult,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build schema graphs from type declarations and validate JSON documents against them
#[derive(Parser, Debug)]
#[command(name = "json-conform", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build and print the schema graph of a set of declaration documents
    Schema(SchemaOut),
    /// validate JSON documents against a declared type
    Validate(ValidateOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    /// declaration documents (literal paths or quoted glob patterns)
    #[arg(long, num_args = 1.., required = true)]
    decl: Vec<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ValidateOut {
    /// declaration documents to build the schema from
    #[arg(long, num_args = 1.., required_unless_present = "schema", conflicts_with = "schema")]
    decl: Vec<String>,

    /// prebuilt schema file (output of `schema`)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// expected type: `Name`, `path/Name`, `Name[]` or a primitive
    #[arg(long = "type", short = 't')]
    type_name: String,

    #[command(flatten)]
    input_settings: InputSettings,

    /// lowest severity to report
    #[arg(long, value_enum, default_value_t = MinSeverity::Hint)]
    min_severity: MinSeverity,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum MinSeverity {
    Hint,
    Warning,
    Error,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Text,
    Json,
}

/// One JSON document, with a label naming where it came from.
#[derive(Debug)]
struct Document {
    source: String,
    value: Value,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    source: &'a str,
    #[serde(flatten)]
    result: ValidationResult,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl From<MinSeverity> for Severity {
    fn from(value: MinSeverity) -> Self {
        match value {
            MinSeverity::Hint => Severity::Hint,
            MinSeverity::Warning => Severity::Warning,
            MinSeverity::Error => Severity::Error,
        }
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            let raw = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        let label = format!("{source_path_str}:{}", i + 1);
                        serde_json::from_str::<Value>(line)
                            .with_context(|| format!("failed to parse NDJSON line ({label})"))
                            .map(|value| Document { source: label, value })
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let value = serde_json::from_str::<Value>(&source).with_context(|| {
                    format!("failed to parse JSON source file ({source_path_str})")
                })?;
                vec![Document { source: source_path_str.clone(), value }]
            };
            for document in raw {
                documents.extend(self.preprocess(document)?);
            }
        }
        info!(documents = documents.len(), "inputs loaded");
        Ok(documents)
    }

    /// Apply `--json-pointer`, then `--jq-expr`.
    fn preprocess(&self, document: Document) -> Result<Vec<Document>> {
        let Document { source, mut value } = document;
        if let Some(pointer) = self.json_pointer.as_deref() {
            let selected = value.pointer_mut(pointer).map(Value::take);
            value = match selected {
                Some(selected) => selected,
                None => bail!("JSON pointer {pointer} selects nothing in {source}"),
            };
        }
        let Some(jq_expr) = self.jq_expr.as_deref() else {
            return Ok(vec![Document { source, value }]);
        };
        let outputs = json_conform::jq_exec::run_jaq(jq_expr, &value)
            .with_context(|| format!("failed to apply jq expression to {source}"))?;
        let many = outputs.len() > 1;
        Ok(outputs
            .into_iter()
            .enumerate()
            .map(|(i, value)| Document {
                source: if many { format!("{source}#{i}") } else { source.clone() },
                value,
            })
            .collect())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }
                let schema = load_declarations(&target.decl)?;
                let schema_src = serde_json::to_string_pretty(&schema)?;
                emit(target.out.as_deref(), &schema_src)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Validate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }
                let schema = match target.schema.as_deref() {
                    Some(path) => json_conform::path_de::from_file_with_path::<Schema>(path)
                        .with_context(|| format!("failed to load schema {}", path.display()))?,
                    None => load_declarations(&target.decl)?,
                };
                let documents = target.input_settings.load_documents()?;

                let results: Vec<ValidationResult> = documents
                    .par_iter()
                    .map(|doc| validate(&doc.value, &schema, &target.type_name))
                    .collect();

                let failed = results.iter().filter(|r| r.has_errors()).count();
                let min = Severity::from(target.min_severity);
                let reports: Vec<Report> = documents
                    .iter()
                    .zip(results)
                    .map(|(doc, result)| Report {
                        source: &doc.source,
                        result: ValidationResult {
                            errors: result.by_severity(min).cloned().collect(),
                        },
                    })
                    .collect();

                let rendered = match target.format {
                    Format::Json => serde_json::to_string_pretty(&reports)?,
                    Format::Text => render_text(&reports, target.out.is_some()),
                };
                emit(target.out.as_deref(), &rendered)?;
                info!(documents = reports.len(), failed, "validation finished");

                Ok(if failed > 0 { ExitCode::from(1) } else { ExitCode::SUCCESS })
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_declarations(patterns: &[String]) -> Result<Schema> {
    let paths = resolve_file_path_patterns(patterns)?;
    let universe = TypeUniverse::from_files(&paths).context("failed to load declarations")?;
    Ok(build_schema(&universe))
}

fn emit(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn render_text(reports: &[Report], plain: bool) -> String {
    if plain {
        colored::control::set_override(false);
    }
    let mut lines = Vec::new();
    for report in reports {
        if report.result.is_empty() {
            lines.push(format!("{} {}", "ok".green().bold(), report.source));
            continue;
        }
        for error in &report.result.errors {
            lines.push(render_finding(report.source, error));
        }
    }
    colored::control::unset_override();
    lines.join("\n")
}

fn render_finding(source: &str, error: &ValidationError) -> String {
    let label = match error.severity() {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Hint => "hint".cyan(),
    };
    format!("{label} {source} [{}] {}", error.error_type, error.message)
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            let entries =
                glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))?;
            for entry in entries {
                out.push(entry?);
                matched_any = true;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through_and_globs_expand() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        let pattern = format!("{}/*.json", dir.path().display());
        let paths = resolve_file_path_patterns([pattern.as_str(), "missing.json"]).unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[2], PathBuf::from("missing.json"));

        let none = format!("{}/*.yaml", dir.path().display());
        assert!(resolve_file_path_patterns([none.as_str()]).is_err());
    }

    #[test]
    fn ndjson_pointer_and_jq_shape_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.ndjson");
        std::fs::write(&path, "{\"data\":{\"items\":[1,2]}}\n\n{\"data\":{\"items\":[3]}}\n").unwrap();
        let settings = InputSettings {
            ndjson: true,
            json_pointer: Some("/data".into()),
            jq_expr: Some(".items[]".into()),
            input: vec![path.to_string_lossy().to_string()],
        };
        let docs = settings.load_documents().unwrap();
        let values: Vec<_> = docs.iter().map(|d| d.value.clone()).collect();
        assert_eq!(values, vec![serde_json::json!(1), serde_json::json!(2), serde_json::json!(3)]);
        assert!(docs[0].source.ends_with("feed.ndjson:1#0"));
        assert!(docs[2].source.ends_with("feed.ndjson:3"));
    }

    #[test]
    fn missing_pointer_targets_are_errors() {
        let settings = InputSettings {
            ndjson: false,
            json_pointer: Some("/nope".into()),
            jq_expr: None,
            input: Vec::new(),
        };
        let doc = Document { source: "x.json".into(), value: serde_json::json!({}) };
        assert!(settings.preprocess(doc).is_err());
    }

    #[test]
    fn cli_parses_validate_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "json-conform", "validate", "--decl", "types.json", "--type", "Order[]",
            "--input", "a.json", "--min-severity", "warning", "--format", "json",
        ])
        .unwrap();
        let Command::Validate(target) = cli.cmd else { panic!("validate expected") };
        assert_eq!(target.type_name, "Order[]");
        assert!(matches!(target.min_severity, MinSeverity::Warning));
        assert!(matches!(target.format, Format::Json));
    }

    #[test]
    fn decl_and_schema_are_exclusive() {
        let parsed = CommandLineInterface::try_parse_from([
            "json-conform", "validate", "--decl", "types.json", "--schema", "s.json",
            "--type", "Order", "--input", "a.json",
        ]);
        assert!(parsed.is_err());
        let parsed = CommandLineInterface::try_parse_from([
            "json-conform", "validate", "--type", "Order", "--input", "a.json",
        ]);
        assert!(parsed.is_err());
    }
}
