//! OpenAPI document lint.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_yaml::Value;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use mafs_core::error::AppError;

/// Top-level keys every document must carry.
const REQUIRED_KEYS: [&str; 3] = ["openapi", "info", "paths"];

/// Keys under a path item that declare an operation.
const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Arguments for openapi commands
#[derive(Debug, Args)]
pub struct OpenApiArgs {
    /// OpenAPI subcommand
    #[command(subcommand)]
    pub command: OpenApiCommand,
}

/// OpenAPI subcommands
#[derive(Debug, Subcommand)]
pub enum OpenApiCommand {
    /// Check that a document has the required sections
    Check {
        /// Path to the YAML or JSON document
        file: PathBuf,
    },
}

/// Result of a successful check.
#[derive(Debug, Serialize, Tabled, PartialEq, Eq)]
pub struct OpenApiReport {
    /// Declared OpenAPI version
    pub version: String,
    /// API title from `info`
    pub title: String,
    /// Number of path items
    pub paths: usize,
    /// Number of operations across all paths
    pub operations: usize,
}

/// Execute openapi commands
pub async fn execute(args: &OpenApiArgs, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        OpenApiCommand::Check { file } => {
            let text = tokio::fs::read_to_string(file).await.map_err(|e| {
                AppError::validation(format!("Cannot read {}: {e}", file.display()))
            })?;
            let report = check_document(&text)?;
            output::print_row(&report, format);
            if format == OutputFormat::Table {
                output::print_success(&format!("{} is valid", file.display()));
            }
            Ok(())
        }
    }
}

/// Parses a document and checks its required sections.
pub fn check_document(text: &str) -> Result<OpenApiReport, AppError> {
    let doc: Value = serde_yaml::from_str(text)
        .map_err(|e| AppError::validation(format!("Document is not valid YAML: {e}")))?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| doc.get(key).is_none_or(Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "Missing required key(s): {}",
            missing.join(", ")
        )));
    }

    let paths = doc["paths"]
        .as_mapping()
        .ok_or_else(|| AppError::validation("`paths` must be a mapping"))?;
    let operations = paths
        .values()
        .filter_map(Value::as_mapping)
        .map(|item| {
            item.keys()
                .filter_map(Value::as_str)
                .filter(|k| METHODS.contains(&k.to_ascii_lowercase().as_str()))
                .count()
        })
        .sum();

    Ok(OpenApiReport {
        version: scalar(&doc["openapi"]),
        title: scalar(&doc["info"]["title"]),
        paths: paths.len(),
        operations,
    })
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
