//! CLI subcommand implementations.

pub mod build;
pub mod check;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

/// Read and parse a lowered-AST JSON document.
pub fn load_document(file: &Path) -> anyhow::Result<Value> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("cannot parse {} as JSON", file.display()))
}
