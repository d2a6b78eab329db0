// src/schema.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Parameter template extraction from a pipeline schema.
//!
//! The schema groups parameters into definitions under `$defs` (older
//! schemas use `definitions`). Every definition may carry a `properties`
//! object and a `required` list. The template keeps each non-excluded,
//! non-deprecated property with its trimmed description and whether it is
//! optional.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One template entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub description: String,
    pub optional: bool,
}

/// Parameter name → entry, in schema order.
pub type ParameterTemplate = IndexMap<String, ParameterEntry>;

/// Walk the definitions of `schema` and build the template.
///
/// A parameter defined in more than one definition keeps its first position
/// and takes the values of the last definition.
pub fn extract_parameters(schema: &Value, exclusions: &HashSet<&str>) -> ParameterTemplate {
    let mut template = ParameterTemplate::new();

    let Some(defs) = schema
        .get("$defs")
        .or_else(|| schema.get("definitions"))
        .and_then(Value::as_object)
    else {
        return template;
    };

    for (def_name, def) in defs {
        let Some(properties) = def.get("properties").and_then(Value::as_object) else {
            debug!("definition '{}' has no properties", def_name);
            continue;
        };
        let required: HashSet<&str> = def
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        for (name, details) in properties {
            if exclusions.contains(name.as_str()) {
                continue;
            }
            if details.get("deprecated").and_then(Value::as_bool).unwrap_or(false) {
                debug!("skipping deprecated parameter '{}'", name);
                continue;
            }
            let description = details
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            template.insert(
                name.clone(),
                ParameterEntry { description, optional: !required.contains(name.as_str()) },
            );
        }
    }
    template
}

/// Read and parse a schema file. Malformed JSON is an error.
pub fn load_schema(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read schema {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed schema {}", path.display()))
}

pub fn load_template(path: &Path) -> Result<ParameterTemplate> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read template {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed template {}", path.display()))
}

/// Write the template as JSON indented by four spaces.
pub fn save_template(path: &Path, template: &ParameterTemplate) -> Result<()> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    template
        .serialize(&mut ser)
        .context("cannot serialise parameter template")?;
    fs::write(path, out).with_context(|| format!("cannot write {}", path.display()))
}

/// Summary of an `extract-params` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub processed: usize,
    pub excluded: usize,
}

/// Schema file → template file.
pub fn extract_to_file(
    schema_path: &Path,
    output_path: &Path,
    exclusions: &[String],
) -> Result<ExtractSummary> {
    let schema = load_schema(schema_path)?;
    let exclusions: HashSet<&str> = exclusions.iter().map(String::as_str).collect();
    let template = extract_parameters(&schema, &exclusions);
    save_template(output_path, &template)?;
    info!(
        "Processed {} parameters from {} → {}",
        template.len(),
        schema_path.display(),
        output_path.display()
    );
    Ok(ExtractSummary { processed: template.len(), excluded: exclusions.len() })
}
