// src/samplesheet.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Samplesheet loading and file-reference inventory.
//!
//! A samplesheet is delimited text with a header row. Comma is the default
//! delimiter; `.tsv` files are read tab-separated. Rows may be ragged: a
//! missing trailing cell is treated the same as an empty one.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ColumnSelection;
use crate::constants::MAX_ALTERNATE_COLUMNS;

/// A samplesheet held in memory.
#[derive(Debug, Clone)]
pub struct Samplesheet {
    path: PathBuf,
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

/// Result of `Samplesheet::scan`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Canonical columns that were absent (empty when all were present).
    pub missing_canonical: Vec<String>,
    /// Requested columns that were not in the header and were skipped.
    pub missing_columns: Vec<String>,
    /// Columns actually read, in order.
    pub columns_used: Vec<String>,
    /// Non-blank cell values, column by column, row order within a column.
    pub references: Vec<String>,
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Split a comma-separated list of column names, trimming each entry,
/// dropping blanks and keeping at most the first two.
pub fn parse_column_list(input: &str) -> Vec<String> {
    limit_alternates(input.split(',').map(str::to_string).collect())
}

fn limit_alternates(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .take(MAX_ALTERNATE_COLUMNS)
        .collect()
}

impl Samplesheet {
    /// Parse `path`. Malformed content is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter_for(path))
            .from_path(path)
            .with_context(|| format!("cannot open samplesheet {}", path.display()))?;

        let headers = rdr
            .headers()
            .with_context(|| format!("cannot read header of {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let records = rdr
            .records()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("malformed samplesheet {}", path.display()))?;

        Ok(Self { path: path.to_path_buf(), headers, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Non-blank values of one column, in row order. `None` if the column is absent.
    pub fn column_values(&self, name: &str) -> Option<Vec<String>> {
        let idx = self.column_index(name)?;
        Some(
            self.records
                .iter()
                .filter_map(|rec| rec.get(idx))
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Inventory file references.
    ///
    /// When every canonical column exists those are read. Otherwise the
    /// missing ones are reported and the alternates from `selection` are
    /// used; when none are configured `ask_alternates` is called with the
    /// missing names and must return the replacement column names.
    pub fn scan<F>(&self, selection: &ColumnSelection, ask_alternates: F) -> Result<ScanReport>
    where
        F: FnOnce(&[String]) -> Result<Vec<String>>,
    {
        let mut report = ScanReport {
            missing_canonical: selection
                .canonical
                .iter()
                .filter(|c| !self.has_column(c))
                .cloned()
                .collect(),
            ..Default::default()
        };

        let columns = if report.missing_canonical.is_empty() {
            selection.canonical.clone()
        } else {
            warn!(
                "{} aren't present in {}",
                report.missing_canonical.join(", "),
                self.path.display()
            );
            let requested = match &selection.alternates {
                Some(alternates) => alternates.clone(),
                None => ask_alternates(&report.missing_canonical)?,
            };
            limit_alternates(requested)
        };

        for col in columns {
            match self.column_values(&col) {
                Some(values) => {
                    report.references.extend(values);
                    report.columns_used.push(col);
                }
                None => {
                    warn!("Column '{}' not found in {}", col, self.path.display());
                    report.missing_columns.push(col);
                }
            }
        }

        info!(
            "{}: {} reference(s) in column(s) [{}]",
            self.path.display(),
            report.references.len(),
            report.columns_used.join(", ")
        );
        Ok(report)
    }
}
