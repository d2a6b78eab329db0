// src/migrate.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Samplesheet migration: relocate every referenced file that matches a
//! rewrite rule, rewrite the samplesheet, then upload it next to the data.
//!
//! Work is strictly sequential. A failed reference is logged and counted;
//! the remaining references are still processed. Nothing is rolled back.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{ColumnSelection, MigrateConfig, PullConfig};
use crate::config_url::fetch_samplesheet_from_config;
use crate::constants::TEST_CONFIG_FILES;
use crate::http::HttpSource;
use crate::rewrite::{rewrite_file, RewriteRule};
use crate::samplesheet::Samplesheet;
use crate::transfer::{TransferExecutor, TransferOutcome};
use crate::uri_utils::{ObjectRef, RemoteLocation};

/// Answers the questions a migration may need to ask the operator.
pub trait OperatorInput {
    /// Columns to read instead of the missing canonical ones.
    fn alternate_columns(&mut self, samplesheet: &Path, missing: &[String]) -> Result<Vec<String>>;

    /// Rule for `samplesheet`; `None` skips it. `default_replacement` is the
    /// replacement chosen for the previous samplesheet, empty for the first.
    fn rewrite_rule(
        &mut self,
        samplesheet: &Path,
        default_replacement: &str,
    ) -> Result<Option<RewriteRule>>;
}

/// Never asks: no alternates, no rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl OperatorInput for NonInteractive {
    fn alternate_columns(&mut self, samplesheet: &Path, missing: &[String]) -> Result<Vec<String>> {
        warn!(
            "{}: no alternates for missing column(s) {}",
            samplesheet.display(),
            missing.join(", ")
        );
        Ok(Vec::new())
    }

    fn rewrite_rule(&mut self, _: &Path, _: &str) -> Result<Option<RewriteRule>> {
        Ok(None)
    }
}

/// Per-samplesheet result of the copy phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub references: usize,
    /// Server-side copies.
    pub copied: usize,
    /// HTTP downloads uploaded to the store.
    pub uploaded: usize,
    /// References not starting with the prefix.
    pub skipped: usize,
    /// (reference, error) for each failed relocation.
    pub failed: Vec<(String, String)>,
}

/// Result of rewriting and uploading the samplesheet itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    pub replacements: usize,
    pub uploaded_to: Option<ObjectRef>,
}

/// Where the rewritten samplesheet goes: its file name under the replacement.
///
/// A `/` is inserted when the replacement does not already end with one, so
/// `s3://b/data` and `s3://b/data/` both give `s3://b/data/<name>`. Plain
/// concatenation would produce `s3://b/data<name>`.
pub fn samplesheet_destination(replacement: &str, file_name: &str) -> String {
    if replacement.is_empty() || replacement.ends_with('/') {
        format!("{}{}", replacement, file_name)
    } else {
        format!("{}/{}", replacement, file_name)
    }
}

/// Relocate every reference of `cfg.samplesheet` that the rule matches.
pub async fn migrate_samplesheet(
    cfg: &MigrateConfig,
    executor: &TransferExecutor<'_>,
    input: &mut dyn OperatorInput,
) -> Result<MigrationReport> {
    let sheet = Samplesheet::load(&cfg.samplesheet)?;
    let scan = sheet.scan(&cfg.columns, |missing| {
        input.alternate_columns(&cfg.samplesheet, missing)
    })?;

    let mut report = MigrationReport { references: scan.references.len(), ..Default::default() };
    for reference in &scan.references {
        let Some(destination) = cfg.rule.apply(reference) else {
            report.skipped += 1;
            continue;
        };
        let source = RemoteLocation::classify(reference);
        let target = RemoteLocation::classify(&destination);
        match executor.relocate(&source, &target).await {
            Ok(TransferOutcome::Copied) => report.copied += 1,
            Ok(TransferOutcome::Uploaded { .. }) => report.uploaded += 1,
            Err(e) => {
                error!("Failed to migrate {} → {}: {:#}", reference, destination, e);
                report.failed.push((reference.clone(), format!("{:#}", e)));
            }
        }
    }

    info!(
        "{}: {} copied, {} uploaded, {} skipped, {} failed",
        cfg.samplesheet.display(),
        report.copied,
        report.uploaded,
        report.skipped,
        report.failed.len()
    );
    Ok(report)
}

/// Rewrite the samplesheet text and upload it.
///
/// The text pass replaces every occurrence of the prefix in the file, not
/// only the references that were relocated. An upload failure is logged and
/// reported as `uploaded_to: None`.
pub async fn finalize_samplesheet(
    cfg: &MigrateConfig,
    executor: &TransferExecutor<'_>,
) -> Result<FinalizeReport> {
    let replacements = rewrite_file(&cfg.samplesheet, &cfg.rule)?;
    let mut report = FinalizeReport { replacements, uploaded_to: None };
    if !cfg.upload_samplesheet {
        return Ok(report);
    }

    let file_name = cfg
        .samplesheet
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let destination = samplesheet_destination(cfg.rule.replacement(), &file_name);
    let dest = match RemoteLocation::classify(&destination) {
        RemoteLocation::ObjectStore(obj) => obj,
        RemoteLocation::Http(url) => {
            warn!("Not uploading {}: destination {} is not object storage", file_name, url);
            return Ok(report);
        }
    };

    info!("Uploading {} to {}", cfg.samplesheet.display(), dest);
    match executor.store().upload_file(&cfg.samplesheet, &dest).await {
        Ok(_) => {
            info!("File uploaded successfully to {}", dest);
            report.uploaded_to = Some(dest);
        }
        Err(e) => error!("Error uploading {}: {:#}", cfg.samplesheet.display(), e),
    }
    Ok(report)
}

/// One samplesheet processed by `pull_test_data`.
#[derive(Debug, Clone)]
pub struct PulledSheet {
    pub config: PathBuf,
    pub samplesheet: PathBuf,
    pub migration: MigrationReport,
    pub finalize: FinalizeReport,
}

/// Fetch the samplesheets named in the test profiles, migrate them, rewrite
/// them and upload them.
///
/// Every rule is collected before any transfer starts; all copies then run
/// before any samplesheet is rewritten.
pub async fn pull_test_data(
    cfg: &PullConfig,
    executor: &TransferExecutor<'_>,
    http: &dyn HttpSource,
    input: &mut dyn OperatorInput,
) -> Result<Vec<PulledSheet>> {
    let mut jobs: Vec<(PathBuf, MigrateConfig)> = Vec::new();
    let mut default_replacement = String::new();

    for name in TEST_CONFIG_FILES {
        let config = cfg.conf_dir.join(name);
        if !config.exists() {
            warn!("{} not found!", config.display());
            continue;
        }
        let Some(samplesheet) =
            fetch_samplesheet_from_config(&config, http, executor.work_dir()).await?
        else {
            warn!("Failed to get the file from {}", config.display());
            continue;
        };
        let Some(rule) = input.rewrite_rule(&samplesheet, &default_replacement)? else {
            info!("No rewrite for {}, skipping", samplesheet.display());
            continue;
        };
        default_replacement = rule.replacement().to_string();
        jobs.push((config, sheet_config(samplesheet, rule, &cfg.columns)));
    }

    let mut migrations = Vec::with_capacity(jobs.len());
    for (_, job) in &jobs {
        info!(
            "Migrating {} ('{}' → '{}')",
            job.samplesheet.display(),
            job.rule.prefix(),
            job.rule.replacement()
        );
        migrations.push(migrate_samplesheet(job, executor, input).await?);
    }

    let mut pulled = Vec::with_capacity(jobs.len());
    for ((config, job), migration) in jobs.into_iter().zip(migrations) {
        let finalize = finalize_samplesheet(&job, executor).await?;
        pulled.push(PulledSheet { config, samplesheet: job.samplesheet, migration, finalize });
    }
    info!("Finished executing all tasks.");
    Ok(pulled)
}

fn sheet_config(samplesheet: PathBuf, rule: RewriteRule, columns: &ColumnSelection) -> MigrateConfig {
    let mut job = MigrateConfig::new(samplesheet, rule);
    job.columns = columns.clone();
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_join() {
        assert_eq!(samplesheet_destination("s3://b/data/", "s.csv"), "s3://b/data/s.csv");
        assert_eq!(samplesheet_destination("s3://b/data", "s.csv"), "s3://b/data/s.csv");
        assert_eq!(samplesheet_destination("", "s.csv"), "s.csv");
    }
}
