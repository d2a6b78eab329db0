// tests/test_migrate.rs
//
// Samplesheet migration end to end against the filesystem store.

mod common;

use anyhow::Result;
use common::{seed_object, RecordingHttp};
use nfrelease::{
    finalize_samplesheet, migrate_samplesheet, pull_test_data, ColumnSelection,
    FileSystemObjectStore, MigrateConfig, NonInteractive, ObjectRef, OperatorInput, PullConfig,
    RewriteRule, TransferExecutor,
};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Replays canned answers and records what it was asked.
#[derive(Default)]
struct Scripted {
    alternates: Vec<String>,
    rules: VecDeque<Option<RewriteRule>>,
    asked_missing: Vec<Vec<String>>,
    defaults_seen: Vec<String>,
}

impl OperatorInput for Scripted {
    fn alternate_columns(&mut self, _: &Path, missing: &[String]) -> Result<Vec<String>> {
        self.asked_missing.push(missing.to_vec());
        Ok(self.alternates.clone())
    }

    fn rewrite_rule(&mut self, _: &Path, default_replacement: &str) -> Result<Option<RewriteRule>> {
        self.defaults_seen.push(default_replacement.to_string());
        Ok(self.rules.pop_front().flatten())
    }
}

fn write(path: &Path, text: &str) -> PathBuf {
    fs::write(path, text).unwrap();
    path.to_path_buf()
}

#[tokio::test]
async fn prefix_rewrite_copies_and_uploads_samplesheet() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("store");
    seed_object(&root, "bucket-a", "reads/x.fastq.gz", b"x-reads");
    let sheet = write(
        &tmp.path().join("samplesheet.csv"),
        "sample,fastq_1,fastq_2\nS1,s3://bucket-a/reads/x.fastq.gz,\nS2,s3://elsewhere/y.fastq.gz,\n",
    );

    let store = FileSystemObjectStore::new(&root);
    let http = RecordingHttp::new();
    let exec = TransferExecutor::new(&store, &http, tmp.path().join("work"));
    let rule = RewriteRule::new("s3://bucket-a/reads", "s3://bucket-b/data")?;
    let cfg = MigrateConfig::new(&sheet, rule);

    let report = migrate_samplesheet(&cfg, &exec, &mut NonInteractive).await?;
    assert_eq!(report.references, 2);
    assert_eq!(report.copied, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.failed.is_empty());
    assert_eq!(fs::read(root.join("bucket-b/data/x.fastq.gz"))?, b"x-reads");
    // Server-side copy keeps the source.
    assert!(root.join("bucket-a/reads/x.fastq.gz").exists());

    let finalize = finalize_samplesheet(&cfg, &exec).await?;
    assert_eq!(finalize.replacements, 1);
    assert_eq!(finalize.uploaded_to, Some(ObjectRef::new("bucket-b", "data/samplesheet.csv")));

    let rewritten = fs::read_to_string(&sheet)?;
    assert!(rewritten.contains("S1,s3://bucket-b/data/x.fastq.gz,"));
    assert!(rewritten.contains("S2,s3://elsewhere/y.fastq.gz,"));
    assert_eq!(fs::read_to_string(root.join("bucket-b/data/samplesheet.csv"))?, rewritten);
    Ok(())
}

#[tokio::test]
async fn failed_reference_does_not_stop_the_rest() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("store");
    seed_object(&root, "a", "p/two.fq", b"2");
    let sheet = write(
        &tmp.path().join("s.csv"),
        "sample,fastq_1,fastq_2\nS,s3://a/p/one.fq,s3://a/p/two.fq\n",
    );

    let store = FileSystemObjectStore::new(&root);
    let http = RecordingHttp::new();
    let exec = TransferExecutor::new(&store, &http, tmp.path().join("work"));
    let cfg = MigrateConfig::new(&sheet, RewriteRule::new("s3://a/p/", "s3://b/q/")?);

    let report = migrate_samplesheet(&cfg, &exec, &mut NonInteractive).await?;
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "s3://a/p/one.fq");
    assert_eq!(report.copied, 1);
    assert!(root.join("b/q/two.fq").exists());
    Ok(())
}

#[tokio::test]
async fn missing_canonical_columns_use_operator_alternates() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("store");
    seed_object(&root, "a", "r/1.fq", b"1");
    seed_object(&root, "a", "r/2.fq", b"2");
    let sheet = write(
        &tmp.path().join("alt.csv"),
        "sample,read_a,read_b\nS1,s3://a/r/1.fq,s3://a/r/ignored.fq\nS2,s3://a/r/2.fq,\n",
    );

    let store = FileSystemObjectStore::new(&root);
    let http = RecordingHttp::new();
    let exec = TransferExecutor::new(&store, &http, tmp.path().join("work"));
    let mut cfg = MigrateConfig::new(&sheet, RewriteRule::new("s3://a/", "s3://b/")?);
    cfg.upload_samplesheet = false;

    let mut input = Scripted {
        alternates: vec!["read_a".into(), "no_such_column".into()],
        ..Default::default()
    };
    let report = migrate_samplesheet(&cfg, &exec, &mut input).await?;

    assert_eq!(input.asked_missing, vec![vec!["fastq_1".to_string(), "fastq_2".to_string()]]);
    assert_eq!(report.references, 2);
    assert_eq!(report.copied, 2);
    assert!(!root.join("b/r/ignored.fq").exists());

    let finalize = finalize_samplesheet(&cfg, &exec).await?;
    assert_eq!(finalize.uploaded_to, None);
    // The text pass is unscoped: read_b is rewritten too.
    assert_eq!(finalize.replacements, 3);
    Ok(())
}

#[tokio::test]
async fn configured_alternates_skip_the_prompt() -> Result<()> {
    let tmp = TempDir::new()?;
    let sheet = write(&tmp.path().join("s.csv"), "sample,bam\nS,https://h/x.bam\n");
    let store = FileSystemObjectStore::new(tmp.path().join("store"));
    let http = RecordingHttp::new();
    let exec = TransferExecutor::new(&store, &http, tmp.path().join("work"));
    let mut cfg = MigrateConfig::new(&sheet, RewriteRule::new("s3://none/", "s3://b/")?);
    cfg.columns = ColumnSelection { alternates: Some(vec!["bam".into()]), ..Default::default() };

    let mut input = Scripted::default();
    let report = migrate_samplesheet(&cfg, &exec, &mut input).await?;
    assert!(input.asked_missing.is_empty());
    assert_eq!(report.references, 1);
    assert_eq!(report.skipped, 1);
    assert!(http.calls().is_empty());
    Ok(())
}

const TD: &str = "https://raw.githubusercontent.com/nf-core/test-datasets/demo/";

#[tokio::test]
async fn pull_test_data_processes_both_profiles() -> Result<()> {
    let tmp = TempDir::new()?;
    let conf = tmp.path().join("conf");
    fs::create_dir_all(&conf)?;
    write(
        &conf.join("test.config"),
        &format!("params {{\n    input = '{TD}samplesheet/samplesheet_test.csv'\n}}\n"),
    );
    write(
        &conf.join("test_full.config"),
        &format!("params {{\n    input = '{TD}samplesheet/samplesheet_full.csv'\n}}\n"),
    );

    let http = RecordingHttp::new()
        .with(
            &format!("{TD}samplesheet/samplesheet_test.csv"),
            format!("sample,fastq_1,fastq_2\nT,{TD}reads/t_1.fq.gz,{TD}reads/t_2.fq.gz\n"),
        )
        .with(
            &format!("{TD}samplesheet/samplesheet_full.csv"),
            format!("sample,fastq_1,fastq_2\nF,{TD}reads/f_1.fq.gz,\n"),
        )
        .with(&format!("{TD}reads/t_1.fq.gz"), b"t1".to_vec())
        .with(&format!("{TD}reads/t_2.fq.gz"), b"t2".to_vec())
        .with(&format!("{TD}reads/f_1.fq.gz"), b"f1".to_vec());

    let root = tmp.path().join("store");
    let work = tmp.path().join("work");
    let store = FileSystemObjectStore::new(&root);
    let exec = TransferExecutor::new(&store, &http, &work);

    let rule = RewriteRule::new(TD, "s3://mirror/demo/")?;
    let mut input = Scripted {
        rules: VecDeque::from(vec![Some(rule.clone()), Some(rule)]),
        ..Default::default()
    };
    let cfg = PullConfig { conf_dir: conf.clone(), columns: ColumnSelection::default() };

    let pulled = pull_test_data(&cfg, &exec, &http, &mut input).await?;

    assert_eq!(pulled.len(), 2);
    assert_eq!(input.defaults_seen, vec![String::new(), "s3://mirror/demo/".to_string()]);
    assert_eq!(pulled[0].migration.uploaded, 2);
    assert_eq!(pulled[1].migration.uploaded, 1);
    assert_eq!(fs::read(root.join("mirror/demo/reads/t_1.fq.gz"))?, b"t1");
    assert_eq!(fs::read(root.join("mirror/demo/reads/f_1.fq.gz"))?, b"f1");
    assert_eq!(
        pulled[0].finalize.uploaded_to,
        Some(ObjectRef::new("mirror", "demo/samplesheet_test.csv"))
    );
    let uploaded = fs::read_to_string(root.join("mirror/demo/samplesheet_test.csv"))?;
    assert!(uploaded.contains("T,s3://mirror/demo/reads/t_1.fq.gz,s3://mirror/demo/reads/t_2.fq.gz"));

    // Only the fetched samplesheets stay in the work directory.
    let mut left: Vec<String> = fs::read_dir(&work)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    left.sort();
    assert_eq!(left, vec!["samplesheet_full.csv", "samplesheet_test.csv"]);
    Ok(())
}

#[tokio::test]
async fn pull_test_data_skips_declined_and_missing_profiles() -> Result<()> {
    let tmp = TempDir::new()?;
    let conf = tmp.path().join("conf");
    fs::create_dir_all(&conf)?;
    write(
        &conf.join("test.config"),
        &format!("params {{ input = '{TD}samplesheet/samplesheet_test.csv' }}\n"),
    );

    let http = RecordingHttp::new().with(
        &format!("{TD}samplesheet/samplesheet_test.csv"),
        format!("sample,fastq_1,fastq_2\nT,{TD}reads/t_1.fq.gz,\n"),
    );
    let store = FileSystemObjectStore::new(tmp.path().join("store"));
    let exec = TransferExecutor::new(&store, &http, tmp.path().join("work"));
    let cfg = PullConfig { conf_dir: conf, columns: ColumnSelection::default() };

    let mut input = Scripted { rules: VecDeque::from(vec![None]), ..Default::default() };
    let pulled = pull_test_data(&cfg, &exec, &http, &mut input).await?;

    assert!(pulled.is_empty());
    assert_eq!(http.calls().len(), 1);
    Ok(())
}
