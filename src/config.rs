// src/config.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Runtime parameters for every operation. The CLI fills these from flags,
// the environment and (for anything still missing) interactive prompts;
// library code only ever reads them.

use anyhow::{bail, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    CANONICAL_COLUMNS, DEFAULT_CONF_DIR, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REQUIRED_BADGE_CLASS,
    DEFAULT_SCHEMA_FILE, DEFAULT_TEMPLATE_FILE, ENV_BADGE_CLASS, ENV_HTTP_TIMEOUT_SECS,
    ENV_WORK_DIR, EXCLUDE_PARAMETERS,
};
use crate::rewrite::RewriteRule;

/// Pipeline root: the parent of the directory the tools are run from.
pub fn pipeline_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    cwd.parent().map(Path::to_path_buf).unwrap_or(cwd)
}

/// Scratch directory for downloaded samplesheets and transfer intermediates.
pub fn default_work_dir() -> PathBuf {
    env::var(ENV_WORK_DIR)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn http_timeout_from_env() -> Duration {
    env::var(ENV_HTTP_TIMEOUT_SECS)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
}

/// Which object store receives uploads and copies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    S3,
    /// A local directory standing in for the store: `file:///path/to/root`.
    Filesystem { root: PathBuf },
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("s3") {
            return Ok(StoreBackend::S3);
        }
        if let Some(root) = s.strip_prefix("file://") {
            if root.is_empty() {
                bail!("file:// backend needs a root directory");
            }
            return Ok(StoreBackend::Filesystem { root: PathBuf::from(root) });
        }
        bail!("unknown store backend '{}' (expected 's3' or 'file:///path')", s)
    }
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: http_timeout_from_env(),
            user_agent: format!("nfrelease/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Which samplesheet columns hold file references.
#[derive(Debug, Clone)]
pub struct ColumnSelection {
    /// Used when every one of them is present.
    pub canonical: Vec<String>,
    /// Used instead of asking when the canonical columns are incomplete.
    pub alternates: Option<Vec<String>>,
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self {
            canonical: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            alternates: None,
        }
    }
}

/// Inputs for `extract-params`.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub schema_path: PathBuf,
    pub output_path: PathBuf,
    pub exclusions: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let root = pipeline_root();
        Self {
            schema_path: root.join(DEFAULT_SCHEMA_FILE),
            output_path: root.join(DEFAULT_TEMPLATE_FILE),
            exclusions: EXCLUDE_PARAMETERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Inputs for `enrich-params`.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub template_path: PathBuf,
    pub docs_url: String,
    pub badge_class: String,
    pub http: HttpConfig,
}

impl EnrichConfig {
    pub fn new(docs_url: impl Into<String>) -> Self {
        Self {
            template_path: pipeline_root().join(DEFAULT_TEMPLATE_FILE),
            docs_url: docs_url.into(),
            badge_class: env::var(ENV_BADGE_CLASS)
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_REQUIRED_BADGE_CLASS.to_string()),
            http: HttpConfig::default(),
        }
    }
}

/// One samplesheet to migrate.
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    pub samplesheet: PathBuf,
    pub rule: RewriteRule,
    pub columns: ColumnSelection,
    /// Upload the rewritten samplesheet next to the migrated files.
    pub upload_samplesheet: bool,
}

impl MigrateConfig {
    pub fn new(samplesheet: impl Into<PathBuf>, rule: RewriteRule) -> Self {
        Self {
            samplesheet: samplesheet.into(),
            rule,
            columns: ColumnSelection::default(),
            upload_samplesheet: true,
        }
    }
}

/// Shared transfer settings.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub work_dir: PathBuf,
    pub backend: StoreBackend,
    pub http: HttpConfig,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            backend: StoreBackend::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Inputs for `pull-test-data`.
#[derive(Debug, Clone)]
pub struct PullConfig {
    pub conf_dir: PathBuf,
    pub columns: ColumnSelection,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            conf_dir: pipeline_root().join(DEFAULT_CONF_DIR),
            columns: ColumnSelection::default(),
        }
    }
}
