//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! CLI supporting `extract-params`, `enrich-params`, `migrate` and `pull-test-data`.
//!
//! Examples:
//! ```bash
//! nfrelease-cli extract-params --schema ../nextflow_schema.json
//! nfrelease-cli enrich-params https://nf-co.re/rnaseq/parameters
//! nfrelease-cli migrate samplesheet.csv --prefix s3://old/reads --replacement s3://new/data/
//! nfrelease-cli pull-test-data --conf-dir ../conf
//!
//! # Dry run against a local directory instead of S3
//! nfrelease-cli --backend file:///tmp/store migrate samplesheet.csv -p s3://a/ -r s3://b/
//! ```
//!
//! Values not given on the command line are asked for when stdin is a terminal.

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, BufRead, ErrorKind, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nfrelease::{
    config::default_work_dir, enrich_template_file, extract_to_file, finalize_samplesheet,
    migrate_samplesheet, parse_column_list, pull_test_data, s3_client::has_env_credentials,
    store_for_backend, ColumnSelection, EnrichConfig, ExtractConfig, HttpConfig, MigrateConfig,
    OperatorInput, PullConfig, ReqwestSource, RewriteRule, StoreBackend, TransferConfig,
    TransferExecutor,
};

/// Macro to safely print with broken pipe handling
macro_rules! safe_println {
    ($($arg:tt)*) => {
        match writeln!(io::stdout(), $($arg)*) {
            Ok(_) => {},
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                // Gracefully exit on broken pipe (e.g., when piped to head/tail)
                std::process::exit(0);
            }
            Err(e) => return Err(e.into())
        }
    };
}

// -- Commands

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short = 'v',
        long,
        action = ArgAction::Count,
        help = "Increase log verbosity: -v = Info, -vv = Debug",
    )]
    verbose: u8,

    /// Object store for uploads and copies: `s3` or `file:///path/to/root`.
    #[arg(long, global = true, default_value = "s3")]
    backend: StoreBackend,

    /// Directory for downloaded samplesheets and transfer intermediates.
    #[arg(long = "work-dir", global = true)]
    work_dir: Option<PathBuf>,

    /// Never prompt; missing values fall back to defaults.
    #[arg(long = "no-prompt", global = true)]
    no_prompt: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the parameter template from a pipeline schema.
    ExtractParams {
        /// Schema file (default: ../nextflow_schema.json)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Output template (default: ../parameter-template.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Set required/optional flags in the template from the documentation page.
    EnrichParams {
        /// URL of the rendered parameter documentation
        docs_url: Option<String>,

        /// Template to update (default: ../parameter-template.json)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Markup class that marks a required parameter
        #[arg(long = "badge-class")]
        badge_class: Option<String>,
    },

    /// Relocate the files of one samplesheet and re-point it.
    Migrate {
        /// Samplesheet to migrate (rewritten in place)
        samplesheet: PathBuf,

        /// Exact prefix of the references to move
        #[arg(short, long)]
        prefix: Option<String>,

        /// Replacement for the prefix
        #[arg(short, long)]
        replacement: Option<String>,

        /// Columns to read when fastq_1/fastq_2 are missing (comma separated, at most two)
        #[arg(short, long)]
        columns: Option<String>,

        /// Do not upload the rewritten samplesheet
        #[arg(long = "no-upload")]
        no_upload: bool,
    },

    /// Fetch the samplesheets named in conf/test*.config and migrate them.
    PullTestData {
        /// Directory with test.config and test_full.config (default: ../conf)
        #[arg(long = "conf-dir")]
        conf_dir: Option<PathBuf>,

        /// Columns to read when fastq_1/fastq_2 are missing (comma separated, at most two)
        #[arg(short, long)]
        columns: Option<String>,
    },
}

// -----------------------------------------------------------------------------
// Operator prompts
// -----------------------------------------------------------------------------

/// Line-based prompts on stdin; silent when not attached to a terminal.
struct Prompter {
    interactive: bool,
}

impl Prompter {
    fn new(no_prompt: bool) -> Self {
        Self { interactive: !no_prompt && io::stdin().is_terminal() }
    }

    /// Ask `question`; an empty answer (or no terminal) yields `default`.
    fn ask(&self, question: &str, default: &str) -> Result<String> {
        if !self.interactive {
            return Ok(default.to_string());
        }
        let mut stdout = io::stdout();
        if default.is_empty() {
            write!(stdout, "{}: ", question)?;
        } else {
            write!(stdout, "{} [default: {}]: ", question, default)?;
        }
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let answer = line.trim();
        Ok(if answer.is_empty() { default.to_string() } else { answer.to_string() })
    }

    fn ask_path(&self, question: &str, default: PathBuf) -> Result<PathBuf> {
        let answer = self.ask(question, &default.to_string_lossy())?;
        Ok(PathBuf::from(answer))
    }
}

impl OperatorInput for Prompter {
    fn alternate_columns(&mut self, samplesheet: &Path, missing: &[String]) -> Result<Vec<String>> {
        println!("{} aren't present in {}.", missing.join(", "), samplesheet.display());
        let answer = self.ask(
            "Please provide the name(s) of the column(s) which contain the sample filepaths (comma separated)",
            "",
        )?;
        Ok(parse_column_list(&answer))
    }

    fn rewrite_rule(
        &mut self,
        samplesheet: &Path,
        default_replacement: &str,
    ) -> Result<Option<RewriteRule>> {
        println!("Processing file: {}", samplesheet.display());
        let prefix = self.ask(
            "Enter the filepath of the samples in the samplesheet you want to change",
            "",
        )?;
        if prefix.is_empty() {
            return Ok(None);
        }
        let replacement = self.ask("Enter the string you want to replace it with", default_replacement)?;
        Ok(Some(RewriteRule::new(prefix, replacement)?))
    }
}

fn column_selection(columns: Option<&str>) -> ColumnSelection {
    ColumnSelection {
        alternates: columns.map(parse_column_list),
        ..Default::default()
    }
}

fn warn_if_no_credentials(backend: &StoreBackend) {
    if *backend == StoreBackend::S3 && !has_env_credentials() {
        warn!("AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY not set; relying on the default credential chain");
    }
}

// -----------------------------------------------------------------------------
// Command implementations
// -----------------------------------------------------------------------------

fn extract_params_cmd(prompter: &Prompter, schema: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let mut cfg = ExtractConfig::default();
    cfg.schema_path = match schema {
        Some(p) => p,
        None => prompter.ask_path("Enter path to nextflow_schema.json", cfg.schema_path)?,
    };
    if let Some(p) = output {
        cfg.output_path = p;
    }

    let summary = extract_to_file(&cfg.schema_path, &cfg.output_path, &cfg.exclusions)?;
    safe_println!("\nProcessed {} parameters", summary.processed);
    safe_println!("Excluded {} specified parameters", summary.excluded);
    safe_println!("Output saved to: {}", cfg.output_path.display());
    Ok(())
}

async fn enrich_params_cmd(
    prompter: &Prompter,
    docs_url: Option<String>,
    template: Option<PathBuf>,
    badge_class: Option<String>,
) -> Result<()> {
    let docs_url = match docs_url {
        Some(u) => u,
        None => prompter.ask("Enter the URL of the parameter documentation page", "")?,
    };
    if docs_url.is_empty() {
        bail!("a documentation URL is required");
    }
    let mut cfg = EnrichConfig::new(docs_url);
    if let Some(t) = template {
        cfg.template_path = t;
    }
    if let Some(b) = badge_class {
        cfg.badge_class = b;
    }

    let http = ReqwestSource::new(&cfg.http)?;
    match enrich_template_file(&cfg, &http).await? {
        Some(summary) => {
            safe_println!(
                "{} parameters found on the page, {} required",
                summary.found,
                summary.required
            );
            for name in &summary.not_found {
                safe_println!("  not documented: {}", name);
            }
            safe_println!("Template updated: {}", cfg.template_path.display());
        }
        None => safe_println!("Documentation page unavailable; {} left unchanged", cfg.template_path.display()),
    }
    Ok(())
}

async fn migrate_cmd(
    prompter: &mut Prompter,
    transfer: &TransferConfig,
    samplesheet: PathBuf,
    prefix: Option<String>,
    replacement: Option<String>,
    columns: Option<String>,
    no_upload: bool,
) -> Result<()> {
    let prefix = match prefix {
        Some(p) => p,
        None => prompter.ask("Enter the prefix of the references you want to change", "")?,
    };
    let replacement = match replacement {
        Some(r) => r,
        None => prompter.ask("Enter the string you want to replace it with", "")?,
    };
    let mut cfg = MigrateConfig::new(samplesheet, RewriteRule::new(prefix, replacement)?);
    cfg.columns = column_selection(columns.as_deref());
    cfg.upload_samplesheet = !no_upload;

    warn_if_no_credentials(&transfer.backend);
    let store = store_for_backend(&transfer.backend).await?;
    let http = ReqwestSource::new(&transfer.http)?;
    let executor = TransferExecutor::new(store.as_ref(), &http, &transfer.work_dir);

    let report = migrate_samplesheet(&cfg, &executor, prompter).await?;
    let finalize = finalize_samplesheet(&cfg, &executor).await?;

    safe_println!(
        "{}: {} copied, {} uploaded, {} skipped, {} failed",
        cfg.samplesheet.display(),
        report.copied,
        report.uploaded,
        report.skipped,
        report.failed.len()
    );
    for (reference, err) in &report.failed {
        safe_println!("  FAILED {}: {}", reference, err);
    }
    safe_println!("Rewrote {} occurrence(s) in {}", finalize.replacements, cfg.samplesheet.display());
    if let Some(dest) = finalize.uploaded_to {
        safe_println!("Samplesheet uploaded to {}", dest);
    }
    Ok(())
}

async fn pull_test_data_cmd(
    prompter: &mut Prompter,
    transfer: &TransferConfig,
    conf_dir: Option<PathBuf>,
    columns: Option<String>,
) -> Result<()> {
    let mut cfg = PullConfig::default();
    if let Some(dir) = conf_dir {
        cfg.conf_dir = dir;
    }
    cfg.columns = column_selection(columns.as_deref());

    warn_if_no_credentials(&transfer.backend);
    let store = store_for_backend(&transfer.backend).await?;
    let http = ReqwestSource::new(&transfer.http)?;
    let executor = TransferExecutor::new(store.as_ref(), &http, &transfer.work_dir);

    let pulled = pull_test_data(&cfg, &executor, &http, prompter).await?;
    if pulled.is_empty() {
        safe_println!("Nothing to migrate.");
    }
    for sheet in &pulled {
        safe_println!(
            "{} (from {}): {} copied, {} uploaded, {} skipped, {} failed",
            sheet.samplesheet.display(),
            sheet.config.display(),
            sheet.migration.copied,
            sheet.migration.uploaded,
            sheet.migration.skipped,
            sheet.migration.failed.len()
        );
        if let Some(dest) = &sheet.finalize.uploaded_to {
            safe_println!("  samplesheet uploaded to {}", dest);
        }
    }
    Ok(())
}

/// Main CLI function
#[tokio::main]
async fn main() -> Result<()> {
    // Loads any variables from .env file that are not already set
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbosity
    let filter = match cli.verbose {
        0 => "warn",        // no -v: WARN level
        1 => "info",        // -v: INFO level
        _ => "debug",       // -vv or more: DEBUG level
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Initialize tracing-log bridge to capture log crate messages from dependencies
    tracing_log::LogTracer::init().ok();

    let mut prompter = Prompter::new(cli.no_prompt);
    let transfer = TransferConfig {
        work_dir: cli.work_dir.clone().unwrap_or_else(default_work_dir),
        backend: cli.backend.clone(),
        http: HttpConfig::default(),
    };
    info!("work directory: {}", transfer.work_dir.display());

    match cli.cmd {
        Command::ExtractParams { schema, output } => {
            extract_params_cmd(&prompter, schema, output)?
        }

        Command::EnrichParams { docs_url, template, badge_class } => {
            enrich_params_cmd(&prompter, docs_url, template, badge_class).await?
        }

        Command::Migrate { samplesheet, prefix, replacement, columns, no_upload } => {
            migrate_cmd(
                &mut prompter,
                &transfer,
                samplesheet,
                prefix,
                replacement,
                columns,
                no_upload,
            )
            .await?
        }

        Command::PullTestData { conf_dir, columns } => {
            pull_test_data_cmd(&mut prompter, &transfer, conf_dir, columns).await?
        }
    }

    Ok(())
}
