// src/constants.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Centralized constants for nfrelease to avoid hardcoded values throughout the codebase

/// Parameters never carried into the parameter template.
/// These are either institutional/config-profile knobs or generic pipeline
/// plumbing that every nf-core pipeline shares.
pub const EXCLUDE_PARAMETERS: &[&str] = &[
    "outdir",
    "email",
    "custom_config_version",
    "custom_config_base",
    "config_profile_name",
    "config_profile_description",
    "config_profile_contact",
    "config_profile_url",
    "max_cpus",
    "max_memory",
    "max_time",
    "max_multiqc_email_size",
    "help",
    "version",
    "publish_dir_mode",
    "email_on_fail",
    "plaintext_email",
    "monochrome_logs",
    "hook_url",
    "validate_params",
    "validationShowHiddenParams",
    "validationFailUnrecognisedParams",
    "validationLenientMode",
    "pipelines_testdata_base_path",
    "genome",
    "igenomes_base",
    "igenomes_ignore",
];

/// Schema file name, resolved next to the pipeline root
pub const DEFAULT_SCHEMA_FILE: &str = "nextflow_schema.json";

/// Template file name, resolved next to the pipeline root
pub const DEFAULT_TEMPLATE_FILE: &str = "parameter-template.json";

/// Directory holding the pipeline test profiles
pub const DEFAULT_CONF_DIR: &str = "conf";

/// Test profiles scanned by `pull-test-data`, in processing order
pub const TEST_CONFIG_FILES: [&str; 2] = ["test.config", "test_full.config"];

/// Columns holding the read files in an nf-core samplesheet
pub const CANONICAL_COLUMNS: [&str; 2] = ["fastq_1", "fastq_2"];

/// At most this many alternate columns are accepted when the canonical ones are missing
pub const MAX_ALTERNATE_COLUMNS: usize = 2;

/// Raw-content prefix of the nf-core test-datasets repository
pub const TEST_DATASETS_URL_PREFIX: &str = "https://raw.githubusercontent.com/nf-core/test-datasets/";

/// Markup class marking a parameter as required on the documentation page
pub const DEFAULT_REQUIRED_BADGE_CLASS: &str = "badge-required";

/// Default region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default timeout for HTTP requests (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Default connect timeout for object-store requests (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default operation timeout for object-store requests (seconds)
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 300;

/// Objects larger than this are uploaded / copied in parts
pub const DEFAULT_S3_MULTIPART_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Default part size for multipart upload and copy
pub const DEFAULT_S3_MULTIPART_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Minimum part size allowed by S3 (except the last part)
pub const MIN_S3_MULTIPART_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of parts in one multipart upload
pub const MAX_MULTIPART_PARTS: u64 = 10_000;

/// Scheme prefix used when rendering object references
pub const OBJECT_STORE_SCHEME: &str = "s3://";

/// Environment overrides
pub const ENV_WORK_DIR: &str = "NFRELEASE_WORK_DIR";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "NFRELEASE_HTTP_TIMEOUT_SECS";
pub const ENV_BADGE_CLASS: &str = "NFRELEASE_BADGE_CLASS";
pub const ENV_OPERATION_TIMEOUT_SECS: &str = "NFRELEASE_OPERATION_TIMEOUT_SECS";
