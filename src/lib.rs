// src/lib.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Crate root. Release tooling for nf-core pipelines: parameter templates
// from the schema, and test-data samplesheet migration into object storage.

pub mod constants;
pub mod config;

// URI handling and transfer backends
pub mod uri_utils;
pub mod s3_client;
pub mod object_store;
pub mod multipart;
pub mod file_store;
pub mod http;
pub mod transfer;

// Samplesheet migration
pub mod samplesheet;
pub mod rewrite;
pub mod config_url;
pub mod migrate;

// Parameter templates
pub mod schema;
pub mod docs;

// ===== Re-exports expected by src/bin/cli.rs at the crate root =====
pub use crate::config::{
    ColumnSelection, EnrichConfig, ExtractConfig, HttpConfig, MigrateConfig, PullConfig,
    StoreBackend, TransferConfig,
};
pub use crate::uri_utils::{ObjectRef, RemoteLocation};
pub use crate::object_store::{store_for_backend, ObjectStore, S3ObjectStore};
pub use crate::file_store::FileSystemObjectStore;
pub use crate::http::{HttpError, HttpSource, ReqwestSource};
pub use crate::transfer::{TransferError, TransferExecutor, TransferOutcome};
pub use crate::samplesheet::{parse_column_list, Samplesheet, ScanReport};
pub use crate::rewrite::{rewrite_file, RewriteError, RewriteRule};
pub use crate::config_url::{fetch_samplesheet_from_config, find_samplesheet_url};
pub use crate::migrate::{
    finalize_samplesheet, migrate_samplesheet, pull_test_data, samplesheet_destination,
    FinalizeReport, MigrationReport, NonInteractive, OperatorInput, PulledSheet,
};
pub use crate::schema::{extract_parameters, extract_to_file, ParameterEntry, ParameterTemplate};
pub use crate::docs::{enrich_from_docs, enrich_template_file, EnrichSummary};
