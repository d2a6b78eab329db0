// src/transfer.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Relocate one resource into object storage.
// HTTP sources are downloaded to the work directory and uploaded;
// object-store sources are copied server-side and never touch local disk.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::http::HttpSource;
use crate::object_store::ObjectStore;
use crate::uri_utils::{url_file_name, ObjectRef, RemoteLocation};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("destination {0} is an HTTP URL; only object-store destinations can be written")]
    UnsupportedDestination(String),
    #[error("cannot derive a local file name from {0}")]
    NoFileName(String),
}

/// What `relocate` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Downloaded over HTTP, then uploaded.
    Uploaded { bytes: u64 },
    /// Copied inside the object store.
    Copied,
}

/// Moves resources into an object store, one at a time.
pub struct TransferExecutor<'a> {
    store: &'a dyn ObjectStore,
    http: &'a dyn HttpSource,
    work_dir: PathBuf,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(store: &'a dyn ObjectStore, http: &'a dyn HttpSource, work_dir: impl Into<PathBuf>) -> Self {
        Self { store, http, work_dir: work_dir.into() }
    }

    pub fn store(&self) -> &'a dyn ObjectStore {
        self.store
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Relocate `source` to `destination`. No retries.
    pub async fn relocate(
        &self,
        source: &RemoteLocation,
        destination: &RemoteLocation,
    ) -> Result<TransferOutcome> {
        let dst = match destination {
            RemoteLocation::ObjectStore(obj) => obj,
            RemoteLocation::Http(url) => {
                return Err(TransferError::UnsupportedDestination(url.clone()).into());
            }
        };

        match source {
            RemoteLocation::Http(url) => self.download_then_upload(url, dst).await,
            RemoteLocation::ObjectStore(src) => self.server_side_copy(src, dst).await,
        }
    }

    async fn server_side_copy(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<TransferOutcome> {
        self.store.copy(src, dst).await?;
        info!("Copied {} to {}", src, dst);
        Ok(TransferOutcome::Copied)
    }

    async fn download_then_upload(&self, url: &str, dst: &ObjectRef) -> Result<TransferOutcome> {
        let name = url_file_name(url).ok_or_else(|| TransferError::NoFileName(url.to_string()))?;
        fs::create_dir_all(&self.work_dir)
            .await
            .with_context(|| format!("cannot create work dir {}", self.work_dir.display()))?;
        let local = self.work_dir.join(name);

        debug!("fetching {} → {}", url, local.display());
        let result = match self.http.download_to(url, &local).await {
            Ok(_) => self.store.upload_file(&local, dst).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                fs::remove_file(&local)
                    .await
                    .with_context(|| format!("cannot remove intermediate {}", local.display()))?;
                info!("Uploaded {} ({} bytes) to {}", name, bytes, dst);
                Ok(TransferOutcome::Uploaded { bytes })
            }
            Err(e) => {
                discard_partial(&local).await;
                Err(e)
            }
        }
    }
}

/// Best-effort removal after a failed transfer.
async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("removed partial {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {}: {}", path.display(), e),
    }
}
