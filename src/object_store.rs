// src/object_store.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// Pluggable object-store abstraction.
// Backends: S3 (aws-sdk-s3) and a local directory (file://) used for dry runs and tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::debug;

use crate::config::StoreBackend;
use crate::constants::{DEFAULT_S3_MULTIPART_PART_SIZE, DEFAULT_S3_MULTIPART_THRESHOLD};
use crate::file_store::FileSystemObjectStore;
use crate::multipart::{copy_multipart, copy_source, upload_file_multipart};
use crate::s3_client::aws_s3_client_async;
use crate::uri_utils::ObjectRef;

/// ObjectStore trait for pluggable storage backends.
///
/// Only the two operations the migration needs: push a local file, and copy
/// between two addresses without the data leaving the store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file to `dest`. Returns the number of bytes sent.
    async fn upload_file(&self, local: &Path, dest: &ObjectRef) -> Result<u64>;

    /// Server-side copy from `src` to `dst`.
    async fn copy(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()>;
}

/// S3 adapter over the shared SDK client.
///
/// Objects above `multipart_threshold` bytes go through multipart upload or
/// multipart copy.
pub struct S3ObjectStore {
    client: Client,
    multipart_threshold: u64,
    part_size: u64,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            multipart_threshold: DEFAULT_S3_MULTIPART_THRESHOLD,
            part_size: DEFAULT_S3_MULTIPART_PART_SIZE,
        }
    }

    /// Build on the process-wide client.
    pub async fn from_env() -> Result<Self> {
        Ok(Self::new(aws_s3_client_async().await?))
    }

    async fn object_size(&self, obj: &ObjectRef) -> Result<u64> {
        let head = self
            .client
            .head_object()
            .bucket(&obj.container)
            .key(&obj.key)
            .send()
            .await
            .with_context(|| format!("head_object {} failed", obj))?;
        let len = head.content_length().unwrap_or_default();
        Ok(u64::try_from(len).unwrap_or_default())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload_file(&self, local: &Path, dest: &ObjectRef) -> Result<u64> {
        let size = tokio::fs::metadata(local)
            .await
            .with_context(|| format!("cannot stat {}", local.display()))?
            .len();

        if size > self.multipart_threshold {
            debug!("multipart upload {} ({} bytes) → {}", local.display(), size, dest);
            upload_file_multipart(&self.client, local, dest, size, self.part_size).await?;
            return Ok(size);
        }

        let body = ByteStream::from_path(local)
            .await
            .with_context(|| format!("cannot open {} for upload", local.display()))?;
        debug!("put_object {} ({} bytes) → {}", local.display(), size, dest);
        self.client
            .put_object()
            .bucket(&dest.container)
            .key(&dest.key)
            .body(body)
            .send()
            .await
            .with_context(|| format!("put_object to {} failed", dest))?;
        Ok(size)
    }

    async fn copy(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()> {
        let size = self.object_size(src).await?;
        if size > self.multipart_threshold {
            debug!("multipart copy {} ({} bytes) → {}", src, size, dst);
            return copy_multipart(&self.client, src, dst, size, self.part_size).await;
        }

        debug!("copy_object {} → {}", src, dst);
        self.client
            .copy_object()
            .copy_source(copy_source(src))
            .bucket(&dst.container)
            .key(&dst.key)
            .send()
            .await
            .with_context(|| format!("copy_object {} → {} failed", src, dst))?;
        Ok(())
    }
}

/// Convenience factory that picks a backend from configuration.
pub async fn store_for_backend(backend: &StoreBackend) -> Result<Box<dyn ObjectStore>> {
    match backend {
        StoreBackend::S3 => Ok(Box::new(S3ObjectStore::from_env().await?)),
        StoreBackend::Filesystem { root } => {
            Ok(Box::new(FileSystemObjectStore::new(root.clone())))
        }
    }
}
