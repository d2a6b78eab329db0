// src/multipart.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// S3 multipart upload and multipart server-side copy.
//
// Used for objects above DEFAULT_S3_MULTIPART_THRESHOLD; a single PutObject
// or CopyObject is limited to 5 GiB. Parts are sent one after another.
// Any failure aborts the upload.

use anyhow::{bail, Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::constants::{MAX_MULTIPART_PARTS, MIN_S3_MULTIPART_PART_SIZE};
use crate::uri_utils::ObjectRef;

/// One byte range of a multipart transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based, as S3 numbers parts.
    pub number: i32,
    pub offset: u64,
    pub len: u64,
}

impl PartRange {
    /// Inclusive `bytes=first-last` form used by UploadPartCopy.
    pub fn copy_range(&self) -> String {
        format!("bytes={}-{}", self.offset, self.offset + self.len - 1)
    }
}

/// Split `total` bytes into parts of `part_size`, growing the part size when
/// needed to stay within the part-count limit.
pub fn plan_parts(total: u64, part_size: u64) -> Vec<PartRange> {
    let part_size = part_size
        .max(MIN_S3_MULTIPART_PART_SIZE)
        .max(total.div_ceil(MAX_MULTIPART_PARTS));

    let mut parts = Vec::new();
    let mut offset = 0u64;
    let mut number = 1i32;
    while offset < total {
        let len = part_size.min(total - offset);
        parts.push(PartRange { number, offset, len });
        offset += len;
        number += 1;
    }
    parts
}

/// `x-amz-copy-source` value: bucket, then the key with every path segment
/// percent-encoded.
pub fn copy_source(src: &ObjectRef) -> String {
    let key = src
        .key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", src.container, key)
}

struct MultipartUpload<'a> {
    client: &'a Client,
    dest: &'a ObjectRef,
    upload_id: String,
    completed: Vec<CompletedPart>,
}

impl<'a> MultipartUpload<'a> {
    async fn begin(client: &'a Client, dest: &'a ObjectRef) -> Result<Self> {
        let resp = client
            .create_multipart_upload()
            .bucket(&dest.container)
            .key(&dest.key)
            .send()
            .await
            .with_context(|| format!("CreateMultipartUpload for {} failed", dest))?;
        let Some(upload_id) = resp.upload_id().filter(|id| !id.is_empty()) else {
            bail!("CreateMultipartUpload for {} returned no upload id", dest);
        };
        debug!("multipart upload {} started for {}", upload_id, dest);
        Ok(Self { client, dest, upload_id: upload_id.to_string(), completed: Vec::new() })
    }

    fn record(&mut self, number: i32, e_tag: Option<&str>) -> Result<()> {
        let Some(e_tag) = e_tag.filter(|t| !t.is_empty()) else {
            bail!("part {} of {} returned empty ETag", number, self.dest);
        };
        self.completed
            .push(CompletedPart::builder().part_number(number).e_tag(e_tag).build());
        Ok(())
    }

    async fn complete(self) -> Result<()> {
        let parts = self.completed.len();
        let cmu = CompletedMultipartUpload::builder()
            .set_parts(Some(self.completed))
            .build();
        self.client
            .complete_multipart_upload()
            .bucket(&self.dest.container)
            .key(&self.dest.key)
            .upload_id(&self.upload_id)
            .multipart_upload(cmu)
            .send()
            .await
            .with_context(|| format!("CompleteMultipartUpload for {} failed", self.dest))?;
        debug!("multipart upload to {} completed ({} parts)", self.dest, parts);
        Ok(())
    }

    /// Best-effort.
    async fn abort(self) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.dest.container)
            .key(&self.dest.key)
            .upload_id(&self.upload_id)
            .send()
            .await
        {
            warn!("could not abort multipart upload {} to {}: {}", self.upload_id, self.dest, e);
        }
    }
}

/// Upload `local` (`size` bytes) to `dest` in parts.
pub async fn upload_file_multipart(
    client: &Client,
    local: &Path,
    dest: &ObjectRef,
    size: u64,
    part_size: u64,
) -> Result<()> {
    let mut mpu = MultipartUpload::begin(client, dest).await?;
    match upload_parts(&mut mpu, local, size, part_size).await {
        Ok(()) => mpu.complete().await,
        Err(e) => {
            mpu.abort().await;
            Err(e)
        }
    }
}

async fn upload_parts(
    mpu: &mut MultipartUpload<'_>,
    local: &Path,
    size: u64,
    part_size: u64,
) -> Result<()> {
    let mut file = File::open(local)
        .await
        .with_context(|| format!("cannot open {} for upload", local.display()))?;

    for part in plan_parts(size, part_size) {
        let mut buf = vec![0u8; part.len as usize];
        file.read_exact(&mut buf)
            .await
            .with_context(|| format!("short read of {} at offset {}", local.display(), part.offset))?;
        let resp = mpu
            .client
            .upload_part()
            .bucket(&mpu.dest.container)
            .key(&mpu.dest.key)
            .upload_id(&mpu.upload_id)
            .part_number(part.number)
            .body(ByteStream::from(buf))
            .send()
            .await
            .with_context(|| format!("UploadPart {} to {} failed", part.number, mpu.dest))?;
        mpu.record(part.number, resp.e_tag())?;
    }
    Ok(())
}

/// Server-side copy of `src` (`size` bytes) to `dst` in ranged parts.
pub async fn copy_multipart(
    client: &Client,
    src: &ObjectRef,
    dst: &ObjectRef,
    size: u64,
    part_size: u64,
) -> Result<()> {
    let mut mpu = MultipartUpload::begin(client, dst).await?;
    match copy_parts(&mut mpu, src, size, part_size).await {
        Ok(()) => mpu.complete().await,
        Err(e) => {
            mpu.abort().await;
            Err(e)
        }
    }
}

async fn copy_parts(
    mpu: &mut MultipartUpload<'_>,
    src: &ObjectRef,
    size: u64,
    part_size: u64,
) -> Result<()> {
    let source = copy_source(src);
    for part in plan_parts(size, part_size) {
        let resp = mpu
            .client
            .upload_part_copy()
            .bucket(&mpu.dest.container)
            .key(&mpu.dest.key)
            .upload_id(&mpu.upload_id)
            .part_number(part.number)
            .copy_source(&source)
            .copy_source_range(part.copy_range())
            .send()
            .await
            .with_context(|| format!("UploadPartCopy {} from {} failed", part.number, src))?;
        let e_tag = resp.copy_part_result().and_then(|r| r.e_tag());
        mpu.record(part.number, e_tag)?;
    }
    Ok(())
}
