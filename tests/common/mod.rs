// tests/common/mod.rs
//
// Common test utilities: an in-memory HTTP source that records every
// request, and a store that refuses uploads.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use nfrelease::{HttpError, HttpSource, ObjectRef, ObjectStore};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Serves canned bodies; any other URL answers 404.
#[derive(Default)]
pub struct RecordingHttp {
    bodies: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn serve(&self, url: &str) -> Result<&[u8]> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.bodies.get(url) {
            Some(body) => Ok(body.as_slice()),
            None => Err(HttpError::Status { url: url.to_string(), status: StatusCode::NOT_FOUND }.into()),
        }
    }
}

#[async_trait]
impl HttpSource for RecordingHttp {
    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let body = self.serve(url)?.to_vec();
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.serve(url)?))
    }
}

/// Every operation fails.
pub struct BrokenStore;

#[async_trait]
impl ObjectStore for BrokenStore {
    async fn upload_file(&self, _local: &Path, dest: &ObjectRef) -> Result<u64> {
        bail!("upload to {} refused", dest)
    }

    async fn copy(&self, src: &ObjectRef, _dst: &ObjectRef) -> Result<()> {
        bail!("copy of {} refused", src)
    }
}

/// Number of entries directly under `dir`.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Write `body` at `<root>/<container>/<key>`.
pub fn seed_object(root: &Path, container: &str, key: &str, body: &[u8]) {
    let path = root.join(container).join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}
