// src/http/client.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
// reqwest-backed HTTP source: streaming download to disk and whole-body fetch

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{ClientBuilder, StatusCode};
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::HttpConfig;

/// Failures the caller may want to tell apart from transport errors.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("GET {url} returned {status}")]
    Status { url: String, status: StatusCode },
}

/// Anything that can serve an HTTP GET.
///
/// One call is one request; implementations do not retry.
#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Stream the body of `url` into `dest`, creating or truncating it.
    /// Returns the number of bytes written.
    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64>;

    /// Read the whole body of `url` into memory.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// HTTP source over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestSource {
    client: reqwest::Client,
}

impl ReqwestSource {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .use_rustls_tls()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status { url: url.to_string(), status }.into());
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self.get_ok(url).await?;
        let mut file = File::create(dest)
            .await
            .with_context(|| format!("cannot create {}", dest.display()))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("reading body of {} failed", url))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!("downloaded {} bytes from {} → {}", written, url, dest.display());
        Ok(written)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self.get_ok(url).await?;
        response
            .bytes()
            .await
            .with_context(|| format!("reading body of {} failed", url))
    }
}
