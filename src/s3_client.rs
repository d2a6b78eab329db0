// src/s3_client.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Lazily-built, process-wide S3 client.
//!
//! Credentials come from the standard AWS provider chain; this module only
//! resolves region, an optional custom endpoint and timeouts.

use anyhow::Result;
use aws_config::meta::region::RegionProviderChain;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::{config::Region, Client};
use std::{env, time::Duration};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_OPERATION_TIMEOUT_SECS, DEFAULT_REGION,
    ENV_OPERATION_TIMEOUT_SECS,
};

static CLIENT: OnceCell<Client> = OnceCell::const_new();

/// Get operation timeout for large file transfers
fn get_operation_timeout() -> Duration {
    env::var(ENV_OPERATION_TIMEOUT_SECS)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS))
}

/// True when static credentials are visible in the environment.
/// Other providers (profiles, IMDS, SSO) may still succeed without them.
pub fn has_env_credentials() -> bool {
    env::var("AWS_ACCESS_KEY_ID").is_ok() && env::var("AWS_SECRET_ACCESS_KEY").is_ok()
}

/// Async getter for the global S3 client.
/// Safe to call from any async context; initializes once.
pub async fn aws_s3_client_async() -> Result<Client> {
    let client_ref = CLIENT
        .get_or_try_init(|| async {
            dotenvy::dotenv().ok();

            // Region & optional endpoint
            let region =
                RegionProviderChain::first_try(env::var("AWS_REGION").ok().map(Region::new))
                    .or_default_provider()
                    .or_else(Region::new(DEFAULT_REGION));

            let mut loader =
                aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);
            if let Ok(endpoint) = env::var("AWS_ENDPOINT_URL") {
                if !endpoint.is_empty() {
                    debug!("Using custom S3 endpoint {}", endpoint);
                    loader = loader.endpoint_url(endpoint);
                }
            }

            let timeout_config = TimeoutConfig::builder()
                .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
                .operation_timeout(get_operation_timeout())
                .build();

            let cfg = loader.timeout_config(timeout_config).load().await;

            // Path-style addressing keeps S3-compatible services (MinIO, Ceph) working
            // behind a custom endpoint.
            let s3_config = aws_sdk_s3::config::Builder::from(&cfg)
                .force_path_style(true)
                .build();
            Ok::<_, anyhow::Error>(Client::from_conf(s3_config))
        })
        .await?;

    Ok(client_ref.clone())
}
