#![doc = "S3 implementation of the core `ObjectStore` trait used by the CLI."]
//
//! # Object storage (CLI <-> Core)
//!
//! Bridges [`module_publisher_core::contract::ObjectStore`] to Amazon S3 (or
//! any S3-compatible endpoint reachable through the AWS SDK).
//!
//! - Construct [`S3Store`] with [`S3Store::new`]. The SDK client is built on
//!   the first upload, so runs with nothing to publish need no credentials.
//!   Credentials come from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`, the
//!   region from the usual AWS resolution chain.
//! - Every object is written with the `public-read` canned ACL.

use crate::load_config::StorageSettings;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use module_publisher_core::contract::{ObjectStore, UploadError};
use std::env;
use std::path::Path;
use tokio::sync::OnceCell;

pub struct S3Store {
    client: OnceCell<Client>,
    bucket: String,
    public_base: String,
}

/// Public URL of `key` below `base`.
pub fn public_location(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Default public base for a bucket when none is configured.
pub fn default_public_base(bucket: &str) -> String {
    format!("https://{bucket}.s3.amazonaws.com")
}

/// Content type announced for a published file, chosen by key suffix.
pub fn content_type_for(key: &str) -> &'static str {
    let lower = key.to_ascii_lowercase();
    if lower.ends_with(".tar.gz") {
        "application/gzip"
    } else if lower.ends_with(".md") {
        "text/markdown"
    } else {
        "text/plain"
    }
}

/// Static credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`.
pub fn credentials_from_env() -> anyhow::Result<Credentials> {
    dotenvy::dotenv().ok(); // loads environment variables from .env if present
    let access_key = env::var("AWS_ACCESS_KEY_ID").map_err(|e| {
        tracing::error!(error = ?e, "AWS_ACCESS_KEY_ID missing in environment");
        anyhow::anyhow!("AWS_ACCESS_KEY_ID missing in environment: {e}")
    })?;
    let secret_key = env::var("AWS_SECRET_ACCESS_KEY").map_err(|e| {
        tracing::error!(error = ?e, "AWS_SECRET_ACCESS_KEY missing in environment");
        anyhow::anyhow!("AWS_SECRET_ACCESS_KEY missing in environment: {e}")
    })?;
    Ok(Credentials::new(access_key, secret_key, None, None, "environment"))
}

impl S3Store {
    pub fn new(settings: &StorageSettings) -> Self {
        let public_base = settings
            .public_base_url
            .clone()
            .unwrap_or_else(|| default_public_base(&settings.bucket));
        tracing::info!(
            bucket = %settings.bucket,
            public_base = %public_base,
            "Configured S3Store"
        );
        Self {
            client: OnceCell::new(),
            bucket: settings.bucket.clone(),
            public_base,
        }
    }

    async fn client(&self) -> anyhow::Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let credentials = credentials_from_env()?;
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .credentials_provider(credentials)
                    .load()
                    .await;
                tracing::info!(
                    bucket = %self.bucket,
                    region = ?sdk_config.region(),
                    "Initialized S3 client from environment"
                );
                Ok::<_, anyhow::Error>(Client::new(&sdk_config))
            })
            .await
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_public(&self, local_path: &Path, key: &str) -> Result<String, UploadError> {
        let client = self.client().await?;
        tracing::info!(
            bucket = %self.bucket,
            key,
            path = %local_path.display(),
            "Uploading object"
        );
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            tracing::error!(
                error = ?e,
                path = %local_path.display(),
                "Failed to open upload source"
            );
            e
        })?;

        client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(key))
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %DisplayErrorContext(&e), key, "S3 PutObject failed");
                format!("Error while uploading {key}: {}", DisplayErrorContext(&e))
            })?;

        Ok(public_location(&self.public_base, key))
    }
}
