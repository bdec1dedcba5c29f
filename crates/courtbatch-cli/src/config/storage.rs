//! Storage options.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use courtbatch_opendal::{S3Config, Storage};

use crate::TRACING_TARGET_CONFIG;

/// Local data directory and remote bucket.
#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// Local data directory; relative locations resolve against it.
    #[arg(long, env = "COURTBATCH_DATA_DIR", default_value = "./data", global = true)]
    pub data_dir: PathBuf,

    /// Bucket behind `s3://` locations.
    #[arg(long, env = "COURTBATCH_BUCKET", global = true)]
    pub bucket: Option<String>,

    /// Bucket region.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1", global = true)]
    pub region: String,

    /// Custom endpoint for S3-compatible storage.
    #[arg(long, env = "COURTBATCH_S3_ENDPOINT", global = true)]
    pub s3_endpoint: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true, global = true)]
    pub aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true, global = true)]
    pub aws_secret_access_key: Option<String>,
}

impl StorageArgs {
    /// Builds the process-wide storage client.
    pub async fn build(&self) -> anyhow::Result<Storage> {
        let storage = Storage::new(&self.data_dir)
            .await
            .with_context(|| format!("failed to open data directory '{}'", self.data_dir.display()))?;

        let Some(bucket) = &self.bucket else {
            return Ok(storage);
        };

        let mut s3 = S3Config::new(bucket, &self.region);
        if let Some(endpoint) = &self.s3_endpoint {
            s3 = s3.with_endpoint(endpoint);
        }
        if let (Some(key), Some(secret)) = (&self.aws_access_key_id, &self.aws_secret_access_key) {
            s3 = s3.with_credentials(key, secret);
        }

        storage
            .with_s3(s3)
            .await
            .with_context(|| format!("failed to configure bucket '{bucket}'"))
    }

    /// Options a child worker process needs to see the same storage.
    ///
    /// Credentials are left out; children inherit them from the environment.
    pub fn forwarded_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--data-dir={}", self.data_dir.display()),
            format!("--region={}", self.region),
        ];
        if let Some(bucket) = &self.bucket {
            args.push(format!("--bucket={bucket}"));
        }
        if let Some(endpoint) = &self.s3_endpoint {
            args.push(format!("--s3-endpoint={endpoint}"));
        }
        args
    }

    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            data_dir = %self.data_dir.display(),
            bucket = ?self.bucket,
            region = %self.region,
            s3_endpoint = ?self.s3_endpoint,
            "Storage configuration"
        );
    }
}
