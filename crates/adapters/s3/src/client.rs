//! S3 client implementation

use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use santoku_common::Table;
use santoku_config::AwsConfig;
use santoku_errors::{AppError, AppResult};
use tracing::{debug, info};

use crate::error::{SERVICE, map_s3_error};
use crate::manifest::QuickSightManifest;

/// S3 handler
#[derive(Debug, Clone)]
pub struct S3Handler {
    client: Client,
}

impl S3Handler {
    /// Create a handler from the shared AWS configuration
    pub async fn new(config: &AwsConfig) -> Self {
        let sdk_config = santoku_common::load_sdk_config(config).await;
        info!("S3 handler created");
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Absolute `s3://` URI of a key, optionally below a prefix.
    ///
    /// A folder prefix is joined with `/` unless it already ends with one; other prefixes are
    /// concatenated with the key as-is.
    pub fn absolute_path(
        bucket: &str,
        key: &str,
        prefix: Option<&str>,
        prefix_is_folder: bool,
    ) -> String {
        match prefix {
            Some(prefix) if prefix_is_folder && !prefix.ends_with('/') => {
                format!("s3://{}/{}/{}", bucket, prefix, key)
            }
            Some(prefix) => format!("s3://{}/{}{}", bucket, prefix, key),
            None => format!("s3://{}/{}", bucket, key),
        }
    }

    /// List every key in a bucket, across all result pages.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        start_after: Option<&str>,
    ) -> AppResult<Vec<String>> {
        debug!("Listing objects in bucket: {}", bucket);

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_start_after(start_after.map(str::to_string))
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(map_s3_error)?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }

        debug!(bucket, count = keys.len(), "Objects listed");
        Ok(keys)
    }

    pub async fn key_exists(&self, bucket: &str, key: &str) -> AppResult<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(map_s3_error(err)),
        }
    }

    pub async fn read_key_bytes(&self, bucket: &str, key: &str) -> AppResult<Vec<u8>> {
        debug!("Reading s3://{}/{}", bucket, key);

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(map_s3_error)?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::vendor(SERVICE, e))?;
        Ok(body.into_bytes().to_vec())
    }

    /// Read an object as UTF-8 text.
    pub async fn read_key_content(&self, bucket: &str, key: &str) -> AppResult<String> {
        let bytes = self.read_key_bytes(bucket, key).await?;
        String::from_utf8(bytes).map_err(|_| {
            AppError::malformed(format!("s3://{}/{} is not valid UTF-8 text.", bucket, key))
        })
    }

    pub async fn put_key(&self, bucket: &str, key: &str, content: Vec<u8>) -> AppResult<()> {
        let size = content.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(map_s3_error)?;

        info!(bucket, key, size, "Object written");
        Ok(())
    }

    pub async fn delete_key(&self, bucket: &str, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(map_s3_error)?;

        info!(bucket, key, "Object deleted");
        Ok(())
    }

    /// Delete keys one by one, stopping at the first failure.
    pub async fn delete_keys<K: AsRef<str>>(&self, bucket: &str, keys: &[K]) -> AppResult<()> {
        for key in keys {
            self.delete_key(bucket, key.as_ref()).await?;
        }
        Ok(())
    }

    /// Upload a table as a CSV object.
    pub async fn write_table_as_csv(
        &self,
        table: &Table,
        bucket: &str,
        key: &str,
        include_index: bool,
    ) -> AppResult<()> {
        let content = table.to_csv_bytes(include_index)?;
        self.put_key(bucket, key, content).await
    }

    /// Render a QuickSight manifest and store it at `bucket/key`.
    pub async fn generate_quicksight_manifest(
        &self,
        bucket: &str,
        key: &str,
        manifest: &QuickSightManifest,
    ) -> AppResult<()> {
        let content = manifest.to_json_string()?;
        self.put_key(bucket, key, content.into_bytes()).await
    }
}
