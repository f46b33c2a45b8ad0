//! Object-store access: the [`ObjectStore`] trait and its S3 implementation.
//!
//! All interaction with the blob store goes through here. Typed payloads
//! (JSON documents, gzip-CSV tables) are converted to and from raw bytes at
//! this boundary, and every operation returns a typed error instead of a
//! swallowed boolean, so callers decide whether to log-and-continue or abort.
//! No operation retries internally.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use thiserror::Error;
use tracing::debug;

use crate::keymap::KEY_SEPARATOR;
use crate::table::Table;

/// Failure while writing an object.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The backend answered with a non-success status.
    #[error("upload rejected by storage backend: {0}")]
    Rejected(String),
    /// Connection, timeout or local IO failure before a response arrived.
    #[error("upload transport failure: {0}")]
    Transport(String),
}

/// Failure while reading an object.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("download rejected by storage backend: {0}")]
    Rejected(String),
    #[error("download transport failure: {0}")]
    Transport(String),
    /// The object body could not be decoded as the requested payload kind.
    #[error("malformed object body: {0}")]
    Malformed(String),
}

/// Failure while listing a bucket.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("listing rejected by storage backend: {0}")]
    Rejected(String),
    #[error("listing transport failure: {0}")]
    Transport(String),
}

/// Storage-access abstraction over a key-value blob store.
///
/// One explicit operation per payload kind rather than an overloaded upload
/// method, so callers never guess what kind of object a key holds. Mocked in
/// tests via `MockObjectStore`.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write raw bytes to `bucket`/`key`, overwriting any existing object.
    async fn put_bytes(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), UploadError>;

    /// Stream a local file to `bucket`/`key` without buffering it fully.
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), UploadError>;

    /// Read the full object body.
    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, DownloadError>;

    /// Serialise `value` as compact UTF-8 JSON and upload it.
    async fn put_json(
        &self,
        value: &serde_json::Value,
        bucket: &str,
        key: &str,
    ) -> Result<(), UploadError>;

    /// Download and parse a JSON document.
    async fn get_json(&self, bucket: &str, key: &str) -> Result<serde_json::Value, DownloadError>;

    /// Serialise `table` as gzip-compressed CSV and upload it.
    async fn put_table(&self, table: &Table, bucket: &str, key: &str) -> Result<(), UploadError>;

    /// Download and decode a gzip-compressed CSV table. All cells come back
    /// as strings; `header_row` picks the header record and `index_column`
    /// designates the row index.
    async fn get_table(
        &self,
        bucket: &str,
        key: &str,
        index_column: usize,
        header_row: usize,
    ) -> Result<Table, DownloadError>;

    /// Keys of plain objects: those containing no `/` separator.
    async fn list_object_keys(&self, bucket: &str) -> Result<Vec<String>, ListError>;

    /// Keys under a folder level: those containing a `/` separator,
    /// including zero-length folder markers.
    async fn list_folder_keys(&self, bucket: &str) -> Result<Vec<String>, ListError>;

    /// Write the zero-length marker object `name/` that presents as a folder.
    async fn create_folder(&self, bucket: &str, name: &str) -> Result<(), UploadError>;
}

/// [`ObjectStore`] backed by the AWS S3 API.
///
/// Owns the SDK client (and with it the credential session) for its lifetime.
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Connect with static credentials.
    pub async fn new(access_key_id: &str, secret_access_key: &str, region: &str) -> Self {
        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "static");
        let config = aws_config::from_env()
            .region(Region::new(region.to_owned()))
            .credentials_provider(credentials)
            .load()
            .await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Connect using a named profile from the shared AWS config/credentials
    /// files.
    pub async fn from_profile(profile_name: &str) -> Self {
        let config = aws_config::from_env()
            .profile_name(profile_name)
            .load()
            .await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Connect using the default credential chain (environment, profile,
    /// instance metadata).
    pub async fn from_env() -> Self {
        let config = aws_config::from_env().load().await;
        Self {
            client: Client::new(&config),
        }
    }

    fn is_folder_key(key: &str) -> bool {
        key.contains(KEY_SEPARATOR)
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, ListError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| {
                if let Some(service) = err.as_service_error() {
                    ListError::Rejected(service_detail(service))
                } else {
                    ListError::Transport(err.to_string())
                }
            })?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_owned),
            );
        }
        Ok(keys)
    }

    async fn put_body(&self, bucket: &str, key: &str, body: ByteStream) -> Result<(), UploadError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                if let Some(service) = err.as_service_error() {
                    UploadError::Rejected(service_detail(service))
                } else {
                    UploadError::Transport(err.to_string())
                }
            })?;
        debug!(bucket, key, "Object stored");
        Ok(())
    }
}

/// Compact UTF-8 JSON encoding of a payload value.
fn encode_json(value: &serde_json::Value) -> Result<Vec<u8>, UploadError> {
    serde_json::to_vec(value).map_err(|e| UploadError::Transport(format!("serialise json: {e}")))
}

/// Parse an object body as a JSON document.
fn decode_json(bytes: &[u8]) -> Result<serde_json::Value, DownloadError> {
    serde_json::from_slice(bytes).map_err(|e| DownloadError::Malformed(e.to_string()))
}

/// Marker key presenting `name` as a folder: exactly one trailing separator.
fn folder_marker(name: &str) -> String {
    format!("{}{}", name.trim_end_matches(KEY_SEPARATOR), KEY_SEPARATOR)
}

/// Human-readable code/message pair from an S3 service error.
fn service_detail<E: ProvideErrorMetadata>(err: &E) -> String {
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_owned(),
        (None, Some(message)) => message.to_owned(),
        (None, None) => "unspecified service error".to_owned(),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_bytes(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), UploadError> {
        self.put_body(bucket, key, ByteStream::from(body)).await
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), UploadError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| UploadError::Transport(format!("open {}: {e}", path.display())))?;
        self.put_body(bucket, key, body).await
    }

    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if let Some(service) = err.as_service_error() {
                    if service.is_no_such_key() {
                        DownloadError::NotFound {
                            bucket: bucket.to_owned(),
                            key: key.to_owned(),
                        }
                    } else {
                        DownloadError::Rejected(service_detail(service))
                    }
                } else {
                    DownloadError::Transport(err.to_string())
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| DownloadError::Transport(format!("read body: {e}")))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put_json(
        &self,
        value: &serde_json::Value,
        bucket: &str,
        key: &str,
    ) -> Result<(), UploadError> {
        let body = encode_json(value)?;
        self.put_bytes(bucket, key, body).await
    }

    async fn get_json(&self, bucket: &str, key: &str) -> Result<serde_json::Value, DownloadError> {
        let bytes = self.get_bytes(bucket, key).await?;
        decode_json(&bytes)
    }

    async fn put_table(&self, table: &Table, bucket: &str, key: &str) -> Result<(), UploadError> {
        let body = table
            .to_gzip_csv()
            .map_err(|e| UploadError::Transport(format!("encode table: {e}")))?;
        self.put_bytes(bucket, key, body).await
    }

    async fn get_table(
        &self,
        bucket: &str,
        key: &str,
        index_column: usize,
        header_row: usize,
    ) -> Result<Table, DownloadError> {
        let bytes = self.get_bytes(bucket, key).await?;
        Table::from_gzip_csv(&bytes, index_column, header_row)
            .map_err(|e| DownloadError::Malformed(e.to_string()))
    }

    async fn list_object_keys(&self, bucket: &str) -> Result<Vec<String>, ListError> {
        let mut keys = self.list_keys(bucket).await?;
        keys.retain(|key| !Self::is_folder_key(key));
        Ok(keys)
    }

    async fn list_folder_keys(&self, bucket: &str) -> Result<Vec<String>, ListError> {
        let mut keys = self.list_keys(bucket).await?;
        keys.retain(|key| Self::is_folder_key(key));
        Ok(keys)
    }

    async fn create_folder(&self, bucket: &str, name: &str) -> Result<(), UploadError> {
        self.put_bytes(bucket, &folder_marker(name), Vec::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_keys_contain_a_separator() {
        assert!(!S3Client::is_folder_key("a.txt"));
        assert!(S3Client::is_folder_key("2021/b.txt"));
        assert!(S3Client::is_folder_key("folder/"));
    }

    #[test]
    fn folder_marker_appends_exactly_one_separator() {
        assert_eq!(folder_marker("new"), "new/");
        assert_eq!(folder_marker("new/"), "new/");
        assert!(S3Client::is_folder_key(&folder_marker("new")));
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let value = serde_json::json!({
            "Hello": "World",
            "count": 3,
            "nested": { "pi": 3.14, "flags": [true, false, null] },
        });
        let bytes = encode_json(&value).unwrap();
        assert_eq!(decode_json(&bytes).unwrap(), value);
    }

    #[test]
    fn json_encoding_is_compact_utf8() {
        let value = serde_json::json!({ "Hello": "World" });
        let bytes = encode_json(&value).unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"{"Hello":"World"}"#);
    }

    #[test]
    fn non_json_body_decodes_as_malformed() {
        let err = decode_json(b"not json at all").unwrap_err();
        assert!(matches!(err, DownloadError::Malformed(_)));
    }
}
