//! s3ferry: batch upload of completed recorder files to S3.
//!
//! One run scans a source directory, keeps files not modified since the
//! daily cutoff, derives a date-grouped object key from each filename, and
//! streams each file to the target bucket, optionally deleting the local
//! copy on success. The [`storage::ObjectStore`] abstraction also reads and
//! writes structured payloads (JSON documents, gzip-CSV tables) for other
//! tooling that shares the bucket.
//!
//! # Usage
//! ```no_run
//! use s3ferry::storage::{ObjectStore, S3Client};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = S3Client::new("AKIA...", "secret", "eu-west-1").await;
//! let value = serde_json::json!({ "hello": "world" });
//! client.put_json(&value, "gvt-test", "json-hello-world").await?;
//! let back = client.get_json("gvt-test", "json-hello-world").await?;
//! assert_eq!(back, value);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod discover;
pub mod keymap;
pub mod load_config;
pub mod storage;
pub mod synchronise;
pub mod table;
