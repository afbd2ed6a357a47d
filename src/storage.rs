// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::fmt;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{IngestError, StorageError};
use crate::models::MeasurementRecord;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Object key a record is written under: `{YYYYMMDD}/processed_data_{YYYYMMDD-HHMMSS}.json`.
///
/// Only second precision: two records processed in the same second share a
/// key and the later write replaces the earlier one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use speedtest_ingest::storage::StorageKey;
    ///
    /// let at = Utc.with_ymd_and_hms(2025, 8, 7, 12, 34, 56).unwrap();
    /// assert_eq!(
    ///     StorageKey::for_time(&at).as_str(),
    ///     "20250807/processed_data_20250807-123456.json"
    /// );
    /// ```
    pub fn for_time(at: &DateTime<Utc>) -> Self {
        let date_prefix = at.format("%Y%m%d");
        let timestamp = at.format("%Y%m%d-%H%M%S");
        Self(format!("{date_prefix}/processed_data_{timestamp}.json"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable destination for serialized records.
///
/// Allows swapping object storage for an in-memory sink in tests.
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Writes `payload` under `key` in a single attempt.
    async fn put(
        &self,
        key: &StorageKey,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

/// Writes objects to an S3 bucket.
#[derive(Clone)]
pub struct S3Sink {
    client: Client,
    bucket: String,
}

impl S3Sink {
    /// Uses the default AWS credential chain. A custom `endpoint` switches to
    /// path-style addressing for MinIO or localstack.
    pub async fn new(bucket: String, endpoint: Option<String>) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(bucket = %bucket, endpoint = ?endpoint, "S3 sink initialized");

        Self {
            client: Client::from_conf(builder.build()),
            bucket,
        }
    }
}

#[async_trait]
impl StorageSink for S3Sink {
    async fn put(
        &self,
        key: &StorageKey,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(payload))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::WriteFailed {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}

/// Logs objects instead of storing them. For local runs without a bucket.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintSink;

#[async_trait]
impl StorageSink for PrintSink {
    async fn put(
        &self,
        key: &StorageKey,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        info!(
            key = %key,
            content_type,
            payload = %String::from_utf8_lossy(&payload),
            "print sink write"
        );
        Ok(())
    }
}

/// Serializes `record` as JSON and writes it under the key derived from its
/// processing time.
pub async fn persist(
    sink: &dyn StorageSink,
    record: &MeasurementRecord,
) -> Result<StorageKey, IngestError> {
    let key = StorageKey::for_time(&record.time_processed);
    let payload = serde_json::to_vec(record)?;
    sink.put(&key, Bytes::from(payload), JSON_CONTENT_TYPE).await?;
    Ok(key)
}
