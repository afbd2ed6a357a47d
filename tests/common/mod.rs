// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

//! Test sinks and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use speedtest_ingest::*;

pub const ALLOWED_ORIGIN: &str = "https://speed.example.com";

/// 2025-08-07T12:34:56Z, so every key lands on `20250807/processed_data_20250807-123456.json`.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 7, 12, 34, 56).unwrap()
}

pub const FIXED_KEY: &str = "20250807/processed_data_20250807-123456.json";

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub key: StorageKey,
    pub payload: Bytes,
    pub content_type: String,
}

/// Keeps every write in memory.
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<StoredObject>>,
}

impl RecordingSink {
    pub fn writes(&self) -> Vec<StoredObject> {
        self.writes.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<MeasurementRecord> {
        self.writes()
            .iter()
            .map(|w| serde_json::from_slice(&w.payload).unwrap())
            .collect()
    }
}

#[async_trait]
impl StorageSink for RecordingSink {
    async fn put(
        &self,
        key: &StorageKey,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push(StoredObject {
            key: key.clone(),
            payload,
            content_type: content_type.to_owned(),
        });
        Ok(())
    }
}

/// Fails every write as if the bucket were unreachable.
pub struct FailingSink;

#[async_trait]
impl StorageSink for FailingSink {
    async fn put(
        &self,
        _key: &StorageKey,
        _payload: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("bucket unreachable".to_string()))
    }
}
