// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use thiserror::Error;

/// Outcome of a failed pipeline stage.
///
/// Every stage returns `Result<_, IngestError>`; the request handler maps the
/// variant to a status code in exactly one place (see [`crate::response::Reply`]).
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("payload of {received_size} bytes exceeds the {max_size} byte limit")]
    PayloadTooLarge {
        max_size: usize,
        received_size: usize,
    },
    #[error("failed to read request body: {0}")]
    Payload(String),
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure reported by a [`crate::storage::StorageSink`].
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write {key} to bucket {bucket}: {reason}")]
    WriteFailed {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("storage sink unavailable: {0}")]
    Unavailable(String),
}

/// Problems found while loading [`crate::config::Config`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
