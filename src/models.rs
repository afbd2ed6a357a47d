// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use actix_web::http::Method;
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transport metadata captured by the front door when the request arrived.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    /// Human readable arrival time, e.g. `16/Oct/2026:09:30:00 +0000`.
    pub time: Option<String>,
    /// Arrival time in milliseconds since the Unix epoch.
    pub time_epoch: Option<i64>,
}

/// One submission as handed to the pipeline.
///
/// `received_len` is the full byte length of the payload. It equals
/// `body.len()` unless the front door stopped buffering an oversized payload.
#[derive(Clone, Debug)]
pub struct IncomingRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub received_len: usize,
    pub is_base64_encoded: bool,
    pub context: RequestContext,
}

impl IncomingRequest {
    pub fn new(method: Method, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            method,
            headers: HeaderMap::new(),
            received_len: body.len(),
            body,
            is_base64_encoded: false,
            context: RequestContext::default(),
        }
    }

    /// Adds a header value, keeping any values already present under `name`.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_base64_encoded(mut self, encoded: bool) -> Self {
        self.is_base64_encoded = encoded;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Case-insensitive header lookup for record fields. See [`joined_header`].
    pub fn header(&self, name: &str) -> Option<String> {
        joined_header(&self.headers, name)
    }

    /// The `Origin` header byte for byte, for allow-list matching.
    pub fn origin(&self) -> Option<&str> {
        self.headers.get("origin").and_then(|v| v.to_str().ok())
    }

    pub fn is_preflight(&self) -> bool {
        self.method == Method::OPTIONS
    }
}

/// Every value of header `name` joined with `", "`, decoded as lossy UTF-8.
///
/// `None` only when the header is absent.
pub fn joined_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<_> = headers
        .get_all(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// The persisted shape of a single speedtest submission.
///
/// Every field is always serialized, absent inputs appear as `""` or `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub download: String,
    pub upload: String,
    pub ping: String,
    pub jitter: String,
    pub user_agent: String,
    pub download_size: String,
    pub upload_size: String,
    pub content_length: Option<String>,
    pub origin: String,
    pub header_user_agent: String,
    pub x_forwarded_for: String,
    pub x_forwarded_port: String,
    pub source_ip: Option<String>,
    pub source_user_agent: Option<String>,
    pub time_of_test: Option<String>,
    pub epoch_of_test: Option<i64>,
    pub time_processed: DateTime<Utc>,
    pub orig_body: String,
    pub decoded_body: String,
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
}

/// Body of the 200 reply to a CORS preflight.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightBody {
    pub message: String,
}

/// Body of the 413 reply.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadTooLargeBody {
    pub message: String,
    pub max_size: usize,
    pub received_size: usize,
}

/// Body of the 500 reply.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: String,
}
