//! # speedtest-ingest
//!
//! An HTTP endpoint that accepts browser speedtest reports and persists them
//! to object storage for later batch analysis.
//!
//! A submission is a form-encoded body (`d=...&u=...&p=...`) posted from the
//! speedtest page. Each request is admitted by size, decoded, turned into a
//! [`MeasurementRecord`] and written once under a timestamp-derived
//! [`StorageKey`]. Every response carries the CORS headers the page needs.

// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod record;
pub mod response;
pub mod storage;
pub mod time;

use std::sync::Arc;

use actix_web::http::Method;
use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tracing::error;

pub use error::{ConfigError, IngestError, StorageError};
pub use models::*;
pub use pipeline::MAX_PAYLOAD_SIZE;
pub use response::{CorsPolicy, Reply};
pub use storage::{PrintSink, S3Sink, StorageKey, StorageSink};
pub use time::{FixedClock, SystemClock, TimeSource};

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub cors: CorsPolicy,
    pub sink: Arc<dyn StorageSink>,
    pub clock: Arc<dyn TimeSource>,
}

impl AppState {
    pub fn new(cors: CorsPolicy, sink: Arc<dyn StorageSink>) -> Self {
        Self {
            cors,
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }
}

/// A request body as read off the wire.
///
/// Once `received_len` passes the collection limit the buffered bytes are
/// dropped and only the length keeps growing.
#[derive(Clone, Debug, Default)]
pub struct CollectedBody {
    pub bytes: Bytes,
    pub received_len: usize,
}

/// Drains `payload`, buffering at most `limit` bytes.
pub async fn collect_body<S, E>(payload: S, limit: usize) -> Result<CollectedBody, IngestError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut payload = std::pin::pin!(payload);
    let mut buffer = BytesMut::new();
    let mut received_len = 0usize;

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| IngestError::Payload(e.to_string()))?;
        received_len = received_len.saturating_add(chunk.len());
        if received_len <= limit {
            buffer.extend_from_slice(&chunk);
        } else if !buffer.is_empty() {
            buffer = BytesMut::new();
        }
    }

    Ok(CollectedBody {
        bytes: buffer.freeze(),
        received_len,
    })
}

impl IncomingRequest {
    /// Captures method, headers and transport context from an actix request.
    ///
    /// A `Content-Transfer-Encoding: base64` header marks the body as base64.
    pub fn from_http(
        req: &HttpRequest,
        body: CollectedBody,
        received_at: DateTime<Utc>,
    ) -> Self {
        let headers = req.headers();
        let is_base64_encoded = headers
            .get("content-transfer-encoding")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"));

        let context = RequestContext {
            source_ip: req.peer_addr().map(|addr| addr.ip().to_string()),
            user_agent: joined_header(headers, "user-agent"),
            time: Some(received_at.format("%d/%b/%Y:%H:%M:%S %z").to_string()),
            time_epoch: Some(received_at.timestamp_millis()),
        };

        Self {
            method: req.method().clone(),
            headers: headers.clone(),
            body: body.bytes,
            received_len: body.received_len,
            is_base64_encoded,
            context,
        }
    }
}

/// Accepts speedtest submissions on any method. `OPTIONS` answers the CORS
/// preflight without reading the body.
pub async fn submit(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> HttpResponse {
    let received_at = Utc::now();

    let body = if *req.method() == Method::OPTIONS {
        CollectedBody::default()
    } else {
        match collect_body(payload, MAX_PAYLOAD_SIZE).await {
            Ok(body) => body,
            Err(err) => {
                error!(
                    error = %err,
                    method = %req.method(),
                    headers = ?req.headers(),
                    "failed to read request body"
                );
                let origin = req.headers().get("origin").and_then(|v| v.to_str().ok());
                return state.cors.respond(Reply::from(err), origin);
            }
        }
    };

    let request = IncomingRequest::from_http(&req, body, received_at);
    pipeline::handle(&request, &state).await
}

/// HTTP GET endpoint `/healthz` for load balancer health checks.
#[get("/healthz")]
pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

/// Registers the service routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz).service(web::resource("/").to(submit));
}
