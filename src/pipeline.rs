// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

//! The per-request stages: admission, decoding, record building and persistence.
//!
//! Each stage returns `Result<_, IngestError>`. [`handle`] runs them in order and
//! turns the outcome into a single response.

use actix_web::HttpResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{error, info, warn};

use crate::error::IngestError;
use crate::models::IncomingRequest;
use crate::record::build_record;
use crate::response::Reply;
use crate::storage::{StorageKey, StorageSink, persist};
use crate::time::TimeSource;
use crate::AppState;

/// Largest accepted body, in bytes (10 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 10 * (1 << 20);

/// Rejects payloads larger than [`MAX_PAYLOAD_SIZE`].
///
/// # Examples
///
/// ```
/// use speedtest_ingest::pipeline::{admit, MAX_PAYLOAD_SIZE};
///
/// assert!(admit(MAX_PAYLOAD_SIZE).is_ok());
/// assert!(admit(MAX_PAYLOAD_SIZE + 1).is_err());
/// ```
pub fn admit(received_len: usize) -> Result<(), IngestError> {
    if received_len > MAX_PAYLOAD_SIZE {
        return Err(IngestError::PayloadTooLarge {
            max_size: MAX_PAYLOAD_SIZE,
            received_size: received_len,
        });
    }
    Ok(())
}

/// A body in both the form it arrived in and the form the record builder reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedBody {
    pub original: String,
    pub decoded: String,
    pub was_base64: bool,
}

/// Decodes the raw body according to the transport's encoding flag.
///
/// The flag is trusted as given; the content is never sniffed. Bytes outside
/// the base64 alphabet (line breaks, stray punctuation) are discarded before
/// decoding; padding must still be canonical.
///
/// # Examples
///
/// ```
/// use speedtest_ingest::pipeline::decode_body;
///
/// let body = decode_body(b"ZD01MA==", true).unwrap();
/// assert_eq!(body.decoded, "d=50");
/// assert_eq!(body.original, "ZD01MA==");
///
/// let body = decode_body(b"d=50", false).unwrap();
/// assert_eq!(body.decoded, body.original);
/// ```
pub fn decode_body(raw: &[u8], is_base64: bool) -> Result<DecodedBody, IngestError> {
    let original = std::str::from_utf8(raw)?.to_owned();

    let decoded = if is_base64 {
        let compact: Vec<u8> = raw
            .iter()
            .copied()
            .filter(|b| b.is_ascii_alphanumeric() || matches!(*b, b'+' | b'/' | b'='))
            .collect();
        let bytes = STANDARD.decode(compact)?;
        String::from_utf8(bytes).map_err(|e| IngestError::Utf8(e.utf8_error()))?
    } else {
        original.clone()
    };

    Ok(DecodedBody {
        original,
        decoded,
        was_base64: is_base64,
    })
}

/// Runs admission, decoding, record building and the storage write.
///
/// Returns the key the record was written under.
pub async fn process(
    request: &IncomingRequest,
    sink: &dyn StorageSink,
    clock: &dyn TimeSource,
) -> Result<StorageKey, IngestError> {
    admit(request.received_len)?;
    let body = decode_body(&request.body, request.is_base64_encoded)?;
    let record = build_record(request, body, clock.now());
    persist(sink, &record).await
}

/// Produces the response for one request, CORS headers included.
///
/// Preflight requests never reach [`process`].
pub async fn handle(request: &IncomingRequest, state: &AppState) -> HttpResponse {
    let reply = if request.is_preflight() {
        Reply::Preflight
    } else {
        match process(request, state.sink.as_ref(), state.clock.as_ref()).await {
            Ok(key) => {
                info!(key = %key, "stored measurement");
                Reply::Stored
            }
            Err(err @ IngestError::PayloadTooLarge { .. }) => {
                warn!(error = %err, "rejected oversized payload");
                Reply::from(err)
            }
            Err(err) => {
                error!(error = %err, request = ?request, "error processing measurement");
                Reply::from(err)
            }
        }
    };

    state.cors.respond(reply, request.origin())
}
