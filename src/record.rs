// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use url::form_urlencoded;

use crate::models::{IncomingRequest, MeasurementRecord};
use crate::pipeline::DecodedBody;

/// Form keys sent by the speedtest client.
pub mod keys {
    pub const DOWNLOAD: &str = "d";
    pub const UPLOAD: &str = "u";
    pub const PING: &str = "p";
    pub const JITTER: &str = "jit";
    pub const USER_AGENT: &str = "ua";
    pub const DOWNLOAD_SIZE: &str = "dd";
    pub const UPLOAD_SIZE: &str = "ud";
}

/// Fields of an `application/x-www-form-urlencoded` body.
///
/// Blank values are skipped, so a key maps to its first non-empty value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// Never fails: invalid percent escapes and bytes decode lossily.
    pub fn parse(body: &str) -> Self {
        let mut fields = HashMap::new();
        for (key, value) in form_urlencoded::parse(body.as_bytes()) {
            if !value.is_empty() {
                fields.entry(key.into_owned()).or_insert_with(|| value.into_owned());
            }
        }
        Self(fields)
    }

    /// The value for `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> String {
        self.0.get(key).cloned().unwrap_or_default()
    }
}

/// Builds the record persisted for one submission.
///
/// Total: missing form fields, headers and context values fall back to defaults.
pub fn build_record(
    request: &IncomingRequest,
    body: DecodedBody,
    processed_at: DateTime<Utc>,
) -> MeasurementRecord {
    let form = FormFields::parse(&body.decoded);
    let header = |name: &str| request.header(name).unwrap_or_default();
    let context = &request.context;

    MeasurementRecord {
        download: form.get(keys::DOWNLOAD),
        upload: form.get(keys::UPLOAD),
        ping: form.get(keys::PING),
        jitter: form.get(keys::JITTER),
        user_agent: form.get(keys::USER_AGENT),
        download_size: form.get(keys::DOWNLOAD_SIZE),
        upload_size: form.get(keys::UPLOAD_SIZE),
        content_length: request.header("content-length"),
        origin: header("origin"),
        header_user_agent: header("user-agent"),
        x_forwarded_for: header("x-forwarded-for"),
        x_forwarded_port: header("x-forwarded-port"),
        source_ip: context.source_ip.clone(),
        source_user_agent: context.user_agent.clone(),
        time_of_test: context.time.clone(),
        epoch_of_test: context.time_epoch,
        time_processed: processed_at,
        orig_body: body.original,
        decoded_body: body.decoded,
        is_base64_encoded: body.was_base64,
    }
}
