// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header;

use crate::error::IngestError;
use crate::models::{ErrorBody, PayloadTooLargeBody, PreflightBody};

pub const ALLOW_HEADERS: &str = "Content-Type";
pub const ALLOW_METHODS: &str = "OPTIONS,POST";

pub const PREFLIGHT_MESSAGE: &str = "CORS preflight request successful";
pub const TOO_LARGE_MESSAGE: &str = "Payload too large";
pub const ERROR_MESSAGE: &str = "Error processing data";

/// Terminal state of a request.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Preflight,
    Stored,
    TooLarge {
        max_size: usize,
        received_size: usize,
    },
    Failed(String),
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Preflight => StatusCode::OK,
            Reply::Stored => StatusCode::NO_CONTENT,
            Reply::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Reply::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IngestError> for Reply {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::PayloadTooLarge {
                max_size,
                received_size,
            } => Reply::TooLarge {
                max_size,
                received_size,
            },
            other => Reply::Failed(other.to_string()),
        }
    }
}

/// Origin allow-list applied to every response.
///
/// Origins are compared as exact strings: no wildcards, no case folding.
#[derive(Clone, Debug, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    /// Renders `reply`, echoing `origin` only when it is on the allow-list.
    pub fn respond(&self, reply: Reply, origin: Option<&str>) -> HttpResponse {
        let mut builder = HttpResponse::build(reply.status());
        builder
            .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS))
            .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS));

        if let Some(origin) = origin.filter(|origin| self.allows(origin)) {
            builder.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin));
        }

        match reply {
            Reply::Preflight => builder.json(PreflightBody {
                message: PREFLIGHT_MESSAGE.to_owned(),
            }),
            Reply::Stored => builder.finish(),
            Reply::TooLarge {
                max_size,
                received_size,
            } => builder.json(PayloadTooLargeBody {
                message: TOO_LARGE_MESSAGE.to_owned(),
                max_size,
                received_size,
            }),
            Reply::Failed(error) => builder.json(ErrorBody {
                message: ERROR_MESSAGE.to_owned(),
                error,
            }),
        }
    }
}
