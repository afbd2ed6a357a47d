//! # speedtest-ingest
//!
//! An HTTP endpoint that accepts browser speedtest reports and persists them
//! to object storage for later batch analysis.

// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use speedtest_ingest::config::{Config, SinkConfig};
use speedtest_ingest::{AppState, CorsPolicy, PrintSink, S3Sink, StorageSink, configure};

/// Main entrypoint loads configuration, builds the storage sink and starts the Actix-web server.
///
/// Binds to `BIND_ADDRESS` and `BIND_PORT` environment variables or defaults.
/// Log verbosity follows `RUST_LOG` (default `info`).
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let sink: Arc<dyn StorageSink> = match &config.sink {
        SinkConfig::Print => Arc::new(PrintSink),
        SinkConfig::S3 { bucket, endpoint } => {
            Arc::new(S3Sink::new(bucket.clone(), endpoint.clone()).await)
        }
    };

    let state = web::Data::new(AppState::new(
        CorsPolicy::new(config.allowed_origins.clone()),
        sink,
    ));

    info!(
        address = %config.bind_address,
        port = config.bind_port,
        allowed_origins = ?config.allowed_origins,
        "starting server"
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind((config.bind_address.as_str(), config.bind_port))?
        .run()
        .await
}
