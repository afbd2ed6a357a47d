// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

//! Configuration loading. Uses `Config::from_lookup` so no test touches the
//! process environment.

use std::collections::HashMap;

use speedtest_ingest::ConfigError;
use speedtest_ingest::config::{Config, SinkConfig};

fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_apply_when_optional_settings_absent() {
    let config = load(&[
        ("ALLOWED_ORIGINS", "https://a.example"),
        ("OUTPUT_BUCKET", "results"),
    ])
    .unwrap();

    assert_eq!(config.allowed_origins, vec!["https://a.example".to_string()]);
    assert_eq!(config.bind_address, "127.0.0.1");
    assert_eq!(config.bind_port, 8080);
    assert_eq!(
        config.sink,
        SinkConfig::S3 {
            bucket: "results".into(),
            endpoint: None
        }
    );
}

#[test]
fn allowed_origins_split_on_commas_without_trimming() {
    let config = load(&[
        ("ALLOWED_ORIGINS", "https://a.example,, https://b.example,"),
        ("OUTPUT_BUCKET", "results"),
    ])
    .unwrap();

    assert_eq!(
        config.allowed_origins,
        vec!["https://a.example".to_string(), " https://b.example".to_string()]
    );
}

#[test]
fn allowed_origins_are_required() {
    assert_eq!(
        load(&[("OUTPUT_BUCKET", "results")]),
        Err(ConfigError::Missing("ALLOWED_ORIGINS"))
    );
}

#[test]
fn bucket_is_required_for_s3_sink() {
    assert_eq!(
        load(&[("ALLOWED_ORIGINS", "https://a.example")]),
        Err(ConfigError::Missing("OUTPUT_BUCKET"))
    );
}

#[test]
fn print_sink_needs_no_bucket() {
    let config = load(&[("ALLOWED_ORIGINS", "https://a.example"), ("PRINT_SINK", "true")]).unwrap();
    assert_eq!(config.sink, SinkConfig::Print);
}

#[test]
fn custom_endpoint_and_bind_settings() {
    let config = load(&[
        ("ALLOWED_ORIGINS", "https://a.example"),
        ("OUTPUT_BUCKET", "results"),
        ("S3_ENDPOINT", "http://localhost:9000"),
        ("BIND_ADDRESS", "0.0.0.0"),
        ("BIND_PORT", "9090"),
    ])
    .unwrap();

    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.bind_port, 9090);
    assert_eq!(
        config.sink,
        SinkConfig::S3 {
            bucket: "results".into(),
            endpoint: Some("http://localhost:9000".into())
        }
    );
}

#[test]
fn invalid_values_are_reported() {
    assert_eq!(
        load(&[
            ("ALLOWED_ORIGINS", "https://a.example"),
            ("OUTPUT_BUCKET", "results"),
            ("BIND_PORT", "eighty"),
        ]),
        Err(ConfigError::Invalid {
            key: "BIND_PORT",
            value: "eighty".into()
        })
    );
    assert_eq!(
        load(&[("ALLOWED_ORIGINS", "https://a.example"), ("PRINT_SINK", "maybe")]),
        Err(ConfigError::Invalid {
            key: "PRINT_SINK",
            value: "maybe".into()
        })
    );
}
