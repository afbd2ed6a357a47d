// Copyright (c) 2025 Jak Bracegirdle
//
// This file is part of the speedtest_ingest crate.
//
// Licensed under the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use std::env;

use crate::error::ConfigError;

/// Where records are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    /// Log records instead of storing them (`PRINT_SINK=true`).
    Print,
    S3 {
        bucket: String,
        endpoint: Option<String>,
    },
}

/// Process configuration, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub allowed_origins: Vec<String>,
    pub sink: SinkConfig,
    pub bind_address: String,
    pub bind_port: u16,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to honour a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use speedtest_ingest::config::{Config, SinkConfig};
    ///
    /// let config = Config::from_lookup(|key| match key {
    ///     "ALLOWED_ORIGINS" => Some("https://speed.example,https://www.speed.example".into()),
    ///     "OUTPUT_BUCKET" => Some("speedtest-results".into()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.allowed_origins.len(), 2);
    /// assert_eq!(config.bind_port, 8080);
    /// assert!(matches!(config.sink, SinkConfig::S3 { .. }));
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .ok_or(ConfigError::Missing("ALLOWED_ORIGINS"))?
            .split(',')
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        let print_sink = match lookup("PRINT_SINK") {
            None => false,
            Some(value) => parse_bool("PRINT_SINK", &value)?,
        };

        let sink = if print_sink {
            SinkConfig::Print
        } else {
            SinkConfig::S3 {
                bucket: lookup("OUTPUT_BUCKET")
                    .filter(|bucket| !bucket.is_empty())
                    .ok_or(ConfigError::Missing("OUTPUT_BUCKET"))?,
                endpoint: lookup("S3_ENDPOINT").filter(|endpoint| !endpoint.is_empty()),
            }
        };

        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port: u16 = match lookup("BIND_PORT") {
            None => 8080,
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_PORT",
                value,
            })?,
        };

        Ok(Self {
            allowed_origins,
            sink,
            bind_address,
            bind_port,
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_owned(),
        }),
    }
}
