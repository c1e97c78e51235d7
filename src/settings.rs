// src/settings.rs
//! Service configuration.
//!
//! Layered, lowest precedence first:
//! 1. Built-in defaults (local Ganache node, ten-year validity)
//! 2. Optional `ethr-vc.toml` in the working directory
//! 3. `ETHR_VC_*` environment variables (a `.env` file is loaded by the binary)

use crate::services::credential_issuer::DEFAULT_VALIDITY_DAYS;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Base name of the optional configuration file.
pub const CONFIG_FILE: &str = "ethr-vc";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ETHR_VC";

/// Configuration for the credential service.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// JSON-RPC endpoint of the node hosting the registry contract.
    pub rpc_url: String,

    /// Address of the deployed CredentialRegistry contract.
    pub registry_address: String,

    /// Socket address the HTTP API binds to.
    pub bind_address: String,

    /// Hex private key of the issuing account. Without it the service only verifies.
    pub issuer_private_key: Option<String>,

    /// Display name embedded in issued credentials.
    pub issuer_name: String,

    /// Validity of issued credentials, in days.
    pub validity_days: i64,

    /// Optional deadline on registry calls during verification.
    pub registry_timeout_ms: Option<u64>,

    /// Log filter (e.g. "info", "ethr_vc=debug"); `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Settings {
    /// Loads settings from defaults, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("rpc_url", "http://127.0.0.1:8545")?
            .set_default("registry_address", "0x0000000000000000000000000000000000000000")?
            .set_default("bind_address", "127.0.0.1:3000")?
            .set_default("issuer_name", "Credential Issuer")?
            .set_default("validity_days", DEFAULT_VALIDITY_DAYS)?
            .set_default("log_level", "info")
    }

    /// Configured validity; `None` when `validity_days` overflows the calendar.
    pub fn validity(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_days(self.validity_days)
    }

    pub fn registry_timeout(&self) -> Option<Duration> {
        self.registry_timeout_ms.map(Duration::from_millis)
    }
}
