// src/main.rs

//! # ethr-vc - Main Entry Point
//!
//! Wires the issuer, verifier and registry client together and starts the API server.
//!
//! ## Configuration
//! Read from `ethr-vc.toml` and `ETHR_VC_*` environment variables (a `.env`
//! file is loaded first). The ones that matter in practice:
//! - `ETHR_VC_RPC_URL`: JSON-RPC node hosting the registry (default: http://127.0.0.1:8545)
//! - `ETHR_VC_REGISTRY_ADDRESS`: deployed CredentialRegistry contract
//! - `ETHR_VC_ISSUER_PRIVATE_KEY`: (Optional) issuing key; without it the service only verifies
//! - `ETHR_VC_REGISTRY_TIMEOUT_MS`: (Optional) deadline on registry calls

use anyhow::{anyhow, Context};
use dotenv::dotenv;
use ethr_vc::blockchain::eth_client::EthClient;
use ethr_vc::contracts::credential_registry::ContractRegistry;
use ethr_vc::models::did::parse_address;
use ethr_vc::services::api_server::ApiServer;
use ethr_vc::services::credential_issuer::CredentialIssuer;
use ethr_vc::services::verifier::Verifier;
use ethr_vc::settings::Settings;
use ethr_vc::storage::credential_store::InMemoryCredentialStore;
use ethr_vc::wallet::key_management::IssuerIdentity;
use std::net::SocketAddr;
use std::sync::Arc;

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load configuration and start logging
/// 2. Connect the registry contract
/// 3. Initialize service components
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let settings = Settings::load().context("failed to load configuration")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();

    let eth_client = EthClient::new(&settings.rpc_url)
        .with_context(|| format!("invalid RPC url {}", settings.rpc_url))?;
    let registry_address = parse_address(&settings.registry_address)
        .context("invalid registry_address")?;
    let registry = Arc::new(ContractRegistry::new(eth_client.clone(), registry_address));
    log::info!(
        "using CredentialRegistry at {:?} via {}",
        registry_address,
        settings.rpc_url
    );

    let mut verifier = Verifier::new(registry);
    if let Some(timeout) = settings.registry_timeout() {
        verifier = verifier.with_registry_timeout(timeout);
    }

    let identity = match &settings.issuer_private_key {
        Some(key) => {
            let identity = IssuerIdentity::from_private_key_hex(settings.issuer_name.clone(), key)
                .context("invalid issuer_private_key")?;
            log::info!("issuing as {}", identity.did());
            Some(identity)
        }
        None => {
            log::warn!("no issuer key configured; running in verify-only mode");
            None
        }
    };

    let validity = settings
        .validity()
        .ok_or_else(|| anyhow!("validity_days {} is out of range", settings.validity_days))?;

    let api_server = ApiServer::new(
        CredentialIssuer::new(),
        verifier,
        identity,
        Arc::new(InMemoryCredentialStore::new()),
        Some(eth_client),
        validity,
    );

    let addr: SocketAddr = settings
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind_address {}", settings.bind_address))?;
    api_server.run(addr).await?;
    Ok(())
}
