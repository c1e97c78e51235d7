// src/blockchain/eth_client.rs
//! Ethereum JSON-RPC client.
//!
//! Provides a read-only interface to an Ethereum-compatible node (Ganache,
//! Hardhat, a public endpoint): contract queries and basic chain information.
//! Nothing here signs or sends transactions.

use crate::error::RegistryError;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::Address;
use ethers_contract::{BaseContract, Contract};
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of the connected chain.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub latest_block_number: u64,
    pub total_accounts: usize,
    /// First node-managed account, if the node exposes any.
    pub first_account: Option<Address>,
}

/// Thin wrapper over an HTTP provider.
///
/// Cloning shares the underlying provider.
#[derive(Clone, Debug)]
pub struct EthClient {
    provider: Arc<Provider<Http>>,
}

impl EthClient {
    /// Creates a client for `rpc_url`.
    ///
    /// No request is made until the first call, so an unreachable node only
    /// shows up as errors on use.
    ///
    /// # Errors
    /// `Transport` if the URL cannot be parsed.
    pub fn new(rpc_url: &str) -> Result<Self, RegistryError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| RegistryError::Transport(format!("invalid RPC url `{}`: {}", rpc_url, e)))?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    /// Queries a smart contract (read-only `eth_call`).
    ///
    /// # Arguments
    /// * `contract_address` - Address of the target contract
    /// * `abi` - Contract ABI JSON bytes
    /// * `method` - Method name to call
    /// * `params` - Method parameters
    ///
    /// # Errors
    /// - `Contract` if the ABI cannot be loaded or has no such method
    /// - `Transport` if the call or the decoding of its result fails
    pub async fn query_contract<R: Detokenize>(
        &self,
        contract_address: Address,
        abi: &[u8],
        method: &str,
        params: impl Tokenize,
    ) -> Result<R, RegistryError> {
        let abi = Abi::load(abi).map_err(|e| RegistryError::Contract(format!("ABI: {}", e)))?;
        let base_contract = BaseContract::from(abi);
        let contract = Contract::new(contract_address, base_contract, self.provider.clone());

        contract
            .method::<_, R>(method, params)
            .map_err(|e| RegistryError::Contract(format!("{}: {}", method, e)))?
            .call()
            .await
            .map_err(|e| RegistryError::Transport(format!("{}: {}", method, e)))
    }

    /// Fetches chain id, head block number and node-managed accounts.
    pub async fn chain_info(&self) -> Result<ChainInfo, RegistryError> {
        let chain_id = self.provider.get_chainid().await.map_err(transport)?;
        let latest_block = self.provider.get_block_number().await.map_err(transport)?;
        let accounts = self.provider.get_accounts().await.map_err(transport)?;

        Ok(ChainInfo {
            chain_id: chain_id.as_u64(),
            latest_block_number: latest_block.as_u64(),
            total_accounts: accounts.len(),
            first_account: accounts.first().copied(),
        })
    }
}

fn transport(err: impl std::fmt::Display) -> RegistryError {
    RegistryError::Transport(err.to_string())
}
