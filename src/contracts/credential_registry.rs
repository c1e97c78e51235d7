// src/contracts/credential_registry.rs
//! Credential Registry smart contract interface.
//!
//! Reads the on-chain CredentialRegistry contract that records which issuer
//! addresses are trusted. Registration is done by the contract owner outside
//! this crate; only the two view functions are used here.

use crate::blockchain::eth_client::EthClient;
use crate::contracts::registry::RegistryClient;
use crate::error::RegistryError;
use async_trait::async_trait;
use ethers::types::Address;

/// ABI of the deployed CredentialRegistry contract.
pub const CREDENTIAL_REGISTRY_ABI: &[u8] = include_bytes!("abi/CredentialRegistry.json");

/// Credential Registry smart contract wrapper.
#[derive(Clone, Debug)]
pub struct ContractRegistry {
    /// Client for the node hosting the contract
    client: EthClient,
    /// Address of the deployed CredentialRegistry contract
    contract_address: Address,
}

impl ContractRegistry {
    /// Creates a new ContractRegistry instance.
    ///
    /// # Arguments
    /// * `client` - Connected chain client
    /// * `contract_address` - Address of deployed CredentialRegistry contract
    pub fn new(client: EthClient, contract_address: Address) -> Self {
        Self {
            client,
            contract_address,
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }
}

#[async_trait]
impl RegistryClient for ContractRegistry {
    /// Calls `isIssuerRegistered(address) -> bool`.
    async fn is_registered(&self, address: Address) -> Result<bool, RegistryError> {
        self.client
            .query_contract(
                self.contract_address,
                CREDENTIAL_REGISTRY_ABI,
                "isIssuerRegistered",
                address,
            )
            .await
    }

    /// Calls `getIssuerName(address) -> string`.
    async fn issuer_name(&self, address: Address) -> Result<String, RegistryError> {
        self.client
            .query_contract(
                self.contract_address,
                CREDENTIAL_REGISTRY_ABI,
                "getIssuerName",
                address,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::mock;

    fn registry_at(path: &str) -> ContractRegistry {
        let client = EthClient::new(&format!("{}{}", mockito::server_url(), path)).unwrap();
        ContractRegistry::new(client, Address::repeat_byte(0x42))
    }

    #[test]
    fn bundled_abi_declares_view_functions() {
        let abi = ethers_core::abi::Abi::load(CREDENTIAL_REGISTRY_ABI).unwrap();
        assert!(abi.function("isIssuerRegistered").is_ok());
        assert!(abi.function("getIssuerName").is_ok());
    }

    #[tokio::test]
    async fn decodes_true_from_eth_call() {
        let _m = mock("POST", "/registry-true")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":"0x0000000000000000000000000000000000000000000000000000000000000001"}"#,
            )
            .create();

        let registry = registry_at("/registry-true");
        assert!(registry.is_registered(Address::repeat_byte(0xab)).await.unwrap());
    }

    #[tokio::test]
    async fn server_error_is_not_a_negative_answer() {
        let _m = mock("POST", "/registry-500").with_status(500).with_body("boom").create();

        let registry = registry_at("/registry-500");
        let result = registry.is_registered(Address::repeat_byte(0xab)).await;
        assert!(matches!(result, Err(RegistryError::Transport(_))));
    }

    #[tokio::test]
    async fn json_rpc_error_is_a_transport_error() {
        let _m = mock("POST", "/registry-rpc-error")
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
            .create();

        let registry = registry_at("/registry-rpc-error");
        let result = registry.issuer_name(Address::repeat_byte(0xab)).await;
        assert!(matches!(result, Err(RegistryError::Transport(_))));
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        let client = EthClient::new("http://127.0.0.1:1").unwrap();
        let registry = ContractRegistry::new(client, Address::repeat_byte(0x42));
        let result = registry.is_registered(Address::repeat_byte(0xab)).await;
        assert!(matches!(result, Err(RegistryError::Transport(_))));
    }
}
