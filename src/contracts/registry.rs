// src/contracts/registry.rs
//! Trusted-issuer registry interface.
//!
//! The registry is the authority on which addresses may issue credentials.
//! Verification reads it exactly once per token; everything else about it
//! (deployment, registration transactions, enumeration) lives outside this crate.

use crate::error::RegistryError;
use async_trait::async_trait;
use ethers::types::Address;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry record for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub address: Address,
    pub display_name: String,
    pub registered: bool,
}

/// Read-only view of the trusted-issuer registry.
///
/// Implementations must report connectivity problems as `Err`, never as
/// `Ok(false)`: callers rely on the difference between "unreachable" and
/// "not trusted".
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Whether `address` is a registered issuer.
    async fn is_registered(&self, address: Address) -> Result<bool, RegistryError>;

    /// Display name recorded for `address`; empty when none is recorded.
    async fn issuer_name(&self, address: Address) -> Result<String, RegistryError>;

    /// Both facts about `address` in one record.
    async fn entry(&self, address: Address) -> Result<RegistryEntry, RegistryError> {
        let registered = self.is_registered(address).await?;
        let display_name = self.issuer_name(address).await?;
        Ok(RegistryEntry {
            address,
            display_name,
            registered,
        })
    }
}

/// In-memory registry for tests and offline deployments.
#[derive(Default)]
pub struct StaticRegistry {
    entries: RwLock<HashMap<Address, RegistryEntry>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `address` as a trusted issuer named `display_name`.
    pub fn register(&self, address: Address, display_name: impl Into<String>) {
        let entry = RegistryEntry {
            address,
            display_name: display_name.into(),
            registered: true,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address, entry);
    }

    /// Withdraws trust from `address`, keeping its name on record.
    /// Returns false if the address was never registered.
    pub fn revoke(&self, address: Address) -> bool {
        match self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&address)
        {
            Some(entry) => {
                entry.registered = false;
                true
            }
            None => false,
        }
    }

    fn lookup(&self, address: &Address) -> Result<Option<RegistryEntry>, RegistryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RegistryError::Transport("registry lock poisoned".into()))?;
        Ok(entries.get(address).cloned())
    }
}

#[async_trait]
impl RegistryClient for StaticRegistry {
    async fn is_registered(&self, address: Address) -> Result<bool, RegistryError> {
        Ok(self.lookup(&address)?.map(|e| e.registered).unwrap_or(false))
    }

    async fn issuer_name(&self, address: Address) -> Result<String, RegistryError> {
        Ok(self.lookup(&address)?.map(|e| e.display_name).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_addresses_are_not_registered() {
        let registry = StaticRegistry::new();
        let address = Address::repeat_byte(0x11);

        assert!(!registry.is_registered(address).await.unwrap());
        assert_eq!(registry.issuer_name(address).await.unwrap(), "");
    }

    #[tokio::test]
    async fn register_then_revoke() {
        let registry = StaticRegistry::new();
        let address = Address::repeat_byte(0xab);
        registry.register(address, "State University");

        let entry = registry.entry(address).await.unwrap();
        assert!(entry.registered);
        assert_eq!(entry.display_name, "State University");

        assert!(registry.revoke(address));
        assert!(!registry.is_registered(address).await.unwrap());
        assert_eq!(registry.issuer_name(address).await.unwrap(), "State University");
        assert!(!registry.revoke(Address::repeat_byte(0xcd)));
    }
}
