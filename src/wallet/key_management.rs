// src/wallet/key_management.rs
//! Issuer key material.
//!
//! An [`IssuerIdentity`] pairs a published account address and display name
//! with the secp256k1 private key that signs credentials for it.
//!
//! Uses the following cryptographic primitives:
//! - secp256k1 curve (via `k256` crate)
//! - Keccak-256 hashing (via `ethers` crate)

use crate::error::{CredentialError, Result};
use crate::models::did::EthrDid;
use crate::utils::crypto::{self, RecoverableSignature};
use ethers::types::Address;
use ethers::utils::hex;
use std::fmt;

/// An issuer's address, display name and signing key.
///
/// # Security Notes
/// - The signing key is never serialized and is redacted from `Debug`
/// - Only the derived address is meant to be published
/// - The address is trusted as supplied; it must match the registry record
#[derive(Clone)]
pub struct IssuerIdentity {
    address: Address,
    display_name: String,
    signing_key: [u8; 32],
}

impl IssuerIdentity {
    /// Creates an identity from an explicit address/key mapping.
    ///
    /// The key is not validated here; signing reports `InvalidKey`.
    pub fn new(address: Address, display_name: impl Into<String>, signing_key: [u8; 32]) -> Self {
        Self {
            address,
            display_name: display_name.into(),
            signing_key,
        }
    }

    /// Creates an identity whose address is derived from the key.
    ///
    /// # Errors
    /// `InvalidKey` if the key is not a valid secp256k1 scalar.
    pub fn from_private_key(display_name: impl Into<String>, signing_key: [u8; 32]) -> Result<Self> {
        let address = crypto::address_from_private_key(&signing_key)?;
        Ok(Self::new(address, display_name, signing_key))
    }

    /// Like [`IssuerIdentity::from_private_key`], from a hex string with or without `0x`.
    pub fn from_private_key_hex(display_name: impl Into<String>, key_hex: &str) -> Result<Self> {
        let digits = key_hex.trim().trim_start_matches("0x");
        let bytes = hex::decode(digits)
            .map_err(|_| CredentialError::InvalidKey("private key is not valid hex".into()))?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CredentialError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_private_key(display_name, key)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The issuer DID embedded in credentials.
    pub fn did(&self) -> EthrDid {
        EthrDid::new(self.address)
    }

    /// Signs a message with Keccak-256 prehashing.
    ///
    /// # Returns
    /// 65-byte recoverable signature (`r || s || v`)
    pub fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature> {
        crypto::sign(message, &self.signing_key)
    }
}

impl fmt::Debug for IssuerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerIdentity")
            .field("address", &self.address)
            .field("display_name", &self.display_name)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::{hash_data, recover};

    const KEY_HEX: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn derives_address_from_hex_key() {
        let identity = IssuerIdentity::from_private_key_hex("State University", KEY_HEX).unwrap();
        assert_eq!(
            identity.did().to_string(),
            "did:ethr:0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
        assert_eq!(identity.display_name(), "State University");
    }

    #[test]
    fn debug_output_redacts_key() {
        let identity = IssuerIdentity::from_private_key_hex("State University", KEY_HEX).unwrap();
        let rendered = format!("{:?}", identity);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("4c0883a6"));
    }

    #[test]
    fn signatures_recover_to_identity_address() {
        let identity = IssuerIdentity::from_private_key("Issuer", [5u8; 32]).unwrap();
        let signature = identity.sign_message(b"hello").unwrap();
        assert_eq!(recover(&hash_data(b"hello"), &signature).unwrap(), identity.address());
    }

    #[test]
    fn invalid_keys_surface_at_signing() {
        let identity = IssuerIdentity::new(Address::zero(), "Broken", [0u8; 32]);
        assert!(matches!(identity.sign_message(b"x"), Err(CredentialError::InvalidKey(_))));
        assert!(matches!(
            IssuerIdentity::from_private_key_hex("Short", "0xabcd"),
            Err(CredentialError::InvalidKey(_))
        ));
    }
}
