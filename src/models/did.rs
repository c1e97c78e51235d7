// src/models/did.rs
//! `did:ethr` decentralized identifiers.
//!
//! An ethr DID is an Ethereum account address behind the `did:ethr:` method
//! prefix. Issuers are named by their DID inside credential claims; verifiers
//! turn it back into an address to compare against the recovered signer.

use crate::error::CredentialError;
use ethers::types::Address;
use ethers::utils::{hex, to_checksum};
use std::fmt;
use std::str::FromStr;

/// Method prefix of every ethr DID.
pub const ETHR_DID_PREFIX: &str = "did:ethr:";

/// A `did:ethr:<address>` identifier.
///
/// Rendering always uses the lowercase `0x`-prefixed address. Parsing accepts
/// any letter case, with or without `0x`, so that checksummed DIDs written by
/// other tooling resolve to the same address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EthrDid {
    address: Address,
}

impl EthrDid {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// EIP-55 checksummed form of the address, the canonical display form.
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.address, None)
    }
}

impl fmt::Display for EthrDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}0x{:x}", ETHR_DID_PREFIX, self.address)
    }
}

impl FromStr for EthrDid {
    type Err = CredentialError;

    fn from_str(did: &str) -> Result<Self, Self::Err> {
        let rest = did.strip_prefix(ETHR_DID_PREFIX).ok_or_else(|| {
            CredentialError::MissingIssuer(format!("`{}` is not a did:ethr identifier", did))
        })?;
        Ok(Self::new(parse_address(rest)?))
    }
}

/// Parses a hex account address, with or without `0x`, in any letter case.
///
/// # Errors
/// `MissingIssuer` if the input is not exactly 20 hex-encoded bytes.
pub fn parse_address(input: &str) -> Result<Address, CredentialError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.len() != 40 {
        return Err(CredentialError::MissingIssuer(format!(
            "address `{}` must have 40 hex digits",
            input
        )));
    }
    let bytes = hex::decode(digits)
        .map_err(|_| CredentialError::MissingIssuer(format!("address `{}` is not hex", input)))?;
    Ok(Address::from_slice(&bytes))
}
