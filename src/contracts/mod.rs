// src/contracts/mod.rs
//! Trusted-issuer registry: the client trait, an in-memory registry and the
//! on-chain CredentialRegistry contract.

pub mod credential_registry;
pub mod registry;
