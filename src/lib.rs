// src/lib.rs

//! # ethr-vc
//!
//! Issuance and verification of Ethereum-anchored verifiable credentials.
//!
//! A credential is a compact `header.payload.signature` token signed with an
//! issuer's secp256k1 key (ES256K over keccak-256). Verification recovers the
//! signer from the signature, checks it against the `did:ethr:` issuer named in
//! the claims, then asks an on-chain registry whether that issuer is trusted.
//!
//! ## Layout
//! - **utils**: keccak-256, recoverable signatures, canonical JSON, base64url
//! - **models**: claims, DIDs and tokens
//! - **wallet**: issuer identities
//! - **services**: token codec, issuer, verifier and the HTTP API
//! - **contracts** / **blockchain**: registry clients and the JSON-RPC client
//! - **storage**: records of issued credentials

pub mod blockchain;
pub mod contracts;
pub mod error;
pub mod models;
pub mod services;
pub mod settings;
pub mod storage;
pub mod utils;
pub mod wallet;

pub use contracts::registry::{RegistryClient, RegistryEntry, StaticRegistry};
pub use error::{CredentialError, RegistryError, Result};
pub use models::credential::{ClaimsPayload, SubjectFacts};
pub use models::did::EthrDid;
pub use models::token::SignedToken;
pub use services::credential_issuer::CredentialIssuer;
pub use services::verifier::{verify, VerificationResult, Verifier};
pub use wallet::key_management::IssuerIdentity;
