// src/error.rs
//! Error taxonomy for credential issuance and verification.
//!
//! Every failure names the stage that raised it so callers can tell a forged
//! credential apart from an unreachable trust registry.

use thiserror::Error;

/// Failures raised by a [`RegistryClient`](crate::contracts::registry::RegistryClient).
///
/// These never mean "not registered": a negative trust decision is an
/// `Ok(false)` from the registry, not an error.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The node could not be reached or answered with garbage.
    #[error("registry transport error: {0}")]
    Transport(String),

    /// The contract call itself failed (bad ABI, revert, decoding).
    #[error("registry contract error: {0}")]
    Contract(String),

    /// The caller-supplied deadline elapsed before the registry answered.
    #[error("registry call timed out after {0} ms")]
    Timeout(u64),
}

/// Errors produced by the signing primitives, the codec, the issuer and the verifier.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Signing key is not a valid non-zero secp256k1 scalar.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// Token structure, base64url or JSON shape is wrong.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Signature bytes are the wrong length or r, s or v is out of range.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Point recovery produced no valid public key.
    #[error("public key recovery failed: {0}")]
    RecoveryFailure(String),

    /// `iss` claim is absent or not a `did:ethr:` address.
    #[error("missing or invalid issuer: {0}")]
    MissingIssuer(String),

    /// A signing or recovery primitive failed during verification.
    #[error("cryptographic verification failed: {0}")]
    CryptographicFailure(#[source] Box<CredentialError>),

    /// The recovered signer is not the issuer the claims name.
    #[error("signature mismatch: recovered {recovered}, claimed {claimed}")]
    SignatureMismatch { recovered: String, claimed: String },

    /// The registry answered and the issuer is not trusted.
    #[error("issuer {0} is not registered or not trusted in the registry")]
    IssuerNotTrusted(String),

    /// Issuer-side fail-fast check: the signing identity is not registered.
    #[error("issuer {0} is not registered; refusing to sign")]
    IssuerNotRegistered(String),

    /// The registry could not give an answer.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(#[from] RegistryError),

    /// A subject attribute would overwrite a fixed subject field.
    #[error("claim `{0}` collides with a reserved field")]
    ReservedClaim(String),

    /// Validity period is not positive or overflows the calendar.
    #[error("invalid validity period: {0}")]
    InvalidValidity(String),

    /// Canonical JSON serialization failed.
    #[error("encoding failed: {0}")]
    Encoding(String),
}

impl CredentialError {
    /// Stable snake_case label of the variant, for logs and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialError::InvalidKey(_) => "invalid_key",
            CredentialError::MalformedToken(_) => "malformed_token",
            CredentialError::MalformedSignature(_) => "malformed_signature",
            CredentialError::RecoveryFailure(_) => "recovery_failure",
            CredentialError::MissingIssuer(_) => "missing_issuer",
            CredentialError::CryptographicFailure(_) => "cryptographic_failure",
            CredentialError::SignatureMismatch { .. } => "signature_mismatch",
            CredentialError::IssuerNotTrusted(_) => "issuer_not_trusted",
            CredentialError::IssuerNotRegistered(_) => "issuer_not_registered",
            CredentialError::RegistryUnavailable(_) => "registry_unavailable",
            CredentialError::ReservedClaim(_) => "reserved_claim",
            CredentialError::InvalidValidity(_) => "invalid_validity",
            CredentialError::Encoding(_) => "encoding",
        }
    }

    /// True when retrying later could succeed. Only registry outages qualify;
    /// every other variant is a property of the input.
    pub fn is_transient(&self) -> bool {
        matches!(self, CredentialError::RegistryUnavailable(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CredentialError>;
