// src/utils/crypto.rs
//! Cryptographic primitives optimized for blockchain compatibility.
//!
//! Uses Keccak-256 (Ethereum's standard hash function) for all digests and
//! recoverable ECDSA over secp256k1 for signatures, so that any Ethereum
//! tooling can recover the signer's account address from a credential.
//!
//! # Recovery id convention
//! Signatures are serialized as 65 bytes `r (32) || s (32) || v (1)` where `v`
//! is the raw y-parity of the nonce point: `0` or `1`. Recovery additionally
//! accepts the Ethereum-biased `27`/`28` and un-biases it before use.

use crate::error::{CredentialError, Result};
use ethers::types::Address;
use ethers::utils::keccak256;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

/// Length of a serialized recoverable signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id by legacy Ethereum signers.
const LEGACY_V_OFFSET: u8 = 27;

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// ECDSA signature carrying the id needed to recover the signer's public key.
///
/// Construction through [`RecoverableSignature::from_bytes`] guarantees that
/// `r` and `s` are in range, `s` is low, and the recovery id is 0 or 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// Parses `r || s || v`.
    ///
    /// # Errors
    /// `MalformedSignature` if the input is not 65 bytes, `r` or `s` is zero or
    /// not below the curve order, `s` is in the upper half of the order, or `v`
    /// is not 0, 1, 27 or 28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CredentialError::MalformedSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            )));
        }

        let signature = Signature::from_slice(&bytes[..64])
            .map_err(|_| CredentialError::MalformedSignature("r or s out of range".into()))?;
        if signature.normalize_s().is_some() {
            return Err(CredentialError::MalformedSignature("s is not low-order".into()));
        }

        let v = match bytes[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - LEGACY_V_OFFSET,
            other => {
                return Err(CredentialError::MalformedSignature(format!(
                    "recovery id {} out of range",
                    other
                )))
            }
        };

        Ok(Self {
            signature,
            recovery_id: RecoveryId::new(v == 1, false),
        })
    }

    /// Serializes as `r || s || v` with `v` in `{0, 1}`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&self.signature.to_bytes());
        out[64] = self.recovery_id.to_byte();
        out
    }

    /// The recovery id as written on the wire.
    pub fn v(&self) -> u8 {
        self.recovery_id.to_byte()
    }
}

/// Parses a raw 32-byte secret into a signing key.
///
/// # Errors
/// `InvalidKey` if the input is not 32 bytes or is not a scalar in `[1, n)`.
pub fn signing_key_from_bytes(key: &[u8]) -> Result<SigningKey> {
    if key.len() != 32 {
        return Err(CredentialError::InvalidKey(format!(
            "expected 32 bytes, got {}",
            key.len()
        )));
    }
    SigningKey::from_slice(key)
        .map_err(|_| CredentialError::InvalidKey("not a valid secp256k1 scalar".into()))
}

/// Signs a message using recoverable ECDSA (secp256k1) with Keccak-256 prehashing.
///
/// # Arguments
/// * `message` - Exact bytes to sign; for credentials this is the ASCII
///   `header.payload` signing input
/// * `key` - Raw 32-byte private key
///
/// # Process Flow
/// 1. Hashes message with Keccak-256
/// 2. Signs the hash with an RFC 6979 deterministic nonce
/// 3. Normalizes `s` to the lower half of the curve order
///
/// # Errors
/// `InvalidKey` for a malformed key.
pub fn sign(message: &[u8], key: &[u8]) -> Result<RecoverableSignature> {
    let signing_key = signing_key_from_bytes(key)?;
    sign_digest(&hash_data(message), &signing_key)
}

/// Signs an already computed 32-byte digest.
pub fn sign_digest(digest: &[u8; 32], signing_key: &SigningKey) -> Result<RecoverableSignature> {
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;

    // Negating s mirrors R across the x-axis, flipping its y-parity.
    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (low, RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced())),
        None => (signature, recovery_id),
    };

    if recovery_id.is_x_reduced() {
        return Err(CredentialError::MalformedSignature(
            "nonce point x-coordinate exceeds the curve order".into(),
        ));
    }

    Ok(RecoverableSignature { signature, recovery_id })
}

/// Recovers the signer's address from a digest and recoverable signature.
///
/// # Errors
/// `RecoveryFailure` if no valid public key can be reconstructed.
pub fn recover(digest: &[u8; 32], signature: &RecoverableSignature) -> Result<Address> {
    let verifying_key =
        VerifyingKey::recover_from_prehash(digest, &signature.signature, signature.recovery_id)
            .map_err(|e| CredentialError::RecoveryFailure(e.to_string()))?;
    Ok(public_key_to_address(&verifying_key))
}

/// Derives the Ethereum address of a public key: the low 20 bytes of the
/// Keccak-256 hash of the uncompressed point without its `0x04` tag.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = hash_data(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Derives the address controlled by a raw private key.
pub fn address_from_private_key(key: &[u8]) -> Result<Address> {
    let signing_key = signing_key_from_bytes(key)?;
    Ok(public_key_to_address(signing_key.verifying_key()))
}
