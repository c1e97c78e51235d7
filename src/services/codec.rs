// src/services/codec.rs
//! Compact token codec.
//!
//! Wire format: `b64url(header) . b64url(claims) . b64url(r || s || v)`, all
//! segments unpadded, JSON segments in canonical form (sorted keys, no
//! whitespace). The signing input is the ASCII prefix up to the second dot.

use crate::error::{CredentialError, Result};
use crate::models::credential::ClaimsPayload;
use crate::models::token::TokenHeader;
use crate::utils::crypto::{RecoverableSignature, SIGNATURE_LENGTH};
use crate::utils::serialization::{b64url_decode, b64url_encode, to_canonical_json};

/// A parsed token. The signing input is kept verbatim so that verification
/// hashes exactly the bytes that were signed.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub claims: ClaimsPayload,
    /// `encoded_header.encoded_payload` as it appeared in the token.
    pub signing_input: String,
    /// The third segment, still base64url-encoded.
    pub raw_signature_segment: String,
    pub signature: RecoverableSignature,
}

/// Encodes the unsigned two-segment prefix.
///
/// # Returns
/// The prefix as bytes (what gets hashed and signed) and as a string (what
/// the signature segment gets appended to).
pub fn encode_prefix(header: &TokenHeader, claims: &ClaimsPayload) -> Result<(Vec<u8>, String)> {
    let header_segment = b64url_encode(to_canonical_json(header)?.as_bytes());
    let payload_segment = b64url_encode(to_canonical_json(claims)?.as_bytes());
    let prefix = format!("{}.{}", header_segment, payload_segment);
    Ok((prefix.as_bytes().to_vec(), prefix))
}

/// Encodes a signature as the third token segment.
pub fn encode_signature(signature: &RecoverableSignature) -> String {
    b64url_encode(&signature.to_bytes())
}

/// Parses a compact token.
///
/// # Errors
/// - `MalformedToken` if the token does not have exactly three segments, a
///   segment is not canonical base64url, the header is not the ES256K/JWT
///   header, or the payload does not match the claims shape
/// - `MalformedSignature` if the signature segment does not decode to a valid
///   65-byte recoverable signature
pub fn decode(token: &str) -> Result<DecodedToken> {
    let segments: Vec<&str> = token.split('.').collect();
    let &[header_segment, payload_segment, signature_segment] = segments.as_slice() else {
        return Err(CredentialError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let header_bytes = b64url_decode(header_segment)
        .map_err(|e| CredentialError::MalformedToken(format!("header: {}", e)))?;
    let header: TokenHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| CredentialError::MalformedToken(format!("header: {}", e)))?;
    if !header.is_supported() {
        return Err(CredentialError::MalformedToken(format!(
            "unsupported header alg={} typ={}",
            header.alg, header.typ
        )));
    }

    let payload_bytes = b64url_decode(payload_segment)
        .map_err(|e| CredentialError::MalformedToken(format!("payload: {}", e)))?;
    let claims: ClaimsPayload = serde_json::from_slice(&payload_bytes)
        .map_err(|e| CredentialError::MalformedToken(format!("payload: {}", e)))?;

    let signature_bytes = b64url_decode(signature_segment)
        .map_err(|e| CredentialError::MalformedToken(format!("signature: {}", e)))?;
    if signature_bytes.len() != SIGNATURE_LENGTH {
        return Err(CredentialError::MalformedSignature(format!(
            "signature segment decodes to {} bytes, expected {}",
            signature_bytes.len(),
            SIGNATURE_LENGTH
        )));
    }
    let signature = RecoverableSignature::from_bytes(&signature_bytes)?;

    Ok(DecodedToken {
        header,
        claims,
        signing_input: format!("{}.{}", header_segment, payload_segment),
        raw_signature_segment: signature_segment.to_string(),
        signature,
    })
}
