// src/models/token.rs
//! Compact token types: the fixed header and the signed three-segment token.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature algorithm: ECDSA over secp256k1.
pub const ALG_ES256K: &str = "ES256K";

/// Token type.
pub const TYP_JWT: &str = "JWT";

/// JOSE header of every credential token.
///
/// The algorithm is pinned; [`TokenHeader::is_supported`] is the only header
/// shape accepted on decode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    pub fn es256k() -> Self {
        Self {
            alg: ALG_ES256K.to_string(),
            typ: TYP_JWT.to_string(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.alg == ALG_ES256K && self.typ == TYP_JWT
    }
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self::es256k()
    }
}

/// A signed credential: `header.payload.signature`, each segment unpadded base64url.
///
/// Only the issuer constructs these; the value is immutable afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    pub(crate) fn from_parts(signing_input: &str, signature_segment: &str) -> Self {
        Self(format!("{}.{}", signing_input, signature_segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The `header.payload` prefix that was signed.
    pub fn signing_input(&self) -> &str {
        self.0.rsplit_once('.').map(|(prefix, _)| prefix).unwrap_or(&self.0)
    }

    /// The three raw segments.
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SignedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
