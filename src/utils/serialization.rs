// src/utils/serialization.rs
//! Serialization utilities for the credential wire format.
//!
//! Provides:
//! - Canonical JSON (object keys sorted at every depth, no whitespace)
//! - Unpadded base64url encoding and strict decoding

use crate::error::{CredentialError, Result};
use serde::Serialize;
use serde_json::Value;

/// Serializes a value to canonical JSON.
///
/// Keys are emitted in lexicographic byte order regardless of struct field
/// order or of how `serde_json::Map` is configured, so two structurally equal
/// values always produce identical bytes.
///
/// # Errors
/// `Encoding` if the value cannot be represented as JSON.
pub fn to_canonical_json<T: Serialize>(data: &T) -> Result<String> {
    let value = serde_json::to_value(data).map_err(|e| CredentialError::Encoding(e.to_string()))?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&scalar_json(&Value::String(key.clone()))?);
                out.push(':');
                write_canonical(&map[key], out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar_json(scalar)?),
    }
    Ok(())
}

fn scalar_json(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| CredentialError::Encoding(e.to_string()))
}

/// Encodes bytes as base64url without padding.
pub fn b64url_encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

/// Decodes an unpadded base64url segment.
///
/// Only the canonical encoding is accepted: padding, non-alphabet characters
/// and non-zero trailing bits are all rejected, so every distinct segment
/// string maps to distinct bytes.
///
/// # Errors
/// Returns a description of the defect; callers wrap it in their own error kind.
pub fn b64url_decode(segment: &str) -> std::result::Result<Vec<u8>, String> {
    let bytes = base64::decode_config(segment, base64::URL_SAFE_NO_PAD)
        .map_err(|e| format!("invalid base64url: {}", e))?;
    if b64url_encode(&bytes) != segment {
        return Err("non-canonical base64url encoding".into());
    }
    Ok(bytes)
}
