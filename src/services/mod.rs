// src/services/mod.rs
pub mod api_error;
pub mod api_server;
pub mod codec;
pub mod credential_issuer;
pub mod verifier;
