// src/storage/mod.rs
pub mod credential_store;
