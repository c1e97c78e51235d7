// src/blockchain/mod.rs
pub mod eth_client;
