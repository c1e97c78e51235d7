// src/storage/credential_store.rs
//! Issued-credential records.
//!
//! The issuing service keeps a record of every token it hands out so that a
//! credential can be fetched again by id (for display, QR rendering, resend).
//! Storage is an explicit trait object owned by whoever wires the service;
//! there is no ambient global store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by credential stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// One issued credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IssuedCredential {
    pub id: String,
    /// The compact signed token.
    pub token: String,
    pub subject_id: String,
    pub subject_name: String,
    pub issued_at: DateTime<Utc>,
}

impl IssuedCredential {
    /// Creates a record with a fresh random id.
    pub fn new(
        token: impl Into<String>,
        subject_id: impl Into<String>,
        subject_name: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token: token.into(),
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
            issued_at,
        }
    }
}

/// Keyed storage for issued credentials.
pub trait CredentialStore: Send + Sync {
    /// Stores `record` under `id`, replacing any previous record.
    fn put(&self, id: String, record: IssuedCredential) -> Result<(), StoreError>;

    /// Looks up the record stored under `id`.
    fn get(&self, id: &str) -> Result<Option<IssuedCredential>, StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, StoreError>;
}

/// In-memory storage for issued credentials.
///
/// This storage provides:
/// - Thread-safe access behind a read-write lock
/// - O(1) average case complexity for insertions and lookups
///
/// # Note
/// Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<String, IssuedCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("credential store lock poisoned".into())
}

impl CredentialStore for InMemoryCredentialStore {
    fn put(&self, id: String, record: IssuedCredential) -> Result<(), StoreError> {
        self.credentials.write().map_err(poisoned)?.insert(id, record);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<IssuedCredential>, StoreError> {
        Ok(self.credentials.read().map_err(poisoned)?.get(id).cloned())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.credentials.read().map_err(poisoned)?.len())
    }
}
