// src/services/api_server.rs
//! API Server for the credential service
//!
//! This module provides the REST API in front of the issuer and verifier.
//!
//! The API is built using Axum and includes endpoints for:
//! - Service and blockchain status
//! - Credential issuance and retrieval of issued credentials
//! - Credential verification
//! - Registry lookups of issuers

use crate::blockchain::eth_client::EthClient;
use crate::models::credential::SubjectFacts;
use crate::models::did::parse_address;
use crate::services::api_error::ApiError;
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::verifier::{VerificationResult, Verifier};
use crate::storage::credential_store::{CredentialStore, IssuedCredential};
use crate::wallet::key_management::IssuerIdentity;
use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

// API request and response structures

/// Request payload for issuing a degree credential
#[derive(Serialize, Deserialize)]
struct IssueCredentialRequest {
    student_id: String,
    name: String,
    degree: String,
    major: String,
    /// Overrides the configured validity
    validity_days: Option<i64>,
}

/// Response for credential issuance
#[derive(Serialize, Deserialize)]
struct IssueCredentialResponse {
    id: String,
    token: String,
}

/// Request payload for verifying a credential token
#[derive(Serialize, Deserialize)]
struct VerifyCredentialRequest {
    vc_jwt: String,
}

/// Registry record of an issuer
#[derive(Serialize, Deserialize)]
struct IssuerResponse {
    address: String,
    name: String,
    registered: bool,
}

/// API server state containing all service dependencies
pub struct ApiServer {
    /// Service for issuing credentials
    credential_issuer: Arc<CredentialIssuer>,

    /// Service for verifying credentials
    verifier: Arc<Verifier>,

    /// Identity credentials are issued under; `None` disables issuance
    identity: Option<Arc<IssuerIdentity>>,

    /// Records of issued credentials
    store: Arc<dyn CredentialStore>,

    /// Client for chain status; `None` when running without a node
    eth_client: Option<EthClient>,

    /// Validity applied when a request does not specify one
    validity: Duration,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `credential_issuer` - Service for credential issuance
    /// * `verifier` - Service for credential verification
    /// * `identity` - Issuing identity, if this instance issues
    /// * `store` - Storage for issued credentials
    /// * `eth_client` - Client for blockchain status
    /// * `validity` - Default credential validity
    pub fn new(
        credential_issuer: CredentialIssuer,
        verifier: Verifier,
        identity: Option<IssuerIdentity>,
        store: Arc<dyn CredentialStore>,
        eth_client: Option<EthClient>,
        validity: Duration,
    ) -> Self {
        ApiServer {
            credential_issuer: Arc::new(credential_issuer),
            verifier: Arc::new(verifier),
            identity: identity.map(Arc::new),
            store,
            eth_client,
            validity,
        }
    }

    /// Builds the router with all API routes
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(Self::root_handler))
            .route("/blockchain-info", get(Self::blockchain_info_handler))
            .route("/issue", post(Self::issue_credential_handler))
            .route("/credentials/:id", get(Self::get_credential_handler))
            .route("/verify", post(Self::verify_credential_handler))
            .route("/issuers/:address", get(Self::issuer_handler))
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("API server listening on http://{}", addr);
        axum::serve(listener, self.router()).await
    }

    // =====================
    // Status Handlers
    // =====================

    /// # Endpoint
    /// GET /
    async fn root_handler() -> Json<Value> {
        Json(json!({ "message": "Hello from the ethr-vc credential service!" }))
    }

    /// Reports chain id, latest block and node accounts
    ///
    /// # Endpoint
    /// GET /blockchain-info
    ///
    /// # Responses
    /// - 200 OK: Chain status, or a failure status when the node is unreachable
    async fn blockchain_info_handler(State(state): State<Arc<ApiServer>>) -> Json<Value> {
        let Some(client) = &state.eth_client else {
            return Json(json!({ "status": "Failed to connect to Blockchain" }));
        };

        match client.chain_info().await {
            Ok(info) => Json(json!({
                "status": "Connected to Blockchain",
                "chain_id": info.chain_id,
                "latest_block_number": info.latest_block_number,
                "total_accounts": info.total_accounts,
                "first_account_address": info
                    .first_account
                    .map(|a| to_checksum(&a, None))
                    .unwrap_or_else(|| "No accounts found".to_string()),
            })),
            Err(e) => {
                log::warn!("blockchain info unavailable: {}", e);
                Json(json!({ "status": "Failed to connect to Blockchain" }))
            }
        }
    }

    // =====================
    // Credential Handlers
    // =====================

    /// Issues and records a degree credential
    ///
    /// # Endpoint
    /// POST /issue
    ///
    /// # Responses
    /// - 200 OK: Record id and signed token
    /// - 400 Bad Request: Invalid validity
    /// - 503 Service Unavailable: This instance has no issuing identity
    async fn issue_credential_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<IssueCredentialRequest>,
    ) -> Result<Json<IssueCredentialResponse>, ApiError> {
        let identity = state
            .identity
            .as_ref()
            .ok_or_else(|| ApiError::ServiceUnavailable("issuing is not configured".into()))?;

        let validity = match payload.validity_days {
            Some(days) => Duration::try_days(days)
                .ok_or_else(|| ApiError::BadRequest(format!("validity of {} days is out of range", days)))?,
            None => state.validity,
        };

        let facts = SubjectFacts::degree(
            payload.student_id.clone(),
            payload.name.clone(),
            payload.degree,
            payload.major,
        );
        let issued_at = Utc::now();
        let token = state
            .credential_issuer
            .issue_at(identity, facts, validity, issued_at)
            .await?;

        let record = IssuedCredential::new(token.as_str(), payload.student_id, payload.name, issued_at);
        let id = record.id.clone();
        state.store.put(id.clone(), record)?;

        Ok(Json(IssueCredentialResponse {
            id,
            token: token.into_string(),
        }))
    }

    /// Retrieves a previously issued credential
    ///
    /// # Endpoint
    /// GET /credentials/:id
    async fn get_credential_handler(
        Path(id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> Result<Json<IssuedCredential>, ApiError> {
        state
            .store
            .get(&id)?
            .map(Json)
            .ok_or_else(|| ApiError::NotFound(format!("credential {} not found", id)))
    }

    /// Verifies a credential token
    ///
    /// # Endpoint
    /// POST /verify
    ///
    /// # Responses
    /// - 200 OK: Verified claims
    /// - 400 Bad Request: Malformed or forged token
    /// - 403 Forbidden: Issuer not trusted by the registry
    /// - 503 Service Unavailable: Registry unreachable
    async fn verify_credential_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<VerifyCredentialRequest>,
    ) -> Result<Json<VerificationResult>, ApiError> {
        Ok(Json(state.verifier.verify(&payload.vc_jwt).await?))
    }

    /// Looks up an issuer in the registry
    ///
    /// # Endpoint
    /// GET /issuers/:address
    async fn issuer_handler(
        Path(address): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> Result<Json<IssuerResponse>, ApiError> {
        let address = parse_address(&address).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let entry = state
            .verifier
            .registry()
            .entry(address)
            .await
            .map_err(|e| ApiError::Credential(e.into()))?;

        Ok(Json(IssuerResponse {
            address: to_checksum(&entry.address, None),
            name: entry.display_name,
            registered: entry.registered,
        }))
    }
}

// Implement Clone for ApiServer to use with Axum's State
impl Clone for ApiServer {
    fn clone(&self) -> Self {
        ApiServer {
            credential_issuer: Arc::clone(&self.credential_issuer),
            verifier: Arc::clone(&self.verifier),
            identity: self.identity.clone(),
            store: Arc::clone(&self.store),
            eth_client: self.eth_client.clone(),
            validity: self.validity,
        }
    }
}
