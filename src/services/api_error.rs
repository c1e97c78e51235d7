// src/services/api_error.rs
//! HTTP error mapping for the API server.

use crate::error::CredentialError;
use crate::storage::credential_store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// A credential operation failed; the status follows the failure kind.
    Credential(CredentialError),
    NotFound(String),
    BadRequest(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Credential(err) => match err {
                CredentialError::IssuerNotTrusted(_) | CredentialError::IssuerNotRegistered(_) => {
                    StatusCode::FORBIDDEN
                }
                CredentialError::RegistryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CredentialError::InvalidKey(_) | CredentialError::Encoding(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Credential(err) => err.kind(),
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            ApiError::Credential(err) => err.to_string(),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            log::error!("request failed ({}): {}", kind, message);
        }

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        ApiError::Credential(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
