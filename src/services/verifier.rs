// src/services/verifier.rs
//! Credential verification service.
//!
//! Verification is a linear pipeline over an immutable token:
//! 1. Parse the token
//! 2. Extract the issuer address from the `iss` DID
//! 3. Recompute the Keccak-256 digest of the signing input
//! 4. Recover the signer's address from the signature
//! 5. Require the recovered signer to be the claimed issuer
//! 6. Ask the registry whether the issuer is trusted
//! 7. Accept
//!
//! Steps 1-5 are pure. Step 6 is the only await point; nothing is retried.

use crate::contracts::registry::RegistryClient;
use crate::error::{CredentialError, RegistryError, Result};
use crate::models::credential::ClaimsPayload;
use crate::models::did::EthrDid;
use crate::services::codec;
use crate::utils::crypto::{hash_data, recover};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    /// Always true; failures are reported as errors.
    pub valid: bool,
    /// Checksummed address of the verified issuer.
    pub issuer: String,
    pub claims: ClaimsPayload,
}

/// A token whose signature matched its claimed issuer but whose issuer has
/// not yet been checked against the registry.
#[derive(Debug, Clone)]
pub struct AuthenticToken {
    pub issuer: EthrDid,
    pub claims: ClaimsPayload,
}

/// Runs the pure part of the pipeline (steps 1-5).
///
/// # Errors
/// `MalformedToken`, `MalformedSignature`, `MissingIssuer`,
/// `CryptographicFailure` or `SignatureMismatch`.
pub fn authenticate(token: &str) -> Result<AuthenticToken> {
    let decoded = codec::decode(token)?;

    if decoded.claims.iss.is_empty() {
        return Err(CredentialError::MissingIssuer("no `iss` claim".into()));
    }
    let issuer: EthrDid = decoded.claims.iss.parse()?;

    let digest = hash_data(decoded.signing_input.as_bytes());
    let recovered = recover(&digest, &decoded.signature)
        .map_err(|e| CredentialError::CryptographicFailure(Box::new(e)))?;

    if recovered != issuer.address() {
        return Err(CredentialError::SignatureMismatch {
            recovered: EthrDid::new(recovered).checksum_address(),
            claimed: issuer.checksum_address(),
        });
    }

    Ok(AuthenticToken {
        issuer,
        claims: decoded.claims,
    })
}

/// Verifies `token` against `registry`.
///
/// # Errors
/// Everything [`authenticate`] reports, plus `IssuerNotTrusted` when the
/// registry answers "no" and `RegistryUnavailable` when it cannot answer.
pub async fn verify(token: &str, registry: &dyn RegistryClient) -> Result<VerificationResult> {
    verify_with_deadline(token, registry, None).await
}

async fn verify_with_deadline(
    token: &str,
    registry: &dyn RegistryClient,
    deadline: Option<Duration>,
) -> Result<VerificationResult> {
    let authentic = authenticate(token).map_err(|e| {
        log::debug!("credential rejected before trust check: {}", e);
        e
    })?;
    let issuer = authentic.issuer.checksum_address();

    let lookup = registry.is_registered(authentic.issuer.address());
    let registered = match deadline {
        Some(limit) => tokio::time::timeout(limit, lookup)
            .await
            .unwrap_or_else(|_| Err(RegistryError::Timeout(limit.as_millis() as u64))),
        None => lookup.await,
    }
    .map_err(|e| {
        log::warn!("registry lookup for {} failed: {}", issuer, e);
        CredentialError::RegistryUnavailable(e)
    })?;

    if !registered {
        log::info!("credential signed by untrusted issuer {}", issuer);
        return Err(CredentialError::IssuerNotTrusted(issuer));
    }

    log::debug!("credential for subject {} verified, issuer {}", authentic.claims.sub, issuer);
    Ok(VerificationResult {
        valid: true,
        issuer,
        claims: authentic.claims,
    })
}

/// Credential verifier bound to a registry.
///
/// The Verifier provides:
/// - Thread-safe sharing of the registry via `Arc`
/// - An optional deadline on the registry call
#[derive(Clone)]
pub struct Verifier {
    registry: Arc<dyn RegistryClient>,
    registry_timeout: Option<Duration>,
}

impl Verifier {
    /// Constructs a new Verifier with no deadline on registry calls.
    pub fn new(registry: Arc<dyn RegistryClient>) -> Self {
        Self {
            registry,
            registry_timeout: None,
        }
    }

    /// Bounds the registry call; expiry is reported as `RegistryUnavailable`.
    pub fn with_registry_timeout(mut self, timeout: Duration) -> Self {
        self.registry_timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &Arc<dyn RegistryClient> {
        &self.registry
    }

    /// Verifies a credential token.
    pub async fn verify(&self, token: &str) -> Result<VerificationResult> {
        verify_with_deadline(token, self.registry.as_ref(), self.registry_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::registry::StaticRegistry;
    use crate::models::credential::SubjectFacts;
    use crate::services::credential_issuer::{build_claims, default_validity, sign_claims, CredentialIssuer};
    use crate::utils::crypto::address_from_private_key;
    use crate::wallet::key_management::IssuerIdentity;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use ethers::types::Address;
    use rand::{Rng, SeedableRng};

    /// Registry whose node is down.
    struct DownRegistry;

    #[async_trait]
    impl RegistryClient for DownRegistry {
        async fn is_registered(&self, _address: Address) -> std::result::Result<bool, RegistryError> {
            Err(RegistryError::Transport("connection refused".into()))
        }
        async fn issuer_name(&self, _address: Address) -> std::result::Result<String, RegistryError> {
            Err(RegistryError::Transport("connection refused".into()))
        }
    }

    /// Registry that never answers.
    struct HangingRegistry;

    #[async_trait]
    impl RegistryClient for HangingRegistry {
        async fn is_registered(&self, _address: Address) -> std::result::Result<bool, RegistryError> {
            std::future::pending().await
        }
        async fn issuer_name(&self, _address: Address) -> std::result::Result<String, RegistryError> {
            std::future::pending().await
        }
    }

    /// Identity registered as "State University".
    fn university() -> (IssuerIdentity, Arc<StaticRegistry>) {
        let identity = IssuerIdentity::from_private_key("State University", [0xabu8; 32]).unwrap();
        let registry = Arc::new(StaticRegistry::new());
        registry.register(identity.address(), identity.display_name());
        (identity, registry)
    }

    async fn jane_doe_token(identity: &IssuerIdentity) -> String {
        CredentialIssuer::new()
            .issue(identity, SubjectFacts::degree("S1", "Jane Doe", "BSc", "CS"), default_validity())
            .await
            .unwrap()
            .into_string()
    }

    #[tokio::test]
    async fn registered_issuer_round_trip() {
        let (identity, registry) = university();
        let token = jane_doe_token(&identity).await;

        let result = Verifier::new(registry).verify(&token).await.unwrap();
        assert!(result.valid);
        assert_eq!(result.issuer, identity.did().checksum_address());
        assert_eq!(result.claims.vc.credential_subject.name, "Jane Doe");
        assert_eq!(result.claims.vc.credential_subject.attributes["degree"]["major"], "CS");
    }

    #[tokio::test]
    async fn verified_claims_equal_issued_claims() {
        let (identity, registry) = university();
        let issued_at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let facts = SubjectFacts::new("S9", "Ada").with_attribute("grade", 1.5).with_attribute("honours", true);
        let claims = build_claims(&identity, facts, default_validity(), issued_at).unwrap();
        let token = sign_claims(&identity, &claims).unwrap();

        let result = verify(token.as_str(), registry.as_ref()).await.unwrap();
        assert_eq!(result.claims, claims);
    }

    #[tokio::test]
    async fn round_trip_holds_for_random_keys() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..16 {
            let key: [u8; 32] = rng.gen();
            let Ok(identity) = IssuerIdentity::from_private_key("Random Issuer", key) else {
                continue;
            };
            let registry = StaticRegistry::new();
            registry.register(identity.address(), "Random Issuer");

            let token = jane_doe_token(&identity).await;
            assert!(verify(&token, &registry).await.unwrap().valid);
        }
    }

    #[tokio::test]
    async fn unregistered_issuer_is_not_trusted() {
        let (identity, _) = university();
        let token = jane_doe_token(&identity).await;

        let result = verify(&token, &StaticRegistry::new()).await;
        assert!(matches!(result, Err(CredentialError::IssuerNotTrusted(_))));
    }

    #[tokio::test]
    async fn revoked_issuer_is_not_trusted() {
        let (identity, registry) = university();
        let token = jane_doe_token(&identity).await;
        registry.revoke(identity.address());

        let result = Verifier::new(registry).verify(&token).await;
        assert!(matches!(result, Err(CredentialError::IssuerNotTrusted(_))));
    }

    #[tokio::test]
    async fn registry_outage_is_distinct_from_distrust() {
        let (identity, _) = university();
        let token = jane_doe_token(&identity).await;

        let err = verify(&token, &DownRegistry).await.unwrap_err();
        assert!(matches!(err, CredentialError::RegistryUnavailable(RegistryError::Transport(_))));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn registry_timeout_is_unavailable_not_untrusted() {
        let (identity, _) = university();
        let token = jane_doe_token(&identity).await;
        let verifier = Verifier::new(Arc::new(HangingRegistry))
            .with_registry_timeout(Duration::from_millis(20));

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, CredentialError::RegistryUnavailable(RegistryError::Timeout(20))));
    }

    #[tokio::test]
    async fn forged_tokens_never_reach_the_registry() {
        // A down registry would turn any registry call into RegistryUnavailable.
        let result = verify("not-a-token", &DownRegistry).await;
        assert!(matches!(result, Err(CredentialError::MalformedToken(_))));
    }

    #[test]
    fn token_signed_by_other_key_is_a_mismatch() {
        let (claimed, _) = university();
        let impostor = IssuerIdentity::new(claimed.address(), "State University", [0x99u8; 32]);
        assert_ne!(address_from_private_key(&[0x99u8; 32]).unwrap(), claimed.address());

        let claims = build_claims(
            &impostor,
            SubjectFacts::new("S1", "Jane Doe"),
            default_validity(),
            Utc::now(),
        )
        .unwrap();
        let token = sign_claims(&impostor, &claims).unwrap();

        let err = authenticate(token.as_str()).unwrap_err();
        assert!(matches!(err, CredentialError::SignatureMismatch { .. }));
    }

    #[test]
    fn missing_or_foreign_issuer_is_reported() {
        let (identity, _) = university();
        let mut claims = build_claims(
            &identity,
            SubjectFacts::new("S1", "Jane Doe"),
            default_validity(),
            Utc::now(),
        )
        .unwrap();

        claims.iss = String::new();
        let token = sign_claims(&identity, &claims).unwrap();
        assert!(matches!(authenticate(token.as_str()), Err(CredentialError::MissingIssuer(_))));

        claims.iss = "did:web:state.edu".into();
        let token = sign_claims(&identity, &claims).unwrap();
        assert!(matches!(authenticate(token.as_str()), Err(CredentialError::MissingIssuer(_))));
    }

    #[test]
    fn checksummed_issuer_did_is_accepted() {
        let (identity, _) = university();
        let mut claims = build_claims(
            &identity,
            SubjectFacts::new("S1", "Jane Doe"),
            default_validity(),
            Utc::now(),
        )
        .unwrap();
        claims.iss = format!("did:ethr:{}", identity.did().checksum_address());
        let token = sign_claims(&identity, &claims).unwrap();

        let authentic = authenticate(token.as_str()).unwrap();
        assert_eq!(authentic.issuer, identity.did());
    }

    #[tokio::test]
    async fn every_single_bit_flip_is_rejected() {
        let (identity, registry) = university();
        let token = jane_doe_token(&identity).await;
        let bytes = token.as_bytes();

        for index in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.to_vec();
                tampered[index] ^= 1 << bit;
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };

                match verify(&tampered, registry.as_ref()).await {
                    Ok(_) => panic!("bit {} of byte {} flipped and still verified", bit, index),
                    Err(
                        CredentialError::MalformedToken(_)
                        | CredentialError::MalformedSignature(_)
                        | CredentialError::MissingIssuer(_)
                        | CredentialError::CryptographicFailure(_)
                        | CredentialError::SignatureMismatch { .. },
                    ) => {}
                    Err(other) => panic!("unexpected error for flipped byte {}: {}", index, other),
                }
            }
        }
    }
}
