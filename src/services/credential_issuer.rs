// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Turns facts about a subject into a signed credential token:
//! 1. Builds the claims set (issuer DID, subject block, validity window)
//! 2. Encodes the fixed header and the claims into the signing input
//! 3. Signs the signing input with the issuer's key
//! 4. Appends the signature segment
//!
//! Issued tokens are returned, not stored; persistence belongs to the caller.

use crate::contracts::registry::RegistryClient;
use crate::error::{CredentialError, Result};
use crate::models::credential::{
    ClaimsPayload, CredentialBody, CredentialSubject, IssuerRef, SubjectFacts, VC_CONTEXT, VC_TYPE,
};
use crate::models::token::{SignedToken, TokenHeader};
use crate::services::codec;
use crate::wallet::key_management::IssuerIdentity;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::Arc;

/// Default validity of an issued credential: ten years.
pub const DEFAULT_VALIDITY_DAYS: i64 = 3650;

/// Default validity as a duration.
pub fn default_validity() -> Duration {
    Duration::days(DEFAULT_VALIDITY_DAYS)
}

/// Service for issuing signed verifiable credentials.
///
/// Stateless apart from the optional registry used for the fail-fast check,
/// so one instance can be shared across tasks.
#[derive(Clone, Default)]
pub struct CredentialIssuer {
    /// When set, issuance is refused for identities the registry does not trust.
    registry: Option<Arc<dyn RegistryClient>>,
}

impl CredentialIssuer {
    /// Creates an issuer that signs for any identity it is handed.
    pub fn new() -> Self {
        Self { registry: None }
    }

    /// Creates an issuer that consults `registry` before signing and refuses
    /// with `IssuerNotRegistered` if the identity's address is not trusted.
    pub fn with_registry_check(registry: Arc<dyn RegistryClient>) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// Issues a credential valid from now for `validity`.
    ///
    /// # Arguments
    /// * `identity` - Issuer address, name and signing key
    /// * `facts` - Subject identifier, name and attributes
    /// * `validity` - How long the credential stays valid
    ///
    /// # Errors
    /// `InvalidKey`, `ReservedClaim`, `InvalidValidity`, `IssuerNotRegistered`
    /// or `RegistryUnavailable` (registry check only).
    pub async fn issue(
        &self,
        identity: &IssuerIdentity,
        facts: SubjectFacts,
        validity: Duration,
    ) -> Result<SignedToken> {
        self.issue_at(identity, facts, validity, Utc::now()).await
    }

    /// Issues a credential with an explicit issuance instant.
    ///
    /// Identical inputs produce byte-identical tokens.
    pub async fn issue_at(
        &self,
        identity: &IssuerIdentity,
        facts: SubjectFacts,
        validity: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<SignedToken> {
        if let Some(registry) = &self.registry {
            let address = identity.address();
            if !registry.is_registered(address).await? {
                log::warn!("refusing to issue: {} is not a registered issuer", identity.did());
                return Err(CredentialError::IssuerNotRegistered(
                    identity.did().checksum_address(),
                ));
            }
        }

        let claims = build_claims(identity, facts, validity, issued_at)?;
        let token = sign_claims(identity, &claims)?;
        log::info!(
            "issued credential for subject {} by {} (expires {})",
            claims.sub,
            claims.iss,
            claims.vc.expiration_date
        );
        Ok(token)
    }
}

/// Builds the claims set for one issuance.
///
/// Timestamps are truncated to whole seconds so that the numeric claims and
/// the RFC 3339 dates in the credential body agree.
pub fn build_claims(
    identity: &IssuerIdentity,
    facts: SubjectFacts,
    validity: Duration,
    issued_at: DateTime<Utc>,
) -> Result<ClaimsPayload> {
    if let Some(key) = facts.reserved_collision() {
        return Err(CredentialError::ReservedClaim(key.to_string()));
    }
    if validity <= Duration::zero() {
        return Err(CredentialError::InvalidValidity(format!(
            "{} seconds is not positive",
            validity.num_seconds()
        )));
    }

    let issued_at = DateTime::<Utc>::from_timestamp(issued_at.timestamp(), 0).unwrap_or(issued_at);
    let expires_at = issued_at
        .checked_add_signed(validity)
        .ok_or_else(|| CredentialError::InvalidValidity("expiry overflows the calendar".into()))?;

    let did = identity.did().to_string();
    let mut types = vec![VC_TYPE.to_string()];
    types.extend(facts.credential_type);

    Ok(ClaimsPayload {
        iss: did.clone(),
        sub: facts.subject_id.clone(),
        nbf: issued_at.timestamp(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
        vc: CredentialBody {
            context: vec![VC_CONTEXT.to_string()],
            types,
            issuer: IssuerRef {
                id: did,
                name: identity.display_name().to_string(),
            },
            issuance_date: issued_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            expiration_date: expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            credential_subject: CredentialSubject {
                id: facts.subject_id,
                name: facts.name,
                attributes: facts.attributes,
            },
        },
    })
}

/// Signs `claims` under the fixed ES256K header.
pub fn sign_claims(identity: &IssuerIdentity, claims: &ClaimsPayload) -> Result<SignedToken> {
    let (signing_input, prefix) = codec::encode_prefix(&TokenHeader::es256k(), claims)?;
    let signature = identity.sign_message(&signing_input)?;
    Ok(SignedToken::from_parts(&prefix, &codec::encode_signature(&signature)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::registry::StaticRegistry;
    use crate::utils::crypto::{hash_data, recover};
    use chrono::TimeZone;
    use ethers::types::Address;

    fn identity() -> IssuerIdentity {
        IssuerIdentity::from_private_key("State University", [0x21u8; 32]).unwrap()
    }

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn claims_carry_issuer_subject_and_window() {
        let identity = identity();
        let claims = build_claims(
            &identity,
            SubjectFacts::degree("S1", "Jane Doe", "BSc", "CS"),
            default_validity(),
            fixed_instant(),
        )
        .unwrap();

        assert_eq!(claims.iss, identity.did().to_string());
        assert_eq!(claims.vc.issuer.name, "State University");
        assert_eq!(claims.sub, "S1");
        assert_eq!(claims.exp - claims.iat, DEFAULT_VALIDITY_DAYS * 86_400);
        assert_eq!(claims.vc.issuance_date, "2024-06-01T12:00:00Z");
        assert_eq!(claims.vc.expiration_date, "2034-05-30T12:00:00Z");
        assert_eq!(claims.vc.types, vec!["VerifiableCredential", "UniversityDegreeCredential"]);
        assert_eq!(claims.vc.credential_subject.attributes["degree"]["type"], "BSc");
    }

    #[test]
    fn sub_second_instants_are_truncated() {
        let instant = fixed_instant() + Duration::milliseconds(750);
        let claims = build_claims(&identity(), SubjectFacts::new("S1", "Jane"), Duration::days(1), instant)
            .unwrap();
        assert_eq!(claims.iat, fixed_instant().timestamp());
        assert_eq!(claims.vc.issuance_date, "2024-06-01T12:00:00Z");
    }

    #[test]
    fn rejects_reserved_attributes_and_bad_validity() {
        let clash = SubjectFacts::new("S1", "Jane").with_attribute("id", "S2");
        assert!(matches!(
            build_claims(&identity(), clash, default_validity(), fixed_instant()),
            Err(CredentialError::ReservedClaim(key)) if key == "id"
        ));

        let facts = SubjectFacts::new("S1", "Jane");
        assert!(matches!(
            build_claims(&identity(), facts, Duration::zero(), fixed_instant()),
            Err(CredentialError::InvalidValidity(_))
        ));
    }

    #[tokio::test]
    async fn token_has_three_segments_and_recovers_to_issuer() {
        let identity = identity();
        let token = CredentialIssuer::new()
            .issue(&identity, SubjectFacts::degree("S1", "Jane Doe", "BSc", "CS"), default_validity())
            .await
            .unwrap();

        let segments = token.segments();
        assert_eq!(segments.len(), 3);

        let signature_bytes = crate::utils::serialization::b64url_decode(segments[2]).unwrap();
        let signature = crate::utils::crypto::RecoverableSignature::from_bytes(&signature_bytes).unwrap();
        let signer = recover(&hash_data(token.signing_input().as_bytes()), &signature).unwrap();
        assert_eq!(signer, identity.address());
    }

    #[tokio::test]
    async fn same_inputs_produce_identical_tokens() {
        let issuer = CredentialIssuer::new();
        let facts = SubjectFacts::degree("S1", "Jane Doe", "BSc", "CS");
        let a = issuer.issue_at(&identity(), facts.clone(), default_validity(), fixed_instant()).await.unwrap();
        let b = issuer.issue_at(&identity(), facts, default_validity(), fixed_instant()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn registry_check_refuses_unregistered_identity() {
        let registry = Arc::new(StaticRegistry::new());
        let issuer = CredentialIssuer::with_registry_check(registry.clone());
        let identity = identity();

        let refused = issuer
            .issue(&identity, SubjectFacts::new("S1", "Jane"), default_validity())
            .await;
        assert!(matches!(refused, Err(CredentialError::IssuerNotRegistered(_))));

        registry.register(identity.address(), identity.display_name());
        assert!(issuer
            .issue(&identity, SubjectFacts::new("S1", "Jane"), default_validity())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn invalid_key_is_reported() {
        let identity = IssuerIdentity::new(Address::repeat_byte(1), "Broken", [0u8; 32]);
        let result = CredentialIssuer::new()
            .issue(&identity, SubjectFacts::new("S1", "Jane"), default_validity())
            .await;
        assert!(matches!(result, Err(CredentialError::InvalidKey(_))));
    }
}
