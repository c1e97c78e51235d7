// src/models/credential.rs
//! Verifiable Credential claims model.
//!
//! Defines the JWT claims set carried in the payload segment of a signed
//! credential, following the JWT encoding of the
//! [W3C Verifiable Credentials Data Model](https://www.w3.org/TR/vc-data-model/#json-web-token):
//! registered JWT claims (`iss`, `sub`, `nbf`, `iat`, `exp`) at the top level and
//! the credential itself under `vc`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Base JSON-LD context of every credential.
pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Base credential type of every credential.
pub const VC_TYPE: &str = "VerifiableCredential";

/// Credential type used for academic degree credentials.
pub const DEGREE_CREDENTIAL_TYPE: &str = "UniversityDegreeCredential";

/// Subject fields that attributes may not overwrite.
pub const RESERVED_SUBJECT_FIELDS: [&str; 2] = ["id", "name"];

/// The claims set signed into a credential token.
///
/// Built once per issuance and never mutated afterwards; verification hands
/// back the decoded copy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClaimsPayload {
    /// Issuer DID, `did:ethr:0x<lowercase address>`. Empty when absent from
    /// a decoded token so that the verifier can report it as missing.
    #[serde(default)]
    pub iss: String,
    /// Subject identifier.
    pub sub: String,
    /// Not-before, seconds since the Unix epoch.
    pub nbf: i64,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// The credential body.
    pub vc: CredentialBody,
}

impl ClaimsPayload {
    /// Display name of the credential subject.
    pub fn subject_name(&self) -> &str {
        &self.vc.credential_subject.name
    }

    /// Whether the credential has expired at `now` (Unix seconds).
    ///
    /// Verification does not enforce expiry; presentation layers decide how
    /// to treat expired but authentic credentials.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// The `vc` claim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBody {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub issuer: IssuerRef,
    /// RFC 3339, second precision, UTC.
    pub issuance_date: String,
    /// RFC 3339, second precision, UTC.
    pub expiration_date: String,
    pub credential_subject: CredentialSubject,
}

/// Issuer as embedded in the credential body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IssuerRef {
    pub id: String,
    pub name: String,
}

/// Attributes asserted about the subject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialSubject {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

/// Caller-supplied facts about a subject, the raw input to issuance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubjectFacts {
    pub subject_id: String,
    pub name: String,
    /// Extra credential type appended after [`VC_TYPE`].
    pub credential_type: Option<String>,
    pub attributes: BTreeMap<String, Value>,
}

impl SubjectFacts {
    pub fn new(subject_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Facts for an academic degree: the subject gets a `degree` block with
    /// the degree `type` and `major`.
    ///
    /// # Example
    /// ```
    /// use ethr_vc::models::credential::SubjectFacts;
    ///
    /// let facts = SubjectFacts::degree("S1", "Jane Doe", "BSc", "CS");
    /// assert_eq!(facts.attributes["degree"]["major"], "CS");
    /// ```
    pub fn degree(
        student_id: impl Into<String>,
        name: impl Into<String>,
        degree: impl Into<String>,
        major: impl Into<String>,
    ) -> Self {
        let block = serde_json::json!({
            "type": degree.into(),
            "major": major.into(),
        });
        Self::new(student_id, name)
            .with_credential_type(DEGREE_CREDENTIAL_TYPE)
            .with_attribute("degree", block)
    }

    pub fn with_credential_type(mut self, credential_type: impl Into<String>) -> Self {
        self.credential_type = Some(credential_type.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// First attribute name that would collide with a fixed subject field.
    pub fn reserved_collision(&self) -> Option<&str> {
        self.attributes
            .keys()
            .map(String::as_str)
            .find(|key| RESERVED_SUBJECT_FIELDS.contains(key))
    }
}
