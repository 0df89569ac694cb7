//! Request and response types for the entity's operations.
//!
//! Each operation of the entity has an `XxxRequest`/`XxxResponse` pair. The
//! types serialize to and from JSON so an HTTP shell can surface them with a
//! few lines of wrapper code per route.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jose::Jwks;
use crate::state::{SubordinateRecord, TrustMarkRecord};

/// Request for the entity's self-signed Entity Configuration, served at
/// `/.well-known/openid-federation`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigurationRequest {}

/// The signed Entity Configuration in compact JWT serialization.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigurationResponse(pub String);

/// Request for a Subordinate Statement about a registered subordinate.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FetchRequest {
    /// Entity identifier of the subordinate the statement is about.
    pub sub: String,
}

/// The signed Subordinate Statement in compact JWT serialization.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FetchResponse(pub String);

/// Request for the identifiers of all registered subordinates.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListRequest {}

/// The entity identifiers of all registered subordinates, ordered.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListResponse(pub Vec<String>);

/// Request for a summary of the entity's state.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityRequest {}

/// A summary of the entity's state.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityResponse {
    /// The entity identifier.
    pub entity_id: String,

    /// Declared superiors, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,

    /// Entity identifiers of registered subordinates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subordinates: Vec<String>,

    /// Number of Trust Marks this entity has issued.
    pub issued_trust_marks: usize,

    /// Number of Trust Marks issued to this entity.
    pub received_trust_marks: usize,

    /// The entity's declared metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Replace the entity's declared superiors.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SetAuthorityHintsRequest {
    /// The new superiors, in order of preference. The first is followed
    /// during chain resolution.
    pub authority_hints: Vec<String>,
}

/// The authority hints in effect after replacement.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SetAuthorityHintsResponse {
    /// The entity identifier.
    pub entity_id: String,

    /// The superiors now in effect.
    pub authority_hints: Vec<String>,
}

/// Request for all subordinate records.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListSubordinatesRequest {}

/// All subordinate records, ordered by entity identifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListSubordinatesResponse(pub Vec<SubordinateRecord>);

/// Register a subordinate, or replace an existing registration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UpsertSubordinateRequest {
    /// Entity identifier of the subordinate.
    pub entity_id: String,

    /// The subordinate's public key set.
    #[serde(default)]
    pub jwks: Jwks,

    /// Metadata to include in Subordinate Statements about the subordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// The superiors the subordinate declares. The registering entity is
    /// added if absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,
}

/// Result of a subordinate registration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UpsertSubordinateResponse {
    /// Entity identifier of the subordinate.
    pub entity_id: String,

    /// `true` when an existing registration was replaced.
    pub replaced: bool,
}

/// Replace an existing subordinate registration. Unlike
/// [`UpsertSubordinateRequest`], the subordinate must already be registered.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UpdateSubordinateRequest {
    /// Entity identifier of the subordinate.
    pub entity_id: String,

    /// The subordinate's public key set.
    #[serde(default)]
    pub jwks: Jwks,

    /// Metadata to include in Subordinate Statements about the subordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// The superiors the subordinate declares.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,
}

/// Request for one subordinate record.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GetSubordinateRequest {
    /// Entity identifier of the subordinate.
    pub entity_id: String,
}

/// A single subordinate record.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SubordinateResponse(pub SubordinateRecord);

/// Remove a subordinate registration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DeleteSubordinateRequest {
    /// Entity identifier of the subordinate.
    pub entity_id: String,
}

/// Result of removing a subordinate registration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DeleteSubordinateResponse {
    /// Entity identifier of the removed subordinate.
    pub entity_id: String,
}

/// Mint a Trust Mark for a subject entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IssueTrustMarkRequest {
    /// The Trust Mark type identifier (a namespace URL).
    pub trust_mark_id: String,

    /// Entity identifier the mark is about.
    pub subject: String,

    /// Lifetime of the mark in seconds. The mark never expires when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

/// A single Trust Mark record, including its signed JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TrustMarkResponse(pub TrustMarkRecord);

/// Request for all Trust Marks this entity has issued.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListTrustMarksRequest {}

/// All issued Trust Marks, in issuance order.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListTrustMarksResponse(pub Vec<TrustMarkRecord>);

/// Request for one issued Trust Mark by type identifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GetTrustMarkRequest {
    /// The Trust Mark type identifier.
    pub trust_mark_id: String,
}

/// Revoke an issued Trust Mark by type identifier. Revocation is local; no
/// external notification is made.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RevokeTrustMarkRequest {
    /// The Trust Mark type identifier.
    pub trust_mark_id: String,
}

/// Result of revoking a Trust Mark.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RevokeTrustMarkResponse {
    /// The revoked Trust Mark's type identifier.
    pub trust_mark_id: String,
}

/// Register a Trust Mark issued to this entity by another.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AddReceivedTrustMarkRequest {
    /// The signed Trust Mark in compact JWT serialization.
    pub signed_jwt: String,
}

/// Request for all Trust Marks issued to this entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListReceivedTrustMarksRequest {}

/// All received Trust Marks, in arrival order.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListReceivedTrustMarksResponse(pub Vec<TrustMarkRecord>);

/// Resolve the trust chain from a target entity to an expected trust anchor.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResolveRequest {
    /// URL of the target entity.
    pub sub: String,

    /// URL of the expected trust anchor.
    pub trust_anchor: String,
}
