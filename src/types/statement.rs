//! Statement claim sets and the chain element type.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jose::Jwks;

/// Lifetime of Entity Configurations and Subordinate Statements, in seconds
/// (one year from `iat`).
pub const STATEMENT_LIFETIME: i64 = 31_536_000;

/// The claim set of an entity statement.
///
/// Both statement kinds share this shape: an Entity Configuration is
/// self-issued (`iss == sub`) and carries the entity's own key set, while a
/// Subordinate Statement is issued by a superior about a named subordinate
/// (`iss != sub`) and carries the subordinate's registered key set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct EntityStatement {
    /// Entity identifier of the issuer.
    pub iss: String,

    /// Entity identifier the statement is about.
    pub sub: String,

    /// Issued-at time, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: i64,

    /// Expiry time, seconds since the Unix epoch.
    #[serde(default)]
    pub exp: i64,

    /// Unique statement identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Audience; present on Subordinate Statements, equal to `sub`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// The subject's public key set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<Jwks>,

    /// Entity identifiers of the subject's declared superiors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,

    /// Declarative metadata exposed by the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// Raw signed Trust Mark JWTs held by the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_marks: Option<Vec<String>>,

    /// The endpoint a Subordinate Statement was (or can be) fetched from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_endpoint: Option<String>,
}

impl EntityStatement {
    /// Build a typed statement from a verified claim map.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim map does not deserialize into a
    /// statement (e.g. `iss` or `sub` missing or non-string).
    pub fn from_claims(claims: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(claims)).context("issue deserializing statement")
    }

    /// `true` when the statement is self-issued (`iss == sub`).
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.iss == self.sub
    }
}

/// An element of a trust chain.
///
/// The two kinds carry the same claim shape but play different roles: an
/// Entity Configuration proves what an entity says about itself, a
/// Subordinate Statement proves what a superior says about it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", content = "claims", rename_all = "snake_case")]
pub enum Statement {
    /// A self-signed Entity Configuration (`iss == sub`).
    EntityConfiguration(EntityStatement),

    /// A statement issued by a superior about a subordinate (`iss != sub`).
    Subordinate(EntityStatement),
}

impl Statement {
    /// The claim set of the statement, regardless of kind.
    #[must_use]
    pub const fn claims(&self) -> &EntityStatement {
        match self {
            Self::EntityConfiguration(claims) | Self::Subordinate(claims) => claims,
        }
    }

    /// `true` for Entity Configurations.
    #[must_use]
    pub const fn is_entity_configuration(&self) -> bool {
        matches!(self, Self::EntityConfiguration(_))
    }
}

/// The claim set of a Trust Mark.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrustMarkClaims {
    /// Entity identifier of the issuer.
    pub iss: String,

    /// Entity identifier the mark is about.
    pub sub: String,

    /// The Trust Mark type identifier (a namespace URL).
    pub id: String,

    /// Issued-at time, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: i64,

    /// Expiry time, seconds since the Unix epoch, if the mark expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TrustMarkClaims {
    /// Build typed Trust Mark claims from a decoded claim map.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim map lacks `iss`, `sub`, or `id`.
    pub fn from_claims(claims: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(claims)).context("issue deserializing trust mark")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn statement_from_claims() {
        let Value::Object(claims) = json!({
            "iss": "https://a.example.com",
            "sub": "https://b.example.com",
            "iat": 1_700_000_000,
            "exp": 1_731_536_000,
            "jwks": {"keys": []},
            "metadata": {"federation_entity": {}},
        }) else {
            unreachable!()
        };

        let statement = EntityStatement::from_claims(claims).expect("should deserialize");
        assert!(!statement.is_self_issued());
        assert!(statement.authority_hints.is_empty());
        assert!(statement.jwks.is_some());
    }

    #[test]
    fn statement_requires_issuer() {
        let Value::Object(claims) = json!({"sub": "https://b.example.com"}) else {
            unreachable!()
        };
        assert!(EntityStatement::from_claims(claims).is_err());
    }

    #[test]
    fn chain_element_round_trip() {
        let statement = Statement::EntityConfiguration(EntityStatement {
            iss: "https://a.example.com".to_string(),
            sub: "https://a.example.com".to_string(),
            ..EntityStatement::default()
        });

        let value = serde_json::to_value(&statement).expect("should serialize");
        assert_eq!(value["kind"], "entity_configuration");
        let back: Statement = serde_json::from_value(value).expect("should deserialize");
        assert_eq!(back, statement);
    }
}
