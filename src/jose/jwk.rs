//! # JSON Web Keys
//!
//! A partial representation of JWKs per
//! [RFC7517](https://www.rfc-editor.org/rfc/rfc7517): the fields needed to
//! publish and verify `RS256` signatures (`kty`, `kid`, `use`, `alg`, and the
//! RSA `n`/`e` components). Fields outside this set are preserved verbatim so
//! a key set registered by a subordinate round-trips unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A public JSON Web Key.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKeyJwk {
    /// Key type. Only `RSA` keys are usable for verification.
    pub kty: String,

    /// Key identifier, used by verifiers to select this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Intended use of the key (`sig` for signing keys).
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    /// Signature algorithm the key is intended for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// RSA modulus, base64url-encoded without padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent, base64url-encoded without padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Members outside the profile above, carried through untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A JSON Web Key Set: `{"keys": [ ... ]}`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwks {
    /// The keys in the set.
    #[serde(default)]
    pub keys: Vec<PublicKeyJwk>,
}

impl Jwks {
    /// Find the key with the given `kid`, if present.
    #[must_use]
    pub fn key(&self, kid: &str) -> Option<&PublicKeyJwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

impl From<PublicKeyJwk> for Jwks {
    fn from(key: PublicKeyJwk) -> Self {
        Self { keys: vec![key] }
    }
}
