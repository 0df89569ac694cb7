//! # Signing and Verification
//!
//! RS256 compact-JWT signing under a process-local RSA key, and verification
//! of compact JWTs against a supplied key set.
//!
//! Verification here is signature verification only. Temporal claims (`exp`,
//! `iat`, `nbf`) are policy concerns of the caller and are never enforced at
//! this layer.

use std::fmt::{self, Debug, Formatter};

use anyhow::{Context, Result, anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{Map, Value};

use crate::jose::jwk::{Jwks, PublicKeyJwk};

/// Custody of the entity's RSA-2048 signing key pair.
///
/// The key pair is generated at construction and lives for the life of the
/// process. Only the public half is reachable through the API; private key
/// material is held as an opaque signing handle and never serialized.
#[derive(Clone)]
pub struct KeyManager {
    kid: String,
    signer: EncodingKey,
    public: PublicKeyJwk,
}

impl KeyManager {
    /// Generate an RSA-2048 key pair for the named entity. The public JWK is
    /// assigned the stable key id `<entity_name>-key-1`.
    ///
    /// # Errors
    ///
    /// Returns an error if RSA key generation or private key encoding fails.
    /// Callers treat this as fatal: an entity without a signing key cannot
    /// participate in a federation.
    pub fn new(entity_name: &str) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key =
            RsaPrivateKey::new(&mut rng, 2048).context("issue generating RSA key pair")?;
        let public_key = RsaPublicKey::from(&private_key);

        // hand the private key to the JWT library as PKCS#1 PEM, then drop it
        let pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .context("issue encoding private key")?;
        let signer =
            EncodingKey::from_rsa_pem(pem.as_bytes()).context("issue creating signing key")?;

        let kid = format!("{entity_name}-key-1");
        let public = PublicKeyJwk {
            kty: "RSA".to_string(),
            kid: Some(kid.clone()),
            use_: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n: Some(Base64UrlUnpadded::encode_string(&public_key.n().to_bytes_be())),
            e: Some(Base64UrlUnpadded::encode_string(&public_key.e().to_bytes_be())),
            other: Map::new(),
        };

        Ok(Self { kid, signer, public })
    }

    /// The key id of the signing key.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.kid
    }

    /// The public half of the signing key as a JWK.
    #[must_use]
    pub fn public_jwk(&self) -> PublicKeyJwk {
        self.public.clone()
    }

    /// The published key set: `{"keys": [public_jwk]}`.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        self.public.clone().into()
    }

    /// Sign a claim map as a compact-serialized RS256 JWT with header
    /// `{"alg": "RS256", "kid": <key id>, "typ": "JWT"}`.
    ///
    /// # Errors
    ///
    /// Returns an error if claim serialization or signing fails.
    pub fn sign(&self, claims: &Map<String, Value>) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        jsonwebtoken::encode(&header, claims, &self.signer).context("issue signing statement")
    }
}

impl Debug for KeyManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager").field("kid", &self.kid).finish_non_exhaustive()
    }
}

/// Verify a compact JWT against the supplied key set, returning the decoded
/// claim map.
///
/// The key is selected by the `kid` in the JWT header and must be an RSA key.
/// Only the RS256 signature is checked; `exp` and other temporal claims are
/// left to the caller.
///
/// # Errors
///
/// Returns an error if the token is malformed, the header names no `kid` or
/// one absent from the key set, the selected key is not RSA, or the
/// signature does not verify. Callers treat any error as "no claims".
pub fn verify_statement(token: &str, jwks: &Jwks) -> Result<Map<String, Value>> {
    let header = jsonwebtoken::decode_header(token).context("issue decoding header")?;
    let Some(kid) = header.kid else {
        bail!("no `kid` in header");
    };
    let Some(key) = jwks.key(&kid) else {
        bail!("key `{kid}` not present in key set");
    };
    if key.kty != "RSA" {
        bail!("key `{kid}` is not an RSA key");
    }
    let (Some(n), Some(e)) = (&key.n, &key.e) else {
        bail!("key `{kid}` is missing RSA components");
    };
    let decoding_key =
        DecodingKey::from_rsa_components(n, e).context("issue building decoding key")?;

    // signature check only: expiry and audience are caller policy
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = jsonwebtoken::decode::<Map<String, Value>>(token, &decoding_key, &validation)
        .context("signature verification failed")?;
    Ok(token_data.claims)
}

/// Verify a self-signed Entity Configuration: the JWT is verified against the
/// JWKS carried in its *own* `jwks` claim.
///
/// Trust in the result is self-referential: it proves the statement was
/// signed by whoever controls the embedded keys, nothing more. Anchoring
/// requires walking a trust chain.
///
/// # Errors
///
/// Returns an error if the token cannot be parsed, carries no `jwks` claim,
/// or fails signature verification against that key set.
pub fn verify_self_signed(token: &str) -> Result<Map<String, Value>> {
    let claims = peek_claims(token)?;
    let jwks = claims.get("jwks").ok_or_else(|| anyhow!("no `jwks` claim in statement"))?;
    let jwks: Jwks =
        serde_json::from_value(jwks.clone()).context("issue deserializing `jwks` claim")?;
    verify_statement(token, &jwks)
}

/// Decode the claims of a compact JWT *without* verifying its signature.
///
/// Used where claims are needed before any key is trusted: extracting the
/// embedded key set of a self-signed configuration, or registering a received
/// Trust Mark whose signature is checked later, at validation time.
///
/// # Errors
///
/// Returns an error if the token is not a three-part compact serialization
/// or the payload is not base64url-encoded JSON.
pub fn peek_claims(token: &str) -> Result<Map<String, Value>> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("token is not in compact JWT serialization");
    };
    let bytes = Base64UrlUnpadded::decode_vec(payload)
        .map_err(|e| anyhow!("issue decoding payload: {e}"))?;
    serde_json::from_slice(&bytes).context("issue deserializing claims")
}
