//! # Trust Mark Validation
//!
//! Validates the Trust Marks carried in an Entity Configuration against a
//! resolved trust chain: a mark is accepted only when it names the expected
//! subject, has not expired, and its signature verifies against the
//! published key set of an issuer whose statement appears in the chain.
//!
//! Statements enter a chain in configuration-before-subordinate-statement
//! order, so the first chain element matching an issuer is that issuer's own
//! Entity Configuration, the one carrying its signing keys.

use serde::{Deserialize, Serialize};

use crate::jose;
use crate::provider::Clock;
use crate::types::{EntityStatement, Statement, TrustMarkClaims};

/// The validation outcome for one Trust Mark.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TrustMarkValidation {
    /// The Trust Mark type identifier, when the mark parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_mark_id: Option<String>,

    /// Entity identifier of the issuer, when the mark parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Entity identifier of the subject, when the mark parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// `true` when every check passed.
    pub valid: bool,

    /// Why validation failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrustMarkValidation {
    fn invalid(error: impl Into<String>) -> Self {
        Self { valid: false, error: Some(error.into()), ..Self::default() }
    }

    fn with_claims(mut self, claims: &TrustMarkClaims) -> Self {
        self.trust_mark_id = Some(claims.id.clone());
        self.issuer = Some(claims.iss.clone());
        self.subject = Some(claims.sub.clone());
        self
    }
}

/// Validate every Trust Mark carried in `entity_config` against the supplied
/// chain, returning one result per mark (an empty list when the
/// configuration carries none).
pub fn validate_trust_marks(
    entity_config: &EntityStatement, expected_subject: &str, chain: &[Statement],
    clock: &impl Clock,
) -> Vec<TrustMarkValidation> {
    let Some(marks) = &entity_config.trust_marks else {
        return Vec::new();
    };
    marks.iter().map(|jwt| validate_one(jwt, expected_subject, chain, clock.now())).collect()
}

fn validate_one(
    signed_jwt: &str, expected_subject: &str, chain: &[Statement], now: i64,
) -> TrustMarkValidation {
    let claims = match jose::peek_claims(signed_jwt).and_then(TrustMarkClaims::from_claims) {
        Ok(claims) => claims,
        Err(e) => return TrustMarkValidation::invalid(format!("unparseable trust mark: {e}")),
    };
    let result = TrustMarkValidation::default().with_claims(&claims);

    if claims.sub != expected_subject {
        return TrustMarkValidation::invalid(format!(
            "subject mismatch: mark is about {} but expected {expected_subject}",
            claims.sub
        ))
        .with_claims(&claims);
    }

    if let Some(exp) = claims.exp {
        if exp < now {
            return TrustMarkValidation::invalid(format!("trust mark expired at {exp}"))
                .with_claims(&claims);
        }
    }

    let Some(issuer_statement) = chain.iter().find(|s| s.claims().iss == claims.iss) else {
        return TrustMarkValidation::invalid(format!("issuer {} not in chain", claims.iss))
            .with_claims(&claims);
    };
    let Some(issuer_jwks) = &issuer_statement.claims().jwks else {
        return TrustMarkValidation::invalid(format!(
            "no jwks published for issuer {}",
            claims.iss
        ))
        .with_claims(&claims);
    };

    if let Err(e) = jose::verify_statement(signed_jwt, issuer_jwks) {
        return TrustMarkValidation::invalid(format!("signature verification failed: {e}"))
            .with_claims(&claims);
    }

    TrustMarkValidation { valid: true, ..result }
}
