//! # Trust Chain Resolution
//!
//! Given a target entity URL and an expected trust anchor, walk the
//! federation graph upward through authority hints, fetching and
//! cryptographically verifying each statement, and produce an ordered chain
//! proving the target is anchored at the expected root.
//!
//! The walk alternates two verifications. An Entity Configuration is
//! self-signed, so it is verified against the key set embedded in its own
//! claims; trust in it comes from the Subordinate Statement the next
//! superior issues about it, which is verified against *that* superior's
//! published keys. The chain is complete when the superior is the expected
//! anchor.
//!
//! Resolution never fails with an error value: fetch, verification, and
//! structural failures (cycles, hop exhaustion, anchor mismatch) are folded
//! into the returned [`ChainResult`] so the caller always receives the full
//! audit trail of the attempt.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::jose::{self, Jwks};
use crate::provider::Provider;
use crate::types::{EntityStatement, Statement};

/// Hard cap on upward hops during resolution.
pub const MAX_HOPS: usize = 10;

/// The well-known path Entity Configurations are published at.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-federation";

/// The outcome of a resolution attempt.
///
/// `statements` holds every statement verified before the attempt ended, in
/// chain order: the target's Entity Configuration first, then for each hop
/// the superior's Entity Configuration followed by its Subordinate Statement
/// about the previous entity. On failure `valid` is `false` and `errors`
/// describes the hop that ended the walk.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ChainResult {
    /// `true` when the chain reaches the expected trust anchor with every
    /// signature verified.
    pub valid: bool,

    /// The verified statements, in chain order.
    pub statements: Vec<Statement>,

    /// Descriptions of the failures that ended the walk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    /// Progress notes, one per verification step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl ChainResult {
    fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{message}");
        self.messages.push(message);
    }

    fn fail(mut self, error: impl Into<String>) -> Self {
        let error = error.into();
        tracing::warn!("resolution failed: {error}");
        self.errors.push(error);
        self.valid = false;
        self
    }

    fn succeed(mut self, message: impl Into<String>) -> Self {
        self.note(message);
        self.valid = true;
        self
    }
}

/// Resolve the trust chain from `target_url` to the trust anchor at
/// `anchor_url`.
///
/// The anchor's identity is established dynamically: its Entity
/// Configuration is fetched and the `iss` claim is taken as the identity the
/// walk must terminate at.
///
/// No entity state is read or mutated. Resolution depends only on what the
/// network serves, so concurrent resolutions need no coordination.
pub async fn resolve(provider: &impl Provider, target_url: &str, anchor_url: &str) -> ChainResult {
    let mut chain = ChainResult::default();
    tracing::info!("resolving {target_url} against trust anchor {anchor_url}");

    // (the target's configuration is verified against its own embedded keys)
    let target = match fetch_configuration(provider, target_url).await {
        Ok(config) => config,
        Err(e) => return chain.fail(format!("target fetch/verify failed for {target_url}: {e}")),
    };
    let mut current_id = target.iss.clone();
    let mut hints = target.authority_hints.clone();
    chain.note(format!("verified entity configuration for {current_id}"));
    chain.statements.push(Statement::EntityConfiguration(target));

    let mut visited = HashSet::new();
    visited.insert(current_id.clone());

    let anchor_id = match resolve_anchor_id(provider, anchor_url).await {
        Ok(id) => id,
        Err(e) => {
            return chain.fail(format!("trust anchor lookup failed for {anchor_url}: {e}"));
        }
    };
    chain.note(format!("trust anchor identity is {anchor_id}"));

    if hints.is_empty() {
        if current_id == anchor_id {
            return chain.succeed(format!("entity {current_id} is the trust anchor"));
        }
        return chain
            .fail(format!("{current_id} declares no authority hints and is not the trust anchor"));
    }

    let mut hops = 0;
    while !hints.is_empty() && hops < MAX_HOPS {
        hops += 1;

        // only the first hint is followed; entities with several superiors
        // order the relevant one first
        let superior_url = hints[0].clone();
        if hints.len() > 1 {
            tracing::debug!("ignoring alternate authority hints: {:?}", &hints[1..]);
        }
        if visited.contains(&superior_url) {
            return chain.fail(format!("cycle detected at {superior_url}"));
        }

        let superior = match fetch_configuration(provider, &superior_url).await {
            Ok(config) => config,
            Err(e) => {
                return chain.fail(format!("superior fetch failed for {superior_url}: {e}"));
            }
        };
        let superior_id = superior.iss.clone();
        if visited.contains(&superior_id) {
            return chain.fail(format!("cycle detected at {superior_id}"));
        }
        let Some(superior_jwks) = superior.jwks.clone() else {
            return chain.fail(format!("configuration for {superior_id} carries no jwks"));
        };
        let superior_hints = superior.authority_hints.clone();
        chain.note(format!("verified entity configuration for {superior_id}"));
        chain.statements.push(Statement::EntityConfiguration(superior));
        visited.insert(superior_id.clone());

        let statement =
            match fetch_subordinate(provider, &superior_url, &current_id, &superior_jwks).await {
                Ok(statement) => statement,
                Err(e) => {
                    return chain.fail(format!(
                        "subordinate statement fetch failed from {superior_url} for {current_id}: {e}"
                    ));
                }
            };
        if statement.iss != superior_id {
            return chain.fail(format!(
                "issuer mismatch: statement issued by {} but expected {superior_id}",
                statement.iss
            ));
        }
        if statement.sub != current_id {
            return chain.fail(format!(
                "subject mismatch: statement is about {} but expected {current_id}",
                statement.sub
            ));
        }
        chain.note(format!("verified subordinate statement {superior_id} -> {current_id}"));
        chain.statements.push(Statement::Subordinate(statement));

        if superior_id == anchor_id {
            return chain.succeed(format!("reached trust anchor {anchor_id}"));
        }

        current_id = superior_id;
        hints = superior_hints;
        if hints.is_empty() {
            if current_id == anchor_id {
                return chain.succeed(format!("reached trust anchor {anchor_id}"));
            }
            return chain.fail(format!(
                "reached terminal entity {current_id} without reaching trust anchor {anchor_id}"
            ));
        }
    }

    chain.fail(format!("hop limit exceeded after {MAX_HOPS} hops"))
}

/// Establish the trust anchor's entity identifier by fetching its Entity
/// Configuration and reading the `iss` claim.
async fn resolve_anchor_id(provider: &impl Provider, anchor_url: &str) -> Result<String> {
    let config = fetch_configuration(provider, anchor_url).await?;
    Ok(config.iss)
}

/// Fetch an entity's self-signed Entity Configuration from its well-known
/// path and verify it against the key set embedded in its own claims.
async fn fetch_configuration(provider: &impl Provider, entity_url: &str) -> Result<EntityStatement> {
    let url = format!("{}{WELL_KNOWN_PATH}", entity_url.trim_end_matches('/'));
    let body = get(provider, &url).await?;
    let claims = jose::verify_self_signed(&body)?;
    EntityStatement::from_claims(claims)
}

/// Fetch the superior's Subordinate Statement about `sub_id` and verify it
/// against the superior's published key set.
async fn fetch_subordinate(
    provider: &impl Provider, superior_url: &str, sub_id: &str, superior_jwks: &Jwks,
) -> Result<EntityStatement> {
    let url = format!(
        "{}/fetch?sub={}",
        superior_url.trim_end_matches('/'),
        urlencoding::encode(sub_id)
    );
    let body = get(provider, &url).await?;
    let claims = jose::verify_statement(&body, superior_jwks)?;
    EntityStatement::from_claims(claims)
}

async fn get(provider: &impl Provider, url: &str) -> Result<String> {
    let response = provider.fetch(url).await.with_context(|| format!("issue fetching {url}"))?;
    if !response.is_success() {
        bail!("unexpected status {} from {url}", response.status);
    }
    Ok(response.body)
}
