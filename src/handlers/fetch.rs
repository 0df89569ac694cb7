//! # Fetch Endpoint
//!
//! Serves Subordinate Statements: compact JWTs in which this entity
//! (`iss`) asserts the registered key set and metadata of a named
//! subordinate (`sub`). Resolvers fetch these while walking a trust chain
//! upward, verifying each against the superior's published keys.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::endpoint::{Body, Handler, Request};
use crate::provider::{Clock, Provider};
use crate::state::EntityContext;
use crate::types::{FetchRequest, FetchResponse, STATEMENT_LIFETIME};
use crate::{Result, invalid, not_found, server};

/// Build and sign a Subordinate Statement about the requested subordinate.
///
/// # Errors
///
/// Returns `NotFound` when no subordinate with the requested identifier is
/// registered, and a server error if signing fails.
async fn fetch(
    ctx: &EntityContext, provider: &impl Provider, request: FetchRequest,
) -> Result<FetchResponse> {
    let Some(record) = ctx.state().subordinate(&request.sub) else {
        return Err(not_found!("unknown subordinate: {}", request.sub));
    };

    let iat = provider.now();
    let mut claims = Map::new();
    claims.insert("iss".to_string(), json!(ctx.entity_id()));
    claims.insert("sub".to_string(), json!(record.entity_id));
    claims.insert("aud".to_string(), json!(record.entity_id));
    claims.insert("iat".to_string(), json!(iat));
    claims.insert("exp".to_string(), json!(iat + STATEMENT_LIFETIME));
    claims.insert("jti".to_string(), json!(Uuid::new_v4().to_string()));
    claims.insert(
        "jwks".to_string(),
        serde_json::to_value(record.jwks).map_err(|e| server!("issue serializing jwks: {e}"))?,
    );
    if let Some(metadata) = record.metadata {
        claims.insert("metadata".to_string(), Value::Object(metadata));
    }
    claims.insert(
        "source_endpoint".to_string(),
        json!(format!("{}?sub={}", ctx.fetch_endpoint(), record.entity_id)),
    );

    let jwt = ctx
        .keys()
        .sign(&claims)
        .map_err(|e| server!("issue signing subordinate statement: {e}"))?;

    Ok(FetchResponse(jwt))
}

impl Handler for Request<FetchRequest> {
    type Response = FetchResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        fetch(ctx, provider, self.body)
    }

    fn validate(
        &self, _ctx: &EntityContext, _provider: &impl Provider,
    ) -> impl Future<Output = Result<()>> + Send {
        async {
            if self.body.sub.is_empty() {
                return Err(invalid!("missing `sub` parameter"));
            }
            Ok(())
        }
    }
}

impl Body for FetchRequest {}
