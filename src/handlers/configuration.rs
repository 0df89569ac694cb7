//! # Entity Configuration Endpoint
//!
//! Serves the entity's self-signed Entity Configuration: a compact JWT in
//! which `iss == sub == entity_id` and whose `jwks` claim carries the
//! entity's own public key set. Published at
//! `/.well-known/openid-federation` per the federation discovery contract.
//!
//! The configuration lists the entity's declared superiors
//! (`authority_hints`) and the raw JWTs of Trust Marks issued *to* this
//! entity (`trust_marks`), so resolvers and validators can work from this
//! one document.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::endpoint::{Body, Handler, Request};
use crate::provider::{Clock, Provider};
use crate::state::EntityContext;
use crate::types::{ConfigurationRequest, ConfigurationResponse, STATEMENT_LIFETIME};
use crate::{Result, server};

/// Build and sign the entity's Entity Configuration.
///
/// # Errors
///
/// Returns a server error if signing fails.
async fn configuration(
    ctx: &EntityContext, provider: &impl Provider, _request: ConfigurationRequest,
) -> Result<ConfigurationResponse> {
    let iat = provider.now();
    let entity_id = ctx.entity_id();

    let mut claims = Map::new();
    claims.insert("iss".to_string(), json!(entity_id));
    claims.insert("sub".to_string(), json!(entity_id));
    claims.insert("iat".to_string(), json!(iat));
    claims.insert("exp".to_string(), json!(iat + STATEMENT_LIFETIME));
    claims.insert("jti".to_string(), json!(Uuid::new_v4().to_string()));
    claims.insert(
        "jwks".to_string(),
        serde_json::to_value(ctx.keys().jwks())
            .map_err(|e| server!("issue serializing jwks: {e}"))?,
    );

    let declared = ctx.state().metadata();
    let metadata = if declared.is_empty() {
        // advertise the entity's own federation endpoints
        json!({
            "federation_entity": {
                "federation_fetch_endpoint": ctx.fetch_endpoint(),
                "federation_list_endpoint": ctx.list_endpoint(),
            }
        })
    } else {
        Value::Object(declared)
    };
    claims.insert("metadata".to_string(), metadata);

    let hints = ctx.state().authority_hints();
    if !hints.is_empty() {
        claims.insert("authority_hints".to_string(), json!(hints));
    }

    let marks: Vec<String> = ctx
        .state()
        .received_trust_marks()
        .into_iter()
        .filter(|record| record.subject == entity_id)
        .map(|record| record.signed_jwt)
        .collect();
    if !marks.is_empty() {
        claims.insert("trust_marks".to_string(), json!(marks));
    }

    let jwt = ctx
        .keys()
        .sign(&claims)
        .map_err(|e| server!("issue signing entity configuration: {e}"))?;

    Ok(ConfigurationResponse(jwt))
}

impl Handler for Request<ConfigurationRequest> {
    type Response = ConfigurationResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        configuration(ctx, provider, self.body)
    }
}

impl Body for ConfigurationRequest {}
