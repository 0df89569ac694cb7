//! # Trust Mark Endpoints
//!
//! Issuance and custody of Trust Marks: signed assertions that a subject
//! entity meets the criteria identified by a Trust Mark type URL.
//!
//! Two stores are maintained. `issued` holds marks this entity has minted
//! for others; `received` holds marks other issuers have minted for this
//! entity. A received mark is registered from its signed JWT *without*
//! signature verification: the signature is checked at validation time, when
//! the issuer's keys are available from a resolved trust chain.

use serde_json::{Map, json};

use crate::endpoint::{Body, Handler, Request};
use crate::jose;
use crate::provider::{Clock, Provider};
use crate::state::{EntityContext, TrustMarkRecord};
use crate::types::{
    AddReceivedTrustMarkRequest, GetTrustMarkRequest, IssueTrustMarkRequest,
    ListReceivedTrustMarksRequest, ListReceivedTrustMarksResponse, ListTrustMarksRequest,
    ListTrustMarksResponse, RevokeTrustMarkRequest, RevokeTrustMarkResponse, TrustMarkClaims,
    TrustMarkResponse,
};
use crate::{Result, invalid, not_found, server};

/// Mint a Trust Mark for a subject and record it in the issued store.
///
/// # Errors
///
/// Returns a server error if signing fails.
async fn issue(
    ctx: &EntityContext, provider: &impl Provider, request: IssueTrustMarkRequest,
) -> Result<TrustMarkResponse> {
    let iat = provider.now();
    let expires_at = request.expires_in.map(|secs| iat + secs);

    let mut claims = Map::new();
    claims.insert("iss".to_string(), json!(ctx.entity_id()));
    claims.insert("sub".to_string(), json!(request.subject));
    claims.insert("id".to_string(), json!(request.trust_mark_id));
    claims.insert("iat".to_string(), json!(iat));
    if let Some(exp) = expires_at {
        claims.insert("exp".to_string(), json!(exp));
    }

    let signed_jwt =
        ctx.keys().sign(&claims).map_err(|e| server!("issue signing trust mark: {e}"))?;
    tracing::info!("issued trust mark {} for {}", request.trust_mark_id, request.subject);

    let record = TrustMarkRecord {
        id: request.trust_mark_id,
        issuer: ctx.entity_id().to_string(),
        subject: request.subject,
        issued_at: iat,
        expires_at,
        signed_jwt,
    };
    ctx.state().add_issued_trust_mark(record.clone());

    Ok(TrustMarkResponse(record))
}

async fn list_issued(
    ctx: &EntityContext, _provider: &impl Provider, _request: ListTrustMarksRequest,
) -> Result<ListTrustMarksResponse> {
    Ok(ListTrustMarksResponse(ctx.state().issued_trust_marks()))
}

async fn get_issued(
    ctx: &EntityContext, _provider: &impl Provider, request: GetTrustMarkRequest,
) -> Result<TrustMarkResponse> {
    ctx.state()
        .issued_trust_mark(&request.trust_mark_id)
        .map(TrustMarkResponse)
        .ok_or_else(|| not_found!("unknown trust mark: {}", request.trust_mark_id))
}

/// Remove an issued Trust Mark. Revocation is local only.
async fn revoke(
    ctx: &EntityContext, _provider: &impl Provider, request: RevokeTrustMarkRequest,
) -> Result<RevokeTrustMarkResponse> {
    if !ctx.state().remove_issued_trust_mark(&request.trust_mark_id) {
        return Err(not_found!("unknown trust mark: {}", request.trust_mark_id));
    }
    tracing::info!("revoked trust mark {}", request.trust_mark_id);
    Ok(RevokeTrustMarkResponse { trust_mark_id: request.trust_mark_id })
}

/// Register a Trust Mark issued to this entity.
///
/// The JWT is parsed without signature verification, as the issuer's keys
/// are not known here. The mark must name this entity as its subject.
///
/// # Errors
///
/// Returns `InvalidRequest` when the JWT cannot be parsed or its subject is
/// not this entity.
async fn add_received(
    ctx: &EntityContext, _provider: &impl Provider, request: AddReceivedTrustMarkRequest,
) -> Result<TrustMarkResponse> {
    let claims = jose::peek_claims(&request.signed_jwt)
        .and_then(TrustMarkClaims::from_claims)
        .map_err(|e| invalid!("unparseable trust mark: {e}"))?;

    if claims.sub != ctx.entity_id() {
        return Err(invalid!(
            "trust mark subject {} does not match entity {}",
            claims.sub,
            ctx.entity_id()
        ));
    }

    let record = TrustMarkRecord {
        id: claims.id,
        issuer: claims.iss,
        subject: claims.sub,
        issued_at: claims.iat,
        expires_at: claims.exp,
        signed_jwt: request.signed_jwt,
    };
    ctx.state().add_received_trust_mark(record.clone());

    Ok(TrustMarkResponse(record))
}

async fn list_received(
    ctx: &EntityContext, _provider: &impl Provider, _request: ListReceivedTrustMarksRequest,
) -> Result<ListReceivedTrustMarksResponse> {
    Ok(ListReceivedTrustMarksResponse(ctx.state().received_trust_marks()))
}

impl Handler for Request<IssueTrustMarkRequest> {
    type Response = TrustMarkResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        issue(ctx, provider, self.body)
    }

    fn validate(
        &self, _ctx: &EntityContext, _provider: &impl Provider,
    ) -> impl Future<Output = Result<()>> + Send {
        async {
            if self.body.trust_mark_id.is_empty() {
                return Err(invalid!("missing `trust_mark_id`"));
            }
            if self.body.subject.is_empty() {
                return Err(invalid!("missing `subject`"));
            }
            Ok(())
        }
    }
}

impl Body for IssueTrustMarkRequest {}

impl Handler for Request<ListTrustMarksRequest> {
    type Response = ListTrustMarksResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        list_issued(ctx, provider, self.body)
    }
}

impl Body for ListTrustMarksRequest {}

impl Handler for Request<GetTrustMarkRequest> {
    type Response = TrustMarkResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        get_issued(ctx, provider, self.body)
    }
}

impl Body for GetTrustMarkRequest {}

impl Handler for Request<RevokeTrustMarkRequest> {
    type Response = RevokeTrustMarkResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        revoke(ctx, provider, self.body)
    }
}

impl Body for RevokeTrustMarkRequest {}

impl Handler for Request<AddReceivedTrustMarkRequest> {
    type Response = TrustMarkResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        add_received(ctx, provider, self.body)
    }

    fn validate(
        &self, _ctx: &EntityContext, _provider: &impl Provider,
    ) -> impl Future<Output = Result<()>> + Send {
        async {
            if self.body.signed_jwt.is_empty() {
                return Err(invalid!("missing `signed_jwt`"));
            }
            Ok(())
        }
    }
}

impl Body for AddReceivedTrustMarkRequest {}

impl Handler for Request<ListReceivedTrustMarksRequest> {
    type Response = ListReceivedTrustMarksResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        list_received(ctx, provider, self.body)
    }
}

impl Body for ListReceivedTrustMarksRequest {}
