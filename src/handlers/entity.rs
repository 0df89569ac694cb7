//! # Entity Management Endpoints
//!
//! Operator-facing reads and writes on the entity's own declaration: a
//! summary of current state, and replacement of the declared superiors
//! (`authority_hints`). The first hint is the one followed during chain
//! resolution, so operators with multiple superiors order the relevant one
//! first.

use crate::Result;
use crate::endpoint::{Body, Handler, Request};
use crate::provider::Provider;
use crate::state::EntityContext;
use crate::types::{
    EntityRequest, EntityResponse, SetAuthorityHintsRequest, SetAuthorityHintsResponse,
};

async fn entity(
    ctx: &EntityContext, _provider: &impl Provider, _request: EntityRequest,
) -> Result<EntityResponse> {
    let state = ctx.state();
    Ok(EntityResponse {
        entity_id: ctx.entity_id().to_string(),
        authority_hints: state.authority_hints(),
        subordinates: state.subordinate_ids(),
        issued_trust_marks: state.issued_trust_marks().len(),
        received_trust_marks: state.received_trust_marks().len(),
        metadata: state.metadata(),
    })
}

async fn set_authority_hints(
    ctx: &EntityContext, _provider: &impl Provider, request: SetAuthorityHintsRequest,
) -> Result<SetAuthorityHintsResponse> {
    tracing::info!("replacing authority hints: {:?}", request.authority_hints);
    ctx.state().set_authority_hints(request.authority_hints.clone());

    Ok(SetAuthorityHintsResponse {
        entity_id: ctx.entity_id().to_string(),
        authority_hints: request.authority_hints,
    })
}

impl Handler for Request<EntityRequest> {
    type Response = EntityResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        entity(ctx, provider, self.body)
    }
}

impl Body for EntityRequest {}

impl Handler for Request<SetAuthorityHintsRequest> {
    type Response = SetAuthorityHintsResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        set_authority_hints(ctx, provider, self.body)
    }
}

impl Body for SetAuthorityHintsRequest {}
