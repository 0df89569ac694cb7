//! # Subordinate Management Endpoints
//!
//! Registration and maintenance of the entities this one is an authority
//! for. A registration records the subordinate's entity identifier, its
//! declared public key set, optional metadata, and the superiors it
//! declares. The registrar always appears in the stored `authority_hints`:
//! it is injected when the caller omits it.

use crate::endpoint::{Body, Handler, Request};
use crate::provider::{Clock, Provider};
use crate::state::{EntityContext, SubordinateRecord};
use crate::types::{
    DeleteSubordinateRequest, DeleteSubordinateResponse, GetSubordinateRequest,
    ListSubordinatesRequest, ListSubordinatesResponse, SubordinateResponse,
    UpdateSubordinateRequest, UpsertSubordinateRequest, UpsertSubordinateResponse,
};
use crate::{Result, invalid, not_found};

fn with_registrar(mut hints: Vec<String>, registrar: &str) -> Vec<String> {
    if !hints.iter().any(|hint| hint == registrar) {
        hints.push(registrar.to_string());
    }
    hints
}

async fn list_subordinates(
    ctx: &EntityContext, _provider: &impl Provider, _request: ListSubordinatesRequest,
) -> Result<ListSubordinatesResponse> {
    Ok(ListSubordinatesResponse(ctx.state().subordinates()))
}

/// Register a subordinate; replaces any existing registration with the same
/// entity identifier. The original registration time is preserved across
/// replacement.
async fn upsert_subordinate(
    ctx: &EntityContext, provider: &impl Provider, request: UpsertSubordinateRequest,
) -> Result<UpsertSubordinateResponse> {
    let created_at = ctx
        .state()
        .subordinate(&request.entity_id)
        .map_or_else(|| provider.now(), |existing| existing.created_at);

    let record = SubordinateRecord {
        entity_id: request.entity_id.clone(),
        jwks: request.jwks,
        metadata: request.metadata,
        authority_hints: with_registrar(request.authority_hints, ctx.entity_id()),
        created_at,
    };
    let replaced = ctx.state().add_subordinate(record);

    Ok(UpsertSubordinateResponse { entity_id: request.entity_id, replaced })
}

/// Replace an existing registration. Unlike the upsert path, an unknown
/// subordinate is an error.
async fn update_subordinate(
    ctx: &EntityContext, _provider: &impl Provider, request: UpdateSubordinateRequest,
) -> Result<SubordinateResponse> {
    let Some(existing) = ctx.state().subordinate(&request.entity_id) else {
        return Err(not_found!("unknown subordinate: {}", request.entity_id));
    };

    let record = SubordinateRecord {
        entity_id: request.entity_id.clone(),
        jwks: request.jwks,
        metadata: request.metadata,
        authority_hints: with_registrar(request.authority_hints, ctx.entity_id()),
        created_at: existing.created_at,
    };
    if !ctx.state().replace_subordinate(record.clone()) {
        // removed between the read and the write
        return Err(not_found!("unknown subordinate: {}", request.entity_id));
    }

    Ok(SubordinateResponse(record))
}

async fn get_subordinate(
    ctx: &EntityContext, _provider: &impl Provider, request: GetSubordinateRequest,
) -> Result<SubordinateResponse> {
    ctx.state()
        .subordinate(&request.entity_id)
        .map(SubordinateResponse)
        .ok_or_else(|| not_found!("unknown subordinate: {}", request.entity_id))
}

async fn delete_subordinate(
    ctx: &EntityContext, _provider: &impl Provider, request: DeleteSubordinateRequest,
) -> Result<DeleteSubordinateResponse> {
    if !ctx.state().remove_subordinate(&request.entity_id) {
        return Err(not_found!("unknown subordinate: {}", request.entity_id));
    }
    Ok(DeleteSubordinateResponse { entity_id: request.entity_id })
}

impl Handler for Request<ListSubordinatesRequest> {
    type Response = ListSubordinatesResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        list_subordinates(ctx, provider, self.body)
    }
}

impl Body for ListSubordinatesRequest {}

impl Handler for Request<UpsertSubordinateRequest> {
    type Response = UpsertSubordinateResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        upsert_subordinate(ctx, provider, self.body)
    }

    fn validate(
        &self, _ctx: &EntityContext, _provider: &impl Provider,
    ) -> impl Future<Output = Result<()>> + Send {
        async {
            if self.body.entity_id.is_empty() {
                return Err(invalid!("missing `entity_id`"));
            }
            Ok(())
        }
    }
}

impl Body for UpsertSubordinateRequest {}

impl Handler for Request<UpdateSubordinateRequest> {
    type Response = SubordinateResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        update_subordinate(ctx, provider, self.body)
    }

    fn validate(
        &self, _ctx: &EntityContext, _provider: &impl Provider,
    ) -> impl Future<Output = Result<()>> + Send {
        async {
            if self.body.entity_id.is_empty() {
                return Err(invalid!("missing `entity_id`"));
            }
            Ok(())
        }
    }
}

impl Body for UpdateSubordinateRequest {}

impl Handler for Request<GetSubordinateRequest> {
    type Response = SubordinateResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        get_subordinate(ctx, provider, self.body)
    }
}

impl Body for GetSubordinateRequest {}

impl Handler for Request<DeleteSubordinateRequest> {
    type Response = DeleteSubordinateResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        delete_subordinate(ctx, provider, self.body)
    }
}

impl Body for DeleteSubordinateRequest {}
