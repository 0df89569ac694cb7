//! # List Endpoint
//!
//! Serves the entity identifiers of all registered subordinates, as a JSON
//! array. This is the listing advertised by the `federation_list_endpoint`
//! member of the entity's default metadata.

use crate::Result;
use crate::endpoint::{Body, Handler, Request};
use crate::provider::Provider;
use crate::state::EntityContext;
use crate::types::{ListRequest, ListResponse};

async fn list(
    ctx: &EntityContext, _provider: &impl Provider, _request: ListRequest,
) -> Result<ListResponse> {
    Ok(ListResponse(ctx.state().subordinate_ids()))
}

impl Handler for Request<ListRequest> {
    type Response = ListResponse;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        list(ctx, provider, self.body)
    }
}

impl Body for ListRequest {}
