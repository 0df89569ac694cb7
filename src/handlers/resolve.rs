//! # Resolve Endpoint
//!
//! Surfaces trust chain resolution as an entity operation. The response is
//! the complete [`ChainResult`] whether or not the chain proved valid, so
//! shells return it with a 200 regardless and clients inspect `valid`.

use crate::endpoint::{Body, Handler, Request};
use crate::provider::Provider;
use crate::resolver::{self, ChainResult};
use crate::state::EntityContext;
use crate::types::ResolveRequest;
use crate::{Result, invalid};

async fn resolve(
    _ctx: &EntityContext, provider: &impl Provider, request: ResolveRequest,
) -> Result<ChainResult> {
    Ok(resolver::resolve(provider, &request.sub, &request.trust_anchor).await)
}

impl Handler for Request<ResolveRequest> {
    type Response = ChainResult;

    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send {
        resolve(ctx, provider, self.body)
    }

    fn validate(
        &self, _ctx: &EntityContext, _provider: &impl Provider,
    ) -> impl Future<Output = Result<()>> + Send {
        async {
            if self.body.sub.is_empty() {
                return Err(invalid!("missing `sub` parameter"));
            }
            if self.body.trust_anchor.is_empty() {
                return Err(invalid!("missing `trust_anchor` parameter"));
            }
            Ok(())
        }
    }
}

impl Body for ResolveRequest {}
