//! # Endpoint
//!
//! `handle` is the entry point for federation entity operations. Requests are
//! routed to the appropriate handler for processing, returning a reply that
//! can be serialized to a JSON object (or, for the statement-serving
//! operations, a compact JWT).

use std::fmt::Debug;

use crate::Result;
use crate::provider::Provider;
use crate::state::EntityContext;

/// Handle an incoming request.
///
/// # Errors
///
/// This method can fail for a number of reasons related to the incoming
/// request's viability. Expected failures include missing parameters,
/// unknown subordinates or Trust Marks, and signing failures.
///
/// Implementers should look to the `Error` type and description for more
/// information on the reason for failure.
pub async fn handle<T, U>(
    ctx: &EntityContext, request: impl Into<Request<T>>, provider: &impl Provider,
) -> Result<U>
where
    T: Body,
    Request<T>: Handler<Response = U>,
{
    let request: Request<T> = request.into();
    request.validate(ctx, provider).await?;
    request.handle(ctx, provider).await
}

/// A request to process.
#[derive(Clone, Debug)]
pub struct Request<T: Body> {
    /// The request to process.
    pub body: T,
}

impl<T: Body> From<T> for Request<T> {
    fn from(body: T) -> Self {
        Self { body }
    }
}

/// Methods common to all requests.
///
/// The primary role of this trait is to provide a common interface for
/// requests so they can be processed by the [`handle`] method.
pub trait Handler: Clone + Debug + Send + Sync {
    /// The inner reply type specific to the implementing request.
    type Response;

    /// Routes the request to the concrete handler used to process it.
    fn handle(
        self, ctx: &EntityContext, provider: &impl Provider,
    ) -> impl Future<Output = Result<Self::Response>> + Send;

    /// Perform initial validation of the request.
    ///
    /// Validation undertaken here is common to all requests, with
    /// request-specific validation performed by the request's handler.
    fn validate(
        &self, ctx: &EntityContext, _provider: &impl Provider,
    ) -> impl Future<Output = Result<()>> + Send {
        async {
            if ctx.entity_id().is_empty() {
                return Err(crate::invalid!("no entity identifier configured"));
            }
            Ok(())
        }
    }
}

pub(crate) use seal::Body;
pub(crate) mod seal {
    use std::fmt::Debug;

    /// The `Body` trait is used to restrict the types able to be a `Request`
    /// body. It is implemented by all `xxxRequest` types.
    pub trait Body: Clone + Debug + Send + Sync {}
}
