//! # Provider
//!
//! Traits for the external collaborators of the federation core. The core
//! never opens sockets or reads the system clock itself: resolution fetches
//! remote statements through [`HttpFetch`] and all timestamps come from
//! [`Clock`]. Implementations are supplied by the hosting shell (an HTTP
//! server, a test fixture, a CLI).

use std::fmt::Debug;

use anyhow::Result;

/// Provider is implemented by the hosting shell to supply the federation
/// core with external services.
pub trait Provider: HttpFetch + Clock + Clone + Debug + Send + Sync {}

impl<T> Provider for T where T: HttpFetch + Clock + Clone + Debug + Send + Sync {}

/// The result of an HTTP GET issued through [`HttpFetch`].
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code of the response.
    pub status: u16,

    /// Response body, decoded as UTF-8.
    pub body: String,
}

impl HttpResponse {
    /// `true` when the response carries a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// `HttpFetch` issues HTTP GET requests on behalf of the core.
///
/// Implementations MUST be safe for concurrent use; the core may fetch from
/// multiple in-flight resolutions at once. Transport-level failures are
/// returned as errors; non-2xx statuses are returned as a normal
/// [`HttpResponse`] for the caller to interpret.
pub trait HttpFetch: Send + Sync {
    /// Fetch the given URL, returning the response status and body.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// `Clock` supplies the current time as seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// The current time, in seconds since the Unix epoch.
    fn now(&self) -> i64;
}
