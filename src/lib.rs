//! An API for federated trust establishment based on the
//! [OpenID Federation](https://openid.net/specs/openid-federation-1_0.html)
//! specification.
//!
//! # OpenID Federation
//!
//! This library implements the core of a federation entity: a principal,
//! identified by a URL, that publishes a self-signed Entity Configuration,
//! registers subordinates, issues Trust Marks, and proves membership in a
//! federation by resolving a trust chain to a common Trust Anchor.
//!
//! Independently operated entities form a rooted graph. Each entity declares
//! its superiors through `authority_hints`; a resolver walks those hints
//! upward, verifying the self-signed configuration of each entity and the
//! Subordinate Statement its superior issues about it, until the expected
//! anchor is reached.
//!
//! # Design
//!
//! **Endpoints**
//!
//! The library is architected around entity operations, each with its own
//! `XxxRequest` and `XxxResponse` types that serialize to and from JSON. The
//! operations are designed to be surfaced by Rust-based HTTP servers, such
//! as [axum](https://docs.rs/axum/latest/axum/), with a few lines of
//! wrapper code per route. See `demos/entity.rs` for a complete shell.
//!
//! **Providers**
//!
//! The core performs no I/O of its own. Implementors supply a `Provider`
//! realizing the [`provider::HttpFetch`] and [`provider::Clock`] traits;
//! resolution fetches remote statements and reads the time exclusively
//! through it.
//!
//! # Example
//!
//! ```rust,ignore
//! let keys = jose::KeyManager::new("op")?;
//! let ctx = EntityContext::new("https://op.example.com", keys);
//! ctx.state().add_authority_hint("https://anchor.example.com");
//!
//! // serve the self-signed Entity Configuration
//! let jwt: ConfigurationResponse =
//!     endpoint::handle(&ctx, ConfigurationRequest {}, &provider).await?;
//!
//! // prove the entity chains up to the anchor
//! let chain = resolver::resolve(&provider, "https://op.example.com",
//!     "https://anchor.example.com").await;
//! assert!(chain.valid);
//! ```

pub mod endpoint;
mod error;
mod handlers;
pub mod jose;
pub mod provider;
pub mod resolver;
pub mod state;
pub mod trust_mark;
pub mod types;

pub use error::Error;

/// Result type for federation entity operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
