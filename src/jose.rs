//! # JSON Object Signing (JOSE)
//!
//! Key custody and compact-JWT signing and verification for federation
//! statements, per JWT [RFC7519], JWS [RFC7515], and JWK [RFC7517].
//!
//! Every entity signs with a process-local RSA-2048 key pair whose public
//! half is published as a JWK inside the entity's own Entity Configuration.
//! Verifiers select keys by `kid` and accept `RS256` only.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

pub mod jwk;
pub mod jws;

pub use jwk::{Jwks, PublicKeyJwk};
pub use jws::{KeyManager, peek_claims, verify_self_signed, verify_statement};
