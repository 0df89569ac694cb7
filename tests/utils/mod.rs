//! Shared fixtures for the integration tests: tracing setup and an
//! in-memory federation whose entities are served without sockets by
//! routing fetches straight to in-process handlers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};

use openid_fed::endpoint;
use openid_fed::jose::KeyManager;
use openid_fed::provider::{Clock, HttpFetch, HttpResponse};
use openid_fed::state::{EntityContext, SubordinateRecord};
use openid_fed::types::{ConfigurationRequest, ConfigurationResponse, FetchRequest, FetchResponse};
use tracing_subscriber::EnvFilter;

/// The fixed epoch instant the test clock reports.
pub const NOW: i64 = 1_700_000_000;

static INIT: Once = Once::new();

/// Initialize the tracing subscriber once per test binary.
pub fn init_tracer() {
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    });
}

/// A set of in-process federation entities addressable by entity identifier.
#[derive(Default)]
pub struct Federation {
    entities: HashMap<String, Arc<EntityContext>>,
}

impl Federation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with a fresh signing key and add it to the
    /// federation under its entity identifier.
    pub fn add_entity(&mut self, name: &str, entity_id: &str) -> Arc<EntityContext> {
        let keys = KeyManager::new(name).expect("should generate key");
        let ctx = Arc::new(EntityContext::new(entity_id, keys));
        self.entities.insert(entity_id.to_string(), Arc::clone(&ctx));
        ctx
    }

    /// Register `subordinate` with `superior`, declaring the subordinate's
    /// current key set.
    pub fn register(superior: &EntityContext, subordinate: &EntityContext) {
        superior.state().add_subordinate(SubordinateRecord {
            entity_id: subordinate.entity_id().to_string(),
            jwks: subordinate.keys().jwks(),
            metadata: None,
            authority_hints: vec![superior.entity_id().to_string()],
            created_at: NOW,
        });
    }

    /// The context of a previously added entity.
    #[must_use]
    pub fn entity(&self, entity_id: &str) -> Arc<EntityContext> {
        Arc::clone(self.entities.get(entity_id).expect("entity should be registered"))
    }

    /// A provider whose clock reads [`NOW`].
    #[must_use]
    pub fn provider(&self) -> FederationProvider {
        self.provider_at(NOW)
    }

    /// A provider whose clock reads the given instant.
    #[must_use]
    pub fn provider_at(&self, now: i64) -> FederationProvider {
        FederationProvider { entities: Arc::new(self.entities.clone()), now }
    }
}

/// Provider routing well-known and fetch URLs to in-process entities.
#[derive(Clone, Debug)]
pub struct FederationProvider {
    entities: Arc<HashMap<String, Arc<EntityContext>>>,
    now: i64,
}

impl Clock for FederationProvider {
    fn now(&self) -> i64 {
        self.now
    }
}

impl HttpFetch for FederationProvider {
    async fn fetch(&self, url: &str) -> anyhow::Result<HttpResponse> {
        if let Some(base) = url.strip_suffix("/.well-known/openid-federation") {
            let Some(ctx) = self.entities.get(base) else {
                return Ok(HttpResponse { status: 404, body: format!("no entity at {base}") });
            };
            let result: openid_fed::Result<ConfigurationResponse> =
                endpoint::handle(ctx.as_ref(), ConfigurationRequest {}, self).await;
            return Ok(match result {
                Ok(response) => HttpResponse { status: 200, body: response.0 },
                Err(e) => HttpResponse { status: e.status(), body: e.to_string() },
            });
        }

        if let Some((base, sub)) = url.split_once("/fetch?sub=") {
            let Some(ctx) = self.entities.get(base) else {
                return Ok(HttpResponse { status: 404, body: format!("no entity at {base}") });
            };
            let sub = urlencoding::decode(sub)?.into_owned();
            let result: openid_fed::Result<FetchResponse> =
                endpoint::handle(ctx.as_ref(), FetchRequest { sub }, self).await;
            return Ok(match result {
                Ok(response) => HttpResponse { status: 200, body: response.0 },
                Err(e) => HttpResponse { status: e.status(), body: e.to_string() },
            });
        }

        Ok(HttpResponse { status: 404, body: format!("unroutable url: {url}") })
    }
}

/// Flip one character in the signature segment of a compact JWT, leaving the
/// header and payload parseable but the signature invalid.
#[must_use]
pub fn tamper_signature(jwt: &str) -> String {
    let mut parts: Vec<String> = jwt.split('.').map(ToString::to_string).collect();
    assert_eq!(parts.len(), 3, "expected compact JWT");
    let mut sig: Vec<u8> = parts[2].bytes().collect();
    let mid = sig.len() / 2;
    sig[mid] = if sig[mid] == b'A' { b'B' } else { b'A' };
    parts[2] = String::from_utf8(sig).expect("ascii");
    parts.join(".")
}
