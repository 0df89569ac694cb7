//! Tests for trust chain resolution.

mod utils;

use std::sync::OnceLock;

use openid_fed::provider::{Clock, HttpFetch, HttpResponse};
use openid_fed::resolver;
use openid_fed::types::Statement;
use serde_json::json;
use utils::{Federation, FederationProvider};

const ANCHOR: &str = "https://a.example.com";
const LEAF: &str = "https://b.example.com";
const EDUGAIN: &str = "https://edugain.example.com";
const SWAMID: &str = "https://swamid.example.com";
const UMU: &str = "https://umu.example.com";
const OP_UMU: &str = "https://op.umu.example.com";
const UNRELATED: &str = "https://unrelated.example.com";

/// One federation hosting every topology under test: a two-node anchor pair
/// (plus a second subordinate), a four-node line, an unrelated anchor, a
/// two-node cycle, and a twelve-node chain for the hop cap.
fn federation() -> &'static Federation {
    static FEDERATION: OnceLock<Federation> = OnceLock::new();
    FEDERATION.get_or_init(|| {
        let mut federation = Federation::new();

        let a = federation.add_entity("a", ANCHOR);
        let b = federation.add_entity("b", LEAF);
        let x = federation.add_entity("x", "https://x.example.com");
        b.state().add_authority_hint(ANCHOR);
        x.state().add_authority_hint(ANCHOR);
        Federation::register(&a, &b);
        Federation::register(&a, &x);

        let edugain = federation.add_entity("edugain", EDUGAIN);
        let swamid = federation.add_entity("swamid", SWAMID);
        let umu = federation.add_entity("umu", UMU);
        let op = federation.add_entity("op-umu", OP_UMU);
        swamid.state().add_authority_hint(EDUGAIN);
        umu.state().add_authority_hint(SWAMID);
        op.state().add_authority_hint(UMU);
        Federation::register(&edugain, &swamid);
        Federation::register(&swamid, &umu);
        Federation::register(&umu, &op);

        federation.add_entity("unrelated", UNRELATED);

        let c1 = federation.add_entity("c1", "https://c1.example.com");
        let c2 = federation.add_entity("c2", "https://c2.example.com");
        c1.state().add_authority_hint("https://c2.example.com");
        c2.state().add_authority_hint("https://c1.example.com");
        Federation::register(&c1, &c2);
        Federation::register(&c2, &c1);

        let hop_ids: Vec<String> =
            (0..12).map(|i| format!("https://h{i}.example.com")).collect();
        let hops: Vec<_> = hop_ids
            .iter()
            .enumerate()
            .map(|(i, id)| federation.add_entity(&format!("h{i}"), id))
            .collect();
        for i in 0..11 {
            hops[i].state().add_authority_hint(&hop_ids[i + 1]);
            Federation::register(&hops[i + 1], &hops[i]);
        }

        federation
    })
}

#[tokio::test]
async fn two_node_anchor() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, LEAF, ANCHOR).await;

    assert!(chain.valid, "errors: {:?}", chain.errors);
    assert_eq!(chain.statements.len(), 3);
    assert!(chain.statements[0].is_entity_configuration());
    assert_eq!(chain.statements[0].claims().iss, LEAF);
    assert!(chain.statements[1].is_entity_configuration());
    assert_eq!(chain.statements[1].claims().iss, ANCHOR);

    let Statement::Subordinate(last) = &chain.statements[2] else {
        panic!("last element should be a subordinate statement");
    };
    assert_eq!(last.iss, ANCHOR);
    assert_eq!(last.sub, LEAF);
    assert_eq!(last.aud.as_deref(), Some(LEAF));
}

#[tokio::test]
async fn four_node_line() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, OP_UMU, EDUGAIN).await;

    assert!(chain.valid, "errors: {:?}", chain.errors);
    assert_eq!(chain.statements.len(), 7);
    assert_eq!(chain.statements[0].claims().iss, OP_UMU);

    // each superior contributes its configuration plus its statement about
    // the previous hop; subordinate statement subjects chain upward
    let subjects: Vec<&str> = chain
        .statements
        .iter()
        .filter(|s| !s.is_entity_configuration())
        .map(|s| s.claims().sub.as_str())
        .collect();
    assert_eq!(subjects, vec![OP_UMU, UMU, SWAMID]);

    let Statement::Subordinate(last) = chain.statements.last().expect("non-empty") else {
        panic!("last element should be a subordinate statement");
    };
    assert_eq!(last.iss, EDUGAIN);
    assert_eq!(last.sub, SWAMID);
}

#[tokio::test]
async fn wrong_anchor() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, OP_UMU, UNRELATED).await;

    assert!(!chain.valid);
    assert!(
        chain.errors.iter().any(|e| e.contains("reach") || e.contains("anchor")),
        "errors: {:?}",
        chain.errors
    );
}

#[tokio::test]
async fn entity_is_its_own_anchor() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, ANCHOR, ANCHOR).await;

    assert!(chain.valid, "errors: {:?}", chain.errors);
    assert_eq!(chain.statements.len(), 1);
    assert!(chain.statements[0].is_entity_configuration());
    assert_eq!(chain.statements[0].claims().iss, ANCHOR);
}

#[tokio::test]
async fn no_hints_and_not_the_anchor() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, UNRELATED, ANCHOR).await;

    assert!(!chain.valid);
    assert_eq!(chain.statements.len(), 1);
}

#[tokio::test]
async fn cycle_is_detected() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, "https://c1.example.com", ANCHOR).await;

    assert!(!chain.valid);
    assert!(chain.errors.iter().any(|e| e.contains("cycle")), "errors: {:?}", chain.errors);
}

#[tokio::test]
async fn hop_limit_is_enforced() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, "https://h0.example.com", "https://h11.example.com")
        .await;

    assert!(!chain.valid);
    assert!(chain.errors.iter().any(|e| e.contains("hop limit")), "errors: {:?}", chain.errors);
    // ten hops were walked and audited before giving up
    assert_eq!(
        chain.statements.iter().filter(|s| !s.is_entity_configuration()).count(),
        10
    );
}

#[tokio::test]
async fn superior_fetch_failure() {
    utils::init_tracer();

    // an entity whose declared superior does not exist anywhere
    let mut lonely = Federation::new();
    let orphan = lonely.add_entity("orphan", "https://orphan.example.com");
    orphan.state().add_authority_hint("https://missing.example.com");
    let provider = OverlayProvider {
        primary: lonely.provider(),
        fallback: federation().provider(),
    };

    let chain = resolver::resolve(&provider, "https://orphan.example.com", ANCHOR).await;

    assert!(!chain.valid);
    assert!(
        chain.errors.iter().any(|e| e.contains("superior fetch failed")),
        "errors: {:?}",
        chain.errors
    );
}

#[tokio::test]
async fn anchor_lookup_failure() {
    utils::init_tracer();
    let provider = federation().provider();

    let chain = resolver::resolve(&provider, LEAF, "https://missing.example.com").await;

    assert!(!chain.valid);
    assert!(
        chain.errors.iter().any(|e| e.contains("trust anchor lookup failed")),
        "errors: {:?}",
        chain.errors
    );
}

#[tokio::test]
async fn subordinate_subject_mismatch() {
    utils::init_tracer();
    let provider = RewriteProvider {
        inner: federation().provider(),
        // when asked about b, the superior answers about x
        from: format!("sub={}", urlencoding::encode(LEAF)),
        to: format!("sub={}", urlencoding::encode("https://x.example.com")),
    };

    let chain = resolver::resolve(&provider, LEAF, ANCHOR).await;

    assert!(!chain.valid);
    assert!(
        chain.errors.iter().any(|e| e.contains("subject mismatch")),
        "errors: {:?}",
        chain.errors
    );
}

#[tokio::test]
async fn subordinate_issuer_mismatch() {
    utils::init_tracer();
    let federation = federation();
    let inner = federation.provider();

    // a statement signed with the anchor's key but claiming another issuer
    let anchor = federation.entity(ANCHOR);
    let serde_json::Value::Object(claims) = json!({
        "iss": "https://imposter.example.com",
        "sub": LEAF,
        "iat": utils::NOW,
        "exp": utils::NOW + 600,
        "jwks": anchor.keys().jwks(),
    }) else {
        unreachable!()
    };
    let forged = anchor.keys().sign(&claims).expect("should sign");

    let provider = OverrideProvider {
        inner,
        url: format!("{ANCHOR}/fetch?sub={}", urlencoding::encode(LEAF)),
        body: forged,
    };

    let chain = resolver::resolve(&provider, LEAF, ANCHOR).await;

    assert!(!chain.valid);
    assert!(
        chain.errors.iter().any(|e| e.contains("issuer mismatch")),
        "errors: {:?}",
        chain.errors
    );
}

/// Providers used to inject faults into an otherwise healthy federation.
#[derive(Clone, Debug)]
struct RewriteProvider {
    inner: FederationProvider,
    from: String,
    to: String,
}

impl Clock for RewriteProvider {
    fn now(&self) -> i64 {
        self.inner.now()
    }
}

impl HttpFetch for RewriteProvider {
    async fn fetch(&self, url: &str) -> anyhow::Result<HttpResponse> {
        self.inner.fetch(&url.replace(&self.from, &self.to)).await
    }
}

#[derive(Clone, Debug)]
struct OverrideProvider {
    inner: FederationProvider,
    url: String,
    body: String,
}

impl Clock for OverrideProvider {
    fn now(&self) -> i64 {
        self.inner.now()
    }
}

impl HttpFetch for OverrideProvider {
    async fn fetch(&self, url: &str) -> anyhow::Result<HttpResponse> {
        if url == self.url {
            return Ok(HttpResponse { status: 200, body: self.body.clone() });
        }
        self.inner.fetch(url).await
    }
}

#[derive(Clone, Debug)]
struct OverlayProvider {
    primary: FederationProvider,
    fallback: FederationProvider,
}

impl Clock for OverlayProvider {
    fn now(&self) -> i64 {
        self.primary.now()
    }
}

impl HttpFetch for OverlayProvider {
    async fn fetch(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let response = self.primary.fetch(url).await?;
        if response.status == 404 {
            return self.fallback.fetch(url).await;
        }
        Ok(response)
    }
}
