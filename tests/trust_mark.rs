//! Tests for Trust Mark issuance, receipt, and validation against a
//! resolved chain.

mod utils;

use std::sync::OnceLock;

use openid_fed::trust_mark::{TrustMarkValidation, validate_trust_marks};
use openid_fed::types::{
    AddReceivedTrustMarkRequest, IssueTrustMarkRequest, TrustMarkResponse,
};
use openid_fed::{Error, endpoint, resolver};
use utils::Federation;

const EDUGAIN: &str = "https://edugain.example.com";
const SWAMID: &str = "https://swamid.example.com";
const UMU: &str = "https://umu.example.com";
const OP_UMU: &str = "https://op.umu.example.com";
const UNRELATED: &str = "https://unrelated.example.com";

/// The four-node line of the resolution tests plus an issuer outside it.
/// Tests share the federation, so each works with its own Trust Mark type
/// and filters validation results down to it.
fn federation() -> &'static Federation {
    static FEDERATION: OnceLock<Federation> = OnceLock::new();
    FEDERATION.get_or_init(|| {
        let mut federation = Federation::new();

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

        federation
    })
}

/// Issue a mark from `issuer` to `OP_UMU` and register it with the subject.
/// Returns the issuer's record and the subject's record.
async fn issue_and_receive(
    issuer_id: &str, trust_mark_id: &str, expires_in: Option<i64>, tamper: bool,
) -> (openid_fed::state::TrustMarkRecord, openid_fed::state::TrustMarkRecord) {
    let federation = federation();
    let provider = federation.provider();

    let issuer = federation.entity(issuer_id);
    let request = IssueTrustMarkRequest {
        trust_mark_id: trust_mark_id.to_string(),
        subject: OP_UMU.to_string(),
        expires_in,
    };
    let TrustMarkResponse(issued) =
        endpoint::handle(issuer.as_ref(), request, &provider).await.expect("should issue");

    let signed_jwt =
        if tamper { utils::tamper_signature(&issued.signed_jwt) } else { issued.signed_jwt.clone() };

    let op = federation.entity(OP_UMU);
    let TrustMarkResponse(received) = endpoint::handle(
        op.as_ref(),
        AddReceivedTrustMarkRequest { signed_jwt },
        &provider,
    )
    .await
    .expect("should receive");

    (issued, received)
}

/// Resolve the op chain and validate its marks, returning the results for
/// one Trust Mark type.
async fn validate_for(trust_mark_id: &str, expected_subject: &str) -> Vec<TrustMarkValidation> {
    let provider = federation().provider();
    let chain = resolver::resolve(&provider, OP_UMU, EDUGAIN).await;
    assert!(chain.valid, "errors: {:?}", chain.errors);

    let config = chain.statements[0].claims();
    validate_trust_marks(config, expected_subject, &chain.statements, &provider)
        .into_iter()
        .filter(|v| v.trust_mark_id.as_deref() == Some(trust_mark_id))
        .collect()
}

#[tokio::test]
async fn issued_mark_validates_through_chain() {
    utils::init_tracer();
    const MARK: &str = "https://refeds.org/sirtfi";

    let (issued, received) = issue_and_receive(EDUGAIN, MARK, None, false).await;

    // the subject's record mirrors the issuer's
    assert_eq!(received.id, issued.id);
    assert_eq!(received.issuer, issued.issuer);
    assert_eq!(received.subject, issued.subject);

    // the subject's configuration now carries the signed mark
    let provider = federation().provider();
    let chain = resolver::resolve(&provider, OP_UMU, EDUGAIN).await;
    let marks = chain.statements[0].claims().trust_marks.clone().unwrap_or_default();
    assert!(marks.contains(&issued.signed_jwt));

    let results = validate_for(MARK, OP_UMU).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].valid, "error: {:?}", results[0].error);
    assert_eq!(results[0].issuer.as_deref(), Some(EDUGAIN));
    assert_eq!(results[0].subject.as_deref(), Some(OP_UMU));
}

#[tokio::test]
async fn intermediate_issuer_in_chain_validates() {
    utils::init_tracer();
    const MARK: &str = "https://marks.example.com/intermediate";

    issue_and_receive(SWAMID, MARK, Some(3600), false).await;

    let results = validate_for(MARK, OP_UMU).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].valid, "error: {:?}", results[0].error);
    assert_eq!(results[0].issuer.as_deref(), Some(SWAMID));
}

#[tokio::test]
async fn tampered_mark_fails_signature_check() {
    utils::init_tracer();
    const MARK: &str = "https://marks.example.com/tampered";

    // the tampered JWT still parses, so receipt succeeds; validation is
    // where the signature is finally checked
    issue_and_receive(EDUGAIN, MARK, None, true).await;

    let results = validate_for(MARK, OP_UMU).await;
    assert_eq!(results.len(), 1);
    assert!(!results[0].valid);
    let error = results[0].error.as_deref().unwrap_or_default();
    assert!(error.contains("signature"), "error: {error}");
}

#[tokio::test]
async fn expired_mark_is_rejected() {
    utils::init_tracer();
    const MARK: &str = "https://marks.example.com/expired";

    issue_and_receive(EDUGAIN, MARK, Some(-100), false).await;

    let results = validate_for(MARK, OP_UMU).await;
    assert_eq!(results.len(), 1);
    assert!(!results[0].valid);
    assert!(results[0].error.as_deref().unwrap_or_default().contains("expired"));
}

#[tokio::test]
async fn issuer_outside_chain_is_rejected() {
    utils::init_tracer();
    const MARK: &str = "https://marks.example.com/external";

    issue_and_receive(UNRELATED, MARK, None, false).await;

    let results = validate_for(MARK, OP_UMU).await;
    assert_eq!(results.len(), 1);
    assert!(!results[0].valid);
    assert!(results[0].error.as_deref().unwrap_or_default().contains("issuer"));
}

#[tokio::test]
async fn validation_against_wrong_subject_fails() {
    utils::init_tracer();
    const MARK: &str = "https://marks.example.com/wrong-subject";

    issue_and_receive(EDUGAIN, MARK, None, false).await;

    let results = validate_for(MARK, SWAMID).await;
    assert_eq!(results.len(), 1);
    assert!(!results[0].valid);
    assert!(results[0].error.as_deref().unwrap_or_default().contains("subject mismatch"));
}

#[tokio::test]
async fn receipt_requires_matching_subject() {
    utils::init_tracer();
    let federation = federation();
    let provider = federation.provider();

    // a mark about swamid cannot be registered with op
    let edugain = federation.entity(EDUGAIN);
    let request = IssueTrustMarkRequest {
        trust_mark_id: "https://marks.example.com/misdelivered".to_string(),
        subject: SWAMID.to_string(),
        expires_in: None,
    };
    let TrustMarkResponse(issued) =
        endpoint::handle(edugain.as_ref(), request, &provider).await.expect("should issue");

    let op = federation.entity(OP_UMU);
    let err = endpoint::handle(
        op.as_ref(),
        AddReceivedTrustMarkRequest { signed_jwt: issued.signed_jwt },
        &provider,
    )
    .await
    .map(|TrustMarkResponse(r)| r)
    .expect_err("receipt should fail");

    assert!(matches!(err, Error::InvalidRequest(_)));
    assert!(err.to_string().contains("subject"));
}
