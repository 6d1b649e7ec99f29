//! Integration tests for the provider webhook endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_text, get, post_json_auth, post_webhook, status_payload, text_payload, token_for, unit,
    VERIFY_TOKEN, WEBHOOK_SECRET, WEDDING_ID,
};
use serde_json::json;
use vows_core::status::{AuthResult, GuestSide, LifecycleStatus, ReceiptStatus};
use vows_provider::RecordingProvider;

/// Seed one unit and send it an invite through the API; returns the
/// provider message id of the invite.
async fn dispatch_one(test_app: &common::TestApp) -> String {
    test_app
        .store
        .seed_unit(WEDDING_ID, unit("u1", GuestSide::Bride, "+919800000001"))
        .await;
    let token = token_for("user-1", WEDDING_ID, "owner");
    let response = post_json_auth(
        test_app.app(),
        "/api/v1/weddings/w1/invites/send",
        json!({ "event_id": "e1", "template_name": "wedding_invite" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let messages = test_app.store.messages().await;
    messages[0].provider_message_id.clone().unwrap()
}

// ---------------------------------------------------------------------------
// Test: subscription verification echoes the challenge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verification_echoes_challenge() {
    let test_app = common::build_test_app(RecordingProvider::new());
    let uri = format!(
        "/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=1158201444"
    );

    let response = get(test_app.app(), &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "1158201444");
}

#[tokio::test]
async fn verification_with_wrong_token_returns_403() {
    let test_app = common::build_test_app(RecordingProvider::new());

    let response = get(
        test_app.app(),
        "/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1",
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Test: signature failures return 401 and keep a rejected receipt
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_signature_returns_401() {
    let test_app = common::build_test_app(RecordingProvider::new());
    let body = status_payload("wamid.x", "delivered", 1_767_261_600);

    let response = post_webhook(test_app.app(), &body, Some("not-the-secret")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_webhook(test_app.app(), &body, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let receipts = test_app.store.receipts().await;
    assert_eq!(receipts.len(), 2);
    assert!(receipts
        .iter()
        .all(|r| r.auth_result == AuthResult::InvalidSignature
            && r.receipt_status == ReceiptStatus::Rejected));
}

// ---------------------------------------------------------------------------
// Test: an undecodable but signed body is acknowledged
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_json_is_acknowledged_with_rejected_receipt() {
    let test_app = common::build_test_app(RecordingProvider::new());

    let response = post_webhook(test_app.app(), b"{not json", Some(WEBHOOK_SECRET)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "EVENT_RECEIVED");
    let receipts = test_app.store.receipts().await;
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].auth_result, AuthResult::InvalidPayload);
}

// ---------------------------------------------------------------------------
// Test: status events advance the dispatched message; replays are ignored
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delivered_status_advances_message_once() {
    let test_app = common::build_test_app(RecordingProvider::new());
    let provider_id = dispatch_one(&test_app).await;
    let body = status_payload(&provider_id, "delivered", 1_767_261_600);

    let response = post_webhook(test_app.app(), &body, Some(WEBHOOK_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_webhook(test_app.app(), &body, Some(WEBHOOK_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let messages = test_app.store.messages().await;
    assert_eq!(messages[0].lifecycle_status, LifecycleStatus::Delivered);
    assert!(messages[0].delivered_at.is_some());

    let receipts = test_app.store.receipts().await;
    assert_eq!(receipts.len(), 1, "replayed event must not add a receipt");
    assert_eq!(receipts[0].receipt_status, ReceiptStatus::Accepted);
}

// ---------------------------------------------------------------------------
// Test: an inbound reply to the invite starts the RSVP conversation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reply_to_invite_sends_rsvp_prompt() {
    let test_app = common::build_test_app(RecordingProvider::new());
    let provider_id = dispatch_one(&test_app).await;
    let body = text_payload("919800000001", "wamid.inbound-1", &provider_id, "yes");

    let response = post_webhook(test_app.app(), &body, Some(WEBHOOK_SECRET)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test_app.provider.texts().await.len(), 1);

    // Replaying the same inbound message does not reply again.
    let response = post_webhook(test_app.app(), &body, Some(WEBHOOK_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test_app.provider.texts().await.len(), 1);
}
