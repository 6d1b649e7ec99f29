//! Inbound provider callbacks: signature verification, payload decoding and
//! the dedupe keys that make replayed deliveries no-ops.

use chrono::{SecondsFormat, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::phone::normalize_e164;
use crate::status::LifecycleStatus;
use crate::types::Timestamp;

/// Header carrying the provider's HMAC of the raw body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

/// Compute the header value the provider would send for `body`.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Check `header` against the HMAC-SHA256 of `body`.
///
/// The comparison runs in constant time over the decoded digest. An empty
/// secret never verifies.
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Some(hex_digest) = header.and_then(|h| h.trim().strip_prefix(SIGNATURE_PREFIX)) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

// ---------------------------------------------------------------------------
// Payload shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    statuses: Vec<serde_json::Value>,
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    id: String,
    status: String,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    from: String,
    text: Option<RawText>,
    context: Option<RawContext>,
}

#[derive(Debug, Deserialize)]
struct RawText {
    body: String,
}

#[derive(Debug, Deserialize)]
struct RawContext {
    id: String,
}

// ---------------------------------------------------------------------------
// Normalized events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub provider_message_id: String,
    pub status: LifecycleStatus,
    pub event_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTextEvent {
    /// Sender, normalized to E.164.
    pub from_phone: String,
    pub provider_message_id: String,
    /// The outbound message this is a reply to, if any.
    pub context_message_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Status(StatusEvent),
    InboundText(InboundTextEvent),
    Unrecognized { reason: String },
}

/// Decode a verified request body into events, in payload order.
///
/// Only invalid JSON is an error. A well-formed document with an unexpected
/// shape yields [`WebhookEvent::Unrecognized`] items instead.
pub fn decode_events(body: &[u8]) -> Result<Vec<WebhookEvent>, serde_json::Error> {
    let document: serde_json::Value = serde_json::from_slice(body)?;

    let payload: Payload = match serde_json::from_value(document) {
        Ok(payload) => payload,
        Err(err) => {
            return Ok(vec![WebhookEvent::Unrecognized {
                reason: format!("payload shape not recognized: {err}"),
            }]);
        }
    };

    let mut events = Vec::new();
    for change in payload.entry.into_iter().flat_map(|e| e.changes) {
        events.extend(change.value.statuses.into_iter().map(decode_status));
        events.extend(change.value.messages.into_iter().map(decode_message));
    }
    Ok(events)
}

fn decode_status(value: serde_json::Value) -> WebhookEvent {
    let raw: RawStatus = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(err) => return unrecognized(format!("status item: {err}")),
    };
    if raw.id.trim().is_empty() {
        return unrecognized("status item without message id".to_string());
    }
    let Ok(status) = LifecycleStatus::from_str_db(&raw.status) else {
        return unrecognized(format!("unsupported status '{}'", raw.status));
    };

    WebhookEvent::Status(StatusEvent {
        provider_message_id: raw.id,
        status,
        event_at: raw.timestamp.as_deref().and_then(parse_unix_seconds),
    })
}

fn decode_message(value: serde_json::Value) -> WebhookEvent {
    let raw: RawMessage = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(err) => return unrecognized(format!("message item: {err}")),
    };
    let Some(text) = raw.text.map(|t| t.body).filter(|body| !body.trim().is_empty()) else {
        return unrecognized("message without text body".to_string());
    };
    let Some(from_phone) = normalize_e164(&raw.from) else {
        return unrecognized(format!("unusable sender '{}'", raw.from));
    };

    WebhookEvent::InboundText(InboundTextEvent {
        from_phone,
        provider_message_id: raw.id,
        context_message_id: raw.context.map(|c| c.id).filter(|id| !id.is_empty()),
        text,
    })
}

fn unrecognized(reason: String) -> WebhookEvent {
    WebhookEvent::Unrecognized { reason }
}

fn parse_unix_seconds(text: &str) -> Option<Timestamp> {
    let secs: i64 = text.trim().parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

// ---------------------------------------------------------------------------
// Dedupe keys
// ---------------------------------------------------------------------------

/// `providerMessageId:status:eventAt`, with `none` when no time was given.
pub fn dedupe_key(event: &StatusEvent) -> String {
    let at = event
        .event_at
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "none".to_string());
    format!("{}:{}:{}", event.provider_message_id, event.status, at)
}

pub fn inbound_dedupe_key(event: &InboundTextEvent) -> String {
    format!("inbound:{}", event.provider_message_id)
}

/// Unique key for a rejected request; these never collide with each other.
pub fn rejected_dedupe_key(prefix: &str, now: Timestamp, nonce: &str) -> String {
    format!("{prefix}:{}:{nonce}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    const SECRET: &str = "app-secret";

    #[test]
    fn computed_signature_verifies() {
        let body = br#"{"entry":[]}"#;
        let header = compute_signature(SECRET, body);
        assert!(header.starts_with("sha256="));
        assert!(verify_signature(SECRET, body, Some(&header)));
    }

    #[test]
    fn tampered_or_missing_signature_fails() {
        let body = br#"{"entry":[]}"#;
        let header = compute_signature(SECRET, body);

        assert!(!verify_signature(SECRET, br#"{"entry":[1]}"#, Some(&header)));
        assert!(!verify_signature("other", body, Some(&header)));
        assert!(!verify_signature(SECRET, body, None));
        assert!(!verify_signature(SECRET, body, Some("sha1=abc")));
        assert!(!verify_signature(SECRET, body, Some("sha256=not-hex")));
        assert!(!verify_signature("", body, Some(&header)));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(decode_events(b"{not json").is_err());
    }

    #[test]
    fn statuses_and_messages_decode_in_order() {
        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "statuses": [
                            { "id": "wamid.1", "status": "delivered", "timestamp": "1767261600" },
                            { "id": "wamid.2", "status": "read" }
                        ],
                        "messages": [{
                            "id": "wamid.in.1",
                            "from": "919800000001",
                            "timestamp": "1767261700",
                            "text": { "body": "yes" },
                            "context": { "id": "wamid.1" }
                        }]
                    }
                }]
            }]
        });
        let events = decode_events(body.to_string().as_bytes()).unwrap();

        assert_eq!(events.len(), 3);
        assert_matches!(&events[0], WebhookEvent::Status(e) if e.status == LifecycleStatus::Delivered && e.event_at.is_some());
        assert_matches!(&events[1], WebhookEvent::Status(e) if e.event_at.is_none());
        assert_matches!(
            &events[2],
            WebhookEvent::InboundText(e)
                if e.from_phone == "+919800000001" && e.context_message_id.as_deref() == Some("wamid.1")
        );
    }

    #[test]
    fn odd_items_become_unrecognized() {
        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "statuses": [{ "id": "wamid.1", "status": "deleted" }, { "status": "read" }],
                        "messages": [{ "id": "wamid.in", "from": "919800000001", "type": "image" }]
                    }
                }]
            }]
        });
        let events = decode_events(body.to_string().as_bytes()).unwrap();

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| matches!(e, WebhookEvent::Unrecognized { .. })));
    }

    #[test]
    fn wrong_top_level_shape_is_unrecognized_not_error() {
        let events = decode_events(br#"{"entry":"nope"}"#).unwrap();
        assert_matches!(events.as_slice(), [WebhookEvent::Unrecognized { .. }]);
        assert!(decode_events(br#"{"object":"page"}"#).unwrap().is_empty());
    }

    #[test]
    fn dedupe_key_uses_millisecond_iso_time() {
        let event = StatusEvent {
            provider_message_id: "wamid.1".into(),
            status: LifecycleStatus::Delivered,
            event_at: parse_unix_seconds("1767261600"),
        };
        assert_eq!(dedupe_key(&event), "wamid.1:delivered:2026-01-01T10:00:00.000Z");

        let undated = StatusEvent { event_at: None, ..event };
        assert_eq!(dedupe_key(&undated), "wamid.1:delivered:none");
    }
}
