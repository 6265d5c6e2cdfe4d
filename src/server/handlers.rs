use super::AppState;
use crate::core::command::{Command, reply_for};
use crate::core::report::now_wib;
use crate::messaging::truncate_chars;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};

const MAX_LOGGED_PAYLOAD: usize = 1000;

pub async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "service": "whatsapp-gold-bot" }))
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

fn token_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) => provided.as_bytes().ct_eq(expected.as_bytes()).into(),
        _ => false,
    }
}

/// Webhook subscription handshake: echoes the challenge for a valid token.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String) {
    let subscribing = params.mode.as_deref() == Some("subscribe");
    let authorized = token_matches(
        state.verify_token.as_deref(),
        params.verify_token.as_deref(),
    );
    match params.challenge {
        Some(challenge) if subscribing && authorized && !challenge.is_empty() => {
            info!("Webhook verified");
            (StatusCode::OK, challenge)
        }
        _ => {
            if subscribing {
                warn!("Webhook verification rejected");
            }
            (StatusCode::OK, "OK".to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
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
    messages: Vec<InboundMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct InboundMessage {
    from: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<TextContent>,
}

#[derive(Debug, Default, Deserialize)]
struct TextContent {
    #[serde(default)]
    body: String,
}

impl WebhookPayload {
    fn first_message(self) -> Option<InboundMessage> {
        self.entry
            .into_iter()
            .next()?
            .changes
            .into_iter()
            .next()?
            .value
            .messages
            .into_iter()
            .next()
    }
}

impl InboundMessage {
    /// Text body for text messages, empty for media, reactions and the like.
    fn text_body(&self) -> &str {
        match (self.kind.as_deref(), &self.text) {
            (Some("text"), Some(text)) => &text.body,
            _ => "",
        }
    }
}

fn ack() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Handles inbound messages. Acknowledges at once and replies from a
/// background task, so slow sources never delay the ack into a redelivery.
pub async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let raw = String::from_utf8_lossy(&body);
    debug!(payload = truncate_chars(&raw, MAX_LOGGED_PAYLOAD), "Webhook received");

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed webhook payload");
            return ack();
        }
    };

    // Status receipts carry no messages
    let Some(message) = payload.first_message() else {
        return ack();
    };
    let Some(from) = message.from.as_deref().filter(|f| !f.is_empty()) else {
        return ack();
    };

    let text = message.text_body();
    let command = Command::parse(text);
    info!(from, kind = ?message.kind, text, ?command, "Inbound message");

    tokio::spawn(send_reply(state, from.to_string(), command));
    ack()
}

async fn send_reply(state: AppState, to: String, command: Command) {
    let reply = reply_for(command, &state.aggregator, &now_wib()).await;
    match state.sender.send_text(&to, &reply).await {
        Ok(()) => debug!(to, "Reply sent"),
        Err(e) => error!(error = %e, to, "Reply send failed"),
    }
}
