//! Webhook transport for the WhatsApp Cloud API.

pub mod handlers;

use crate::core::PriceAggregator;
use crate::messaging::MessageSender;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<PriceAggregator>,
    pub sender: Arc<dyn MessageSender>,
    pub verify_token: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AggregatorSettings, PriceQuote, PriceSource, SourceRole};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    struct FixedSource(u64);

    #[async_trait]
    impl PriceSource for FixedSource {
        fn label(&self) -> &str {
            "Antam (LogamMulia)"
        }

        fn name(&self) -> &str {
            "Antam"
        }

        async fn fetch_quote(&self) -> Result<Option<PriceQuote>> {
            Ok(Some(PriceQuote::new("Antam", self.0)?))
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send_text(&self, to: &str, body: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            if self.fail {
                return Err(anyhow!("Graph API down"));
            }
            Ok(())
        }
    }

    struct StalledSource;

    #[async_trait]
    impl PriceSource for StalledSource {
        fn label(&self) -> &str {
            "Harga-Emas.org (24K)"
        }

        fn name(&self) -> &str {
            "Harga-Emas"
        }

        async fn fetch_quote(&self) -> Result<Option<PriceQuote>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
    }

    /// Replies go out from a spawned task; waits until `count` have landed.
    async fn wait_for_sent(sender: &RecordingSender, count: usize) -> Vec<(String, String)> {
        for _ in 0..200 {
            {
                let sent = sender.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} replies to be sent");
    }

    fn app(sender: Arc<RecordingSender>) -> Router {
        app_with(sender, PriceAggregator::new(AggregatorSettings::default()))
    }

    fn app_with(sender: Arc<RecordingSender>, aggregator: PriceAggregator) -> Router {
        let aggregator =
            aggregator.with_source(Arc::new(FixedSource(1_245_000)), SourceRole::Trusted);
        router(AppState {
            aggregator: Arc::new(aggregator),
            sender,
            verify_token: Some("s3cret".to_string()),
        })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn text_message(from: &str, body: &str) -> String {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{
                            "from": from,
                            "type": "text",
                            "text": {"body": body}
                        }]
                    }
                }]
            }]
        })
        .to_string()
    }

    fn post_webhook(body: String) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root() {
        let response = app(Arc::default())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            r#"{"ok":true,"service":"whatsapp-gold-bot"}"#
        );
    }

    #[tokio::test]
    async fn test_verify_echoes_challenge() {
        let uri = "/webhook?hub.mode=subscribe&hub.verify_token=s3cret&hub.challenge=1158201444";
        let response = app(Arc::default())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "1158201444");
    }

    #[tokio::test]
    async fn test_verify_wrong_token() {
        let uri = "/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1158201444";
        let response = app(Arc::default())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_price_command_replies() {
        let sender = Arc::new(RecordingSender::default());
        let response = app(sender.clone())
            .oneshot(post_webhook(text_message("62812", "  EMAS  ")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"ok":true}"#);

        let sent = wait_for_sent(&sender, 1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "62812");
        assert!(sent[0].1.contains("Antam (LogamMulia): Rp 1.245.000"));
        assert!(sent[0].1.contains("📊 Median: Rp 1.245.000"));
    }

    #[tokio::test]
    async fn test_delivery_failure_still_acknowledged() {
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..RecordingSender::default()
        });
        let response = app(sender.clone())
            .oneshot(post_webhook(text_message("62812", "menu")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(wait_for_sent(&sender, 1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_ack_does_not_wait_for_slow_sources() {
        let sender = Arc::new(RecordingSender::default());
        let aggregator = PriceAggregator::new(AggregatorSettings {
            fetch_timeout: Duration::from_secs(60),
            ..AggregatorSettings::default()
        })
        .with_source(Arc::new(StalledSource), SourceRole::CrossChecked);

        let response = tokio::time::timeout(
            Duration::from_secs(2),
            app_with(sender.clone(), aggregator)
                .oneshot(post_webhook(text_message("62812", "emas"))),
        )
        .await
        .expect("webhook ack was held back by the price fetch")
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"ok":true}"#);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_update_and_garbage_ignored() {
        let sender = Arc::new(RecordingSender::default());
        let status_update = r#"{"entry":[{"changes":[{"value":{"statuses":[{"id":"x"}]}}]}]}"#;

        for body in [status_update.to_string(), "not json".to_string(), "{}".to_string()] {
            let response = app(sender.clone()).oneshot(post_webhook(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
