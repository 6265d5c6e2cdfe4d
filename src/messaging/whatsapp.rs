use super::{MessageSender, truncate_chars};
use crate::core::config::WhatsAppConfig;
use crate::providers::util::http_client;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const SEND_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_LOGGED_BODY: usize = 500;

/// WhatsApp Cloud API client for text replies.
pub struct WhatsAppClient {
    base_url: String,
    api_version: String,
    access_token: Option<String>,
    phone_number_id: Option<String>,
    client: reqwest::Client,
}

impl WhatsAppClient {
    pub fn new(config: &WhatsAppConfig) -> Result<Self> {
        Ok(WhatsAppClient {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            client: http_client(SEND_TIMEOUT)?,
        })
    }
}

#[derive(Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    #[instrument(name = "WhatsAppSend", skip(self, body))]
    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        let (Some(token), Some(phone_number_id)) = (&self.access_token, &self.phone_number_id)
        else {
            warn!("Missing META_ACCESS_TOKEN or PHONE_NUMBER_ID, reply not sent");
            return Ok(());
        };

        let url = format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, phone_number_id
        );
        let payload = SendMessageRequest {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .context("Failed to send WhatsApp message")?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(%status, body = truncate_chars(&text, MAX_LOGGED_BODY), "WhatsApp send response");

        if !status.is_success() {
            return Err(anyhow!(
                "WhatsApp send failed with {}: {}",
                status,
                truncate_chars(&text, MAX_LOGGED_BODY)
            ));
        }
        Ok(())
    }
}
