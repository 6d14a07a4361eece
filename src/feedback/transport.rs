//! Mail delivery backends.

use super::error::FeedbackError;
use super::message::MailMessage;
use crate::config::{MailConfig, TransportKind};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Delivers composed feedback mail.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    /// Sends one message.
    async fn send(&self, message: &MailMessage) -> Result<(), FeedbackError>;
}

/// Builds the transport selected in the configuration.
///
/// # Errors
///
/// Returns [`FeedbackError`] if SendGrid is selected without an API key.
#[instrument(skip(config), fields(transport = %config.transport()))]
pub fn transport_from_config(config: &MailConfig) -> Result<Arc<dyn MailTransport>, FeedbackError> {
    match config.transport() {
        TransportKind::Outbox => Ok(Arc::new(OutboxTransport::new(config.outbox_dir()))),
        TransportKind::SendGrid => {
            let api_key = config
                .sendgrid_api_key()
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| FeedbackError::new("SENDGRID_API_KEY is not set"))?;
            Ok(Arc::new(SendGridTransport::new(
                api_key,
                config.sendgrid_endpoint().clone(),
            )))
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  SendGrid
// ─────────────────────────────────────────────────────────────

/// Sends through the SendGrid v3 mail API.
pub struct SendGridTransport {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for SendGridTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SendGridTransport {
    /// Creates a transport for the given key and endpoint.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Request body for a message.
    pub fn request_body(message: &MailMessage) -> serde_json::Value {
        let mut personalization = json!({ "to": [{ "email": message.to() }] });
        if let Some(cc) = message.cc() {
            personalization["cc"] = json!([{ "email": cc }]);
        }

        let mut body = json!({
            "personalizations": [personalization],
            "from": { "email": message.from().email(), "name": message.from().name() },
            "subject": message.subject(),
            "content": [{ "type": "text/plain", "value": message.text() }],
        });
        if !message.attachments().is_empty() {
            body["attachments"] = message
                .attachments()
                .iter()
                .map(|a| {
                    json!({
                        "content": a.content_base64(),
                        "filename": a.filename(),
                        "type": a.content_type(),
                        "disposition": "attachment",
                    })
                })
                .collect();
        }
        body
    }
}

#[async_trait::async_trait]
impl MailTransport for SendGridTransport {
    #[instrument(skip(self, message), fields(subject = %message.subject()))]
    async fn send(&self, message: &MailMessage) -> Result<(), FeedbackError> {
        debug!(endpoint = %self.endpoint, "Sending via SendGrid");

        let response = self
            .client
            .post(&self.endpoint)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&Self::request_body(message))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "SendGrid request failed");
                FeedbackError::new(format!("SendGrid request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, response = %text, "SendGrid API error");
            return Err(FeedbackError::new(format!(
                "SendGrid API error {}: {}",
                status, text
            )));
        }

        info!(status = %status, "Feedback sent via SendGrid");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Outbox
// ─────────────────────────────────────────────────────────────

/// Writes each message as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    /// Creates an outbox rooted at `dir`. The directory is created on first send.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Outbox directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl MailTransport for OutboxTransport {
    #[instrument(skip(self, message), fields(dir = %self.dir.display()))]
    async fn send(&self, message: &MailMessage) -> Result<(), FeedbackError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        let path = self.dir.join(format!("feedback-{}.json", stamp));
        let body = serde_json::to_string_pretty(&SendGridTransport::request_body(message))?;
        tokio::fs::write(&path, body).await?;

        info!(path = %path.display(), "Feedback written to outbox");
        Ok(())
    }
}
