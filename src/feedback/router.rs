//! HTTP surface of the feedback relay.

use super::error::{FeedbackError, SubmissionError};
use super::message::{Attachment, FeedbackForm, compose};
use super::transport::MailTransport;
use crate::config::AppConfig;
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, instrument, warn};

/// Body of `GET /`.
pub const HEALTH_MESSAGE: &str = "Chess Worlds support server is running";

/// Error body when the transport fails.
pub const SEND_FAILED_MESSAGE: &str = "Failed to send feedback. Please try again later.";

/// Room for the text fields and multipart framing on top of the screenshot.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    transport: Arc<dyn MailTransport>,
}

impl AppState {
    /// Creates handler state.
    pub fn new(config: AppConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Builds the relay's router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_screenshot_bytes() + FORM_OVERHEAD_BYTES;
    debug!(body_limit, "Building feedback router");

    Router::new()
        .route("/", get(health))
        .route("/api/support", post(submit_feedback))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(ServiceBuilder::new().map_request(|req: axum::http::Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

/// Binds the configured address and serves until the process exits.
///
/// # Errors
///
/// Returns [`FeedbackError`] if the address cannot be bound or the server fails.
#[instrument(skip_all, fields(addr = %config.listen_address()))]
pub async fn serve(config: AppConfig, transport: Arc<dyn MailTransport>) -> Result<(), FeedbackError> {
    let addr = config.listen_address();
    let app = router(AppState::new(config, transport));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Support server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

#[instrument(skip_all)]
async fn submit_feedback(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            return rejected(SubmissionError::MalformedForm(rejection.body_text()));
        }
    };

    let form = match read_form(multipart, *state.config.max_screenshot_bytes()).await {
        Ok(form) => form,
        Err(e) => return rejected(e),
    };
    let message = match compose(&form, state.config.mail()) {
        Ok(message) => message,
        Err(e) => return rejected(e),
    };

    match state.transport.send(&message).await {
        Ok(()) => {
            info!(subject = %message.subject(), "Feedback relayed");
            Json(json!({ "ok": true })).into_response()
        }
        Err(e) => {
            error!(error = %e, "Feedback delivery failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": SEND_FAILED_MESSAGE })),
            )
                .into_response()
        }
    }
}

async fn read_form(mut multipart: Multipart, limit: usize) -> Result<FeedbackForm, SubmissionError> {
    let mut form = FeedbackForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(SubmissionError::ScreenshotTooLarge { size: limit + 1, limit });
            }
            Err(e) => return Err(SubmissionError::MalformedForm(e.body_text())),
        };
        let name = field.name().unwrap_or_default().to_string();

        if name == "screenshot" {
            let filename = field.file_name().unwrap_or("screenshot.png").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    SubmissionError::ScreenshotTooLarge { size: limit + 1, limit }
                } else {
                    SubmissionError::MalformedForm(e.body_text())
                }
            })?;
            if bytes.len() > limit {
                return Err(SubmissionError::ScreenshotTooLarge {
                    size: bytes.len(),
                    limit,
                });
            }
            if !bytes.is_empty() {
                debug!(filename = %filename, size = bytes.len(), "Screenshot received");
                form = form.with_screenshot(Attachment::new(filename, content_type, bytes.to_vec()));
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| SubmissionError::MalformedForm(e.body_text()))?;
            form.set_field(&name, value);
        }
    }

    Ok(form)
}

fn rejected(err: SubmissionError) -> Response {
    let status = match err {
        SubmissionError::MissingMessage | SubmissionError::MalformedForm(_) => StatusCode::BAD_REQUEST,
        SubmissionError::ScreenshotTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
    };
    warn!(status = %status, error = %err, "Feedback rejected");
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
