use std::convert::Infallible;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use serde_json::json;
use tokio_stream::{Stream, StreamExt};
use tr_axum::signature::WebhookSignature;
use tracing::instrument;
use types::{HealthResponse, LatestResponse, WebhookAck};

use crate::{error::WebhookError, structs::AppContext};

/// Receive a theme from the generator.
#[instrument(skip_all)]
pub async fn webhook_handler(
    State(state): State<AppContext>,
    WebhookSignature(signature): WebhookSignature,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookError> {
    state
        .receiver
        .submit(&body, signature.as_deref())
        .await
        .map(Json)
}

/// Health check; also reports whether signatures are being checked.
#[instrument(skip(state))]
pub async fn health_handler(
    State(state): State<AppContext>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Theme webhook endpoint is ready".to_string(),
        signature_verification: state.receiver.policy().is_active(),
        mode: state.config.app_env.to_string(),
        timestamp: Utc::now(),
    })
}

/// Current theme for pollers. The server does no diffing; pollers compare
/// the envelope timestamp with what they last applied.
#[instrument(skip(state))]
pub async fn latest_handler(State(state): State<AppContext>) -> Response {
    match state.receiver.latest().await {
        Ok(data) => Json(LatestResponse {
            success: true,
            data,
            timestamp: Utc::now(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!("failed to read latest theme: {e}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to read webhook data",
                    "timestamp": Utc::now(),
                })),
            )
                .into_response()
        }
    }
}

/// Server-sent event stream of theme updates.
pub async fn events_handler(
    State(state): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.channel().subscribe();
    tracing::info!(
        subscriber_id = subscription.id(),
        subscribers = state.channel().subscriber_count(),
        "event stream opened"
    );

    let stream = subscription
        .map(|message| Ok(Event::default().data(message.as_json())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
