//! Receives theme definitions over a signed webhook and propagates them to
//! connected viewers, either pushed over server-sent events or pulled from
//! the latest-theme endpoint.

use axum::{
    Json, Router,
    body::Body,
    http::{
        HeaderValue, Method, Request, StatusCode,
        header::{self, CACHE_CONTROL, CONTENT_TYPE},
    },
    routing::get,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tr_axum::signature::SIGNATURE_HEADER;

pub mod channel;
pub mod error;
pub mod handlers;
pub mod receiver;
pub mod signature;
pub mod store;
pub mod structs;

pub use structs::{AppContext, Config, Mode};

/// Build the HTTP surface around `context`.
pub fn router(context: AppContext) -> Router {
    // Set up a trace layer
    let trace_layer = TraceLayer::new_for_http().on_request(
        |request: &Request<Body>, _: &tracing::Span| {
            tracing::info!(
                "received request: {method} {uri}",
                method = request.method(),
                uri = request.uri()
            );
        },
    );

    let cors_layer = cors_layer(&context.config.cors_allowed_origins);

    // event streams are excluded by the default compression predicate
    let compression_layer = CompressionLayer::new().gzip(true).deflate(true);

    Router::new()
        .route(
            "/webhook",
            get(handlers::health_handler).post(handlers::webhook_handler),
        )
        .route("/webhook/latest", get(handlers::latest_handler))
        .route("/webhook/events", get(handlers::events_handler))
        .route("/events", get(handlers::events_handler))
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "application/json")],
                Json(json!({
                    "message": "not found",
                })),
            )
        })
        .layer(cors_layer)
        .layer(trace_layer)
        .layer(compression_layer)
        .with_state(context)
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let allow_origin = if allowed_origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        let origins = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("ignoring invalid CORS origin {origin}: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, CACHE_CONTROL, SIGNATURE_HEADER])
}
