use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use theme_webhook::{AppContext, Config, Mode, signature};
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    context: AppContext,
    router: Router,
}

fn test_app(secret: Option<&str>, mode: Mode, bypass: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_store_path(dir.path().join("latest.json"));
    config.webhook_secret = secret.map(|s| redact::Secret::from(s.to_string()));
    config.app_env = mode;
    config.skip_signature_verification = bypass;

    let context = AppContext::new(config);
    let router = theme_webhook::router(context.clone());

    TestApp {
        _dir: dir,
        context,
        router,
    }
}

fn purple_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "theme": {
            "colors": {
                "primary": "#8b5cf6",
                "secondary": "#64748b",
                "accent": "#f59e0b",
                "neutral": "#6b7280",
                "info": "#0ea5e9",
                "success": "#10b981",
                "warning": "#f59e0b",
                "error": "#ef4444"
            },
            "radius": { "box": 12, "field": 8, "selector": 6 },
            "effects": { "depth": true, "noise": false }
        },
        "themeId": "t1",
        "themeName": "Purple"
    }))
    .unwrap()
}

async fn post_webhook(
    router: &Router,
    body: Vec<u8>,
    signature: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        request = request.header("X-Webhook-Signature", signature);
    }

    let response = router
        .clone()
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    (status, json_body(response.into_body()).await)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    (status, json_body(response.into_body()).await)
}

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn open_event_stream(router: &Router) -> Body {
    let response = router
        .clone()
        .oneshot(
            Request::builder().uri("/events").body(Body::empty()).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    response.into_body()
}

async fn next_event(body: &mut Body) -> Value {
    let frame = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        body.frame(),
    )
    .await
    .expect("timed out waiting for an event")
    .unwrap()
    .unwrap();
    let data = frame.into_data().unwrap();
    let text = std::str::from_utf8(&data).unwrap();

    let payload = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .expect("event without data line");
    serde_json::from_str(payload).unwrap()
}

#[tokio::test]
async fn test_submit_without_secret_then_pull_latest() {
    let app = test_app(None, Mode::Development, false);

    let (status, ack) = post_webhook(&app.router, purple_body(), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);
    assert_eq!(ack["themeId"], "t1");
    assert_eq!(ack["themeName"], "Purple");
    assert_eq!(ack["theme"]["colors"]["primary"], "#8b5cf6");
    assert!(
        ack["cssVariables"]
            .as_str()
            .unwrap()
            .contains("--color-primary: #8b5cf6;")
    );

    let (status, latest) = get_json(&app.router, "/webhook/latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["success"], true);
    assert_eq!(latest["data"]["themeId"], "t1");
    assert_eq!(latest["data"]["timestamp"], ack["timestamp"]);
    assert_eq!(latest["data"]["theme"]["colors"], ack["theme"]["colors"]);
}

#[tokio::test]
async fn test_latest_before_any_submit_is_null() {
    let app = test_app(None, Mode::Development, false);

    let (status, latest) = get_json(&app.router, "/webhook/latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["success"], true);
    assert!(latest["data"].is_null());
    assert!(latest["timestamp"].is_string());
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let app = test_app(None, Mode::Development, false);

    let (status, body) =
        post_webhook(&app.router, br#"{"themeName":"x"}"#.to_vec(), None)
            .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_signature_signed_with_other_secret_is_unauthorized() {
    let app = test_app(Some("server-secret"), Mode::Production, false);
    let body = purple_body();
    let signature = signature::sign(&body, "another-secret").unwrap();

    let (status, response) =
        post_webhook(&app.router, body, Some(&signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["success"], false);

    let (_, latest) = get_json(&app.router, "/webhook/latest").await;
    assert!(latest["data"].is_null());
}

#[tokio::test]
async fn test_valid_signature_is_accepted() {
    let app = test_app(Some("server-secret"), Mode::Production, false);
    let body = purple_body();
    let signature =
        format!("sha256={}", signature::sign(&body, "server-secret").unwrap());

    let (status, ack) = post_webhook(&app.router, body, Some(&signature)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["themeId"], "t1");
}

#[tokio::test]
async fn test_missing_signature_policy_by_mode() {
    let production = test_app(Some("server-secret"), Mode::Production, false);
    let development = test_app(Some("server-secret"), Mode::Development, false);
    let bypassed = test_app(Some("server-secret"), Mode::Production, true);

    let (status, _) = post_webhook(&production.router, purple_body(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        post_webhook(&development.router, purple_body(), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_webhook(&bypassed.router, purple_body(), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_verification_state() {
    let open = test_app(None, Mode::Development, false);
    let guarded = test_app(Some("server-secret"), Mode::Production, false);

    let (status, health) = get_json(&open.router, "/webhook").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["signatureVerification"], false);
    assert_eq!(health["mode"], "development");

    let (_, health) = get_json(&guarded.router, "/webhook").await;
    assert_eq!(health["signatureVerification"], true);
    assert_eq!(health["mode"], "production");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app(None, Mode::Development, false);

    let (status, body) = get_json(&app.router, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "not found");
}

#[tokio::test]
async fn test_event_stream_connects_then_receives_updates() {
    let app = test_app(None, Mode::Development, false);
    let mut stream = open_event_stream(&app.router).await;

    let connected = next_event(&mut stream).await;
    assert_eq!(connected["type"], "connected");
    assert_eq!(app.context.channel().subscriber_count(), 1);

    let (status, _) = post_webhook(&app.router, purple_body(), None).await;
    assert_eq!(status, StatusCode::OK);

    let update = next_event(&mut stream).await;
    assert_eq!(update["themeId"], "t1");
    assert_eq!(update["theme"]["colors"]["primary"], "#8b5cf6");

    drop(stream);
    assert_eq!(app.context.channel().subscriber_count(), 0);
}

#[tokio::test]
async fn test_disconnected_viewer_does_not_block_the_others() {
    let app = test_app(None, Mode::Development, false);
    let mut streams = Vec::new();
    for _ in 0..4 {
        let mut stream = open_event_stream(&app.router).await;
        next_event(&mut stream).await;
        streams.push(stream);
    }

    // one viewer goes away mid-session
    drop(streams.remove(1));

    let (status, _) = post_webhook(&app.router, purple_body(), None).await;
    assert_eq!(status, StatusCode::OK);

    for stream in &mut streams {
        let update = next_event(stream).await;
        assert_eq!(update["themeId"], "t1");
    }
    assert_eq!(app.context.channel().subscriber_count(), 3);
}

#[tokio::test]
async fn test_graceful_shutdown_ends_open_event_streams() {
    let app = test_app(None, Mode::Development, false);
    let channel = app.context.channel().clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(tr_axum::serve(
        listener,
        app.router.clone(),
        async move {
            let _ = stopped.await;
        },
        move || channel.close(),
    ));

    let mut response = reqwest::get(format!("http://{addr}/events"))
        .await
        .unwrap();
    let first = response.chunk().await.unwrap().unwrap();
    assert!(String::from_utf8_lossy(&first).contains("connected"));

    stop.send(()).unwrap();

    let finished =
        tokio::time::timeout(std::time::Duration::from_secs(5), server).await;
    assert!(matches!(finished, Ok(Ok(Ok(())))));
    assert!(response.chunk().await.unwrap_or(None).is_none());
    assert_eq!(app.context.channel().subscriber_count(), 0);
}
