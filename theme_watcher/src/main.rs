use theme_watcher::{AppContext, Config};

#[tokio::main]
async fn main() {
    let app_context = tr_app::create_app_context::<AppContext, Config>()
        .await
        .expect("failed to load config");

    tracing::info!(
        source = %app_context.config.latest_url(),
        interval_secs = app_context.config.poll_interval().as_secs(),
        "starting theme watcher"
    );

    let interval = app_context.config.poll_interval();
    app_context.watcher.run(interval).await;
}
