/**
 * Entrypoint for the theme webhook service.
 *
 * Serves the webhook receiver, the latest-theme endpoint, and the
 * server-sent event stream until the process is asked to stop.
 */
use theme_webhook::{AppContext, Config};

#[tokio::main]
async fn main() {
    // Initialize the application context
    let app_context = tr_app::create_app_context::<AppContext, Config>()
        .await
        .expect("failed to load config");

    let addr = app_context.config.bind_address;
    tracing::info!(
        mode = %app_context.config.app_env,
        store = %app_context.config.theme_store_path.display(),
        "starting theme webhook service"
    );

    let channel = app_context.channel().clone();
    let app = theme_webhook::router(app_context);

    if let Err(e) = tr_axum::run_app(app, addr, move || channel.close()).await
    {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
