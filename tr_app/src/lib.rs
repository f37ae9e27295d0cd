use figment::{Figment, providers::Env};
use serde::de::DeserializeOwned;

pub trait ContextProvider<Config> {
    fn new(config: Config) -> impl Future<Output = Self>;
}

/// Initialize the application context with configuration from environment
/// variables. The configuration is extracted using figment.
///
/// # Returns
/// The application context built from the configuration as specified by
/// the trait.
///
/// # Errors
/// If the configuration cannot be extracted from the environment variables.
///
pub async fn create_app_context<A, Config: DeserializeOwned>()
-> Result<A, figment::Error>
where
    A: ContextProvider<Config>,
{
    init_tracing();

    let config: Config = load_config()?;

    tracing::debug!("configuration loaded");

    Ok(A::new(config).await)
}

/// Extract a configuration struct from the process environment.
///
/// Variable names map to field names case-insensitively, so `APP_ENV`
/// fills `app_env`.
///
/// # Errors
/// If a required variable is missing or a value has the wrong type.
pub fn load_config<Config: DeserializeOwned>() -> Result<Config, figment::Error>
{
    Figment::new().merge(Env::raw()).extract()
}

/// Install the global JSON log subscriber.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        // allow log level to be overridden by RUST_LOG env var
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        // keep the output clean when it is shipped to a log collector.
        .with_ansi(false)
        // remove the name of the module from every log entry
        .with_target(false)
        .init();
}
