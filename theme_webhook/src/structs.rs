use serde::{Deserialize, Deserializer};
use std::{fmt, net::SocketAddr, path::PathBuf, sync::Arc};

use crate::{
    channel::UpdateChannel, receiver::WebhookReceiver,
    signature::SignaturePolicy, store::ThemeStore,
};

/// Whether the service runs with production or development leniency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    #[default]
    Development,
}

impl Mode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub webhook_secret: Option<redact::Secret<String>>,

    #[serde(default)]
    pub app_env: Mode,

    #[serde(default)]
    pub skip_signature_verification: bool,

    #[serde(default = "default_theme_store_path")]
    pub theme_store_path: PathBuf,

    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,

    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

/// Environment values are parsed before extraction, so a secret such as
/// `123456` or `true` arrives as a number or a boolean. Accept any scalar
/// and keep its text.
fn deserialize_secret<'de, D>(
    deserializer: D,
) -> Result<Option<redact::Secret<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Flag(bool),
    }

    let secret = Option::<Scalar>::deserialize(deserializer)?.map(|value| {
        match value {
            Scalar::Text(text) => text,
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    });

    Ok(secret.map(redact::Secret::from))
}

fn default_theme_store_path() -> PathBuf {
    PathBuf::from("webhook-data.json")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3030))
}

fn default_cors_allowed_origins() -> String {
    "*".to_string()
}

const fn default_subscriber_buffer() -> usize {
    16
}

impl Config {
    /// A configuration with every default applied and the store at `path`.
    #[must_use]
    pub fn with_store_path(path: impl Into<PathBuf>) -> Self {
        Self {
            webhook_secret: None,
            app_env: Mode::default(),
            skip_signature_verification: false,
            theme_store_path: path.into(),
            bind_address: default_bind_address(),
            cors_allowed_origins: default_cors_allowed_origins(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }

    /// The configured secret, ignoring an empty `WEBHOOK_SECRET`.
    #[must_use]
    pub fn secret(&self) -> Option<&redact::Secret<String>> {
        self.webhook_secret
            .as_ref()
            .filter(|secret| !secret.expose_secret().is_empty())
    }
}

/// Everything the HTTP handlers share. The subscriber registry and the
/// store are owned here rather than living in statics, so each context is
/// fully independent of any other.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub receiver: Arc<WebhookReceiver>,
}

impl AppContext {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let store = Arc::new(ThemeStore::new(config.theme_store_path.clone()));
        let channel = Arc::new(UpdateChannel::new(config.subscriber_buffer));
        let policy = SignaturePolicy::from_config(&config);

        if !policy.is_active() {
            if config.app_env == Mode::Production {
                tracing::warn!(
                    "signature verification is disabled in production mode"
                );
            } else {
                tracing::info!("signature verification is disabled");
            }
        }

        Self {
            config: Arc::new(config),
            receiver: Arc::new(WebhookReceiver::new(store, channel, policy)),
        }
    }

    #[must_use]
    pub fn channel(&self) -> &Arc<UpdateChannel> {
        self.receiver.channel()
    }
}

impl tr_app::ContextProvider<Config> for AppContext {
    async fn new(config: Config) -> Self {
        Self::new(config)
    }
}
