// Wire and storage types shared by the webhook service and the watcher.
//
// Everything on the wire is camelCase JSON, matching what the theme
// generator sends:
//
// ```json
// {
//   "theme": {
//     "colors": { "primary": "#8b5cf6", ... },
//     "radius": { "box": 12, "field": 8, "selector": 6 },
//     "effects": { "depth": true, "noise": false }
//   },
//   "themeId": "t1",
//   "themeName": "Purple"
// }
// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod utils;

pub use utils::legacy_aliases;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub neutral: String,
    pub info: String,
    pub success: String,
    pub warning: String,
    pub error: String,
}

/// Corner radii in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThemeRadius {
    #[serde(rename = "box")]
    pub box_: f64,
    pub field: f64,
    pub selector: f64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct ThemeEffects {
    #[serde(default)]
    pub depth: bool,
    #[serde(default)]
    pub noise: bool,
}

/// A complete theme. A webhook call always carries a whole theme, never a
/// partial patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub colors: ThemeColors,
    pub radius: ThemeRadius,
    #[serde(default)]
    pub effects: ThemeEffects,
}

/// The unit exchanged over the wire and persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeEnvelope {
    pub theme: Theme,

    pub theme_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_name: Option<String>,

    /// Kept exactly as the sender wrote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// The single persisted document: the latest accepted envelope plus its
/// derived presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLatest {
    pub envelope: ThemeEnvelope,
    pub css_variables: String,
    pub stored_at: DateTime<Utc>,
}

/// Response to an accepted webhook call. Echoes everything that was
/// stored so the caller does not need a follow-up read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
    pub theme_id: String,
    #[serde(default)]
    pub theme_name: Option<String>,
    pub timestamp: String,
    pub css_variables: String,
    pub theme: Theme,
}

/// Body of `GET /webhook/latest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestResponse {
    pub success: bool,
    pub data: Option<ThemeEnvelope>,
    pub timestamp: DateTime<Utc>,
}

/// Body of `GET /webhook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub signature_verification: bool,
    pub mode: String,
    pub timestamp: DateTime<Utc>,
}

/// First message on every event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub message: String,
}

impl Default for ConnectedMessage {
    fn default() -> Self {
        Self {
            message_type: "connected".to_string(),
            message: "SSE connection established".to_string(),
        }
    }
}
