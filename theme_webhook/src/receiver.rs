use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::instrument;
use types::{StoredLatest, ThemeEnvelope, WebhookAck};

use crate::{
    channel::UpdateChannel,
    error::WebhookError,
    signature::{Acceptance, SignaturePolicy},
    store::{StoreError, ThemeStore},
};

/// Validates, persists, and fans out incoming theme payloads.
#[derive(Debug)]
pub struct WebhookReceiver {
    store: Arc<ThemeStore>,
    channel: Arc<UpdateChannel>,
    policy: SignaturePolicy,
}

impl WebhookReceiver {
    #[must_use]
    pub const fn new(
        store: Arc<ThemeStore>,
        channel: Arc<UpdateChannel>,
        policy: SignaturePolicy,
    ) -> Self {
        Self {
            store,
            channel,
            policy,
        }
    }

    #[must_use]
    pub const fn channel(&self) -> &Arc<UpdateChannel> {
        &self.channel
    }

    #[must_use]
    pub const fn policy(&self) -> &SignaturePolicy {
        &self.policy
    }

    /// Accept one webhook call.
    ///
    /// `raw_body` must be the request body exactly as received, since the
    /// signature covers those bytes. The steps run in order: parse, check
    /// the signature, stamp, persist, broadcast. Nothing is retried; a
    /// failed write is returned to the caller and no subscriber hears
    /// about it.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::MalformedPayload`] if the body is not a valid
    ///   envelope.
    /// - [`WebhookError::Unauthorized`] if the signature policy rejects
    ///   the call.
    /// - [`WebhookError::StorageFailure`] if the store write fails.
    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck, WebhookError> {
        let mut envelope = parse_envelope(raw_body)?;

        match self.policy.check(raw_body, signature) {
            Ok(Acceptance::UnsignedInDevelopment) => {
                tracing::warn!(
                    theme_id = %envelope.theme_id,
                    "accepting unsigned webhook in development mode"
                );
            }
            Ok(acceptance) => {
                tracing::debug!(?acceptance, "webhook signature accepted");
            }
            Err(rejection) => {
                tracing::warn!(
                    theme_id = %envelope.theme_id,
                    "rejecting webhook: {rejection}"
                );
                return Err(rejection.into());
            }
        }

        let timestamp = envelope
            .timestamp
            .get_or_insert_with(|| {
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
            })
            .clone();
        let latest = StoredLatest {
            css_variables: envelope.theme.css_variables(),
            envelope,
            stored_at: Utc::now(),
        };

        if let Err(e) = self.store.put(&latest).await {
            tracing::error!("failed to persist theme: {e}");
            return Err(e.into());
        }

        let delivered = match self.channel.broadcast(&latest.envelope) {
            Ok(delivered) => delivered,
            Err(e) => {
                tracing::error!("failed to serialize theme update: {e}");
                0
            }
        };

        let StoredLatest {
            envelope,
            css_variables,
            ..
        } = latest;

        tracing::info!(
            theme_id = %envelope.theme_id,
            theme_name = envelope.theme_name.as_deref().unwrap_or_default(),
            subscribers = delivered,
            "theme webhook accepted"
        );

        Ok(WebhookAck {
            success: true,
            message: "Theme updated successfully".to_string(),
            theme_id: envelope.theme_id,
            theme_name: envelope.theme_name,
            timestamp,
            css_variables,
            theme: envelope.theme,
        })
    }

    /// The latest accepted envelope, if any webhook has been received.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document cannot be read.
    pub async fn latest(&self) -> Result<Option<ThemeEnvelope>, StoreError> {
        Ok(self.store.get().await?.map(|latest| latest.envelope))
    }
}

fn parse_envelope(raw_body: &[u8]) -> Result<ThemeEnvelope, WebhookError> {
    let envelope: ThemeEnvelope = serde_json::from_slice(raw_body)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    if envelope.theme_id.trim().is_empty() {
        return Err(WebhookError::MalformedPayload(
            "themeId must not be empty".to_string(),
        ));
    }

    Ok(envelope)
}
