use axum::extract::FromRequestParts;
use axum::http::{HeaderName, request::Parts};
use std::convert::Infallible;

/// Header carrying the hex HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: HeaderName =
    HeaderName::from_static("x-webhook-signature");

/// Extracts the webhook signature header, if the caller sent one.
///
/// Never rejects: whether a missing signature is acceptable depends on
/// the verification policy, not on the extractor. Blank or non-ASCII
/// values are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSignature(pub Option<String>);

impl<S> FromRequestParts<S> for WebhookSignature
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let signature = parts
            .headers
            .get(&SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self(signature))
    }
}
