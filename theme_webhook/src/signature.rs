use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::structs::{Config, Mode};

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of `body` under `secret`, the
/// value a sender puts in the signature header.
///
/// # Errors
///
/// Returns an error if the key is rejected by the HMAC implementation.
pub fn sign(
    body: &[u8],
    secret: &str,
) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` against the HMAC of the raw `body` bytes.
///
/// `body` must be exactly what was received; re-serializing a parsed
/// payload changes key order and whitespace and will not verify. The
/// signature may carry a `sha256=` prefix. The comparison runs in
/// constant time, and any malformed signature simply fails.
#[must_use]
pub fn verify(body: &[u8], signature: &str, secret: &str) -> bool {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);

    let Ok(signature_bytes) = hex::decode(signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);

    mac.verify_slice(&signature_bytes).is_ok()
}

/// Why a request passed the signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Verified,
    /// No secret configured.
    NotConfigured,
    /// Bypass flag set.
    Bypassed,
    /// Secret configured but the request was unsigned; development only.
    UnsignedInDevelopment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing webhook signature")]
    Missing,
    #[error("invalid webhook signature")]
    Invalid,
}

/// Decides whether a webhook call is authentic enough to accept.
#[derive(Debug, Clone)]
pub struct SignaturePolicy {
    secret: Option<redact::Secret<String>>,
    mode: Mode,
    bypass: bool,
}

impl SignaturePolicy {
    #[must_use]
    pub const fn new(
        secret: Option<redact::Secret<String>>,
        mode: Mode,
        bypass: bool,
    ) -> Self {
        Self {
            secret,
            mode,
            bypass,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.secret().cloned(),
            config.app_env,
            config.skip_signature_verification,
        )
    }

    /// True when signatures are actually checked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.secret.is_some() && !self.bypass
    }

    /// Apply the policy to a request.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] when a secret is configured and the
    /// signature does not match, or is absent in production mode.
    pub fn check(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<Acceptance, Rejection> {
        if self.bypass {
            return Ok(Acceptance::Bypassed);
        }

        let Some(secret) = &self.secret else {
            return Ok(Acceptance::NotConfigured);
        };

        match signature {
            Some(signature) => {
                if verify(body, signature, secret.expose_secret()) {
                    Ok(Acceptance::Verified)
                } else {
                    Err(Rejection::Invalid)
                }
            }
            None => match self.mode {
                Mode::Production => Err(Rejection::Missing),
                Mode::Development => Ok(Acceptance::UnsignedInDevelopment),
            },
        }
    }
}
