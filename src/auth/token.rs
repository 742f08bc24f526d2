//! Stateless signed session tokens.
//!
//! Format: `base64url(claims JSON) "." base64url(HMAC-SHA256 tag)`.
//! Nothing is persisted server-side; verification needs only the signing
//! secret, so a token stays valid until its `exp` claim passes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{JotterError, Result};

/// Default token lifetime: 720 hours, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 720 * 3600;

/// Signed token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Owning user id.
    sub: String,
    /// Issued-at (epoch seconds).
    iat: u64,
    /// Expiry (epoch seconds).
    exp: u64,
}

/// Issues and verifies bearer tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs,
        }
    }

    /// Issue a token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: &str) -> String {
        self.issue_with_expiry(user_id, epoch_secs() + self.ttl_secs)
    }

    /// Issue a token with an explicit expiry (epoch seconds).
    pub fn issue_with_expiry(&self, user_id: &str, exp: u64) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: epoch_secs(),
            exp,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
        let tag = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));
        format!("{payload}.{tag}")
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// `InvalidToken` covers bad shape, bad base64, and bad signature;
    /// `ExpiredToken` is only returned once the signature has checked out.
    pub fn verify(&self, token: &str) -> Result<String> {
        let (payload, tag) = token.split_once('.').ok_or(JotterError::InvalidToken)?;

        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&self.secret) else {
            return Err(JotterError::InvalidToken);
        };
        mac.update(payload.as_bytes());
        let tag_bytes = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| JotterError::InvalidToken)?;
        // verify_slice is constant-time
        mac.verify_slice(&tag_bytes)
            .map_err(|_| JotterError::InvalidToken)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| JotterError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| JotterError::InvalidToken)?;

        if claims.exp <= epoch_secs() {
            return Err(JotterError::ExpiredToken);
        }

        Ok(claims.sub)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        // HMAC accepts any key length, so this cannot fail in practice.
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&self.secret) else {
            return Vec::new();
        };
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
