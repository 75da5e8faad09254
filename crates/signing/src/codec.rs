//! Keyed-HMAC token codec.
//!
//! Wire format: `base64url(payload_json) "." base64url(hmac_sha256(key, namespace || 0x00 || payload_json))`.
//!
//! The namespace is mixed into the MAC input (NUL-separated, so a namespace
//! cannot collide with a payload prefix). Decoding with a different key or
//! namespace fails, as does any structural tampering. The codec itself does
//! not enforce expiry; callers that need short-lived tokens layer a
//! timestamp into their payload.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced by [`TokenCodec`].
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is not valid: signature mismatch, structural corruption,
    /// or a namespace mismatch. Deliberately undifferentiated so the error
    /// itself is not an oracle for attackers probing token structure.
    #[error("invalid token")]
    InvalidToken,

    /// The payload could not be serialized. This is a programming error in
    /// the caller, not a property of any token.
    #[error("token payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Encodes/decodes signed correlation tokens.
///
/// The codec is stateless and cheap to clone; construct one per namespace.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
    namespace: String,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never print the signing key.
        f.debug_struct("TokenCodec")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(key: impl Into<Vec<u8>>, namespace: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            namespace: namespace.into(),
        }
    }

    /// Encode `payload` into a signed token string.
    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<String, TokenError> {
        let body = serde_json::to_vec(payload)?;
        let tag = self.sign(&body);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&body),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }

    /// Decode a token string back into its payload.
    ///
    /// Fails with [`TokenError::InvalidToken`] if the token was signed with
    /// a different key or namespace, or has been altered in any way.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let (body_b64, tag_b64) = token.split_once('.').ok_or(TokenError::InvalidToken)?;

        let body = URL_SAFE_NO_PAD
            .decode(body_b64)
            .map_err(|_| TokenError::InvalidToken)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| TokenError::InvalidToken)?;

        let mut mac = self.mac();
        mac.update(&body);
        // Constant-time comparison.
        mac.verify_slice(&tag).map_err(|_| TokenError::InvalidToken)?;

        serde_json::from_slice(&body).map_err(|_| TokenError::InvalidToken)
    }

    fn sign(&self, body: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(self.namespace.as_bytes());
        mac.update(&[0u8]);
        mac
    }
}
