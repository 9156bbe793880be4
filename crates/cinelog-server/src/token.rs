//! Bearer token issuance and verification.
//!
//! Tokens bind `{id, username}` claims to an Ed25519 signature made with
//! a server-held secret seed: `base64url(claims).base64url(signature)`.
//! The token carries no expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Scheme prefix expected in the `Authorization` header and prepended to
/// issued tokens (`"JWT <token>"`).
pub const TOKEN_SCHEME: &str = "JWT";

/// Identity claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is malformed or its signature does not validate.
    #[error("invalid token")]
    InvalidToken,
}

/// Issues and verifies signed bearer tokens.
///
/// The signing key is derived from a 32-byte secret seed loaded once at
/// startup; the service itself is pure computation.
pub struct TokenService {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl TokenService {
    /// Create a token service from the server secret seed.
    pub fn new(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Sign the claims and encode them as an opaque token string.
    pub fn issue(&self, claims: &Claims) -> String {
        // Claims are a plain struct of a Uuid and a String; serializing
        // them cannot fail.
        let payload = serde_json::to_vec(claims).expect("claims serialize to JSON");
        let signature = self.signing_key.sign(&payload);

        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.to_bytes()),
        )
    }

    /// Check the token signature and return the embedded claims.
    ///
    /// Malformed tokens and bad signatures both yield
    /// [`TokenError::InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(TokenError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::InvalidToken)?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::InvalidToken)?;

        let signature =
            Signature::from_slice(&sig_bytes).map_err(|_| TokenError::InvalidToken)?;

        self.verifying_key
            .verify(&payload, &signature)
            .map_err(|_| TokenError::InvalidToken)?;

        serde_json::from_slice(&payload).map_err(|_| TokenError::InvalidToken)
    }
}
