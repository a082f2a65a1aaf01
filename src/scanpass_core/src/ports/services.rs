use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::Secret;
use thiserror::Error;

use crate::domain::{
    identity_token::{IdentityClaims, IdentityToken, TokenSubject},
    password::Password,
};

/// Source of the current time. Session expiry is decided against this.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    /// Expired, malformed, wrongly signed or wrongly typed; callers never learn which.
    #[error("Invalid token")]
    InvalidToken,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies signed, time-bounded identity tokens.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, subject: &TokenSubject) -> Result<IdentityToken, TokenError>;
    fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum PasswordHasherError {
    #[error("Password does not match")]
    Mismatch,
    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash_password(
        &self,
        password: Password,
    ) -> Result<Secret<String>, PasswordHasherError>;
    async fn verify_password(
        &self,
        expected_hash: Secret<String>,
        candidate: Password,
    ) -> Result<(), PasswordHasherError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum QrCodeError {
    #[error("Failed to encode QR payload: {0}")]
    Encoding(String),
    #[error("Failed to render QR image: {0}")]
    Rendering(String),
}

/// Turns a payload into a scannable image, returned as a `data:` URI.
pub trait QrCodeRenderer: Send + Sync {
    fn render_data_uri(&self, payload: &str) -> Result<String, QrCodeError>;
}
