use std::sync::Arc;

use async_trait::async_trait;
use http::{HeaderMap, header::AUTHORIZATION};
use scanpass_core::{AuthValidator, IdentityClaims, TokenCodec};
use thiserror::Error;

/// Validates `Authorization: Bearer <token>` headers against a [`TokenCodec`].
#[derive(Clone)]
pub struct BearerTokenValidator {
    token_codec: Arc<dyn TokenCodec>,
}

impl BearerTokenValidator {
    pub fn new(token_codec: Arc<dyn TokenCodec>) -> Self {
        Self { token_codec }
    }
}

#[async_trait]
impl AuthValidator for BearerTokenValidator {
    type Claims = IdentityClaims;
    type RequestParts = http::request::Parts;
    type Error = TokenAuthError;

    async fn validate(&self, parts: &Self::RequestParts) -> Result<Self::Claims, Self::Error> {
        let token = extract_bearer_token(&parts.headers)?;

        self.token_codec
            .verify(token)
            .map_err(|_| TokenAuthError::InvalidToken)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TokenAuthError {
    #[error("Missing token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
}

/// The scheme is matched case-insensitively; anything other than a single
/// non-empty bearer credential is rejected.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, TokenAuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenAuthError::MissingToken)?
        .to_str()
        .map_err(|_| TokenAuthError::InvalidToken)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(TokenAuthError::InvalidToken)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(TokenAuthError::InvalidToken);
    }
    Ok(token)
}
