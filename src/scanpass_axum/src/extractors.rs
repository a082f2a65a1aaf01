use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use scanpass_adapters::BearerTokenValidator;
use scanpass_core::{AuthValidator, IdentityClaims};

use crate::error::AuthApiError;

/// Claims of a request carrying a valid `Authorization: Bearer` token.
/// Rejects with `Unauthorized` otherwise.
#[derive(Debug, Clone)]
pub struct Authenticated(pub IdentityClaims);

impl<S> FromRequestParts<S> for Authenticated
where
    BearerTokenValidator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let validator = BearerTokenValidator::from_ref(state);
        let claims = validator.validate(parts).await?;
        Ok(Authenticated(claims))
    }
}
