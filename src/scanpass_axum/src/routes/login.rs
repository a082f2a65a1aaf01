//! Password login.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use scanpass_application::AuthenticatedUser;
use scanpass_core::{IdentityToken, QrSessionStore, UserProfile, UserStore};
use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::{error::AuthApiError, state::AppState};

#[tracing::instrument(name = "Login", skip_all)]
pub async fn login<U, S>(
    State(state): State<AppState<U, S>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let Json(request) = body?;

    let authenticated = state
        .orchestrator
        .login(request.email, request.password)
        .await?;

    Ok(Json(authenticated.into()))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Secret<String>,
    pub password: Secret<String>,
}

/// Body shared by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: IdentityToken,
}

impl From<AuthenticatedUser> for AuthResponse {
    fn from(authenticated: AuthenticatedUser) -> Self {
        Self {
            user: authenticated.user,
            token: authenticated.token,
        }
    }
}
