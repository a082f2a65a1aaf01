//! Password change for an authenticated user.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use scanpass_core::{QrSessionStore, UserStore};
use secrecy::Secret;
use serde::Deserialize;

use crate::{error::AuthApiError, extractors::Authenticated, state::AppState};

#[tracing::instrument(name = "Change Password", skip_all, fields(user_id = %claims.subject))]
pub async fn change_password<U, S>(
    State(state): State<AppState<U, S>>,
    Authenticated(claims): Authenticated,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let Json(request) = body?;

    state
        .orchestrator
        .change_password(claims.subject, request.current_password, request.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(alias = "current_password")]
    pub current_password: Secret<String>,
    #[serde(alias = "new_password")]
    pub new_password: Secret<String>,
}
