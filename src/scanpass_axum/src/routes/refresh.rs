use axum::{Json, extract::State};
use scanpass_core::{QrSessionStore, UserStore};

use crate::{
    error::AuthApiError, extractors::Authenticated, routes::login::AuthResponse, state::AppState,
};

/// Issues a fresh token for the bearer's account.
#[tracing::instrument(name = "Refresh token", skip_all, fields(user_id = %claims.subject))]
pub async fn refresh<U, S>(
    State(state): State<AppState<U, S>>,
    Authenticated(claims): Authenticated,
) -> Result<Json<AuthResponse>, AuthApiError>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let authenticated = state.orchestrator.refresh_token(claims.subject).await?;

    Ok(Json(authenticated.into()))
}
