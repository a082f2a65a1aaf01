use axum::{extract::State, http::StatusCode};
use scanpass_core::{QrSessionStore, UserStore};

use crate::{extractors::Authenticated, state::AppState};

/// Tokens are stateless, so there is nothing to revoke; the call is only logged.
#[tracing::instrument(name = "Logout", skip_all, fields(user_id = %claims.subject))]
pub async fn logout<U, S>(
    State(state): State<AppState<U, S>>,
    Authenticated(claims): Authenticated,
) -> StatusCode
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    state.orchestrator.logout(claims.subject).await;
    StatusCode::NO_CONTENT
}
