use axum::extract::FromRef;
use scanpass_adapters::BearerTokenValidator;
use scanpass_application::LoginOrchestrator;
use scanpass_core::{QrSessionStore, UserStore};

/// Shared state handed to every route.
pub struct AppState<U, S>
where
    U: UserStore + Clone,
    S: QrSessionStore + Clone,
{
    pub orchestrator: LoginOrchestrator<U, S>,
    pub validator: BearerTokenValidator,
}

impl<U, S> AppState<U, S>
where
    U: UserStore + Clone,
    S: QrSessionStore + Clone,
{
    pub fn new(orchestrator: LoginOrchestrator<U, S>, validator: BearerTokenValidator) -> Self {
        Self {
            orchestrator,
            validator,
        }
    }
}

impl<U, S> Clone for AppState<U, S>
where
    U: UserStore + Clone,
    S: QrSessionStore + Clone,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            validator: self.validator.clone(),
        }
    }
}

impl<U, S> FromRef<AppState<U, S>> for BearerTokenValidator
where
    U: UserStore + Clone,
    S: QrSessionStore + Clone,
{
    fn from_ref(state: &AppState<U, S>) -> Self {
        state.validator.clone()
    }
}
