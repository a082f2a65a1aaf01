//! Route handlers. Each one pulls what it needs out of the request, calls the
//! orchestrator and lets [`AuthApiError`](crate::AuthApiError) shape failures.

pub mod change_password;
pub mod login;
pub mod logout;
pub mod qr;
pub mod refresh;

pub use change_password::change_password;
pub use login::login;
pub use logout::logout;
pub use qr::{confirm_qr, generate_qr, qr_status, reject_qr, scan_qr};
pub use refresh::refresh;

use axum::{
    Router,
    routing::{get, post},
};
use scanpass_core::{QrSessionStore, UserStore};

use crate::state::AppState;

/// Every route of the service, bound to `state`.
pub fn router<U, S>(state: AppState<U, S>) -> Router
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    Router::new()
        .route("/qr/generate", post(generate_qr::<U, S>))
        .route("/qr/scan", post(scan_qr::<U, S>))
        .route("/qr/confirm", post(confirm_qr::<U, S>))
        .route("/qr/reject", post(reject_qr::<U, S>))
        .route("/qr/status", get(qr_status::<U, S>))
        .route("/login", post(login::<U, S>))
        .route("/refresh", post(refresh::<U, S>))
        .route("/change-password", post(change_password::<U, S>))
        .route("/logout", post(logout::<U, S>))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support;
