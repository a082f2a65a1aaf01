use scanpass_core::UserId;

/// Logout use case.
///
/// Tokens are self-contained and never stored server side, so there is nothing
/// to revoke: the client discards its token and the call is only recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogoutUseCase;

impl LogoutUseCase {
    pub fn new() -> Self {
        Self
    }

    #[tracing::instrument(name = "LogoutUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: UserId) {
        tracing::info!(user_id = %user_id, "user logged out");
    }
}
