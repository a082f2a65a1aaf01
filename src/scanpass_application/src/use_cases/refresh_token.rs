use std::sync::Arc;

use scanpass_core::{TokenCodec, TokenError, TokenSubject, UserId, UserStore, UserStoreError};

use crate::use_cases::login::AuthenticatedUser;

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("User no longer exists")]
    UserNotFound,
    #[error("Account deactivated")]
    AccountDeactivated,
    #[error("User store error: {0}")]
    UserStoreError(#[from] UserStoreError),
    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

/// Mints a new token for an already authenticated caller, re-reading the
/// account so that deactivation takes effect on the next refresh.
pub struct RefreshTokenUseCase<U>
where
    U: UserStore,
{
    user_store: U,
    token_codec: Arc<dyn TokenCodec>,
}

impl<U> RefreshTokenUseCase<U>
where
    U: UserStore,
{
    pub fn new(user_store: U, token_codec: Arc<dyn TokenCodec>) -> Self {
        Self {
            user_store,
            token_codec,
        }
    }

    #[tracing::instrument(name = "RefreshTokenUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: UserId) -> Result<AuthenticatedUser, RefreshTokenError> {
        let user = self.user_store.get_user(user_id).await.map_err(|e| match e {
            UserStoreError::UserNotFound => RefreshTokenError::UserNotFound,
            e => RefreshTokenError::UserStoreError(e),
        })?;

        if !user.is_active() {
            return Err(RefreshTokenError::AccountDeactivated);
        }

        let token = self.token_codec.issue(&TokenSubject::from(&user))?;

        Ok(AuthenticatedUser {
            token,
            user: user.profile(),
        })
    }
}
