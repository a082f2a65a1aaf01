use std::sync::Arc;

use scanpass_core::{
    Email, IdentityToken, Password, PasswordHasher, PasswordHasherError, TokenCodec, TokenError,
    TokenSubject, UserError, UserProfile, UserStore, UserStoreError,
};
use secrecy::Secret;

/// A freshly minted token together with the profile it was minted for.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub token: IdentityToken,
    pub user: UserProfile,
}

/// Error types specific to login use case
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account deactivated")]
    AccountDeactivated,
    #[error("Validation error: {0}")]
    UserError(#[from] UserError),
    #[error("User store error: {0}")]
    UserStoreError(#[from] UserStoreError),
    #[error("Password hasher error: {0}")]
    PasswordHasherError(#[from] PasswordHasherError),
    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

/// Password login for the mobile app and the web fallback.
pub struct LoginUseCase<U>
where
    U: UserStore,
{
    user_store: U,
    password_hasher: Arc<dyn PasswordHasher>,
    token_codec: Arc<dyn TokenCodec>,
}

impl<U> LoginUseCase<U>
where
    U: UserStore,
{
    pub fn new(
        user_store: U,
        password_hasher: Arc<dyn PasswordHasher>,
        token_codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            user_store,
            password_hasher,
            token_codec,
        }
    }

    /// Unknown email, short password and wrong password all surface as
    /// `InvalidCredentials`. A deactivated account is only reported once the
    /// password has been proven.
    #[tracing::instrument(name = "LoginUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        email: Secret<String>,
        password: Secret<String>,
    ) -> Result<AuthenticatedUser, LoginError> {
        let email = Email::try_from(email)?;
        let password = Password::try_from(password).map_err(|_| LoginError::InvalidCredentials)?;

        let user = self
            .user_store
            .get_user_by_email(&email)
            .await
            .map_err(|e| match e {
                UserStoreError::UserNotFound => LoginError::InvalidCredentials,
                e => LoginError::UserStoreError(e),
            })?;

        self.password_hasher
            .verify_password(user.password_hash().clone(), password)
            .await
            .map_err(|e| match e {
                PasswordHasherError::Mismatch => LoginError::InvalidCredentials,
                e => LoginError::PasswordHasherError(e),
            })?;

        if !user.is_active() {
            tracing::info!(user_id = %user.id(), "login refused for deactivated account");
            return Err(LoginError::AccountDeactivated);
        }

        let token = self.token_codec.issue(&TokenSubject::from(&user))?;
        tracing::info!(user_id = %user.id(), "user logged in");

        Ok(AuthenticatedUser {
            token,
            user: user.profile(),
        })
    }
}
