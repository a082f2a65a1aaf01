use std::sync::Arc;

use scanpass_core::{
    Clock, Password, PasswordHasher, PasswordHasherError, UserError, UserId, UserStore,
    UserStoreError,
};
use secrecy::Secret;

/// Error types for change password use case
#[derive(Debug, thiserror::Error)]
pub enum ChangePasswordError {
    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,
    #[error("Validation error: {0}")]
    UserError(#[from] UserError),
    #[error("User store error: {0}")]
    UserStoreError(#[from] UserStoreError),
    #[error("Password hasher error: {0}")]
    PasswordHasherError(#[from] PasswordHasherError),
}

/// Change password use case - replaces the stored hash after proving the old password
pub struct ChangePasswordUseCase<U>
where
    U: UserStore,
{
    user_store: U,
    password_hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserStore,
{
    pub fn new(
        user_store: U,
        password_hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_store,
            password_hasher,
            clock,
        }
    }

    /// # Arguments
    /// * `user_id` - Subject of the caller's token
    /// * `current_password` - Must match the stored hash
    /// * `new_password` - Must satisfy the password policy
    #[tracing::instrument(
        name = "ChangePasswordUseCase::execute",
        skip(self, current_password, new_password)
    )]
    pub async fn execute(
        &self,
        user_id: UserId,
        current_password: Secret<String>,
        new_password: Secret<String>,
    ) -> Result<(), ChangePasswordError> {
        let new_password = Password::try_from(new_password)?;
        let current_password = Password::try_from(current_password)
            .map_err(|_| ChangePasswordError::IncorrectCurrentPassword)?;

        let user = self.user_store.get_user(user_id).await?;

        self.password_hasher
            .verify_password(user.password_hash().clone(), current_password)
            .await
            .map_err(|e| match e {
                PasswordHasherError::Mismatch => ChangePasswordError::IncorrectCurrentPassword,
                e => ChangePasswordError::PasswordHasherError(e),
            })?;

        let new_hash = self.password_hasher.hash_password(new_password).await?;
        self.user_store
            .update_password_hash(user_id, new_hash, self.clock.now())
            .await?;

        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }
}
