use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Utc};
use secrecy::Secret;
use tokio::sync::RwLock;

use scanpass_core::{Email, NewUser, User, UserId, UserStore, UserStoreError};

#[derive(Default, Clone)]
pub struct HashMapUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    last_id: Arc<AtomicI64>,
}

impl HashMapUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag, for administration and tests.
    pub async fn set_active(&self, id: UserId, is_active: bool) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(UserStoreError::UserNotFound)?;
        user.set_active(is_active, Utc::now());
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserStore for HashMapUserStore {
    async fn add_user(&self, user: NewUser) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email() == &user.email) {
            return Err(UserStoreError::UserAlreadyExists);
        }
        let id = UserId::new(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        let user = User::new(id, user, Utc::now());
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        users.get(&id).cloned().ok_or(UserStoreError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        users
            .values()
            .find(|user| user.email() == email)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: Secret<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(UserStoreError::UserNotFound)?;
        user.set_password_hash(password_hash, updated_at);
        Ok(())
    }
}
