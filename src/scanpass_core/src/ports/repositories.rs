use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::Secret;
use thiserror::Error;

use crate::domain::{
    email::Email,
    qr_session::{QrSession, QrSessionId, QrSessionStatus},
    user::{NewUser, User, UserId},
};

// UserStore port trait and errors
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for UserStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::UserAlreadyExists, Self::UserAlreadyExists)
                | (Self::UserNotFound, Self::UserNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn add_user(&self, user: NewUser) -> Result<User, UserStoreError>;
    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError>;
    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError>;
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: Secret<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError>;
}

// QrSessionStore port trait and errors
#[derive(Debug, Error)]
pub enum QrSessionStoreError {
    #[error("Session already exists")]
    Conflict,
    #[error("Session not found")]
    NotFound,
    #[error("Session status changed concurrently")]
    StatusChanged,
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl PartialEq for QrSessionStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Conflict, Self::Conflict)
                | (Self::NotFound, Self::NotFound)
                | (Self::StatusChanged, Self::StatusChanged)
                | (Self::StorageFailure(_), Self::StorageFailure(_))
        )
    }
}

/// Durable keyed storage for QR sessions.
///
/// Single-record `create`, `save` and `save_if_status` must be atomic under
/// concurrent access. Nothing here spans two calls.
#[async_trait]
pub trait QrSessionStore: Send + Sync {
    /// Insert a new record, failing with `Conflict` if the id is taken.
    async fn create(&self, session: &QrSession) -> Result<(), QrSessionStoreError>;

    async fn get(&self, id: &QrSessionId) -> Result<QrSession, QrSessionStoreError>;

    /// Unconditional overwrite of the record with the same id.
    async fn save(&self, session: &QrSession) -> Result<(), QrSessionStoreError>;

    /// Overwrite only if the stored status still equals `expected`, otherwise
    /// fail with `StatusChanged`.
    async fn save_if_status(
        &self,
        session: &QrSession,
        expected: QrSessionStatus,
    ) -> Result<(), QrSessionStoreError>;

    /// Bulk cleanup for housekeeping. Returns the number of deleted records.
    async fn delete_expired_before(
        &self,
        cutoff: DateTime<Utc>,
        statuses: &[QrSessionStatus],
    ) -> Result<u64, QrSessionStoreError>;
}
