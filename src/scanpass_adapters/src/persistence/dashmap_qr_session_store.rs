use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

use scanpass_core::{QrSession, QrSessionId, QrSessionStatus, QrSessionStore, QrSessionStoreError};

/// In-memory session store. Each record is guarded by its shard lock, which
/// makes `create` and `save_if_status` atomic per id.
#[derive(Default, Clone)]
pub struct DashMapQrSessionStore {
    sessions: Arc<DashMap<QrSessionId, QrSession>>,
}

impl DashMapQrSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait::async_trait]
impl QrSessionStore for DashMapQrSessionStore {
    async fn create(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        match self.sessions.entry(session.id().clone()) {
            Entry::Occupied(_) => Err(QrSessionStoreError::Conflict),
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &QrSessionId) -> Result<QrSession, QrSessionStoreError> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(QrSessionStoreError::NotFound)
    }

    async fn save(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        let mut stored = self
            .sessions
            .get_mut(session.id())
            .ok_or(QrSessionStoreError::NotFound)?;
        *stored = session.clone();
        Ok(())
    }

    async fn save_if_status(
        &self,
        session: &QrSession,
        expected: QrSessionStatus,
    ) -> Result<(), QrSessionStoreError> {
        let mut stored = self
            .sessions
            .get_mut(session.id())
            .ok_or(QrSessionStoreError::NotFound)?;
        if stored.status() != expected {
            return Err(QrSessionStoreError::StatusChanged);
        }
        *stored = session.clone();
        Ok(())
    }

    async fn delete_expired_before(
        &self,
        cutoff: DateTime<Utc>,
        statuses: &[QrSessionStatus],
    ) -> Result<u64, QrSessionStoreError> {
        let mut deleted = 0;
        self.sessions.retain(|_, session| {
            let remove = session.expires_at() < cutoff && statuses.contains(&session.status());
            if remove {
                deleted += 1;
            }
            !remove
        });
        Ok(deleted)
    }
}
