use std::sync::Arc;

use scanpass_core::{Clock, QrSessionStatus, QrSessionStore, QrSessionStoreError};

/// Deletes QR sessions whose expiry lies in the past.
///
/// Confirmed sessions are swept too; that bounds how long a confirmed session
/// can keep handing out tokens on repeated polls.
pub struct SweepExpiredSessionsUseCase<S>
where
    S: QrSessionStore,
{
    session_store: S,
    clock: Arc<dyn Clock>,
    statuses: Vec<QrSessionStatus>,
}

impl<S> SweepExpiredSessionsUseCase<S>
where
    S: QrSessionStore,
{
    pub fn new(session_store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            session_store,
            clock,
            statuses: QrSessionStatus::ALL.to_vec(),
        }
    }

    /// Restrict the sweep to the given statuses.
    pub fn with_statuses(mut self, statuses: impl Into<Vec<QrSessionStatus>>) -> Self {
        self.statuses = statuses.into();
        self
    }

    #[tracing::instrument(name = "SweepExpiredSessionsUseCase::execute", skip(self))]
    pub async fn execute(&self) -> Result<u64, QrSessionStoreError> {
        let cutoff = self.clock.now();
        let deleted = self
            .session_store
            .delete_expired_before(cutoff, &self.statuses)
            .await?;
        if deleted > 0 {
            tracing::info!(deleted, "swept expired QR login sessions");
        }
        Ok(deleted)
    }
}
