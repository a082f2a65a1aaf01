use std::time::Duration;

use scanpass_application::LoginOrchestrator;
use scanpass_core::{QrSessionStore, UserStore};
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// Deletes sessions past their expiry every `period`. Failures are logged and
/// the next tick tries again.
pub fn spawn_session_sweeper<U, S>(
    orchestrator: LoginOrchestrator<U, S>,
    period: Duration,
) -> JoinHandle<()>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match orchestrator.sweep_expired_sessions().await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "swept expired QR sessions"),
                Err(e) => tracing::warn!(error = %e, "QR session sweep failed"),
            }
        }
    })
}
