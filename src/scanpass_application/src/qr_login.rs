//! Cross-device login: a browser shows a QR code, an authenticated mobile app
//! scans it and approves or rejects, and the browser polls until it receives
//! its own token.
//!
//! Every transition is written with a compare-and-set on the status that was
//! read, so two racing decisions can never both succeed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use scanpass_core::{
    Clock, DEFAULT_QR_SESSION_TTL_SECONDS, IdentityToken, QrCodeRenderer, QrSession,
    QrSessionId, QrSessionStatus, QrSessionStore, QrSessionStoreError, TokenCodec, TokenSubject,
    User, UserProfile, UserStore, UserStoreError,
};

/// Re-reads allowed when a lazy expiry write loses a race.
const MAX_EXPIRY_WRITE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct QrLoginConfig {
    /// Scheme of the deep link encoded in the QR image.
    pub deep_link_scheme: String,
    /// Product tag that starts every session id.
    pub session_id_prefix: String,
    pub session_ttl: Duration,
}

impl QrLoginConfig {
    pub fn payload_for(&self, session_id: &QrSessionId) -> String {
        format!(
            "{}://qr-login?session_id={}",
            self.deep_link_scheme, session_id
        )
    }
}

impl Default for QrLoginConfig {
    fn default() -> Self {
        Self {
            deep_link_scheme: "kube".to_owned(),
            session_id_prefix: "kube".to_owned(),
            session_ttl: Duration::seconds(DEFAULT_QR_SESSION_TTL_SECONDS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QrLoginError {
    /// Unknown, already decided or expired. Callers are not told which.
    #[error("Invalid or expired session")]
    InvalidOrExpiredSession,
    #[error("Session not found")]
    SessionNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account deactivated")]
    AccountDeactivated,
    #[error("Storage failure: {0}")]
    StorageFailure(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<QrSessionStoreError> for QrLoginError {
    fn from(e: QrSessionStoreError) -> Self {
        QrLoginError::StorageFailure(e.to_string())
    }
}

/// What the browser needs to display a fresh QR code.
#[derive(Debug, Clone)]
pub struct GeneratedQrCode {
    pub session_id: QrSessionId,
    /// `data:image/png;base64,...`
    pub qr_code_image: String,
    pub payload: String,
    pub expires_at: DateTime<Utc>,
}

/// Answer to a status poll. `token` and `user` are only set once confirmed.
#[derive(Debug, Clone)]
pub struct QrLoginStatus {
    pub session_id: QrSessionId,
    pub status: QrSessionStatus,
    pub message: String,
    pub token: Option<IdentityToken>,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Copy)]
enum Decision {
    Scan,
    Confirm,
    Reject,
}

impl Decision {
    fn accepts(self, status: QrSessionStatus) -> bool {
        match self {
            Decision::Scan => status == QrSessionStatus::Pending,
            Decision::Confirm | Decision::Reject => status.is_open(),
        }
    }
}

pub struct QrLoginMachine<S, U>
where
    S: QrSessionStore,
    U: UserStore,
{
    session_store: S,
    user_store: U,
    token_codec: Arc<dyn TokenCodec>,
    qr_renderer: Arc<dyn QrCodeRenderer>,
    clock: Arc<dyn Clock>,
    config: QrLoginConfig,
}

impl<S, U> Clone for QrLoginMachine<S, U>
where
    S: QrSessionStore + Clone,
    U: UserStore + Clone,
{
    fn clone(&self) -> Self {
        Self {
            session_store: self.session_store.clone(),
            user_store: self.user_store.clone(),
            token_codec: Arc::clone(&self.token_codec),
            qr_renderer: Arc::clone(&self.qr_renderer),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S, U> QrLoginMachine<S, U>
where
    S: QrSessionStore,
    U: UserStore,
{
    pub fn new(
        session_store: S,
        user_store: U,
        token_codec: Arc<dyn TokenCodec>,
        qr_renderer: Arc<dyn QrCodeRenderer>,
        clock: Arc<dyn Clock>,
        config: QrLoginConfig,
    ) -> Self {
        Self {
            session_store,
            user_store,
            token_codec,
            qr_renderer,
            clock,
            config,
        }
    }

    /// Create a `pending` session and render its deep link as a PNG data URI.
    #[tracing::instrument(name = "QrLoginMachine::create_session", skip(self))]
    pub async fn create_session(
        &self,
        device_info: Option<String>,
    ) -> Result<GeneratedQrCode, QrLoginError> {
        let session_id = QrSessionId::generate(&self.config.session_id_prefix);
        let payload = self.config.payload_for(&session_id);

        let renderer = Arc::clone(&self.qr_renderer);
        let encoded = payload.clone();
        let qr_code_image = tokio::task::spawn_blocking(move || renderer.render_data_uri(&encoded))
            .await
            .map_err(|e| QrLoginError::InternalError(e.to_string()))?
            .map_err(|e| QrLoginError::InternalError(e.to_string()))?;

        let session = QrSession::new(
            session_id.clone(),
            payload.clone(),
            device_info,
            self.clock.now(),
            self.config.session_ttl,
        );
        self.session_store.create(&session).await?;

        tracing::info!(
            session_id = %session_id,
            expires_at = %session.expires_at(),
            "QR login session created"
        );

        Ok(GeneratedQrCode {
            session_id,
            qr_code_image,
            payload,
            expires_at: session.expires_at(),
        })
    }

    /// Record that the app behind `app_token` has scanned the code.
    #[tracing::instrument(name = "QrLoginMachine::scan", skip(self, app_token))]
    pub async fn scan(
        &self,
        session_id: &QrSessionId,
        app_token: &str,
    ) -> Result<(), QrLoginError> {
        self.decide(session_id, app_token, Decision::Scan).await
    }

    #[tracing::instrument(name = "QrLoginMachine::approve", skip(self, app_token))]
    pub async fn approve(
        &self,
        session_id: &QrSessionId,
        app_token: &str,
    ) -> Result<(), QrLoginError> {
        self.decide(session_id, app_token, Decision::Confirm).await
    }

    #[tracing::instrument(name = "QrLoginMachine::reject", skip(self, app_token))]
    pub async fn reject(
        &self,
        session_id: &QrSessionId,
        app_token: &str,
    ) -> Result<(), QrLoginError> {
        self.decide(session_id, app_token, Decision::Reject).await
    }

    /// Report the current status, expiring the session first if its TTL has
    /// passed. A confirmed session yields a fresh token for its subject on
    /// every poll until it is swept.
    #[tracing::instrument(name = "QrLoginMachine::get_status", skip(self))]
    pub async fn get_status(
        &self,
        session_id: &QrSessionId,
    ) -> Result<QrLoginStatus, QrLoginError> {
        let now = self.clock.now();
        let mut session = self.load_for_status(session_id).await?;

        let mut attempts = 0;
        loop {
            let observed = session.status();
            if !session.expire_if_due(now) {
                break;
            }
            attempts += 1;
            match self.session_store.save_if_status(&session, observed).await {
                Ok(()) => {
                    tracing::info!(session_id = %session_id, "QR login session expired");
                    break;
                }
                Err(QrSessionStoreError::StatusChanged) if attempts < MAX_EXPIRY_WRITE_ATTEMPTS => {
                    session = self.load_for_status(session_id).await?;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "failed to persist QR session expiry"
                    );
                    break;
                }
            }
        }

        let status = session.status();
        let mut response = QrLoginStatus {
            session_id: session.id().clone(),
            status,
            message: status.message().to_owned(),
            token: None,
            user: None,
        };

        if status == QrSessionStatus::Confirmed {
            let subject = session.subject_user_id().ok_or_else(|| {
                QrLoginError::InternalError(format!(
                    "confirmed session {session_id} has no subject"
                ))
            })?;
            let user = match self.user_store.get_user(subject).await {
                Ok(user) => user,
                Err(UserStoreError::UserNotFound) => {
                    return Err(QrLoginError::InvalidOrExpiredSession);
                }
                Err(e) => return Err(QrLoginError::StorageFailure(e.to_string())),
            };
            if !user.is_active() {
                return Err(QrLoginError::AccountDeactivated);
            }
            let token = self
                .token_codec
                .issue(&TokenSubject::from(&user))
                .map_err(|e| QrLoginError::InternalError(e.to_string()))?;
            response.token = Some(token);
            response.user = Some(user.profile());
        }

        Ok(response)
    }

    async fn load_for_status(&self, session_id: &QrSessionId) -> Result<QrSession, QrLoginError> {
        match self.session_store.get(session_id).await {
            Ok(session) => Ok(session),
            Err(QrSessionStoreError::NotFound) => Err(QrLoginError::SessionNotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn decide(
        &self,
        session_id: &QrSessionId,
        app_token: &str,
        decision: Decision,
    ) -> Result<(), QrLoginError> {
        let mut session = match self.session_store.get(session_id).await {
            Ok(session) => session,
            Err(QrSessionStoreError::NotFound) => return Err(QrLoginError::InvalidOrExpiredSession),
            Err(e) => return Err(e.into()),
        };
        let observed = session.status();
        let now = self.clock.now();

        if session.expire_if_due(now) {
            if let Err(e) = self.session_store.save_if_status(&session, observed).await {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "failed to persist QR session expiry"
                );
            }
            return Err(QrLoginError::InvalidOrExpiredSession);
        }
        if !decision.accepts(observed) {
            return Err(QrLoginError::InvalidOrExpiredSession);
        }

        let user = self.resolve_app_user(app_token).await?;

        let applied = match decision {
            Decision::Scan => session.scan(user.id(), now),
            Decision::Confirm => session.confirm(user.id(), now),
            Decision::Reject => session.reject(user.id(), now),
        };
        if let Err(e) = applied {
            tracing::debug!(session_id = %session_id, error = %e, "QR session transition refused");
            return Err(QrLoginError::InvalidOrExpiredSession);
        }

        match self.session_store.save_if_status(&session, observed).await {
            Ok(()) => {
                tracing::info!(
                    session_id = %session_id,
                    user_id = %user.id(),
                    status = %session.status(),
                    "QR login session updated"
                );
                Ok(())
            }
            Err(QrSessionStoreError::StatusChanged | QrSessionStoreError::NotFound) => {
                Err(QrLoginError::InvalidOrExpiredSession)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_app_user(&self, app_token: &str) -> Result<User, QrLoginError> {
        let claims = self
            .token_codec
            .verify(app_token)
            .map_err(|_| QrLoginError::InvalidCredentials)?;

        let user = match self.user_store.get_user(claims.subject).await {
            Ok(user) => user,
            Err(UserStoreError::UserNotFound) => return Err(QrLoginError::InvalidCredentials),
            Err(e) => return Err(QrLoginError::StorageFailure(e.to_string())),
        };
        if !user.is_active() {
            return Err(QrLoginError::AccountDeactivated);
        }
        Ok(user)
    }
}
