use std::sync::Arc;

use scanpass_core::{
    Clock, IdentityClaims, PasswordHasher, QrCodeRenderer, QrSessionId, QrSessionStore,
    QrSessionStoreError, TokenCodec, TokenError, UserId, UserStore,
};
use secrecy::Secret;

use crate::{
    qr_login::{GeneratedQrCode, QrLoginConfig, QrLoginError, QrLoginMachine, QrLoginStatus},
    use_cases::{
        AuthenticatedUser, ChangePasswordError, ChangePasswordUseCase, LoginError, LoginUseCase,
        LogoutUseCase, RefreshTokenError, RefreshTokenUseCase, SweepExpiredSessionsUseCase,
    },
};

/// Single entry point for the HTTP layer: password login, token refresh and
/// the QR login flow, all wired to the same stores and services.
pub struct LoginOrchestrator<U, S>
where
    U: UserStore + Clone,
    S: QrSessionStore + Clone,
{
    user_store: U,
    session_store: S,
    password_hasher: Arc<dyn PasswordHasher>,
    token_codec: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    qr_login: QrLoginMachine<S, U>,
}

impl<U, S> Clone for LoginOrchestrator<U, S>
where
    U: UserStore + Clone,
    S: QrSessionStore + Clone,
{
    fn clone(&self) -> Self {
        Self {
            user_store: self.user_store.clone(),
            session_store: self.session_store.clone(),
            password_hasher: Arc::clone(&self.password_hasher),
            token_codec: Arc::clone(&self.token_codec),
            clock: Arc::clone(&self.clock),
            qr_login: self.qr_login.clone(),
        }
    }
}

impl<U, S> LoginOrchestrator<U, S>
where
    U: UserStore + Clone,
    S: QrSessionStore + Clone,
{
    pub fn new(
        user_store: U,
        session_store: S,
        password_hasher: Arc<dyn PasswordHasher>,
        token_codec: Arc<dyn TokenCodec>,
        qr_renderer: Arc<dyn QrCodeRenderer>,
        clock: Arc<dyn Clock>,
        qr_config: QrLoginConfig,
    ) -> Self {
        let qr_login = QrLoginMachine::new(
            session_store.clone(),
            user_store.clone(),
            Arc::clone(&token_codec),
            qr_renderer,
            Arc::clone(&clock),
            qr_config,
        );
        Self {
            user_store,
            session_store,
            password_hasher,
            token_codec,
            clock,
            qr_login,
        }
    }

    pub async fn login(
        &self,
        email: Secret<String>,
        password: Secret<String>,
    ) -> Result<AuthenticatedUser, LoginError> {
        LoginUseCase::new(
            self.user_store.clone(),
            Arc::clone(&self.password_hasher),
            Arc::clone(&self.token_codec),
        )
        .execute(email, password)
        .await
    }

    pub async fn refresh_token(
        &self,
        user_id: UserId,
    ) -> Result<AuthenticatedUser, RefreshTokenError> {
        RefreshTokenUseCase::new(self.user_store.clone(), Arc::clone(&self.token_codec))
            .execute(user_id)
            .await
    }

    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: Secret<String>,
        new_password: Secret<String>,
    ) -> Result<(), ChangePasswordError> {
        ChangePasswordUseCase::new(
            self.user_store.clone(),
            Arc::clone(&self.password_hasher),
            Arc::clone(&self.clock),
        )
        .execute(user_id, current_password, new_password)
        .await
    }

    pub async fn logout(&self, user_id: UserId) {
        LogoutUseCase::new().execute(user_id).await
    }

    pub fn verify_token(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        self.token_codec.verify(token)
    }

    pub async fn generate_qr(
        &self,
        device_info: Option<String>,
    ) -> Result<GeneratedQrCode, QrLoginError> {
        self.qr_login.create_session(device_info).await
    }

    pub async fn scan_qr(
        &self,
        session_id: &QrSessionId,
        app_token: &str,
    ) -> Result<(), QrLoginError> {
        self.qr_login.scan(session_id, app_token).await
    }

    pub async fn confirm_qr(
        &self,
        session_id: &QrSessionId,
        app_token: &str,
    ) -> Result<(), QrLoginError> {
        self.qr_login.approve(session_id, app_token).await
    }

    pub async fn reject_qr(
        &self,
        session_id: &QrSessionId,
        app_token: &str,
    ) -> Result<(), QrLoginError> {
        self.qr_login.reject(session_id, app_token).await
    }

    pub async fn qr_status(&self, session_id: &QrSessionId) -> Result<QrLoginStatus, QrLoginError> {
        self.qr_login.get_status(session_id).await
    }

    pub async fn sweep_expired_sessions(&self) -> Result<u64, QrSessionStoreError> {
        SweepExpiredSessionsUseCase::new(self.session_store.clone(), Arc::clone(&self.clock))
            .execute()
            .await
    }
}
