//! In-memory doubles shared by the use case and QR login tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering},
    },
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::RwLock;

use scanpass_core::{
    Clock, Email, IdentityClaims, IdentityToken, NewUser, Password, PasswordHasher,
    PasswordHasherError, QrCodeError, QrCodeRenderer, QrSession, QrSessionId, QrSessionStatus,
    QrSessionStore, QrSessionStoreError, Role, TokenCodec, TokenError, TokenSubject, User,
    UserId, UserStore, UserStoreError,
};

#[derive(Clone, Default)]
pub struct MockUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    next_id: Arc<AtomicI64>,
}

impl MockUserStore {
    pub async fn insert_with_id(&self, id: i64, email: &str, password: &str, active: bool) -> User {
        let new_user = NewUser {
            username: email.split('@').next().unwrap_or_default().to_owned(),
            email: Email::try_from(Secret::new(email.to_owned())).unwrap(),
            password_hash: Secret::new(format!("hashed:{password}")),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            role: Role::User,
            is_active: active,
        };
        let user = User::new(UserId::new(id), new_user, test_epoch());
        self.users.write().await.insert(user.id(), user.clone());
        user
    }

    pub async fn set_active(&self, id: UserId, active: bool) {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.set_active(active, test_epoch());
        }
    }

    pub async fn password_hash_of(&self, id: UserId) -> String {
        self.users.read().await[&id].password_hash().expose_secret().clone()
    }
}

#[async_trait::async_trait]
impl UserStore for MockUserStore {
    async fn add_user(&self, user: NewUser) -> Result<User, UserStoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User::new(UserId::new(id), user, test_epoch());
        self.users.write().await.insert(user.id(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
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

#[derive(Clone, Default)]
pub struct MockQrSessionStore {
    sessions: Arc<RwLock<HashMap<QrSessionId, QrSession>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockQrSessionStore {
    pub async fn stored(&self, id: &QrSessionId) -> QrSession {
        self.sessions.read().await[id].clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn overwrite(&self, session: QrSession) {
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), QrSessionStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(QrSessionStoreError::StorageFailure(
                "store is read-only".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl QrSessionStore for MockQrSessionStore {
    async fn create(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        self.check_writable()?;
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(QrSessionStoreError::Conflict);
        }
        sessions.insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &QrSessionId) -> Result<QrSession, QrSessionStoreError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(QrSessionStoreError::NotFound)
    }

    async fn save(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        self.check_writable()?;
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session.id()) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(QrSessionStoreError::NotFound),
        }
    }

    async fn save_if_status(
        &self,
        session: &QrSession,
        expected: QrSessionStatus,
    ) -> Result<(), QrSessionStoreError> {
        self.check_writable()?;
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session.id()) {
            Some(stored) if stored.status() == expected => {
                *stored = session.clone();
                Ok(())
            }
            Some(_) => Err(QrSessionStoreError::StatusChanged),
            None => Err(QrSessionStoreError::NotFound),
        }
    }

    async fn delete_expired_before(
        &self,
        cutoff: DateTime<Utc>,
        statuses: &[QrSessionStatus],
    ) -> Result<u64, QrSessionStoreError> {
        self.check_writable()?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !(s.expires_at() < cutoff && statuses.contains(&s.status())));
        Ok((before - sessions.len()) as u64)
    }
}

/// Stores `hashed:<plaintext>`; good enough to tell hashes from passwords.
pub struct PlainTextHasher;

#[async_trait::async_trait]
impl PasswordHasher for PlainTextHasher {
    async fn hash_password(
        &self,
        password: Password,
    ) -> Result<Secret<String>, PasswordHasherError> {
        Ok(Secret::new(format!(
            "hashed:{}",
            password.as_ref().expose_secret()
        )))
    }

    async fn verify_password(
        &self,
        expected_hash: Secret<String>,
        candidate: Password,
    ) -> Result<(), PasswordHasherError> {
        let candidate_hash = format!("hashed:{}", candidate.as_ref().expose_secret());
        if expected_hash.expose_secret() == &candidate_hash {
            Ok(())
        } else {
            Err(PasswordHasherError::Mismatch)
        }
    }
}

/// Tokens look like `token:<user id>:<role>:<serial>`. Anything else is rejected.
#[derive(Default)]
pub struct FakeTokenCodec {
    serial: AtomicU64,
}

impl FakeTokenCodec {
    pub fn token_for(user_id: i64) -> String {
        format!("token:{user_id}:user:0")
    }
}

impl TokenCodec for FakeTokenCodec {
    fn issue(&self, subject: &TokenSubject) -> Result<IdentityToken, TokenError> {
        let serial = self.serial.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IdentityToken::new(format!(
            "token:{}:{}:{serial}",
            subject.user_id, subject.role
        )))
    }

    fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let mut parts = token.split(':');
        if parts.next() != Some("token") {
            return Err(TokenError::InvalidToken);
        }
        let subject = parts
            .next()
            .and_then(|id| id.parse::<UserId>().ok())
            .ok_or(TokenError::InvalidToken)?;
        let role = parts
            .next()
            .and_then(|role| role.parse::<Role>().ok())
            .ok_or(TokenError::InvalidToken)?;
        let now = test_epoch();
        Ok(IdentityClaims {
            subject,
            email: String::new(),
            role,
            issued_at: now,
            not_before: now,
            expires_at: now + Duration::days(1),
        })
    }
}

pub struct FakeQrRenderer;

impl QrCodeRenderer for FakeQrRenderer {
    fn render_data_uri(&self, payload: &str) -> Result<String, QrCodeError> {
        Ok(format!("data:image/png;base64,{payload}"))
    }
}

pub struct BrokenQrRenderer;

impl QrCodeRenderer for BrokenQrRenderer {
    fn render_data_uri(&self, _payload: &str) -> Result<String, QrCodeError> {
        Err(QrCodeError::Encoding("payload too long".to_owned()))
    }
}

#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(test_epoch())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}
