pub mod domain;
pub mod ports;
pub mod strategies;

// Re-export commonly used types for convenience
pub use domain::{
    email::Email,
    identity_token::{IdentityClaims, IdentityToken, TokenSubject},
    password::Password,
    qr_session::{
        DEFAULT_QR_SESSION_TTL_SECONDS, QrSession, QrSessionError, QrSessionId, QrSessionRecord,
        QrSessionStatus,
    },
    user::{NewUser, Role, User, UserError, UserId, UserProfile},
};

pub use ports::{
    repositories::{QrSessionStore, QrSessionStoreError, UserStore, UserStoreError},
    services::{
        Clock, PasswordHasher, PasswordHasherError, QrCodeError, QrCodeRenderer, TokenCodec,
        TokenError,
    },
};

pub use strategies::auth_validator::AuthValidator;
