pub mod auth_validation;
pub mod clock;
pub mod config;
pub mod hashing;
pub mod persistence;
pub mod qr;
pub mod token;

pub use auth_validation::bearer_token_validator::{BearerTokenValidator, TokenAuthError};
pub use clock::{ManualClock, SystemClock};
pub use hashing::argon2_password_hasher::Argon2PasswordHasher;
pub use persistence::{
    dashmap_qr_session_store::DashMapQrSessionStore, hashmap_user_store::HashMapUserStore,
    postgres_qr_session_store::PostgresQrSessionStore, postgres_user_store::PostgresUserStore,
    redis_qr_session_store::RedisQrSessionStore,
};
pub use qr::png_qr_code_renderer::PngQrCodeRenderer;
pub use token::jwt_token_codec::{JwtConfig, JwtTokenCodec};
