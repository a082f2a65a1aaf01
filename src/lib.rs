//! # scanpass
//!
//! Facade crate that re-exports the public API of the QR login service
//! components.
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `Password`, `User`, `QrSession`, `IdentityToken`, etc.
//! - **Ports**: `UserStore`, `QrSessionStore`, `TokenCodec`, `PasswordHasher`, `Clock`
//! - **Application**: `LoginOrchestrator`, `QrLoginMachine` and the use cases
//! - **Adapters**: `JwtTokenCodec`, `PostgresUserStore`, `RedisQrSessionStore`, etc.
//! - **Service**: `AuthService`, the axum router with CORS and request tracing

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use scanpass_core::*;
}

pub use scanpass_core::{
    Email, IdentityClaims, IdentityToken, NewUser, Password, QrSession, QrSessionId,
    QrSessionStatus, Role, TokenSubject, User, UserError, UserId, UserProfile,
};

// ============================================================================
// Ports
// ============================================================================

pub use scanpass_core::{
    Clock, PasswordHasher, PasswordHasherError, QrCodeRenderer, QrSessionStore,
    QrSessionStoreError, TokenCodec, TokenError, UserStore, UserStoreError,
};

// ============================================================================
// Application Layer
// ============================================================================

/// Use cases and the QR login state machine
pub mod application {
    pub use scanpass_application::*;
}

pub use scanpass_application::{
    AuthenticatedUser, GeneratedQrCode, LoginOrchestrator, QrLoginConfig, QrLoginError,
    QrLoginMachine, QrLoginStatus,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    pub use scanpass_adapters::*;
}

pub use scanpass_adapters::{
    Argon2PasswordHasher, BearerTokenValidator, DashMapQrSessionStore, HashMapUserStore,
    JwtConfig, JwtTokenCodec, ManualClock, PngQrCodeRenderer, PostgresQrSessionStore,
    PostgresUserStore, RedisQrSessionStore, SystemClock,
};

// ============================================================================
// HTTP boundary and service
// ============================================================================

/// Axum routes, extractors and error mapping
pub mod http {
    pub use scanpass_axum::*;
}

pub use scanpass_axum::{AppState, AuthApiError};

/// Router assembly, sweeper and connection helpers
pub mod service {
    pub use scanpass_auth_service::*;
}

pub use scanpass_auth_service::{AuthService, spawn_session_sweeper};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the store traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};
