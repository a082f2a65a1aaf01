pub mod orchestrator;
pub mod qr_login;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestrator::LoginOrchestrator;
pub use qr_login::{GeneratedQrCode, QrLoginConfig, QrLoginError, QrLoginMachine, QrLoginStatus};
pub use use_cases::{
    AuthenticatedUser, ChangePasswordError, ChangePasswordUseCase, LoginError, LoginUseCase,
    LogoutUseCase, RefreshTokenError, RefreshTokenUseCase, SweepExpiredSessionsUseCase,
};
