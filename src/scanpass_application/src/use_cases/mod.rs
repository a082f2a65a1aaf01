pub mod change_password;
pub mod login;
pub mod logout;
pub mod refresh_token;
pub mod sweep_sessions;

pub use change_password::{ChangePasswordError, ChangePasswordUseCase};
pub use login::{AuthenticatedUser, LoginError, LoginUseCase};
pub use logout::LogoutUseCase;
pub use refresh_token::{RefreshTokenError, RefreshTokenUseCase};
pub use sweep_sessions::SweepExpiredSessionsUseCase;
