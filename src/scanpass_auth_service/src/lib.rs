pub mod auth_service;
pub mod helpers;
pub mod sweeper;
pub mod tracing;

pub use auth_service::AuthService;
pub use sweeper::spawn_session_sweeper;
