pub mod email;
pub mod identity_token;
pub mod password;
pub mod qr_session;
pub mod user;
