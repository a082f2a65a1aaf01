//! HTTP boundary for the login service: axum routes, request and response
//! bodies, the bearer-token extractor and the mapping of application errors
//! onto status codes.

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

pub use error::{AuthApiError, ErrorResponse};
pub use extractors::Authenticated;
pub use state::AppState;
