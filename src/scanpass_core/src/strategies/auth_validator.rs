use async_trait::async_trait;

/// Trait for validating credentials on protected routes.
///
/// Validators extract the credential from the request (for bearer tokens, the
/// `Authorization` header), verify it, and produce the claims handed to the
/// route handler.
///
/// # Implementation Note
///
/// The validator receives `RequestParts` (headers, method, URI, extensions) rather
/// than the full request to avoid issues with non-`Sync` request bodies.
#[async_trait]
pub trait AuthValidator: Clone + Send + Sync + 'static {
    /// The claims extracted from a valid credential.
    type Claims: Clone + Send + Sync + 'static;

    /// Typically `http::request::Parts`.
    type RequestParts: Send + Sync;

    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if:
    /// - No credential is present
    /// - The credential is malformed, wrongly signed or expired
    async fn validate(&self, parts: &Self::RequestParts) -> Result<Self::Claims, Self::Error>;
}
