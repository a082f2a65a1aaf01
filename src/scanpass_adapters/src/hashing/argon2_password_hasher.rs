use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
    password_hash::{self, PasswordHasher as _, SaltString, rand_core},
};
use scanpass_core::{Password, PasswordHasher, PasswordHasherError};
use secrecy::{ExposeSecret, Secret};

/// Argon2id with the parameters used across the service. Hashing runs on the
/// blocking pool so it never stalls the async workers.
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new() -> Result<Self, PasswordHasherError> {
        let params = Params::new(15000, 2, 1, None)
            .map_err(|e| PasswordHasherError::UnexpectedError(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

#[async_trait::async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    #[tracing::instrument(name = "Computing password hash", skip_all)]
    async fn hash_password(
        &self,
        password: Password,
    ) -> Result<Secret<String>, PasswordHasherError> {
        let current_span: tracing::Span = tracing::Span::current();
        let params = self.params.clone();

        tokio::task::spawn_blocking(move || {
            current_span.in_scope(move || {
                let salt: SaltString = SaltString::generate(rand_core::OsRng);
                Self::argon2(params)
                    .hash_password(password.as_ref().expose_secret().as_bytes(), &salt)
                    .map(|h| Secret::from(h.to_string()))
                    .map_err(|e| PasswordHasherError::UnexpectedError(e.to_string()))
            })
        })
        .await
        .map_err(|e| PasswordHasherError::UnexpectedError(e.to_string()))?
    }

    #[tracing::instrument(name = "Verify password hash", skip_all)]
    async fn verify_password(
        &self,
        expected_hash: Secret<String>,
        candidate: Password,
    ) -> Result<(), PasswordHasherError> {
        let current_span: tracing::Span = tracing::Span::current();
        let params = self.params.clone();

        tokio::task::spawn_blocking(move || {
            current_span.in_scope(|| {
                let expected_hash = PasswordHash::new(expected_hash.expose_secret())
                    .map_err(|e| PasswordHasherError::UnexpectedError(e.to_string()))?;

                Self::argon2(params)
                    .verify_password(candidate.as_ref().expose_secret().as_bytes(), &expected_hash)
                    .map_err(|e| match e {
                        password_hash::Error::Password => PasswordHasherError::Mismatch,
                        e => PasswordHasherError::UnexpectedError(e.to_string()),
                    })
            })
        })
        .await
        .map_err(|e| PasswordHasherError::UnexpectedError(e.to_string()))?
    }
}
