use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use scanpass_core::{
    IdentityClaims, IdentityToken, Role, TokenCodec, TokenError, TokenSubject, UserId,
};

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub time_to_live: Duration,
}

impl JwtConfig {
    pub fn new(secret: Secret<String>) -> Self {
        Self {
            secret,
            time_to_live: Duration::seconds(DEFAULT_TOKEN_TTL_SECONDS),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

/// Wire form of the claim set.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    role: Role,
    iat: i64,
    nbf: i64,
    exp: i64,
}

/// HS256 JSON Web Tokens signed with a shared secret.
///
/// Verification accepts HS256 only, requires `exp`, `nbf` and `sub`, and
/// allows no clock skew.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    time_to_live: Duration,
}

impl JwtTokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.as_bytes()),
            validation,
            time_to_live: config.time_to_live,
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, subject: &TokenSubject) -> Result<IdentityToken, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.time_to_live)
            .ok_or_else(|| TokenError::Signing("Duration out of range".to_owned()))?;

        let claims = Claims {
            sub: subject.user_id.to_string(),
            email: subject.email.clone(),
            role: subject.role,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map(IdentityToken::new)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                TokenError::InvalidToken
            })?;

        Ok(IdentityClaims {
            subject: claims
                .sub
                .parse::<UserId>()
                .map_err(|_| TokenError::InvalidToken)?,
            email: claims.email,
            role: claims.role,
            issued_at: timestamp(claims.iat)?,
            not_before: timestamp(claims.nbf)?,
            expires_at: timestamp(claims.exp)?,
        })
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(seconds, 0).ok_or(TokenError::InvalidToken)
}
