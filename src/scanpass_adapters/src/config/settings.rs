use std::env;

use chrono::Duration;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use http::HeaderValue;
use secrecy::Secret;
use serde::Deserialize;

use crate::config::constants::{
    defaults,
    env::{
        AUTH_SERVICE_ALLOWED_ORIGINS_ENV_VAR, DATABASE_URL_ENV_VAR, JWT_SECRET_ENV_VAR,
        REDIS_HOST_NAME_ENV_VAR, SETTINGS_ENV_PREFIX,
    },
    prod,
};
use crate::token::jwt_token_codec::JwtConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthServiceSetting {
    pub application: ApplicationSetting,
    pub auth: AuthSetting,
    pub storage: StorageSetting,
    pub postgres: PostgresSetting,
    pub redis: RedisSetting,
    /// Account created at startup when absent. Handy for local runs.
    #[serde(default)]
    pub seed_user: Option<SeedUserSetting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSetting {
    pub address: String,
    pub allowed_origins: AllowedOrigins,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSetting {
    pub jwt: JwtSetting,
    pub qr: QrSetting,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSetting {
    pub secret: Secret<String>,
    /// Seconds.
    pub time_to_live: i64,
}

impl JwtSetting {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.secret.clone(),
            time_to_live: Duration::seconds(self.time_to_live),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QrSetting {
    pub deep_link_scheme: String,
    pub session_id_prefix: String,
    /// Seconds a session stays open.
    pub session_ttl: i64,
    /// Seconds between expired-session sweeps.
    pub sweep_interval: u64,
    /// Minimum edge length of the rendered PNG, in pixels.
    pub qr_image_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Users and sessions in process memory.
    Memory,
    /// Users and sessions in PostgreSQL.
    Postgres,
    /// Users in PostgreSQL, sessions in Redis.
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSetting {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSetting {
    pub url: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSetting {
    pub host_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUserSetting {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
}

/// Origins allowed to call the service from a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    /// Parse a comma separated list, ignoring blanks.
    pub fn parse_list(value: &str) -> Self {
        Self(
            value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    pub fn contains(&self, origin: &HeaderValue) -> bool {
        origin
            .to_str()
            .map(|origin| self.0.iter().any(|allowed| allowed == origin))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl AuthServiceSetting {
    /// Defaults, then `config/base.json` and `config/local.json` when present,
    /// then `SCANPASS__*` variables, then the well-known variables such as
    /// `JWT_SECRET`. A `.env` file is read first if there is one.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = Self::with_defaults()?
            .add_source(File::with_name("config/base").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix(SETTINGS_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            );

        if let Ok(secret) = env::var(JWT_SECRET_ENV_VAR) {
            builder = builder.set_override("auth.jwt.secret", secret)?;
        }
        if let Ok(url) = env::var(DATABASE_URL_ENV_VAR) {
            builder = builder.set_override("postgres.url", url)?;
        }
        if let Ok(host_name) = env::var(REDIS_HOST_NAME_ENV_VAR) {
            builder = builder.set_override("redis.host_name", host_name)?;
        }
        if let Ok(origins) = env::var(AUTH_SERVICE_ALLOWED_ORIGINS_ENV_VAR) {
            let origins = AllowedOrigins::parse_list(&origins);
            builder = builder.set_override("application.allowed_origins", origins.0)?;
        }

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("application.address", prod::APP_ADDRESS)?
            .set_default("application.allowed_origins", Vec::<String>::new())?
            .set_default("auth.jwt.time_to_live", defaults::TOKEN_TTL_SECONDS)?
            .set_default("auth.qr.deep_link_scheme", defaults::DEEP_LINK_SCHEME)?
            .set_default("auth.qr.session_id_prefix", defaults::SESSION_ID_PREFIX)?
            .set_default("auth.qr.session_ttl", defaults::QR_SESSION_TTL_SECONDS)?
            .set_default("auth.qr.sweep_interval", defaults::SWEEP_INTERVAL_SECONDS)?
            .set_default("auth.qr.qr_image_size", defaults::QR_IMAGE_SIZE)?
            .set_default("storage.backend", "memory")?
            .set_default("postgres.url", defaults::POSTGRES_URL)?
            .set_default("redis.host_name", defaults::REDIS_HOST_NAME)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.auth.jwt.secret.expose_secret().is_empty() {
            return Err(ConfigError::Message(format!(
                "{JWT_SECRET_ENV_VAR} must not be empty"
            )));
        }
        if self.auth.qr.session_ttl <= 0 {
            return Err(ConfigError::Message(
                "auth.qr.session_ttl must be positive".to_owned(),
            ));
        }
        if self.auth.qr.sweep_interval == 0 {
            return Err(ConfigError::Message(
                "auth.qr.sweep_interval must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}
