use std::sync::Arc;

use chrono::Duration;
use redis::{Client, RedisResult};
use scanpass_adapters::config::{AuthServiceSetting, QrSetting};
use scanpass_application::QrLoginConfig;
use secrecy::ExposeSecret;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::sync::RwLock;

/// Connect to PostgreSQL and run pending migrations.
pub async fn configure_postgresql(config: &AuthServiceSetting) -> Result<PgPool, sqlx::Error> {
    let pg_pool = get_postgres_pool(config.postgres.url.expose_secret()).await?;

    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    Ok(pg_pool)
}

/// Open the shared Redis connection used by the session store.
pub fn configure_redis(config: &AuthServiceSetting) -> RedisResult<Arc<RwLock<redis::Connection>>> {
    let connection = get_redis_client(&config.redis.host_name)?.get_connection()?;
    Ok(Arc::new(RwLock::new(connection)))
}

pub async fn get_postgres_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(5).connect(url).await
}

pub fn get_redis_client(redis_hostname: &str) -> RedisResult<Client> {
    let redis_url = format!("redis://{}/", redis_hostname);
    redis::Client::open(redis_url)
}

pub fn qr_login_config(setting: &QrSetting) -> QrLoginConfig {
    QrLoginConfig {
        deep_link_scheme: setting.deep_link_scheme.clone(),
        session_id_prefix: setting.session_id_prefix.clone(),
        session_ttl: Duration::seconds(setting.session_ttl),
    }
}
