use std::{sync::Arc, time::Duration};

use color_eyre::eyre::Result;
use scanpass::{
    AppState, Argon2PasswordHasher, AuthService, BearerTokenValidator, DashMapQrSessionStore,
    Email, HashMapUserStore, JwtTokenCodec, LoginOrchestrator, NewUser, Password,
    PasswordHasher, PngQrCodeRenderer, PostgresQrSessionStore, PostgresUserStore,
    QrSessionStore, RedisQrSessionStore, Role, Secret, SystemClock, UserStore, UserStoreError,
    adapters::config::{AuthServiceSetting, SeedUserSetting, StorageBackend},
    service::helpers::{configure_postgresql, configure_redis, qr_login_config},
    spawn_session_sweeper,
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let config = AuthServiceSetting::load()?;

    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            serve(&config, HashMapUserStore::new(), DashMapQrSessionStore::new()).await
        }
        StorageBackend::Postgres => {
            let pg_pool = configure_postgresql(&config).await?;
            serve(
                &config,
                PostgresUserStore::new(pg_pool.clone()),
                PostgresQrSessionStore::new(pg_pool),
            )
            .await
        }
        StorageBackend::Redis => {
            let pg_pool = configure_postgresql(&config).await?;
            let redis_conn = configure_redis(&config)?;
            serve(
                &config,
                PostgresUserStore::new(pg_pool),
                RedisQrSessionStore::new(redis_conn),
            )
            .await
        }
    }
}

async fn serve<U, S>(config: &AuthServiceSetting, user_store: U, session_store: S) -> Result<()>
where
    U: UserStore + Clone + 'static,
    S: QrSessionStore + Clone + 'static,
{
    let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new()?);
    let token_codec = Arc::new(JwtTokenCodec::new(&config.auth.jwt.jwt_config()));

    if let Some(seed_user) = &config.seed_user {
        seed(&user_store, password_hasher.as_ref(), seed_user).await?;
    }

    let orchestrator = LoginOrchestrator::new(
        user_store,
        session_store,
        password_hasher,
        token_codec.clone(),
        Arc::new(PngQrCodeRenderer::new(config.auth.qr.qr_image_size)),
        Arc::new(SystemClock),
        qr_login_config(&config.auth.qr),
    );

    spawn_session_sweeper(
        orchestrator.clone(),
        Duration::from_secs(config.auth.qr.sweep_interval),
    );

    let state = AppState::new(orchestrator, BearerTokenValidator::new(token_codec));
    let auth_service = AuthService::new(state);

    let allowed_origins = config.application.allowed_origins.clone();
    let allowed_origins = (!allowed_origins.is_empty()).then_some(allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.application.address).await?;
    tracing::info!("Starting scanpass auth service...");

    auth_service
        .run_standalone(listener, allowed_origins)
        .await?;

    Ok(())
}

/// There is no signup route, so a first account can be provisioned from config.
async fn seed<U: UserStore>(
    user_store: &U,
    password_hasher: &dyn PasswordHasher,
    seed_user: &SeedUserSetting,
) -> Result<()> {
    let email = Email::try_from(Secret::new(seed_user.email.clone()))?;
    let password = Password::try_from(seed_user.password.clone())?;
    let password_hash = password_hasher.hash_password(password).await?;

    let new_user = NewUser {
        username: seed_user.username.clone(),
        email,
        password_hash,
        first_name: String::new(),
        last_name: String::new(),
        role: Role::Admin,
        is_active: true,
    };

    match user_store.add_user(new_user).await {
        Ok(user) => tracing::info!(user_id = %user.id(), "Seeded user {}", seed_user.username),
        Err(UserStoreError::UserAlreadyExists) => {
            tracing::info!("Seed user {} already exists", seed_user.username)
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub fn init_tracing() -> Result<()> {
    let fmt_layer = fmt::layer().compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}
