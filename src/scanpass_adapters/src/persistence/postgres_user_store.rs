use chrono::{DateTime, Utc};
use scanpass_core::{Email, NewUser, Role, User, UserId, UserStore, UserStoreError};
use secrecy::{ExposeSecret, Secret};
use sqlx::{PgPool, Pool, Postgres};

#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PostgresUserStore { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    avatar: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::try_from(Secret::from(row.email))
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        Ok(User::restore(
            UserId::new(row.id),
            row.username,
            email,
            Secret::from(row.password_hash),
            row.first_name,
            row.last_name,
            role,
            row.avatar,
            row.is_active,
            row.created_at,
            row.updated_at,
        ))
    }
}

const SELECT_USER: &str = r#"
    SELECT id, username, email, password_hash, first_name, last_name, role, avatar,
           is_active, created_at, updated_at
    FROM users
"#;

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(name = "Adding user to PostgreSQL", skip_all)]
    async fn add_user(&self, user: NewUser) -> Result<User, UserStoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                INSERT INTO users
                    (username, email, password_hash, first_name, last_name, role, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, username, email, password_hash, first_name, last_name, role, avatar,
                          is_active, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(user.email.as_str())
        .bind(user.password_hash.expose_secret())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return UserStoreError::UserAlreadyExists;
                }
            }
            UserStoreError::UnexpectedError(e.to_string())
        })?;

        row.try_into()
    }

    #[tracing::instrument(name = "Retrieving user by id from PostgreSQL", skip_all)]
    async fn get_user(&self, id: UserId) -> Result<User, UserStoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        let Some(row) = row else {
            return Err(UserStoreError::UserNotFound);
        };
        row.try_into()
    }

    #[tracing::instrument(name = "Retrieving user by email from PostgreSQL", skip_all)]
    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        let Some(row) = row else {
            return Err(UserStoreError::UserNotFound);
        };
        row.try_into()
    }

    #[tracing::instrument(name = "Set new password hash", skip_all)]
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: Secret<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE users
                SET password_hash = $1, updated_at = $2
                WHERE id = $3
            "#,
        )
        .bind(password_hash.expose_secret())
        .bind(updated_at)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::UserNotFound);
        }
        Ok(())
    }
}
