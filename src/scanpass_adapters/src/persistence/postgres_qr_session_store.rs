use chrono::{DateTime, Utc};
use scanpass_core::{
    QrSession, QrSessionId, QrSessionRecord, QrSessionStatus, QrSessionStore, QrSessionStoreError,
    UserId,
};
use sqlx::{PgPool, Pool, Postgres};

#[derive(Clone)]
pub struct PostgresQrSessionStore {
    pool: PgPool,
}

impl PostgresQrSessionStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PostgresQrSessionStore { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QrSessionRow {
    id: String,
    status: String,
    user_id: Option<i64>,
    payload: String,
    device_info: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QrSessionRow> for QrSession {
    type Error = QrSessionStoreError;

    fn try_from(row: QrSessionRow) -> Result<Self, Self::Error> {
        let corrupt =
            |e: scanpass_core::QrSessionError| QrSessionStoreError::StorageFailure(e.to_string());
        let record = QrSessionRecord {
            id: QrSessionId::parse(row.id).map_err(corrupt)?,
            status: row.status.parse::<QrSessionStatus>().map_err(corrupt)?,
            subject_user_id: row.user_id.map(UserId::new),
            payload: row.payload,
            device_info: row.device_info,
            created_at: row.created_at,
            expires_at: row.expires_at,
            updated_at: row.updated_at,
        };
        QrSession::try_from(record).map_err(corrupt)
    }
}

fn storage_failure(e: sqlx::Error) -> QrSessionStoreError {
    QrSessionStoreError::StorageFailure(e.to_string())
}

#[async_trait::async_trait]
impl QrSessionStore for PostgresQrSessionStore {
    #[tracing::instrument(name = "Creating QR session in PostgreSQL", skip_all)]
    async fn create(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        sqlx::query(
            r#"
                INSERT INTO qr_login_sessions
                    (id, status, user_id, payload, device_info, created_at, expires_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.status().as_str())
        .bind(session.subject_user_id().map(|id| id.as_i64()))
        .bind(session.payload())
        .bind(session.device_info())
        .bind(session.created_at())
        .bind(session.expires_at())
        .bind(session.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return QrSessionStoreError::Conflict;
                }
            }
            storage_failure(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving QR session from PostgreSQL", skip_all)]
    async fn get(&self, id: &QrSessionId) -> Result<QrSession, QrSessionStoreError> {
        let row = sqlx::query_as::<_, QrSessionRow>(
            r#"
                SELECT id, status, user_id, payload, device_info, created_at, expires_at, updated_at
                FROM qr_login_sessions
                WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_failure)?;

        let Some(row) = row else {
            return Err(QrSessionStoreError::NotFound);
        };
        row.try_into()
    }

    #[tracing::instrument(name = "Saving QR session to PostgreSQL", skip_all)]
    async fn save(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE qr_login_sessions
                SET status = $2, user_id = $3, updated_at = $4
                WHERE id = $1
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.status().as_str())
        .bind(session.subject_user_id().map(|id| id.as_i64()))
        .bind(session.updated_at())
        .execute(&self.pool)
        .await
        .map_err(storage_failure)?;

        if result.rows_affected() == 0 {
            return Err(QrSessionStoreError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Conditionally saving QR session to PostgreSQL", skip_all)]
    async fn save_if_status(
        &self,
        session: &QrSession,
        expected: QrSessionStatus,
    ) -> Result<(), QrSessionStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE qr_login_sessions
                SET status = $2, user_id = $3, updated_at = $4
                WHERE id = $1 AND status = $5
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.status().as_str())
        .bind(session.subject_user_id().map(|id| id.as_i64()))
        .bind(session.updated_at())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_failure)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Zero rows: either the id is gone or another writer got there first.
        let exists: Option<(String,)> =
            sqlx::query_as("SELECT id FROM qr_login_sessions WHERE id = $1")
                .bind(session.id().as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_failure)?;

        match exists {
            Some(_) => Err(QrSessionStoreError::StatusChanged),
            None => Err(QrSessionStoreError::NotFound),
        }
    }

    #[tracing::instrument(name = "Deleting expired QR sessions from PostgreSQL", skip_all)]
    async fn delete_expired_before(
        &self,
        cutoff: DateTime<Utc>,
        statuses: &[QrSessionStatus],
    ) -> Result<u64, QrSessionStoreError> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();

        let result = sqlx::query(
            r#"
                DELETE FROM qr_login_sessions
                WHERE expires_at < $1 AND status = ANY($2)
            "#,
        )
        .bind(cutoff)
        .bind(statuses)
        .execute(&self.pool)
        .await
        .map_err(storage_failure)?;

        Ok(result.rows_affected())
    }
}
