use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use redis::{Commands, Connection, Script};
use scanpass_core::{
    QrSession, QrSessionId, QrSessionRecord, QrSessionStatus, QrSessionStore, QrSessionStoreError,
};
use tokio::sync::RwLock;

/// How long a record outlives its session expiry before Redis drops it. Gives
/// pollers time to observe `expired` and the sweeper a chance to run first.
const KEY_RETENTION_SECONDS: i64 = 60 * 60;

// We are using a key prefix to prevent collisions and organize data!
const QR_SESSION_KEY_PREFIX: &str = "qr_session:";

const SCAN_BATCH_SIZE: usize = 200;

/// Returns -1 when the key is gone, 0 when the status moved, 1 on write.
static COMPARE_AND_SET: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        local current = redis.call('GET', KEYS[1])
        if not current then
            return -1
        end
        if cjson.decode(current)['status'] ~= ARGV[1] then
            return 0
        end
        redis.call('SET', KEYS[1], ARGV[2], 'KEEPTTL')
        return 1
        "#,
    )
});

#[derive(Clone)]
pub struct RedisQrSessionStore {
    conn: Arc<RwLock<Connection>>,
}

impl RedisQrSessionStore {
    pub fn new(conn: Arc<RwLock<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl QrSessionStore for RedisQrSessionStore {
    #[tracing::instrument(name = "Creating QR session in Redis", skip_all)]
    async fn create(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        let key = get_key(session.id());
        let value = encode(session)?;
        let ttl = key_ttl_seconds(session.expires_at(), Utc::now());

        let mut conn = self.conn.write().await;
        let created: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query(&mut *conn)
            .map_err(storage_failure)?;

        match created {
            Some(_) => Ok(()),
            None => Err(QrSessionStoreError::Conflict),
        }
    }

    #[tracing::instrument(name = "Retrieving QR session from Redis", skip_all)]
    async fn get(&self, id: &QrSessionId) -> Result<QrSession, QrSessionStoreError> {
        let key = get_key(id);

        let mut conn = self.conn.write().await;
        let value: Option<String> = conn.get(&key).map_err(storage_failure)?;

        let Some(value) = value else {
            return Err(QrSessionStoreError::NotFound);
        };
        decode(&value)
    }

    #[tracing::instrument(name = "Saving QR session to Redis", skip_all)]
    async fn save(&self, session: &QrSession) -> Result<(), QrSessionStoreError> {
        let key = get_key(session.id());
        let value = encode(session)?;

        let mut conn = self.conn.write().await;
        let saved: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("XX")
            .arg("KEEPTTL")
            .query(&mut *conn)
            .map_err(storage_failure)?;

        match saved {
            Some(_) => Ok(()),
            None => Err(QrSessionStoreError::NotFound),
        }
    }

    #[tracing::instrument(name = "Conditionally saving QR session to Redis", skip_all)]
    async fn save_if_status(
        &self,
        session: &QrSession,
        expected: QrSessionStatus,
    ) -> Result<(), QrSessionStoreError> {
        let key = get_key(session.id());
        let value = encode(session)?;

        let mut conn = self.conn.write().await;
        let outcome: i64 = COMPARE_AND_SET
            .key(&key)
            .arg(expected.as_str())
            .arg(value)
            .invoke(&mut *conn)
            .map_err(storage_failure)?;

        match outcome {
            1 => Ok(()),
            0 => Err(QrSessionStoreError::StatusChanged),
            _ => Err(QrSessionStoreError::NotFound),
        }
    }

    #[tracing::instrument(name = "Deleting expired QR sessions from Redis", skip_all)]
    async fn delete_expired_before(
        &self,
        cutoff: DateTime<Utc>,
        statuses: &[QrSessionStatus],
    ) -> Result<u64, QrSessionStoreError> {
        let mut conn = self.conn.write().await;

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(format!("{QR_SESSION_KEY_PREFIX}*"))
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query(&mut *conn)
                .map_err(storage_failure)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        let mut deleted = 0;
        for key in keys {
            let value: Option<String> = conn.get(&key).map_err(storage_failure)?;
            let Some(value) = value else {
                continue;
            };
            let session = match decode(&value) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping undecodable QR session");
                    continue;
                }
            };
            if session.expires_at() < cutoff && statuses.contains(&session.status()) {
                let removed: u64 = conn.del(&key).map_err(storage_failure)?;
                deleted += removed;
            }
        }

        Ok(deleted)
    }
}

fn get_key(id: &QrSessionId) -> String {
    format!("{}{}", QR_SESSION_KEY_PREFIX, id)
}

fn key_ttl_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let remaining = (expires_at - now).num_seconds().max(0);
    (remaining + KEY_RETENTION_SECONDS) as u64
}

fn encode(session: &QrSession) -> Result<String, QrSessionStoreError> {
    serde_json::to_string(&QrSessionRecord::from(session))
        .map_err(|e| QrSessionStoreError::StorageFailure(e.to_string()))
}

fn decode(value: &str) -> Result<QrSession, QrSessionStoreError> {
    let record: QrSessionRecord = serde_json::from_str(value)
        .map_err(|e| QrSessionStoreError::StorageFailure(e.to_string()))?;
    QrSession::try_from(record).map_err(|e| QrSessionStoreError::StorageFailure(e.to_string()))
}

fn storage_failure(e: redis::RedisError) -> QrSessionStoreError {
    QrSessionStoreError::StorageFailure(e.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use scanpass_core::UserId;
    use testcontainers_modules::{redis::Redis, testcontainers::runners::AsyncRunner};

    use super::*;

    fn session(now: DateTime<Utc>, ttl_secs: i64) -> QrSession {
        let id = QrSessionId::generate("kube");
        QrSession::new(
            id.clone(),
            format!("kube://qr-login?session_id={id}"),
            None,
            now,
            Duration::seconds(ttl_secs),
        )
    }

    #[test]
    fn test_key_layout_and_retention() {
        let id = QrSessionId::parse("kubeabc").unwrap();
        assert_eq!(get_key(&id), "qr_session:kubeabc");

        let now = Utc::now();
        assert_eq!(
            key_ttl_seconds(now + Duration::seconds(300), now),
            300 + KEY_RETENTION_SECONDS as u64
        );
        assert_eq!(
            key_ttl_seconds(now - Duration::seconds(30), now),
            KEY_RETENTION_SECONDS as u64
        );
    }

    #[test]
    fn test_encoded_record_exposes_status_for_the_script() {
        let session = session(Utc::now(), 300);
        let encoded = encode(&session).unwrap();

        let json: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(decode(&encoded).unwrap(), session);
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_redis_session_store_lifecycle() {
        let container = Redis::default().start().await.unwrap();
        let port = container.get_host_port_ipv4(6379).await.unwrap();
        let client = redis::Client::open(format!("redis://127.0.0.1:{port}/")).unwrap();
        let conn = client.get_connection().unwrap();
        let store = RedisQrSessionStore::new(Arc::new(RwLock::new(conn)));

        let now = Utc::now();
        let live = session(now, 300);
        store.create(&live).await.unwrap();
        assert_eq!(store.create(&live).await, Err(QrSessionStoreError::Conflict));

        let mut scanned = live.clone();
        scanned.scan(UserId::new(3), now).unwrap();
        store
            .save_if_status(&scanned, QrSessionStatus::Pending)
            .await
            .unwrap();
        assert_eq!(
            store.save_if_status(&scanned, QrSessionStatus::Pending).await,
            Err(QrSessionStoreError::StatusChanged)
        );
        assert_eq!(store.get(live.id()).await.unwrap(), scanned);

        let missing = session(now, 300);
        assert_eq!(
            store.save_if_status(&missing, QrSessionStatus::Pending).await,
            Err(QrSessionStoreError::NotFound)
        );

        let mut confirmed = scanned.clone();
        confirmed.confirm(UserId::new(3), now).unwrap();
        store.save(&confirmed).await.unwrap();
        assert_eq!(store.get(live.id()).await.unwrap(), confirmed);
        assert_eq!(store.save(&missing).await, Err(QrSessionStoreError::NotFound));

        let stale = session(now - Duration::seconds(900), 300);
        store.create(&stale).await.unwrap();
        let deleted = store
            .delete_expired_before(now, &QrSessionStatus::ALL)
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.get(stale.id()).await, Err(QrSessionStoreError::NotFound));
        assert!(store.get(live.id()).await.is_ok());
    }
}
