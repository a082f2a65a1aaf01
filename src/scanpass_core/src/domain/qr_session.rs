//! The QR login session and its lifecycle.
//!
//! ```text
//! pending ──scan──▶ scanned ──confirm──▶ confirmed
//!    │                 │    ──reject───▶ rejected
//!    │                 └────expire─────▶ expired
//!    ├──confirm / reject──▶ confirmed / rejected
//!    └──expire────────────▶ expired
//! ```
//!
//! `confirmed`, `rejected` and `expired` are terminal. A session is never
//! moved backwards, and `subject_user_id` is present exactly while the status
//! is `scanned`, `confirmed` or `rejected`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::UserId;

pub const DEFAULT_QR_SESSION_TTL_SECONDS: i64 = 300;

const SESSION_ID_RANDOM_LENGTH: usize = 32;
const SESSION_ID_MAX_LENGTH: usize = 128;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QrSessionError {
    #[error("Invalid session id")]
    InvalidId,
    #[error("Unknown session status: {0}")]
    UnknownStatus(String),
    #[error("Session is already {0}")]
    NotOpen(QrSessionStatus),
    #[error("Session expired")]
    Expired,
    #[error("Session was scanned by a different user")]
    SubjectMismatch,
    #[error("Transition from {from} to {to} is not allowed")]
    InvalidTransition {
        from: QrSessionStatus,
        to: QrSessionStatus,
    },
    #[error("Corrupt session record: {0}")]
    CorruptRecord(String),
}

/// Opaque handle shared between the browser and the mobile app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QrSessionId(String);

impl QrSessionId {
    /// Product tag followed by 32 URL-safe characters from the thread-local CSPRNG.
    pub fn generate(prefix: &str) -> Self {
        let random: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(SESSION_ID_RANDOM_LENGTH)
            .map(char::from)
            .collect();
        Self(format!("{prefix}{random}"))
    }

    pub fn parse(value: impl Into<String>) -> Result<Self, QrSessionError> {
        let value = value.into();
        let well_formed = !value.is_empty()
            && value.len() <= SESSION_ID_MAX_LENGTH
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(QrSessionError::InvalidId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QrSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrSessionStatus {
    Pending,
    Scanned,
    Confirmed,
    Rejected,
    Expired,
}

impl QrSessionStatus {
    pub const ALL: [QrSessionStatus; 5] = [
        QrSessionStatus::Pending,
        QrSessionStatus::Scanned,
        QrSessionStatus::Confirmed,
        QrSessionStatus::Rejected,
        QrSessionStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QrSessionStatus::Pending => "pending",
            QrSessionStatus::Scanned => "scanned",
            QrSessionStatus::Confirmed => "confirmed",
            QrSessionStatus::Rejected => "rejected",
            QrSessionStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QrSessionStatus::Confirmed | QrSessionStatus::Rejected | QrSessionStatus::Expired
        )
    }

    /// Pending and scanned sessions still accept a decision.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: QrSessionStatus) -> bool {
        use QrSessionStatus::*;
        matches!(
            (self, next),
            (Pending, Scanned | Confirmed | Rejected | Expired)
                | (Scanned, Confirmed | Rejected | Expired)
        )
    }

    fn has_subject(&self) -> bool {
        matches!(
            self,
            QrSessionStatus::Scanned | QrSessionStatus::Confirmed | QrSessionStatus::Rejected
        )
    }

    /// Human-readable status line shown to the polling browser.
    pub fn message(&self) -> &'static str {
        match self {
            QrSessionStatus::Pending => "Waiting for QR code scan",
            QrSessionStatus::Scanned => "QR code scanned, waiting for confirmation",
            QrSessionStatus::Confirmed => "Login successful",
            QrSessionStatus::Rejected => "Login rejected by user",
            QrSessionStatus::Expired => "Session expired",
        }
    }
}

impl fmt::Display for QrSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrSessionStatus {
    type Err = QrSessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QrSessionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| QrSessionError::UnknownStatus(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrSession {
    id: QrSessionId,
    status: QrSessionStatus,
    subject_user_id: Option<UserId>,
    payload: String,
    device_info: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QrSession {
    /// A fresh `pending` session; `expires_at` is fixed here and never extended.
    pub fn new(
        id: QrSessionId,
        payload: String,
        device_info: Option<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id,
            status: QrSessionStatus::Pending,
            subject_user_id: None,
            payload,
            device_info,
            created_at: now,
            expires_at: now + ttl,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &QrSessionId {
        &self.id
    }

    pub fn status(&self) -> QrSessionStatus {
        self.status
    }

    pub fn subject_user_id(&self) -> Option<UserId> {
        self.subject_user_id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn device_info(&self) -> Option<&str> {
        self.device_info.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Reclassify an open session whose TTL has passed. Returns `true` when the
    /// status changed and the record needs to be written back.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.is_open() || !self.is_expired_at(now) {
            return false;
        }
        self.status = QrSessionStatus::Expired;
        self.subject_user_id = None;
        self.updated_at = now;
        true
    }

    pub fn scan(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<(), QrSessionError> {
        if self.status != QrSessionStatus::Pending {
            return Err(QrSessionError::NotOpen(self.status));
        }
        if self.is_expired_at(now) {
            return Err(QrSessionError::Expired);
        }
        self.transition(QrSessionStatus::Scanned, user_id, now)
    }

    pub fn confirm(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<(), QrSessionError> {
        self.ensure_decidable_by(user_id, now)?;
        self.transition(QrSessionStatus::Confirmed, user_id, now)
    }

    pub fn reject(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<(), QrSessionError> {
        self.ensure_decidable_by(user_id, now)?;
        self.transition(QrSessionStatus::Rejected, user_id, now)
    }

    fn ensure_decidable_by(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), QrSessionError> {
        if !self.status.is_open() {
            return Err(QrSessionError::NotOpen(self.status));
        }
        if self.is_expired_at(now) {
            return Err(QrSessionError::Expired);
        }
        match self.subject_user_id {
            Some(scanned_by) if scanned_by != user_id => Err(QrSessionError::SubjectMismatch),
            _ => Ok(()),
        }
    }

    fn transition(
        &mut self,
        next: QrSessionStatus,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), QrSessionError> {
        if !self.status.can_transition_to(next) {
            return Err(QrSessionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.subject_user_id = Some(user_id);
        self.updated_at = now;
        Ok(())
    }
}

/// Flat, serializable form of a [`QrSession`] used by the storage adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrSessionRecord {
    pub id: QrSessionId,
    pub status: QrSessionStatus,
    pub subject_user_id: Option<UserId>,
    pub payload: String,
    pub device_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&QrSession> for QrSessionRecord {
    fn from(session: &QrSession) -> Self {
        Self {
            id: session.id.clone(),
            status: session.status,
            subject_user_id: session.subject_user_id,
            payload: session.payload.clone(),
            device_info: session.device_info.clone(),
            created_at: session.created_at,
            expires_at: session.expires_at,
            updated_at: session.updated_at,
        }
    }
}

impl TryFrom<QrSessionRecord> for QrSession {
    type Error = QrSessionError;

    fn try_from(record: QrSessionRecord) -> Result<Self, Self::Error> {
        if record.status.has_subject() != record.subject_user_id.is_some() {
            return Err(QrSessionError::CorruptRecord(format!(
                "session {} is {} but subject presence is {}",
                record.id,
                record.status,
                record.subject_user_id.is_some()
            )));
        }
        Ok(Self {
            id: record.id,
            status: record.status,
            subject_user_id: record.subject_user_id,
            payload: record.payload,
            device_info: record.device_info,
            created_at: record.created_at,
            expires_at: record.expires_at,
            updated_at: record.updated_at,
        })
    }
}
