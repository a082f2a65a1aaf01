use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::{Role, User, UserId};

/// Who a token is minted for.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSubject {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<&User> for TokenSubject {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id(),
            email: user.email().as_str().to_owned(),
            role: user.role(),
        }
    }
}

/// The fixed claim set carried by every identity token.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    pub subject: UserId,
    pub email: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A signed, self-contained bearer credential. The server never stores these.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityToken([REDACTED])")
    }
}
