use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Authenticator assurance level of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssuranceLevel {
    /// Single factor.
    #[default]
    Aal1,
    /// A second factor has been verified.
    Aal2,
}

impl fmt::Display for AssuranceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aal1 => write!(f, "aal1"),
            Self::Aal2 => write!(f, "aal2"),
        }
    }
}

impl FromStr for AssuranceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aal1" => Ok(Self::Aal1),
            "aal2" => Ok(Self::Aal2),
            other => Err(format!("unknown assurance level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssuranceLevels {
    pub current: AssuranceLevel,
    pub next: AssuranceLevel,
}

impl AssuranceLevels {
    pub fn new(current: AssuranceLevel, next: AssuranceLevel) -> Self {
        Self { current, next }
    }

    /// The user must complete a second factor before continuing.
    pub fn requires_step_up(&self) -> bool {
        self.next == AssuranceLevel::Aal2 && self.next != self.current
    }
}

/// Claims carried by the access-token cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub aal: AssuranceLevel,
    /// The user has at least one verified second factor enrolled.
    #[serde(default)]
    pub mfa_enrolled: bool,
}

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub claims: SessionClaims,
}

impl Session {
    /// `None` when the expiry is outside the representable time range.
    pub fn from_claims(access_token: impl Into<String>, claims: SessionClaims) -> Option<Self> {
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single()?;
        Some(Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            access_token: access_token.into(),
            expires_at,
            claims,
        })
    }
}
