use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Administrator,
}

impl UserRole {
    /// Students are provisioned by their teacher, never self-registered
    pub fn can_self_register(&self) -> bool {
        matches!(self, UserRole::Teacher | UserRole::Administrator)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "Student"),
            UserRole::Teacher => write!(f, "Teacher"),
            UserRole::Administrator => write!(f, "Administrator"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: UserRole,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
    pub date_joined: Option<DateTime<Utc>>,
}

impl User {
    pub fn display_name(&self) -> String {
        if let Some(ref full) = self.full_name {
            if !full.trim().is_empty() {
                return full.clone();
            }
        }
        let joined = format!("{} {}", self.first_name, self.last_name);
        let joined = joined.trim();
        if joined.is_empty() {
            self.username.clone()
        } else {
            joined.to_string()
        }
    }
}

/// Body of `POST /auth/login/` and `POST /auth/register/` responses
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

/// Body of the refresh endpoint; `refresh` is only present when the backend rotates it
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Fields accepted by `PUT /auth/profile/update/`; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Response of the unauthenticated connectivity check
#[derive(Debug, Clone, Deserialize)]
pub struct ServerStatus {
    pub message: String,
    pub status: String,
    pub version: Option<String>,
}
