//! Wire types exchanged with the ERP API

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Token refresh request body
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token refresh response body
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Login request body; `email` also accepts a username
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account registration body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Account role, `worker` unless chosen otherwise
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl RegisterRequest {
    /// Registration with the default `worker` role
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role: DEFAULT_ROLE.to_string(),
            username: None,
            first_name: String::new(),
            last_name: String::new(),
        }
    }
}

/// Role given to accounts registered without one
pub const DEFAULT_ROLE: &str = "worker";

/// Token pair returned by the login endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Account details returned for the logged in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Absent from the registration response
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_joined: Option<String>,
}

/// Paginated collection envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A collection response, either paginated or a bare array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T = JsonValue> {
    Paginated(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    /// Total number of records on the server
    ///
    /// Paginated listings report the server side count, which may exceed
    /// the records on this page.
    pub fn total(&self) -> u64 {
        match self {
            Self::Paginated(page) => page.count,
            Self::Plain(items) => items.len() as u64,
        }
    }

    /// Records contained in this response
    pub fn items(&self) -> &[T] {
        match self {
            Self::Paginated(page) => &page.results,
            Self::Plain(items) => items,
        }
    }

    /// Consume the listing, keeping only its records
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paginated(page) => page.results,
            Self::Plain(items) => items,
        }
    }

    /// URL of the next page, if any
    pub fn next_page(&self) -> Option<&str> {
        match self {
            Self::Paginated(page) => page.next.as_deref(),
            Self::Plain(_) => None,
        }
    }
}

/// Record counts shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub projects: u64,
    pub employees: u64,
    pub equipment: u64,
}
