//! Site ERP HTTP client
//!
//! [`client::ApiClient`] presents the surface of a plain HTTP client for the
//! ERP REST API while attaching the session's bearer token to every request
//! and renewing an expired access token once per request.

pub mod client;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder, ApiRequest, ClientConfig, RefreshPolicy};
pub use client::error::ClientError;
pub use erp_core::{Credentials, Session, SessionState};
pub use reqwest::{Method, StatusCode};
