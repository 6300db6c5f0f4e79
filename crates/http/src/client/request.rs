//! Request descriptors

use super::error::ClientError;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Retries allowed after an authorization failure
pub(crate) const MAX_AUTH_RETRIES: u8 = 1;

/// Description of a request against the API
///
/// A descriptor is immutable once built and can be dispatched any number of
/// times; the client rebuilds the wire request for every attempt.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<JsonValue>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach an already encoded JSON body
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a query string parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add an extra header
    ///
    /// `Authorization` is owned by the client and is overwritten on dispatch.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&JsonValue> {
        self.body.as_ref()
    }
}

/// One dispatch of an [`ApiRequest`]
///
/// Carries the access token the attempt is sent with and how many
/// authorization retries preceded it.
#[derive(Clone, Debug)]
pub(crate) struct Attempt {
    token: Option<String>,
    retries: u8,
}

impl Attempt {
    pub(crate) fn first(token: Option<String>) -> Self {
        Self { token, retries: 0 }
    }

    /// Next attempt, sent with a renewed access token
    pub(crate) fn retry(&self, token: String) -> Self {
        Self {
            token: Some(token),
            retries: self.retries + 1,
        }
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn may_retry(&self) -> bool {
        self.retries < MAX_AUTH_RETRIES
    }
}
