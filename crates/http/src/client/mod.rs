//! Site ERP API client

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
mod refresh;
pub mod request;
pub mod resources;

pub use config::{ClientConfig, RefreshPolicy};
pub use request::ApiRequest;
pub use resources::{Resource, ResourceApi};

use erp_core::{CredentialStore, MemoryStore, Session, SessionState};
use error::ClientError;
use request::Attempt;
use reqwest::{Client, ClientBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tracing::debug;

/// API client that attaches the session's bearer token to every request
///
/// On a 401 the client renews the access token with the stored refresh
/// token and resubmits the request once. When renewal is impossible the
/// session is invalidated and the caller receives
/// [`ClientError::SessionInvalidated`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<ClientConfig>,
    session: Session,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a new client with an in-memory session
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session whose credentials this client uses
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Observe session state changes, including invalidation
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    /// Send a request and return the response unchanged unless it is a 401
    ///
    /// Non-401 responses, including other error statuses, are handed back
    /// as-is. A 401 triggers at most one token renewal and resubmission.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut attempt = Attempt::first(self.session.access_token()?);

        loop {
            let response = self.dispatch(request, &attempt).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let message = error_message(response).await;
            if !attempt.may_retry() {
                debug!(
                    method = %request.method(),
                    path = request.path(),
                    "Request still unauthorized after token renewal"
                );
                return Err(ClientError::AuthenticationFailed(message));
            }

            let access = self.renew_access(attempt.token(), message).await?;
            attempt = attempt.retry(access);
        }
    }

    /// Send a request and decode a successful JSON response
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        decode(response).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(&ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(&ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(&ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(&ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.send(&ApiRequest::delete(path)).await?;
        ensure_success(response).await.map(drop)
    }

    /// Build and send one attempt on the wire
    async fn dispatch(
        &self,
        request: &ApiRequest,
        attempt: &Attempt,
    ) -> Result<Response, ClientError> {
        let url = self.config.resolve(request.path());
        // Authorization is owned by the client, never taken from the descriptor
        let mut headers = request.headers().clone();
        headers.remove(header::AUTHORIZATION);

        let mut builder = self
            .client
            .request(request.method().clone(), url)
            .headers(headers);

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        // No header at all without a token, never an empty bearer
        if let Some(token) = attempt.token() {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        debug!(
            method = %request.method(),
            path = request.path(),
            authenticated = attempt.token().is_some(),
            "Dispatching API request"
        );
        Ok(builder.send().await?)
    }
}

/// Decode a response body, mapping error statuses to [`ClientError`]
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        // 204 and friends decode as JSON null
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = error_message(response).await;
        Err(ClientError::from_status(status, message))
    }
}

pub(crate) async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.is_empty() => text,
        _ => status.to_string(),
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    session: Option<Session>,
    store: Option<Arc<dyn CredentialStore>>,
}

impl ApiClientBuilder {
    /// Replace every setting with `config`
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.config.refresh_path = path.into();
        self
    }

    pub fn token_path(mut self, path: impl Into<String>) -> Self {
        self.config.token_path = path.into();
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.config.login_path = path.into();
        self
    }

    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.config.refresh_policy = policy;
        self
    }

    /// Set the request timeout, rounded up to whole seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.config.timeout_secs = Some(secs);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Share an existing session with this client
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Keep credentials in `store`; ignored when a session is supplied
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let Self {
            config,
            session,
            store,
        } = self;

        url::Url::parse(&config.base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base_url {:?}: {e}", config.base_url))
        })?;

        let mut client_builder = ClientBuilder::new().user_agent(config.user_agent.clone());

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(secs) = config.timeout_secs.filter(|secs| *secs > 0) {
            client_builder = client_builder.timeout(Duration::from_secs(secs));
        }

        let client = client_builder.build()?;

        let session = session.unwrap_or_else(|| {
            let store = store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
            Session::new(store, config.login_path.clone())
        });

        Ok(ApiClient {
            client,
            config: Arc::new(config),
            session,
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }
}
