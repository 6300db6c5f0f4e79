//! Access token renewal

use super::config::RefreshPolicy;
use super::error::ClientError;
use super::{ApiClient, error_message};
use crate::types::{RefreshRequest, RefreshResponse};
use tracing::{debug, info, warn};

impl ApiClient {
    /// Obtain a new access token after a request sent with `stale` got a 401
    ///
    /// Returns the token the retry must carry. Every unrecoverable outcome
    /// clears the stored credentials before the error is returned.
    pub(super) async fn renew_access(
        &self,
        stale: Option<&str>,
        unauthorized: String,
    ) -> Result<String, ClientError> {
        let _guard = match self.config.refresh_policy {
            RefreshPolicy::Coalesce => Some(self.refresh_gate.lock().await),
            RefreshPolicy::PerRequest => None,
        };

        if self.config.refresh_policy == RefreshPolicy::Coalesce
            && let Some(current) = self.session.access_token()?
            && stale != Some(current.as_str())
        {
            debug!("Access token already renewed by a concurrent request");
            return Ok(current);
        }

        let Some(refresh) = self.session.refresh_token()? else {
            let redirect_to = self.session.invalidate();
            warn!("No refresh token stored, session invalidated");
            return Err(ClientError::session_invalidated(
                redirect_to,
                ClientError::AuthenticationFailed(unauthorized),
            ));
        };

        self.session.begin_refresh();
        match self.request_access_token(&refresh).await {
            Ok(access) => match self.session.set_access_token(&access) {
                Ok(true) => {
                    info!("Access token refreshed");
                    Ok(access)
                }
                Ok(false) => {
                    warn!("Session logged out while the token was being refreshed");
                    Err(ClientError::session_invalidated(
                        self.session.login_path().to_string(),
                        ClientError::AuthenticationFailed(unauthorized),
                    ))
                }
                Err(e) => {
                    let redirect_to = self.session.invalidate();
                    warn!("Failed to store the refreshed token, session invalidated: {e}");
                    Err(ClientError::session_invalidated(redirect_to, e.into()))
                }
            },
            Err(e) => {
                let redirect_to = self.session.invalidate();
                warn!("Token refresh failed, session invalidated: {e}");
                Err(ClientError::session_invalidated(redirect_to, e))
            }
        }
    }

    /// Exchange a refresh token for a new access token
    ///
    /// Goes straight to the transport; a 401 here must never re-enter the
    /// renewal path.
    async fn request_access_token(&self, refresh: &str) -> Result<String, ClientError> {
        let url = self.config.resolve(&self.config.refresh_path);
        let response = self
            .client
            .post(url)
            .json(&RefreshRequest {
                refresh: refresh.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::RefreshFailed {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body: RefreshResponse = response.json().await?;
        if body.access.is_empty() {
            return Err(ClientError::RefreshFailed {
                status: status.as_u16(),
                message: "refresh response carried an empty access token".to_string(),
            });
        }
        Ok(body.access)
    }
}
