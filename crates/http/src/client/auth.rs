//! Login, logout and account endpoints

use super::error::ClientError;
use super::{ApiClient, decode};
use crate::types::{LoginRequest, RegisterRequest, TokenPair, User};
use erp_core::Credentials;
use tracing::info;

/// Path of the logged in user's account
const CURRENT_USER_PATH: &str = "accounts/users/me/";

const REGISTER_PATH: &str = "accounts/register/";

impl ApiClient {
    /// Exchange account credentials for a token pair and store it
    ///
    /// `email` may also be a username. The call bypasses the renewal path:
    /// a rejected login is reported as-is and does not touch the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials, ClientError> {
        let url = self.config.resolve(&self.config.token_path);
        let response = self
            .client
            .post(url)
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let pair: TokenPair = decode(response).await?;
        let credentials = Credentials {
            access: pair.access,
            refresh: pair.refresh,
        };
        self.session.store_credentials(&credentials)?;
        info!("Logged in");
        Ok(credentials)
    }

    /// Create an account
    ///
    /// Registration does not log the new user in and, like [`Self::login`],
    /// bypasses the renewal path.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<User, ClientError> {
        let url = self.config.resolve(REGISTER_PATH);
        let response = self.client.post(url).json(registration).send().await?;

        let user: User = decode(response).await?;
        info!(email = %user.email, "Account registered");
        Ok(user)
    }

    /// Clear the stored credentials and move to `LoggedOut`
    ///
    /// Returns the login page the user should be sent to.
    pub fn logout(&self) -> String {
        let redirect_to = self.session.invalidate();
        info!("Logged out");
        redirect_to
    }

    /// Get the logged in user's account
    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.get(CURRENT_USER_PATH).await
    }
}
