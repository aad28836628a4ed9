//! Authentication service
//!
//! Moves the session between anonymous and authenticated: `login` stores the
//! triple returned by the backend, `logout` always clears it locally, and
//! `verify_token` checks a restored session against the backend.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::constants::api_path;
use crate::error::{LoginError, Result};
use crate::http::PortalHttpClient;
use crate::model::{ApiResponse, Credentials, LoginResponse, Role, Session};

pub struct AuthService {
    http_client: Arc<PortalHttpClient>,
}

impl AuthService {
    pub fn new(http_client: Arc<PortalHttpClient>) -> Self {
        Self { http_client }
    }

    /// Exchange credentials for a session.
    ///
    /// The session is only written once the backend confirmed success and
    /// returned token, role and username. On any failure the previous session
    /// is left exactly as it was.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Session, LoginError> {
        debug!("Attempting login for user {}", username);

        let response: LoginResponse = self
            .http_client
            .post_json_anonymous(api_path::LOGIN, &Credentials { username, password })
            .await?;

        if !response.success {
            let message = response
                .message
                .or(response.error)
                .unwrap_or_else(|| "login rejected".to_string());
            warn!("Login rejected for user {}: {}", username, message);
            return Err(LoginError::InvalidCredentials(message));
        }

        let (Some(token), Some(role), Some(returned_username)) =
            (response.token, response.role, response.username)
        else {
            return Err(LoginError::Other(
                "login response is missing token, role or username".to_string(),
            ));
        };
        if token.is_empty() {
            return Err(LoginError::Other("login response carried an empty token".to_string()));
        }

        self.http_client
            .session()
            .set_session(&token, &role, &returned_username)
            .map_err(|e| LoginError::Other(e.to_string()))?;

        info!("Login succeeded for user {} (role {})", returned_username, role);
        Ok(Session {
            token,
            role,
            username: returned_username,
        })
    }

    /// Notify the backend and clear the local session. The local effect does
    /// not depend on the backend call; only a storage failure is reported.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.http_client.post::<Value>(api_path::LOGOUT).await {
            warn!("Logout request failed, clearing local session anyway: {}", e);
        }
        self.http_client.session().clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Check the held token with the backend.
    ///
    /// Returns `false` without a request when no session is held. A rejected
    /// token leaves the session cleared.
    pub async fn verify_token(&self) -> Result<bool> {
        if !self.is_authenticated() {
            return Ok(false);
        }

        match self
            .http_client
            .post::<ApiResponse<Value>>(api_path::VERIFY_TOKEN)
            .await
        {
            Ok(response) if response.success => Ok(true),
            Ok(response) => {
                warn!(
                    "Token verification failed: {}",
                    response.failure_message("token rejected")
                );
                self.http_client.session().clear()?;
                Ok(false)
            }
            Err(e) if e.is_auth_expired() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.http_client.session().is_authenticated()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.http_client.session().current()
    }

    pub fn role(&self) -> Option<Role> {
        self.http_client.session().role()
    }

    pub fn username(&self) -> Option<String> {
        self.http_client.session().username()
    }
}
