//! HTTP client with bearer authentication and failure classification
//!
//! Every backend call goes through [`PortalHttpClient`]. It attaches the
//! session token, applies the configured timeout, classifies failures into
//! [`ClientError`] and clears the session when the backend answers 401.
//! Requests are attempted exactly once.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::SessionStore;

/// Whether a request carries the session token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach `Authorization: Bearer` when a token is held; a 401 answer
    /// invalidates the session
    Bearer,
    /// Never attach a token; a 401 answer leaves the session alone
    Anonymous,
}

/// HTTP client bound to one backend and one session store
pub struct PortalHttpClient {
    client: Client,
    config: ClientConfig,
    session: SessionStore,
}

impl PortalHttpClient {
    /// Create a new HTTP client
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ClientError::from_transport)?;

        debug!(
            "HTTP client configured: base_url={}, timeout={}ms",
            config.base_url, config.timeout_ms
        );

        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Build full URL from the configured base address
    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, AuthMode::Bearer, |request| request)
            .await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        self.send(Method::GET, path, AuthMode::Bearer, |request| {
            request.query(query)
        })
        .await
    }

    /// Make a POST request without a body
    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::POST, path, AuthMode::Bearer, |request| request)
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(Method::POST, path, AuthMode::Bearer, |request| {
            request.json(body)
        })
        .await
    }

    /// Make a POST request with JSON body and no session token
    pub async fn post_json_anonymous<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(Method::POST, path, AuthMode::Anonymous, |request| {
            request.json(body)
        })
        .await
    }

    /// Execute one request; `customize` adds query or body
    pub async fn send<T, F>(
        &self,
        method: Method,
        path: &str,
        auth: AuthMode,
        customize: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.build_url(path);
        let mut request = self.client.request(method.clone(), &url);

        if auth == AuthMode::Bearer {
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
        }
        let request = customize(request)
            .build()
            .map_err(ClientError::from_transport)?;

        // the built URL carries the query string
        debug!("Sending {} {}", request.method(), request.url());

        match self.client.execute(request).await {
            Ok(response) => self.handle_response(response, &method, &url, auth).await,
            Err(e) => {
                let err = ClientError::from_transport(e);
                log_transport_error(&err, &method, &url, self.config.timeout_ms);
                Err(err)
            }
        }
    }

    /// Handle response and parse JSON
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        method: &Method,
        url: &str,
        auth: AuthMode,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            debug!("Received {} for {} {}", status, method, url);
            let bytes = response
                .bytes()
                .await
                .map_err(ClientError::from_transport)?;
            let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
            return Ok(serde_json::from_slice(body)?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_status(status, &body);

        if status == StatusCode::UNAUTHORIZED && auth == AuthMode::Bearer {
            warn!("Token rejected by {} {}, clearing session", method, url);
            if let Err(e) = self.session.clear() {
                error!("Failed to clear session after 401: {}", e);
            }
        } else {
            error!("Request {} {} failed with status {}: {}", method, url, status, body);
        }

        Err(err)
    }
}

fn log_transport_error(err: &ClientError, method: &Method, url: &str, timeout_ms: u64) {
    match err {
        ClientError::ConnectionRefused(_) => warn!(
            "Connection refused for {} {}: backend is not running or not reachable",
            method, url
        ),
        ClientError::Timeout => warn!(
            "Request {} {} timed out after {} ms",
            method, url, timeout_ms
        ),
        ClientError::Network(e) => warn!("Network error for {} {}: {}", method, url, e),
        other => error!("Request {} {} failed: {}", method, url, other),
    }
}
