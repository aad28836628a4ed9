// PortalClient - facade wiring every service around one HTTP client

use std::sync::Arc;

use crate::{
    auth::AuthService,
    config::ClientConfig,
    data::DataService,
    error::Result,
    health::HealthProbe,
    http::PortalHttpClient,
    session::{FileStorage, SessionStorage, SessionStore},
};

/// Entry point for the portal backend. All services share one session store
/// and one health probe.
pub struct PortalClient {
    http_client: Arc<PortalHttpClient>,
    auth: AuthService,
    data: DataService,
    health: HealthProbe,
}

impl PortalClient {
    /// Create a client with a file-backed session under `config.session_dir`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(&config.session_dir));
        Self::with_storage(config, storage)
    }

    /// Create a client over any session storage backend
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let session = SessionStore::new(storage);
        let http_client = Arc::new(PortalHttpClient::new(config, session)?);
        let health = HealthProbe::new(http_client.clone());

        Ok(Self {
            auth: AuthService::new(http_client.clone()),
            data: DataService::new(http_client.clone(), health.clone()),
            health,
            http_client,
        })
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn data(&self) -> &DataService {
        &self.data
    }

    pub fn health(&self) -> &HealthProbe {
        &self.health
    }

    pub fn session(&self) -> &SessionStore {
        self.http_client.session()
    }

    pub fn config(&self) -> &ClientConfig {
        self.http_client.config()
    }
}
