// Backend liveness probe

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::api_path;
use crate::error::{ClientError, Result};
use crate::http::PortalHttpClient;
use crate::model::Reachability;

/// Single-shot liveness check. The last observed result is shared with every
/// clone and gates the data service until the next explicit probe.
#[derive(Clone)]
pub struct HealthProbe {
    http_client: Arc<PortalHttpClient>,
    last: Arc<RwLock<Reachability>>,
}

impl HealthProbe {
    pub fn new(http_client: Arc<PortalHttpClient>) -> Self {
        Self {
            http_client,
            last: Arc::new(RwLock::new(Reachability::Unknown)),
        }
    }

    /// Probe the backend once and record the outcome
    pub async fn check(&self) -> Reachability {
        let reachability = match self.http_client.get::<Value>(api_path::HEALTH).await {
            Ok(body) => {
                debug!("Backend healthy: {}", body);
                Reachability::Reachable
            }
            Err(e) => {
                warn!("Backend health check failed: {}", e);
                Reachability::Unreachable
            }
        };

        *self.last.write() = reachability;
        reachability
    }

    pub fn last(&self) -> Reachability {
        *self.last.read()
    }

    /// Fails without a network call when the last probe saw the backend down.
    /// An unprobed backend is given the benefit of the doubt.
    pub fn ensure_reachable(&self) -> Result<()> {
        match self.last() {
            Reachability::Unreachable => Err(ClientError::ConnectionRefused(
                "backend reported unreachable by the last health check".to_string(),
            )),
            Reachability::Reachable | Reachability::Unknown => Ok(()),
        }
    }
}
