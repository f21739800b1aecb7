//! Authenticated request helper shared by the HTTP debrid providers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::DebridError;
use crate::config::DebridServiceType;
use crate::http::{Credentials, HttpRequest, HttpResponse, HttpTransport};
use crate::metrics;

/// Obtains a fresh access token after a 401.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, transport: &dyn HttpTransport) -> Result<String, DebridError>;
}

/// Map an HTTP status onto the debrid error set. 2xx (including 204) passes.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse, DebridError> {
    match response.status {
        200..=299 => Ok(response),
        401 => Err(DebridError::Unauthorized),
        429 => Err(DebridError::RateLimited),
        code => Err(DebridError::HttpError {
            code,
            message: response.body_snippet(200),
        }),
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, DebridError> {
    response.json().map_err(|e| DebridError::Parse(e.to_string()))
}

/// Sends provider requests with credentials attached as headers.
///
/// When a refresher is present, a 401 triggers one token refresh and one
/// retry; a second 401 surfaces as `Unauthorized`.
pub struct ProviderHttp {
    service: DebridServiceType,
    transport: Arc<dyn HttpTransport>,
    credentials: RwLock<Credentials>,
    refresher: Option<Box<dyn TokenRefresher>>,
    timeout: Duration,
}

impl ProviderHttp {
    pub fn new(
        service: DebridServiceType,
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            transport,
            credentials: RwLock::new(credentials),
            refresher: None,
            timeout,
        }
    }

    pub fn with_refresher(mut self, refresher: Box<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Send and map the status.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DebridError> {
        let response = self.send_once(request.clone()).await?;

        if response.status == 401 {
            if let Some(refresher) = &self.refresher {
                debug!(service = %self.service, "Got 401, refreshing access token");
                let token = match refresher.refresh(self.transport.as_ref()).await {
                    Ok(token) => {
                        metrics::TOKEN_REFRESHES
                            .with_label_values(&[self.service.as_str(), "success"])
                            .inc();
                        token
                    }
                    Err(e) => {
                        metrics::TOKEN_REFRESHES
                            .with_label_values(&[self.service.as_str(), "failure"])
                            .inc();
                        warn!(service = %self.service, error = %e, "Token refresh failed");
                        return Err(DebridError::Unauthorized);
                    }
                };
                *self.credentials.write().await = Credentials::Bearer(token);
                return check_status(self.send_once(request).await?);
            }
        }

        check_status(response)
    }

    /// Send, map the status and decode a JSON body.
    pub async fn json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, DebridError> {
        let response = self.send(request).await?;
        parse_body(&response)
    }

    async fn send_once(&self, request: HttpRequest) -> Result<HttpResponse, DebridError> {
        let credentials = self.credentials.read().await.clone();
        let mut request = request.credentials(credentials);
        if request.timeout.is_none() {
            request = request.timeout(self.timeout);
        }
        Ok(self.transport.execute(request).await?)
    }
}
