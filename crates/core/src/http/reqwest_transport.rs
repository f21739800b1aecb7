//! `HttpTransport` backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use tracing::debug;

use super::{Credentials, HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, TransportError};

const USER_AGENT: &str = concat!("streamrelay/", env!("CARGO_PKG_VERSION"));

/// Production transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests time out after `default_timeout`
    /// unless the request carries its own timeout.
    pub fn new(default_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(default_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.full_url();
        debug!(method = request.method.as_str(), url = %request.url, "HTTP request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.credentials {
            Some(Credentials::Bearer(token)) => builder.bearer_auth(token),
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            Some(Credentials::ApiKeyHeader { name, value }) => builder.header(name.as_str(), value),
            None => builder,
        };

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(fields) => {
                let form = fields
                    .into_iter()
                    .fold(multipart::Form::new(), |form, (k, v)| form.text(k, v));
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse { status, body })
    }
}
