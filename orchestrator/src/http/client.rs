//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::OrchestratorError;

/// HTTP client for the execution and parameter gateways
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OrchestratorError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Authenticate every request with a bearer token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn check(method: &str, response: Response) -> Result<Response, OrchestratorError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("HTTP {} failed: {} - {}", method, status, body);
        Err(OrchestratorError::Internal(format!("{}: {}", status, body)))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OrchestratorError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::check("GET", response).await?;
        Ok(response.json().await?)
    }

    /// Make a GET request; `None` when the resource does not exist
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, OrchestratorError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check("GET", response).await?;
        Ok(Some(response.json().await?))
    }

    /// Make a GET request with query parameters
    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, OrchestratorError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .authorize(self.client.get(&url).query(query))
            .send()
            .await?;
        let response = Self::check("GET", response).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, OrchestratorError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .authorize(self.client.post(&url).json(body))
            .send()
            .await?;
        let response = Self::check("POST", response).await?;
        Ok(response.json().await?)
    }

    /// Make a PUT request, ignoring the response body
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), OrchestratorError> {
        let url = self.url(path);
        debug!("PUT {}", url);

        let response = self
            .authorize(self.client.put(&url).json(body))
            .send()
            .await?;
        Self::check("PUT", response).await?;
        Ok(())
    }
}
