//! Parameter gateway API

use async_trait::async_trait;
use serde::Serialize;

use crate::directory::{ParameterPage, ParameterStore};
use crate::errors::OrchestratorError;
use crate::http::client::HttpClient;

/// Path listing query
#[derive(Debug, Clone, Serialize)]
pub struct ListParametersQuery<'a> {
    pub path: &'a str,
    pub recursive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

/// Put parameter request body
#[derive(Debug, Clone, Serialize)]
pub struct PutParameterRequest<'a> {
    pub name: &'a str,
    pub value: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub overwrite: bool,
}

impl HttpClient {
    /// List one page of parameters under a path
    pub async fn list_parameters(
        &self,
        region: &str,
        path: &str,
        next_token: Option<&str>,
    ) -> Result<ParameterPage, OrchestratorError> {
        let query = ListParametersQuery {
            path,
            recursive: true,
            next_token,
        };
        self.get_query(&format!("/regions/{}/parameters", region), &query)
            .await
    }

    /// Write a string parameter
    pub async fn put_parameter(
        &self,
        region: &str,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), OrchestratorError> {
        let body = PutParameterRequest {
            name,
            value,
            kind: "String",
            overwrite,
        };
        self.put(&format!("/regions/{}/parameters", region), &body)
            .await
    }
}

/// Parameter store backed by the parameter gateway
pub struct HttpParameterStore {
    client: HttpClient,
}

impl HttpParameterStore {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for HttpParameterStore {
    async fn list_page(
        &self,
        region: &str,
        prefix: &str,
        next_token: Option<String>,
    ) -> Result<ParameterPage, OrchestratorError> {
        self.client
            .list_parameters(region, prefix, next_token.as_deref())
            .await
            .map_err(|e| OrchestratorError::StoreError(format!("{}: {}", region, e)))
    }

    async fn put(
        &self,
        region: &str,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), OrchestratorError> {
        self.client
            .put_parameter(region, name, value, overwrite)
            .await
            .map_err(|e| OrchestratorError::StoreError(format!("{}: {}", name, e)))
    }
}
