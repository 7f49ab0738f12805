//! Key-value parameter store seam

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::OrchestratorError;
use crate::filesys::file::File;

/// A stored parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// One page of a path listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterPage {
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Continuation token; `None` on the last page
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Regional key-value store holding runtime parameters
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// List one page of parameters under `prefix`, recursively
    async fn list_page(
        &self,
        region: &str,
        prefix: &str,
        next_token: Option<String>,
    ) -> Result<ParameterPage, OrchestratorError>;

    /// Write a single parameter
    async fn put(
        &self,
        region: &str,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), OrchestratorError>;

    /// List every parameter under `prefix`, following continuation tokens
    async fn list_by_path(
        &self,
        region: &str,
        prefix: &str,
    ) -> Result<Vec<Parameter>, OrchestratorError> {
        let mut out = Vec::new();
        let mut token = None;
        loop {
            let page = self.list_page(region, prefix, token).await?;
            out.extend(page.parameters);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        debug!("Listed {} parameters under {} in {}", out.len(), prefix, region);
        Ok(out)
    }
}

/// In-memory store, keyed by region then parameter name
pub struct MemoryParameterStore {
    regions: RwLock<BTreeMap<String, BTreeMap<String, String>>>,
    page_size: usize,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self {
            regions: RwLock::new(BTreeMap::new()),
            page_size: 10,
        }
    }

    /// Limit the number of parameters returned per page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Load a `{region: {name: value}}` JSON document
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, OrchestratorError> {
        let regions: BTreeMap<String, BTreeMap<String, String>> =
            File::new(path.as_ref()).read_json().await?;
        Ok(Self {
            regions: RwLock::new(regions),
            page_size: 10,
        })
    }

    /// Insert or replace a parameter
    pub fn insert(&self, region: &str, name: &str, value: &str) {
        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        regions
            .entry(region.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, region: &str, name: &str) -> Option<String> {
        let regions = self.regions.read().unwrap_or_else(|e| e.into_inner());
        regions.get(region).and_then(|r| r.get(name)).cloned()
    }
}

impl Default for MemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn list_page(
        &self,
        region: &str,
        prefix: &str,
        next_token: Option<String>,
    ) -> Result<ParameterPage, OrchestratorError> {
        let offset = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                OrchestratorError::StoreError(format!("invalid continuation token {}", token))
            })?,
            None => 0,
        };

        let regions = self.regions.read().unwrap_or_else(|e| e.into_inner());
        let matching: Vec<Parameter> = regions
            .get(region)
            .map(|params| {
                params
                    .iter()
                    .filter(|(name, _)| name.starts_with(prefix))
                    .map(|(name, value)| Parameter {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let end = (offset + self.page_size).min(matching.len());
        let parameters = matching.get(offset..end).map(|s| s.to_vec()).unwrap_or_default();
        let next_token = (end < matching.len()).then(|| end.to_string());

        Ok(ParameterPage {
            parameters,
            next_token,
        })
    }

    async fn put(
        &self,
        region: &str,
        name: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), OrchestratorError> {
        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        let params = regions.entry(region.to_string()).or_default();
        if !overwrite && params.contains_key(name) {
            return Err(OrchestratorError::StoreError(format!(
                "parameter {} already exists",
                name
            )));
        }
        params.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
