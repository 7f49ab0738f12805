//! Router name to region partition

use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;

/// Maps a router name prefix to the region hosting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRule {
    pub prefix: String,
    pub region: String,
}

/// Ordered prefix rules; the first matching prefix wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionMap {
    rules: Vec<RegionRule>,
}

impl RegionMap {
    pub fn new(rules: Vec<RegionRule>) -> Self {
        Self { rules }
    }

    /// Resolve the region for a router name
    pub fn region_for(&self, router: &str) -> Result<&str, OrchestratorError> {
        self.rules
            .iter()
            .find(|r| router.starts_with(&r.prefix))
            .map(|r| r.region.as_str())
            .ok_or_else(|| {
                OrchestratorError::TopologyError(format!(
                    "Unknown router name: {}. Expected a name starting with one of: {:?}",
                    router,
                    self.rules.iter().map(|r| r.prefix.as_str()).collect::<Vec<_>>()
                ))
            })
    }

    /// Distinct regions, in rule order
    pub fn regions(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for rule in &self.rules {
            if !out.contains(&rule.region) {
                out.push(rule.region.clone());
            }
        }
        out
    }
}

impl Default for RegionMap {
    fn default() -> Self {
        Self::new(vec![
            RegionRule {
                prefix: "nv-".to_string(),
                region: "us-east-1".to_string(),
            },
            RegionRule {
                prefix: "fra-".to_string(),
                region: "eu-central-1".to_string(),
            },
        ])
    }
}
