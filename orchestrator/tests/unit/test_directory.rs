//! Instance directory loading tests

use async_trait::async_trait;

use sdwan_orchestrator::directory::{
    parameter_path, InstanceDirectory, MemoryParameterStore, ParameterPage, ParameterStore,
    ParameterType,
};
use sdwan_orchestrator::errors::OrchestratorError;
use sdwan_orchestrator::filesys::file::File;

use crate::common::{full_store, instance_id, private_address, publish, FLEET, PREFIX};

fn regions() -> Vec<String> {
    vec!["us-east-1".to_string(), "eu-central-1".to_string()]
}

struct UnreachableStore;

#[async_trait]
impl ParameterStore for UnreachableStore {
    async fn list_page(
        &self,
        region: &str,
        _prefix: &str,
        _next_token: Option<String>,
    ) -> Result<ParameterPage, OrchestratorError> {
        Err(OrchestratorError::StoreError(format!("{} unreachable", region)))
    }

    async fn put(&self, _: &str, _: &str, _: &str, _: bool) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_load_spans_regions_and_pages() {
    let store = full_store();
    let directory = InstanceDirectory::load(&store, PREFIX, &regions()).await.unwrap();

    assert_eq!(directory.len(), FLEET.len());
    for (router, region, n) in FLEET {
        let entry = directory.get(router).unwrap();
        assert_eq!(entry.region, region);
        assert_eq!(entry.instance_id, instance_id(router));
        assert_eq!(entry.private_address, private_address(n));
    }
}

#[tokio::test]
async fn test_report_parameter_is_not_a_router() {
    let store = full_store();
    store.insert("us-east-1", "/sdwan/verification-results", "old report");
    store.insert("us-east-1", "/sdwan/nv-sdwan/unknown-type", "x");

    let directory = InstanceDirectory::load(&store, PREFIX, &regions()).await.unwrap();
    assert_eq!(directory.len(), FLEET.len());
    assert!(!directory.contains("verification-results"));
}

#[tokio::test]
async fn test_first_region_wins() {
    let store = MemoryParameterStore::new();
    publish(&store, "nv-sdwan", "us-east-1", 1);
    publish(&store, "nv-sdwan", "eu-central-1", 9);

    let directory = InstanceDirectory::load(&store, PREFIX, &regions()).await.unwrap();
    let entry = directory.get("nv-sdwan").unwrap();
    assert_eq!(entry.region, "us-east-1");
    assert_eq!(entry.private_address, private_address(1));
}

#[tokio::test]
async fn test_partial_publication() {
    let store = MemoryParameterStore::new();
    publish(&store, "nv-sdwan", "us-east-1", 1);
    store.insert(
        "us-east-1",
        &parameter_path(PREFIX, "nv-branch1", ParameterType::InstanceId),
        "i-nv-branch1",
    );

    let directory = InstanceDirectory::load(&store, PREFIX, &regions()).await.unwrap();
    assert_eq!(directory.len(), 1);
    assert!(directory.contains("nv-sdwan"));
    assert!(directory
        .miss_reason("nv-branch1")
        .starts_with("Instance config incomplete for nv-branch1"));
    assert_eq!(
        directory.miss_reason("fra-sdwan"),
        "Instance config not found for fra-sdwan"
    );
}

#[tokio::test]
async fn test_empty_store_loads_empty_directory() {
    let store = MemoryParameterStore::new();
    let directory = InstanceDirectory::load(&store, PREFIX, &regions()).await.unwrap();
    assert!(directory.is_empty());
    assert_eq!(directory.len(), 0);
    assert_eq!(
        directory.miss_reason("nv-sdwan"),
        "Instance config not found for nv-sdwan"
    );
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let result = InstanceDirectory::load(&UnreachableStore, PREFIX, &regions()).await;
    assert!(matches!(result, Err(OrchestratorError::StoreError(_))));
}

#[tokio::test]
async fn test_memory_store_from_file() {
    let path = std::env::temp_dir().join(format!("sdwan-params-{}.json", uuid::Uuid::new_v4()));
    let document = serde_json::json!({
        "us-east-1": {
            "/sdwan/nv-sdwan/instance-id": "i-0nv",
            "/sdwan/nv-sdwan/outside-eip": "54.1.1.1",
            "/sdwan/nv-sdwan/outside-private-ip": "10.201.0.10"
        }
    });
    File::new(&path).write_json(&document).await.unwrap();

    let store = MemoryParameterStore::from_file(&path).await.unwrap();
    let directory = InstanceDirectory::load(&store, PREFIX, &regions()).await.unwrap();
    assert_eq!(directory.get("nv-sdwan").unwrap().instance_id, "i-0nv");

    let _ = tokio::fs::remove_file(&path).await;
}
