use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use quake_inventory::{
    AvailableResources, FetchError, FilterSet, Image, InventoryError, Mutation, ProviderContext,
    RemoteInventorySource, ResourceKind, SshKey,
};

/// Source whose next response can be swapped by the test
struct SwitchableSource {
    next: Mutex<Result<AvailableResources, FetchError>>,
}

impl SwitchableSource {
    fn new(initial: Result<AvailableResources, FetchError>) -> Arc<Self> {
        Arc::new(Self {
            next: Mutex::new(initial),
        })
    }

    fn set(&self, next: Result<AvailableResources, FetchError>) {
        *self.next.lock().unwrap() = next;
    }
}

#[async_trait]
impl RemoteInventorySource for SwitchableSource {
    async fn fetch(&self) -> Result<AvailableResources, FetchError> {
        self.next.lock().unwrap().clone()
    }

    fn source_name(&self) -> &'static str {
        "switchable"
    }
}

fn image(id: &str, flavor: &str) -> Image {
    Image {
        id: id.into(),
        flavor: flavor.into(),
        category: "compute".into(),
        version: "1.0".into(),
    }
}

fn inventory(keys: &[&str]) -> AvailableResources {
    AvailableResources {
        images: vec![image("i1", "gpu"), image("i2", "cpu")],
        ssh_keys: keys
            .iter()
            .map(|k| SshKey {
                id: format!("id-{k}"),
                name: (*k).to_string(),
            })
            .collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn configure_fails_when_inventory_unavailable() {
    let source = SwitchableSource::new(Err(FetchError::Unauthorized("bad token".into())));
    let err = ProviderContext::configure(source).await.unwrap_err();
    assert_eq!(err, FetchError::Unauthorized("bad token".into()));
}

#[tokio::test]
async fn images_query_scenarios() {
    let source = SwitchableSource::new(Ok(inventory(&[])));
    let context = ProviderContext::configure(source).await.unwrap();

    let gpu = context
        .images(&FilterSet::parse_all(["flavor=gpu"]).unwrap())
        .unwrap();
    assert_eq!(gpu.iter().map(|d| d.id()).collect::<Vec<_>>(), vec!["i1"]);

    let both = context
        .images(&FilterSet::parse_all(["flavor=gpu,cpu", "category=compute"]).unwrap())
        .unwrap();
    assert_eq!(both.iter().map(|d| d.id()).collect::<Vec<_>>(), vec!["i1", "i2"]);

    let err = context
        .images(&FilterSet::parse_all(["region=us"]).unwrap())
        .unwrap_err();
    assert_eq!(
        err,
        InventoryError::InvalidFilter {
            kind: ResourceKind::Image,
            attribute: "region".into(),
        }
    );
}

#[tokio::test]
async fn mutation_refresh_updates_inventory() {
    let source = SwitchableSource::new(Ok(inventory(&[])));
    let context = ProviderContext::configure(source.clone()).await.unwrap();
    assert_eq!(context.snapshot().unwrap().len(ResourceKind::SshKey), 0);

    source.set(Ok(inventory(&["ops"])));
    context.after_mutation(Mutation::SshKeyCreated).await.unwrap();

    let keys = context
        .query(ResourceKind::SshKey, &FilterSet::from_pairs([("name", "ops")]).unwrap())
        .unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].id(), "id-ops");
}

#[tokio::test]
async fn failed_mutation_refresh_reports_and_keeps_snapshot() {
    let source = SwitchableSource::new(Ok(inventory(&["ops"])));
    let context = ProviderContext::configure(source.clone()).await.unwrap();
    let before = context.snapshot().unwrap();

    source.set(Err(FetchError::Transport("timed out".into())));
    let err = context
        .after_mutation(Mutation::SshKeyDeleted)
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let after = context.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[tokio::test]
async fn cancelled_context_refuses_refresh() {
    let source = SwitchableSource::new(Ok(inventory(&[])));
    let context = ProviderContext::configure(source).await.unwrap();

    let caller = CancellationToken::new();
    context.refresh_with(&caller).await.unwrap();

    context.cancel();
    assert_eq!(
        context.after_mutation(Mutation::HostCreated).await,
        Err(FetchError::Cancelled)
    );
    assert!(context.cache().is_populated());
}
