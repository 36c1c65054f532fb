//! Tests for engine wiring: config loading, descriptor overrides, the
//! approved-catalogue lookup, deadlines and best-effort side effects

use async_trait::async_trait;
use catalogue_core::*;
use catalogue_engine::*;
use catalogue_registry::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn seed_catalogue(registry: &MemoryRegistry, catalogue: Catalogue) {
    registry
        .add_resource(CATALOGUE_TYPE, catalogue_document(&catalogue).unwrap())
        .await
        .unwrap();
}

fn source(id: &str) -> ResourceBundle<Service> {
    let mut bundle = ResourceBundle::new(Service {
        id: id.into(),
        name: "Compute".into(),
        description: "A test service".into(),
        catalogue_id: "eosc".into(),
        resource_organisation: "prv-1".into(),
        ..Default::default()
    });
    bundle.active = true;
    bundle
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn config_loads_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalogue.toml");
    std::fs::write(
        &path,
        r#"
[catalogue]
local_id = "eic"

[catalogues]
page_size = 50
cache_ttl_secs = 0

[engine]
call_timeout_ms = 250

[pid]
prefix = "21.T11111"

[kinds.monitoring]
strategy = "pid"
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path);
    assert_eq!(config.local_catalogue(), "eic");
    assert_eq!(config.catalogues.page_size, 50);
    assert_eq!(config.cache_ttl(), None);
    assert_eq!(config.call_timeout(), Duration::from_millis(250));
    assert_eq!(config.pid.prefix, "21.T11111");

    let table = DescriptorTable::from_config(&config).unwrap();
    let monitoring = table.get(ResourceKind::Monitoring).unwrap();
    assert_eq!(monitoring.strategy, IdStrategy::Pid);
    assert!(!monitoring.pid_registration);
}

#[test]
fn missing_or_broken_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = EngineConfig::load(&dir.path().join("absent.toml"));
    assert_eq!(missing.local_catalogue(), "eosc");

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[catalogue]\nlocal_id = \"bad.id\"\n").unwrap();
    assert_eq!(EngineConfig::load(&broken).local_catalogue(), "eosc");
}

#[test]
fn default_config_round_trips_through_toml() {
    let text = EngineConfig::default().to_toml();
    let parsed = EngineConfig::parse(&text).unwrap();
    assert_eq!(parsed.local_catalogue(), "eosc");
    assert_eq!(parsed.catalogues.page_size, 1000);
}

#[test]
fn pid_registration_needs_pid_strategy() {
    let config = EngineConfig::parse("[kinds.helpdesk]\npid_registration = true\n").unwrap();
    assert!(matches!(DescriptorTable::from_config(&config), Err(Error::Config(_))));

    let config = EngineConfig::parse("[kinds.gadget]\nstrategy = \"pid\"\n").unwrap();
    assert!(matches!(DescriptorTable::from_config(&config), Err(Error::Config(_))));
}

#[test]
fn invalid_config_is_rejected_by_the_builder() {
    let mut config = EngineConfig::default();
    config.catalogues.page_size = 0;
    let err = EngineContext::builder(config, Arc::new(MemoryRegistry::new())).build().err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}

// ===========================================================================
// Approved-catalogue lookup
// ===========================================================================

#[tokio::test]
async fn lookup_walks_every_page() {
    let registry = Arc::new(MemoryRegistry::new());
    for i in 0..7 {
        seed_catalogue(&registry, Catalogue::approved(format!("cat{}", i))).await;
    }
    seed_catalogue(
        &registry,
        Catalogue {
            catalogue_id: "pending".into(),
            name: String::new(),
            status: "pending catalogue".into(),
            active: true,
        },
    )
    .await;
    let mut retired = Catalogue::approved("retired");
    retired.active = false;
    seed_catalogue(&registry, retired).await;

    let lookup = CatalogueLookup::new(registry, 2, None, Duration::from_secs(1));
    let approved = lookup.fetch_approved_catalogue_ids().await.unwrap();
    assert_eq!(approved.len(), 7);
    assert!(approved.contains("cat6"));
    assert!(!approved.contains("pending"));
    assert!(!approved.contains("retired"));
}

#[tokio::test]
async fn lookup_caches_until_invalidated() {
    let registry = Arc::new(MemoryRegistry::new());
    seed_catalogue(&registry, Catalogue::approved("eosc")).await;
    let lookup = CatalogueLookup::new(registry.clone(), 10, Some(Duration::from_secs(300)), Duration::from_secs(1));

    assert_eq!(lookup.approved().await.unwrap().len(), 1);
    seed_catalogue(&registry, Catalogue::approved("eic")).await;
    assert_eq!(lookup.approved().await.unwrap().len(), 1);

    lookup.invalidate().await;
    assert_eq!(lookup.approved().await.unwrap().len(), 2);
}

#[tokio::test]
async fn catalogue_events_invalidate_the_cache() {
    let registry = Arc::new(MemoryRegistry::new());
    seed_catalogue(&registry, Catalogue::approved("eosc")).await;
    let bus = BroadcastBus::default();
    let lookup = Arc::new(CatalogueLookup::new(
        registry.clone(),
        10,
        Some(Duration::from_secs(300)),
        Duration::from_secs(1),
    ));
    let cancel = CancellationToken::new();
    let listener = lookup.clone().spawn_invalidation_listener(bus.subscribe(), cancel.clone());

    assert!(!lookup.approved().await.unwrap().contains("eic"));
    seed_catalogue(&registry, Catalogue::approved("eic")).await;
    bus.publish(ChangeEvent::named(CATALOGUE_TYPE, ChangeAction::Update, serde_json::json!({})))
        .await
        .unwrap();

    let mut refreshed = false;
    for _ in 0..100 {
        if lookup.approved().await.unwrap().contains("eic") {
            refreshed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(refreshed);

    cancel.cancel();
    listener.await.unwrap();
}

#[tokio::test]
async fn unapproved_owner_still_qualifies_with_own_prefix() {
    let registry = Arc::new(MemoryRegistry::new());
    seed_catalogue(&registry, Catalogue::approved("eosc")).await;
    let config = EngineConfig::parse("[kinds.service]\nstrategy = \"prefix\"\npid_registration = false\n").unwrap();
    let ctx = EngineContext::builder(config, registry).build().unwrap();
    let engine = PublicationEngine::<Service>::new(ctx).unwrap();

    let mut svc = source("svc-1");
    svc.payload.related_resources = vec!["eic.svc-2".into()];
    let public = engine.publish(&svc).await.unwrap();
    // "eic" is not approved here, so its prefix is not trusted.
    assert_eq!(public.payload.related_resources, vec!["eosc.eic.svc-2"]);
}

// ===========================================================================
// Deadlines and best-effort side effects
// ===========================================================================

struct SlowRegistry {
    inner: MemoryRegistry,
    delay: Duration,
}

#[async_trait]
impl Registry for SlowRegistry {
    async fn add_resource(&self, resource_type: &str, document: Document) -> Result<WriteResult> {
        self.inner.add_resource(resource_type, document).await
    }

    async fn update_resource(
        &self,
        resource_type: &str,
        document: Document,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        self.inner.update_resource(resource_type, document, precondition).await
    }

    async fn delete_resource(&self, key: &RecordKey) -> Result<bool> {
        self.inner.delete_resource(key).await
    }

    async fn change_resource_type(&self, key: &RecordKey, new_type: &str) -> Result<Record> {
        self.inner.change_resource_type(key, new_type).await
    }

    async fn search_exact(&self, key: &RecordKey) -> Result<Option<Record>> {
        tokio::time::sleep(self.delay).await;
        self.inner.search_exact(key).await
    }

    async fn search_query(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        self.inner.search_query(query).await
    }

    async fn get_all(&self, query: &RecordQuery, page: PageRequest) -> Result<Paging<Record>> {
        self.inner.get_all(query, page).await
    }
}

#[tokio::test]
async fn slow_registry_times_out() {
    let registry = Arc::new(SlowRegistry {
        inner: MemoryRegistry::new(),
        delay: Duration::from_millis(500),
    });
    let mut config = EngineConfig::default();
    config.engine.call_timeout_ms = 20;
    let ctx = EngineContext::builder(config, registry).build().unwrap();
    let drafts = DraftEngine::<Service>::new(ctx).unwrap();

    match drafts.get("svc-1").await.unwrap_err() {
        Error::Timeout { operation, millis } => {
            assert_eq!(operation, "draft lookup");
            assert_eq!(millis, 20);
        }
        other => panic!("unexpected {other:?}"),
    }
}

struct FailingPids;

#[async_trait]
impl PidIssuer for FailingPids {
    async fn register(&self, pid: &str, _metadata: &PidMetadata) -> Result<()> {
        Err(Error::Internal(format!("issuer unavailable for {}", pid)))
    }
}

struct FailingBus;

#[async_trait]
impl EventBus for FailingBus {
    async fn publish(&self, _event: ChangeEvent) -> Result<()> {
        Err(Error::Internal("bus down".into()))
    }
}

#[tokio::test]
async fn pid_and_event_failures_do_not_fail_publication() {
    let registry = Arc::new(MemoryRegistry::new());
    seed_catalogue(&registry, Catalogue::approved("eosc")).await;
    let ctx = EngineContext::builder(EngineConfig::default(), registry.clone())
        .pids(Arc::new(FailingPids))
        .events(Arc::new(FailingBus))
        .build()
        .unwrap();
    let engine = PublicationEngine::<Service>::new(ctx).unwrap();

    let public = engine.publish(&source("svc-1")).await.unwrap();
    let key = RecordKey::new("service", "eosc", &public.payload.id, true);
    assert!(registry.search_exact(&key).await.unwrap().is_some());
}
