//! Shared wiring handed to every engine.

use crate::catalogues::CatalogueLookup;
use crate::config::EngineConfig;
use crate::deadline::with_deadline;
use crate::descriptor::{DescriptorTable, KindDescriptor};
use crate::providers::{ProviderDirectory, RegistryProviderDirectory};
use catalogue_core::{ChangeEvent, ResourceKind, Result};
use catalogue_registry::{AdminDirectory, EventBus, IdentityService, NullBus, PidIssuer, RecordingPidIssuer, Registry};
use std::future::Future;
use std::sync::Arc;

/// Collaborators, config and descriptors. Cheap to clone.
#[derive(Clone)]
pub struct EngineContext {
    pub config: Arc<EngineConfig>,
    pub descriptors: Arc<DescriptorTable>,
    pub registry: Arc<dyn Registry>,
    pub events: Arc<dyn EventBus>,
    pub pids: Arc<dyn PidIssuer>,
    pub identity: Arc<dyn IdentityService>,
    pub providers: Arc<dyn ProviderDirectory>,
    pub catalogues: Arc<CatalogueLookup>,
}

impl EngineContext {
    pub fn builder(config: EngineConfig, registry: Arc<dyn Registry>) -> EngineContextBuilder {
        EngineContextBuilder {
            config,
            registry,
            events: None,
            pids: None,
            identity: None,
            providers: None,
        }
    }

    pub fn local_catalogue(&self) -> &str {
        self.config.local_catalogue()
    }

    pub fn descriptor(&self, kind: ResourceKind) -> Result<KindDescriptor> {
        self.descriptors.get(kind).cloned()
    }

    /// Run a collaborator call under the configured deadline.
    pub async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        with_deadline(operation, self.config.call_timeout(), fut).await
    }

    /// Best-effort event emission: failures are logged, never returned.
    pub async fn emit(&self, event: ChangeEvent) {
        let topic = event.topic.clone();
        match self.call("event publish", self.events.publish(event)).await {
            Ok(()) => tracing::debug!("emitted {}", topic),
            Err(e) => tracing::warn!("failed to emit {}: {}", topic, e),
        }
    }
}

pub struct EngineContextBuilder {
    config: EngineConfig,
    registry: Arc<dyn Registry>,
    events: Option<Arc<dyn EventBus>>,
    pids: Option<Arc<dyn PidIssuer>>,
    identity: Option<Arc<dyn IdentityService>>,
    providers: Option<Arc<dyn ProviderDirectory>>,
}

impl EngineContextBuilder {
    pub fn events(mut self, events: Arc<dyn EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn pids(mut self, pids: Arc<dyn PidIssuer>) -> Self {
        self.pids = Some(pids);
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityService>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn providers(mut self, providers: Arc<dyn ProviderDirectory>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Validates config and builds the descriptor table. Unset
    /// collaborators fall back to the in-memory ones.
    pub fn build(self) -> Result<EngineContext> {
        self.config.validate()?;
        let descriptors = DescriptorTable::from_config(&self.config)?;
        let catalogues = CatalogueLookup::new(
            self.registry.clone(),
            self.config.catalogues.page_size,
            self.config.cache_ttl(),
            self.config.call_timeout(),
        );
        let providers = self
            .providers
            .unwrap_or_else(|| Arc::new(RegistryProviderDirectory::new(self.registry.clone())));
        Ok(EngineContext {
            config: Arc::new(self.config),
            descriptors: Arc::new(descriptors),
            registry: self.registry,
            events: self.events.unwrap_or_else(|| Arc::new(NullBus)),
            pids: self.pids.unwrap_or_else(|| Arc::new(RecordingPidIssuer::new())),
            identity: self.identity.unwrap_or_else(|| Arc::new(AdminDirectory::new())),
            providers,
            catalogues: Arc::new(catalogues),
        })
    }
}
