//! Provider-template collaborator: drives the approval rule on promotion.

use async_trait::async_trait;
use catalogue_core::{Provider, ResourceBundle, ResourceKind, Result};
use catalogue_registry::{RecordKey, Registry};
use std::sync::Arc;

#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    /// Template status of a provider, `None` if the provider is unknown.
    async fn template_status(&self, provider_id: &str, catalogue_id: &str) -> Result<Option<String>>;
}

/// Reads the provider's source row from the registry.
pub struct RegistryProviderDirectory {
    registry: Arc<dyn Registry>,
}

impl RegistryProviderDirectory {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ProviderDirectory for RegistryProviderDirectory {
    async fn template_status(&self, provider_id: &str, catalogue_id: &str) -> Result<Option<String>> {
        let key = RecordKey::new(ResourceKind::Provider.name(), catalogue_id, provider_id, false);
        let Some(record) = self.registry.search_exact(&key).await? else {
            return Ok(None);
        };
        let bundle: ResourceBundle<Provider> = serde_json::from_value(record.document.payload)?;
        Ok(bundle.template_status)
    }
}
