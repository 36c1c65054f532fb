//! Identity collaborator - who administers what.

use async_trait::async_trait;
use catalogue_core::{Principal, Result};
use dashmap::DashMap;
use std::collections::HashSet;

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Whether `principal` administers `resource_id` within `catalogue_id`.
    async fn is_resource_admin(
        &self,
        principal: &Principal,
        resource_id: &str,
        catalogue_id: &str,
    ) -> Result<bool>;
}

/// Grants keyed by principal email.
#[derive(Default)]
pub struct AdminDirectory {
    grants: DashMap<String, HashSet<(String, String)>>,
}

impl AdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, email: &str, catalogue_id: &str, resource_id: &str) {
        self.grants
            .entry(email.to_ascii_lowercase())
            .or_default()
            .insert((catalogue_id.to_string(), resource_id.to_string()));
    }

    pub fn revoke(&self, email: &str, catalogue_id: &str, resource_id: &str) -> bool {
        self.grants
            .get_mut(&email.to_ascii_lowercase())
            .map(|mut set| set.remove(&(catalogue_id.to_string(), resource_id.to_string())))
            .unwrap_or(false)
    }
}

#[async_trait]
impl IdentityService for AdminDirectory {
    async fn is_resource_admin(
        &self,
        principal: &Principal,
        resource_id: &str,
        catalogue_id: &str,
    ) -> Result<bool> {
        Ok(self
            .grants
            .get(&principal.email.to_ascii_lowercase())
            .map(|set| set.contains(&(catalogue_id.to_string(), resource_id.to_string())))
            .unwrap_or(false))
    }
}
