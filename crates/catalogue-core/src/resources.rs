//! Resource payloads and the trait the generic engines drive them through.
//!
//! Each kind declares its cross-reference fields by rewriting them in
//! `rewrite_references`. The engines never touch payload fields directly.

use crate::identifier::Qualifier;
use crate::types::ResourceKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A payload type the draft and publication engines can manage.
pub trait CatalogueResource:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ResourceKind;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    fn catalogue_id(&self) -> &str;
    fn set_catalogue_id(&mut self, catalogue_id: String);

    /// Provider whose template status decides approval on promotion.
    fn owning_provider(&self) -> Option<&str> {
        None
    }

    /// Qualify every cross-reference field against `q`.
    fn rewrite_references(&mut self, q: &Qualifier);

    fn alternative_identifiers(&self) -> &[AlternativeIdentifier] {
        &[]
    }

    fn set_alternative_identifiers(&mut self, _ids: Vec<AlternativeIdentifier>) {}

    /// Business-rule violations; empty means valid.
    fn violations(&self) -> Vec<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeIdentifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
}

impl AlternativeIdentifier {
    pub fn new(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }
}

fn require(violations: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(format!("{} is required", field));
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderUser {
    pub email: String,
    pub name: String,
    pub surname: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub website: String,
    pub catalogue_id: String,
    pub legal_entity: bool,
    pub users: Vec<ProviderUser>,
    pub alternative_identifiers: Vec<AlternativeIdentifier>,
}

impl CatalogueResource for Provider {
    const KIND: ResourceKind = ResourceKind::Provider;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    // Providers hold no references to other resources.
    fn rewrite_references(&mut self, _q: &Qualifier) {}

    fn alternative_identifiers(&self) -> &[AlternativeIdentifier] {
        &self.alternative_identifiers
    }
    fn set_alternative_identifiers(&mut self, ids: Vec<AlternativeIdentifier>) {
        self.alternative_identifiers = ids;
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "name", &self.name);
        require(&mut v, "abbreviation", &self.abbreviation);
        if self.users.is_empty() {
            v.push("at least one user is required".into());
        }
        v
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub description: String,
    pub webpage: String,
    pub catalogue_id: String,
    pub resource_organisation: String,
    pub resource_providers: Vec<String>,
    pub related_resources: Vec<String>,
    pub required_resources: Vec<String>,
    pub tags: Vec<String>,
    pub alternative_identifiers: Vec<AlternativeIdentifier>,
}

impl CatalogueResource for Service {
    const KIND: ResourceKind = ResourceKind::Service;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn owning_provider(&self) -> Option<&str> {
        Some(self.resource_organisation.as_str()).filter(|p| !p.is_empty())
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.resource_organisation = q.one(&self.resource_organisation);
        self.resource_providers = q.set(&self.resource_providers);
        self.related_resources = q.set(&self.related_resources);
        self.required_resources = q.set(&self.required_resources);
    }

    fn alternative_identifiers(&self) -> &[AlternativeIdentifier] {
        &self.alternative_identifiers
    }
    fn set_alternative_identifiers(&mut self, ids: Vec<AlternativeIdentifier>) {
        self.alternative_identifiers = ids;
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "name", &self.name);
        require(&mut v, "description", &self.description);
        require(&mut v, "resourceOrganisation", &self.resource_organisation);
        v
    }
}

// ---------------------------------------------------------------------------
// Datasource
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Datasource {
    pub id: String,
    pub service_id: String,
    pub catalogue_id: String,
    pub jurisdiction: Option<String>,
    pub submission_policy_url: Option<String>,
    pub version_control: bool,
}

impl CatalogueResource for Datasource {
    const KIND: ResourceKind = ResourceKind::Datasource;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.service_id = q.one(&self.service_id);
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "serviceId", &self.service_id);
        v
    }
}

// ---------------------------------------------------------------------------
// Training resource
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainingResource {
    pub id: String,
    pub title: String,
    pub url: String,
    pub catalogue_id: String,
    pub resource_organisation: String,
    pub resource_providers: Vec<String>,
    pub eosc_related_services: Vec<String>,
    pub alternative_identifiers: Vec<AlternativeIdentifier>,
}

impl CatalogueResource for TrainingResource {
    const KIND: ResourceKind = ResourceKind::TrainingResource;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn owning_provider(&self) -> Option<&str> {
        Some(self.resource_organisation.as_str()).filter(|p| !p.is_empty())
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.resource_organisation = q.one(&self.resource_organisation);
        self.resource_providers = q.set(&self.resource_providers);
        self.eosc_related_services = q.set(&self.eosc_related_services);
    }

    fn alternative_identifiers(&self) -> &[AlternativeIdentifier] {
        &self.alternative_identifiers
    }
    fn set_alternative_identifiers(&mut self, ids: Vec<AlternativeIdentifier>) {
        self.alternative_identifiers = ids;
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "title", &self.title);
        require(&mut v, "url", &self.url);
        require(&mut v, "resourceOrganisation", &self.resource_organisation);
        v
    }
}

// ---------------------------------------------------------------------------
// Interoperability record
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteroperabilityRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub catalogue_id: String,
    pub provider_id: String,
    pub alternative_identifiers: Vec<AlternativeIdentifier>,
}

impl CatalogueResource for InteroperabilityRecord {
    const KIND: ResourceKind = ResourceKind::InteroperabilityRecord;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn owning_provider(&self) -> Option<&str> {
        Some(self.provider_id.as_str()).filter(|p| !p.is_empty())
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.provider_id = q.one(&self.provider_id);
    }

    fn alternative_identifiers(&self) -> &[AlternativeIdentifier] {
        &self.alternative_identifiers
    }
    fn set_alternative_identifiers(&mut self, ids: Vec<AlternativeIdentifier>) {
        self.alternative_identifiers = ids;
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "title", &self.title);
        require(&mut v, "providerId", &self.provider_id);
        v
    }
}

// ---------------------------------------------------------------------------
// Resource interoperability record
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceInteroperabilityRecord {
    pub id: String,
    pub resource_id: String,
    pub catalogue_id: String,
    pub interoperability_record_ids: Vec<String>,
}

impl CatalogueResource for ResourceInteroperabilityRecord {
    const KIND: ResourceKind = ResourceKind::ResourceInteroperabilityRecord;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.resource_id = q.one(&self.resource_id);
        self.interoperability_record_ids = q.set(&self.interoperability_record_ids);
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "resourceId", &self.resource_id);
        if self.interoperability_record_ids.iter().all(|id| id.trim().is_empty()) {
            v.push("at least one interoperabilityRecordId is required".into());
        }
        v
    }
}

// ---------------------------------------------------------------------------
// Monitoring
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringGroup {
    pub service_type: String,
    pub endpoint: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Monitoring {
    pub id: String,
    pub service_id: String,
    pub catalogue_id: String,
    pub monitored_by: Option<String>,
    pub monitoring_groups: Vec<MonitoringGroup>,
}

impl CatalogueResource for Monitoring {
    const KIND: ResourceKind = ResourceKind::Monitoring;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.service_id = q.one(&self.service_id);
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "serviceId", &self.service_id);
        for group in &self.monitoring_groups {
            require(&mut v, "monitoringGroups.endpoint", &group.endpoint);
        }
        v
    }
}

// ---------------------------------------------------------------------------
// Helpdesk
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Helpdesk {
    pub id: String,
    pub service_id: String,
    pub catalogue_id: String,
    pub helpdesk_type: Option<String>,
    pub emails: Vec<String>,
    pub ticket_preservation: bool,
}

impl CatalogueResource for Helpdesk {
    const KIND: ResourceKind = ResourceKind::Helpdesk;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.service_id = q.one(&self.service_id);
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "serviceId", &self.service_id);
        v
    }
}

// ---------------------------------------------------------------------------
// Configuration template instance
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigurationTemplateInstance {
    pub id: String,
    pub resource_id: String,
    /// Templates are catalogue-independent; the id is never qualified.
    pub configuration_template_id: String,
    pub catalogue_id: String,
    pub payload: serde_json::Value,
}

impl CatalogueResource for ConfigurationTemplateInstance {
    const KIND: ResourceKind = ResourceKind::ConfigurationTemplateInstance;

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }
    fn set_catalogue_id(&mut self, catalogue_id: String) {
        self.catalogue_id = catalogue_id;
    }

    fn rewrite_references(&mut self, q: &Qualifier) {
        self.resource_id = q.one(&self.resource_id);
    }

    fn violations(&self) -> Vec<String> {
        let mut v = Vec::new();
        require(&mut v, "resourceId", &self.resource_id);
        require(&mut v, "configurationTemplateId", &self.configuration_template_id);
        v
    }
}
