//! Core types: bundles, metadata, audit log, principals, catalogues

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow labels stored in `ResourceBundle::status` and `template_status`.
pub mod status {
    pub const APPROVED_RESOURCE: &str = "approved resource";
    pub const PENDING_RESOURCE: &str = "pending resource";
    pub const PENDING_PROVIDER: &str = "pending provider";
    pub const APPROVED_CATALOGUE: &str = "approved catalogue";
    pub const APPROVED_TEMPLATE: &str = "approved template";
    pub const NO_TEMPLATE_STATUS: &str = "no template status";
}

/// Storage type of catalogue rows.
pub const CATALOGUE_TYPE: &str = "catalogue";

/// Every resource kind the catalogue manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Provider,
    Service,
    Datasource,
    TrainingResource,
    InteroperabilityRecord,
    ResourceInteroperabilityRecord,
    Monitoring,
    Helpdesk,
    ConfigurationTemplateInstance,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        Self::Provider,
        Self::Service,
        Self::Datasource,
        Self::TrainingResource,
        Self::InteroperabilityRecord,
        Self::ResourceInteroperabilityRecord,
        Self::Monitoring,
        Self::Helpdesk,
        Self::ConfigurationTemplateInstance,
    ];

    /// Registry type name and event topic prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Service => "service",
            Self::Datasource => "datasource",
            Self::TrainingResource => "training_resource",
            Self::InteroperabilityRecord => "interoperability_record",
            Self::ResourceInteroperabilityRecord => "resource_interoperability_record",
            Self::Monitoring => "monitoring",
            Self::Helpdesk => "helpdesk",
            Self::ConfigurationTemplateInstance => "configuration_template_instance",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| format!("unknown resource kind: {}", s))
    }
}

/// The calling user, as resolved by the identity collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Principal {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    /// Id of the source resource this bundle was derived from.
    pub original_id: String,
    /// Persistent identifier, issued once at first publication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Metadata {
    pub fn created_by(actor: &Principal) -> Self {
        let now = Utc::now();
        Self {
            published: false,
            registered_by: Some(actor.name.clone()),
            registered_at: Some(now),
            modified_by: Some(actor.name.clone()),
            modified_at: Some(now),
        }
    }

    pub fn touch(&mut self, actor: &Principal) {
        self.modified_by = Some(actor.name.clone());
        self.modified_at = Some(Utc::now());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingType {
    Draft,
    Onboard,
    Update,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoggingAction {
    Created,
    Updated,
    Registered,
    Approved,
}

impl fmt::Display for LoggingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Updated => write!(f, "UPDATED"),
            Self::Registered => write!(f, "REGISTERED"),
            Self::Approved => write!(f, "APPROVED"),
        }
    }
}

/// One audit-trail entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingInfo {
    pub date: DateTime<Utc>,
    pub user_email: String,
    pub user_full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(rename = "type")]
    pub log_type: LoggingType,
    pub action: LoggingAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl LoggingInfo {
    pub fn new(actor: &Principal, log_type: LoggingType, action: LoggingAction) -> Self {
        Self {
            date: Utc::now(),
            user_email: actor.email.clone(),
            user_full_name: actor.name.clone(),
            user_role: actor.role.clone(),
            log_type,
            action,
            comment: None,
        }
    }
}

/// A payload plus identifiers, metadata, audit log and lifecycle flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceBundle<R> {
    pub payload: R,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub logging_info: Vec<LoggingInfo>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub draft: bool,
    /// Provider bundles only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_status: Option<String>,
}

impl<R> ResourceBundle<R> {
    pub fn new(payload: R) -> Self {
        Self {
            payload,
            identifiers: Identifiers::default(),
            metadata: Metadata::default(),
            logging_info: Vec::new(),
            status: String::new(),
            active: false,
            draft: false,
            template_status: None,
        }
    }

    pub fn log(&mut self, actor: &Principal, log_type: LoggingType, action: LoggingAction) {
        self.logging_info.push(LoggingInfo::new(actor, log_type, action));
    }

    pub fn actions(&self) -> Vec<LoggingAction> {
        self.logging_info.iter().map(|l| l.action).collect()
    }
}

/// A catalogue row as stored in the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    pub catalogue_id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    pub active: bool,
}

impl Catalogue {
    pub fn approved(catalogue_id: impl Into<String>) -> Self {
        Self {
            catalogue_id: catalogue_id.into(),
            name: String::new(),
            status: status::APPROVED_CATALOGUE.into(),
            active: true,
        }
    }

    /// Only approved, active catalogues take part in identifier resolution.
    pub fn participates(&self) -> bool {
        self.active && self.status == status::APPROVED_CATALOGUE
    }
}
