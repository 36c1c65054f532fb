//! Catalogue Engine - draft lifecycle, publication and the per-kind service

pub mod catalogues;
pub mod config;
pub mod context;
pub mod deadline;
pub mod descriptor;
pub mod draft;
pub mod merge;
pub mod providers;
pub mod publication;
pub mod service;
pub mod store;
pub mod validate;

pub use catalogues::CatalogueLookup;
pub use config::EngineConfig;
pub use context::{EngineContext, EngineContextBuilder};
pub use descriptor::{default_descriptors, ApprovalRule, DescriptorTable, KindDescriptor};
pub use draft::DraftEngine;
pub use merge::merge_public;
pub use providers::{ProviderDirectory, RegistryProviderDirectory};
pub use publication::{PublicFilter, PublicationEngine, PID_IDENTIFIER_TYPE};
pub use service::{Outcome, ResourceService};
pub use store::{SourceStore, Versioned};
pub use validate::{RuleValidator, Validator};
