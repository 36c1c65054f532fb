//! Kind descriptors - the table that turns two generic engines into
//! per-kind managers.
//!
//! Every kind has:
//! - an id strategy for its public mirror (PID or catalogue prefix)
//! - whether PIDs get registered with the external issuer
//! - an approval rule applied on promotion out of draft
//! - whether it has a draft workflow at all
//! - a short prefix for generated ids and minted PIDs

use crate::config::EngineConfig;
use catalogue_core::{Error, IdStrategy, ResourceKind, Result};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalRule {
    /// Approved iff the owning provider's template is approved.
    ProviderTemplate,
    /// Providers always land in "pending provider" and reset their template.
    ProviderOnboarding,
}

impl fmt::Display for ApprovalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderTemplate => write!(f, "provider-template"),
            Self::ProviderOnboarding => write!(f, "provider-onboarding"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindDescriptor {
    pub kind: ResourceKind,
    pub strategy: IdStrategy,
    pub pid_registration: bool,
    pub approval: ApprovalRule,
    pub supports_drafts: bool,
    pub id_prefix: &'static str,
}

impl KindDescriptor {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn draft_type(&self) -> String {
        format!("draft_{}", self.kind.name())
    }

    pub fn standard_type(&self) -> String {
        self.kind.name().to_string()
    }

    /// Public rows share the standard type and differ by `published`.
    pub fn public_type(&self) -> String {
        self.kind.name().to_string()
    }
}

/// Holds one descriptor per kind.
pub struct DescriptorTable {
    kinds: BTreeMap<ResourceKind, KindDescriptor>,
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self { kinds: BTreeMap::new() }
    }

    pub fn register(&mut self, descriptor: KindDescriptor) {
        self.kinds.insert(descriptor.kind, descriptor);
    }

    pub fn get(&self, kind: ResourceKind) -> Result<&KindDescriptor> {
        self.kinds
            .get(&kind)
            .ok_or_else(|| Error::Config(format!("no descriptor registered for {}", kind)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &KindDescriptor> {
        self.kinds.values()
    }

    /// Apply `[kinds.<name>]` overrides from config.
    pub fn apply_overrides(&mut self, config: &EngineConfig) -> Result<()> {
        for (name, o) in &config.kinds {
            let kind: ResourceKind = name.parse().map_err(Error::Config)?;
            let descriptor = self
                .kinds
                .get_mut(&kind)
                .ok_or_else(|| Error::Config(format!("no descriptor registered for {}", kind)))?;
            if let Some(strategy) = o.strategy {
                descriptor.strategy = strategy;
                descriptor.pid_registration = strategy == IdStrategy::Pid;
            }
            if let Some(register) = o.pid_registration {
                descriptor.pid_registration = register;
            }
            if descriptor.pid_registration && descriptor.strategy != IdStrategy::Pid {
                return Err(Error::Config(format!(
                    "{}: pid_registration requires the pid strategy",
                    kind
                )));
            }
        }
        Ok(())
    }

    /// Defaults plus config overrides.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut table = default_descriptors();
        table.apply_overrides(config)?;
        Ok(table)
    }
}

fn descriptor(
    kind: ResourceKind,
    strategy: IdStrategy,
    approval: ApprovalRule,
    supports_drafts: bool,
    id_prefix: &'static str,
) -> KindDescriptor {
    KindDescriptor {
        kind,
        strategy,
        pid_registration: strategy == IdStrategy::Pid,
        approval,
        supports_drafts,
        id_prefix,
    }
}

/// Build the default descriptor table.
///
/// Which strategy is authoritative per kind is still open with the
/// catalogue owners; these defaults follow the kinds that already carry
/// PIDs and every one of them can be flipped from config.
pub fn default_descriptors() -> DescriptorTable {
    use ApprovalRule::*;
    use IdStrategy::*;
    use ResourceKind::*;

    let mut table = DescriptorTable::new();

    // ─── PID-addressed kinds ───
    table.register(descriptor(Provider, Pid, ProviderOnboarding, true, "prv"));
    table.register(descriptor(Service, Pid, ProviderTemplate, true, "svc"));
    table.register(descriptor(Datasource, Pid, ProviderTemplate, false, "ds"));
    table.register(descriptor(TrainingResource, Pid, ProviderTemplate, true, "tr"));
    table.register(descriptor(InteroperabilityRecord, Pid, ProviderTemplate, true, "ir"));

    // ─── Prefix-addressed kinds ───
    table.register(descriptor(ResourceInteroperabilityRecord, Prefix, ProviderTemplate, false, "rir"));
    table.register(descriptor(Monitoring, Prefix, ProviderTemplate, false, "mon"));
    table.register(descriptor(Helpdesk, Prefix, ProviderTemplate, false, "hd"));
    table.register(descriptor(ConfigurationTemplateInstance, Prefix, ProviderTemplate, false, "cti"));

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KindOverride;

    #[test]
    fn every_kind_has_a_descriptor() {
        let table = default_descriptors();
        for kind in ResourceKind::ALL {
            assert!(table.get(kind).is_ok(), "missing {}", kind);
        }
    }

    #[test]
    fn storage_types() {
        let table = default_descriptors();
        let svc = table.get(ResourceKind::Service).unwrap();
        assert_eq!(svc.draft_type(), "draft_service");
        assert_eq!(svc.standard_type(), "service");
        assert_eq!(svc.public_type(), "service");
    }

    #[test]
    fn only_providers_onboard() {
        let table = default_descriptors();
        for d in table.iter() {
            let expected = if d.kind == ResourceKind::Provider {
                ApprovalRule::ProviderOnboarding
            } else {
                ApprovalRule::ProviderTemplate
            };
            assert_eq!(d.approval, expected);
        }
    }

    #[test]
    fn override_flips_strategy() {
        let mut config = EngineConfig::default();
        config.kinds.insert(
            "service".into(),
            KindOverride { strategy: Some(IdStrategy::Prefix), pid_registration: Some(false) },
        );
        let table = DescriptorTable::from_config(&config).unwrap();
        let svc = table.get(ResourceKind::Service).unwrap();
        assert_eq!(svc.strategy, IdStrategy::Prefix);
        assert!(!svc.pid_registration);
    }

    #[test]
    fn strategy_override_alone_sets_registration() {
        let mut config = EngineConfig::default();
        config.kinds.insert(
            "service".into(),
            KindOverride { strategy: Some(IdStrategy::Prefix), pid_registration: None },
        );
        config.kinds.insert(
            "helpdesk".into(),
            KindOverride { strategy: Some(IdStrategy::Pid), pid_registration: None },
        );
        let table = DescriptorTable::from_config(&config).unwrap();
        let svc = table.get(ResourceKind::Service).unwrap();
        assert_eq!(svc.strategy, IdStrategy::Prefix);
        assert!(!svc.pid_registration);
        let helpdesk = table.get(ResourceKind::Helpdesk).unwrap();
        assert_eq!(helpdesk.strategy, IdStrategy::Pid);
        assert!(helpdesk.pid_registration);
    }

    #[test]
    fn registration_without_pid_strategy_is_rejected() {
        let mut config = EngineConfig::default();
        config.kinds.insert(
            "helpdesk".into(),
            KindOverride { strategy: None, pid_registration: Some(true) },
        );
        assert!(DescriptorTable::from_config(&config).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut config = EngineConfig::default();
        config.kinds.insert("widget".into(), KindOverride::default());
        assert!(DescriptorTable::from_config(&config).is_err());
    }
}
