//! Business-rule validation run before promotion out of draft.

use catalogue_core::{CatalogueResource, Error, ResourceBundle, Result};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validator<R>: Send + Sync {
    fn validate(&self, bundle: &ResourceBundle<R>) -> Result<()>;
}

fn id_is_well_formed(id: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-/]*$").ok())
        .as_ref()
        .map(|re| re.is_match(id))
        .unwrap_or(false)
}

/// Checks the payload's own rules plus id and catalogue well-formedness.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleValidator;

impl<R: CatalogueResource> Validator<R> for RuleValidator {
    fn validate(&self, bundle: &ResourceBundle<R>) -> Result<()> {
        let mut reasons = bundle.payload.violations();
        let id = bundle.payload.id();
        if id.is_empty() {
            reasons.push("id is required".into());
        } else if !id_is_well_formed(id) {
            reasons.push(format!("id '{}' contains unsupported characters", id));
        }
        if bundle.payload.catalogue_id().trim().is_empty() {
            reasons.push("catalogueId is required".into());
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(R::KIND.name(), reasons))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogue_core::Helpdesk;

    fn bundle(id: &str, service_id: &str) -> ResourceBundle<Helpdesk> {
        ResourceBundle::new(Helpdesk {
            id: id.into(),
            service_id: service_id.into(),
            catalogue_id: "eosc".into(),
            ..Default::default()
        })
    }

    #[test]
    fn accepts_well_formed() {
        assert!(RuleValidator.validate(&bundle("hd-1", "svc-1")).is_ok());
    }

    #[test]
    fn rejects_bad_id_and_missing_fields() {
        let err = RuleValidator.validate(&bundle("hd 1", "")).unwrap_err();
        match err {
            Error::ValidationFailed { kind, reasons } => {
                assert_eq!(kind, "helpdesk");
                assert_eq!(reasons.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
