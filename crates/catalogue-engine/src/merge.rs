//! Republish merge.
//!
//! Incoming fields win, then the identity assigned at first publication is
//! put back: `identifiers`, the public `id`, `published=true` and any
//! alternative identifiers the mirror already carries.

use catalogue_core::{CatalogueResource, ResourceBundle};

pub fn merge_public<R: CatalogueResource>(
    existing: &ResourceBundle<R>,
    incoming: ResourceBundle<R>,
) -> ResourceBundle<R> {
    let mut merged = incoming;
    merged.identifiers = existing.identifiers.clone();
    merged.payload.set_id(existing.payload.id().to_string());
    merged.metadata.published = true;
    let alternative = existing.payload.alternative_identifiers();
    if !alternative.is_empty() {
        merged.payload.set_alternative_identifiers(alternative.to_vec());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogue_core::{AlternativeIdentifier, Identifiers, Service};

    fn public(id: &str, name: &str, pid: &str) -> ResourceBundle<Service> {
        let mut b = ResourceBundle::new(Service {
            id: id.into(),
            name: name.into(),
            alternative_identifiers: vec![AlternativeIdentifier::new("PID", pid)],
            ..Default::default()
        });
        b.identifiers = Identifiers { original_id: "svc-1".into(), pid: Some(pid.into()) };
        b.metadata.published = true;
        b
    }

    #[test]
    fn incoming_fields_win() {
        let existing = public("21.T/svc.a", "Old", "21.T/svc.a");
        let mut incoming = ResourceBundle::new(Service {
            id: "svc-1".into(),
            name: "New".into(),
            ..Default::default()
        });
        incoming.status = "approved resource".into();
        let merged = merge_public(&existing, incoming);
        assert_eq!(merged.payload.name, "New");
        assert_eq!(merged.status, "approved resource");
    }

    #[test]
    fn protected_fields_restored() {
        let existing = public("21.T/svc.a", "Old", "21.T/svc.a");
        let mut incoming = ResourceBundle::new(Service {
            id: "something-else".into(),
            alternative_identifiers: vec![AlternativeIdentifier::new("DOI", "10.1/x")],
            ..Default::default()
        });
        incoming.identifiers = Identifiers { original_id: "other".into(), pid: Some("forged".into()) };
        incoming.metadata.published = false;

        let merged = merge_public(&existing, incoming);
        assert_eq!(merged.payload.id, "21.T/svc.a");
        assert_eq!(merged.identifiers, existing.identifiers);
        assert!(merged.metadata.published);
        assert_eq!(merged.payload.alternative_identifiers, existing.payload.alternative_identifiers);
    }

    #[test]
    fn empty_alternative_list_keeps_incoming() {
        let mut existing = public("eosc.svc-1", "Old", "x");
        existing.payload.alternative_identifiers.clear();
        let incoming = ResourceBundle::new(Service {
            alternative_identifiers: vec![AlternativeIdentifier::new("DOI", "10.1/x")],
            ..Default::default()
        });
        let merged = merge_public(&existing, incoming);
        assert_eq!(merged.payload.alternative_identifiers.len(), 1);
    }
}
