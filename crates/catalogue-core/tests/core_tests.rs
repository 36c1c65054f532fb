//! Tests for catalogue-core: identifier resolution, payload rewriting, bundles, events, errors

use catalogue_core::*;

fn approved() -> ApprovedCatalogues {
    ApprovedCatalogues::new(["eosc", "eic"])
}

// ===========================================================================
// Identifier resolution
// ===========================================================================

#[test]
fn resolve_public_id_example() {
    let a = approved();
    let first = resolve_public_id("svc-42", "eosc", &a);
    assert_eq!(first, "eosc.svc-42");
    assert_eq!(resolve_public_id(&first, "eosc", &a), "eosc.svc-42");
}

#[test]
fn resolve_public_id_is_idempotent_across_inputs() {
    let a = approved();
    let catalogues = ["eosc", "eic", "unlisted"];
    let inputs = ["x", "eosc.x", "eic.y", "foo.bar", "a.b.c", "unlisted.z"];
    for c in catalogues {
        for x in inputs {
            let once = resolve_public_id(x, c, &a);
            assert_eq!(resolve_public_id(&once, c, &a), once, "input {} in {}", x, c);
        }
    }
}

#[test]
fn resolve_public_id_set_is_order_independent() {
    let a = approved();
    let forward = resolve_public_id_set(["p1", "eosc.p2", "p3"], "eosc", &a);
    let backward = resolve_public_id_set(["p3", "eosc.p2", "p1", "eosc.p3"], "eosc", &a);
    assert_eq!(forward, backward);
    assert_eq!(forward.len(), 3);
    assert!(!forward.contains(""));
}

// ===========================================================================
// Cross-reference rewriting
// ===========================================================================

#[test]
fn service_providers_rewritten_and_blank_dropped() {
    let mut service = Service {
        id: "svc-1".into(),
        resource_organisation: "p1".into(),
        resource_providers: vec!["p1".into(), "eosc.p2".into(), "".into()],
        related_resources: vec!["eic.svc-9".into(), "svc-3".into()],
        ..Default::default()
    };
    service.rewrite_references(&Qualifier::new("eosc", approved()));
    assert_eq!(service.resource_organisation, "eosc.p1");
    assert_eq!(service.resource_providers, vec!["eosc.p1".to_string(), "eosc.p2".to_string()]);
    assert_eq!(service.related_resources, vec!["eic.svc-9".to_string(), "eosc.svc-3".to_string()]);
    assert!(service.required_resources.is_empty());
}

#[test]
fn rewrite_twice_is_stable() {
    let q = Qualifier::new("eosc", approved());
    let mut rir = ResourceInteroperabilityRecord {
        resource_id: "svc-1".into(),
        interoperability_record_ids: vec!["ir-1".into(), "ir-1".into(), "eosc.ir-2".into()],
        ..Default::default()
    };
    rir.rewrite_references(&q);
    let once = rir.clone();
    rir.rewrite_references(&q);
    assert_eq!(rir, once);
    assert_eq!(rir.interoperability_record_ids.len(), 2);
}

#[test]
fn configuration_template_id_is_not_qualified() {
    let mut cti = ConfigurationTemplateInstance {
        resource_id: "svc-1".into(),
        configuration_template_id: "tmpl-7".into(),
        ..Default::default()
    };
    cti.rewrite_references(&Qualifier::new("eosc", approved()));
    assert_eq!(cti.resource_id, "eosc.svc-1");
    assert_eq!(cti.configuration_template_id, "tmpl-7");
}

#[test]
fn owning_provider_per_kind() {
    let service = Service {
        resource_organisation: "p1".into(),
        ..Default::default()
    };
    assert_eq!(service.owning_provider(), Some("p1"));
    assert_eq!(Service::default().owning_provider(), None);
    let ir = InteroperabilityRecord {
        provider_id: "p2".into(),
        ..Default::default()
    };
    assert_eq!(ir.owning_provider(), Some("p2"));
    assert_eq!(Helpdesk::default().owning_provider(), None);
}

#[test]
fn violations_list_missing_fields() {
    let v = Service::default().violations();
    assert!(v.iter().any(|m| m.contains("name")));
    assert!(v.iter().any(|m| m.contains("resourceOrganisation")));
    let ok = Provider {
        name: "Acme".into(),
        abbreviation: "ACME".into(),
        users: vec![ProviderUser {
            email: "a@acme.org".into(),
            ..Default::default()
        }],
        ..Default::default()
    };
    assert!(ok.violations().is_empty());
}

#[test]
fn payload_uses_camel_case() {
    let service = Service {
        resource_organisation: "p1".into(),
        ..Default::default()
    };
    let json = serde_json::to_value(&service).unwrap();
    assert_eq!(json["resourceOrganisation"], "p1");
    assert!(json.get("resource_organisation").is_none());
}

// ===========================================================================
// Bundles and kinds
// ===========================================================================

#[test]
fn bundle_serde_roundtrip_keeps_log_actions() {
    let actor = Principal::new("a@x.org", "Ann");
    let mut bundle = ResourceBundle::new(Service::default());
    bundle.log(&actor, LoggingType::Draft, LoggingAction::Created);
    let json = serde_json::to_string(&bundle).unwrap();
    assert!(json.contains("\"CREATED\""));
    let back: ResourceBundle<Service> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.actions(), vec![LoggingAction::Created]);
}

#[test]
fn bundle_without_template_status_omits_field() {
    let json = serde_json::to_string(&ResourceBundle::new(Service::default())).unwrap();
    assert!(!json.contains("template_status"));
}

#[test]
fn kind_names_parse_back() {
    for kind in ResourceKind::ALL {
        assert_eq!(kind.name().parse::<ResourceKind>().unwrap(), kind);
    }
    assert_eq!("training-resource".parse::<ResourceKind>().unwrap(), ResourceKind::TrainingResource);
    assert!("widget".parse::<ResourceKind>().is_err());
}

#[test]
fn catalogue_participation() {
    assert!(Catalogue::approved("eosc").participates());
    let mut inactive = Catalogue::approved("eic");
    inactive.active = false;
    assert!(!inactive.participates());
    let pending = Catalogue {
        catalogue_id: "new".into(),
        name: String::new(),
        status: "pending catalogue".into(),
        active: true,
    };
    assert!(!pending.participates());
}

// ===========================================================================
// Events and errors
// ===========================================================================

#[test]
fn event_topic_naming() {
    let event = ChangeEvent::new(ResourceKind::TrainingResource, ChangeAction::Delete, serde_json::json!({}));
    assert_eq!(event.topic, "training_resource.delete");
    assert_eq!(topic("service", ChangeAction::Create), "service.create");
}

#[test]
fn error_messages() {
    let e = Error::validation("service", vec!["name is required".into(), "x".into()]);
    assert_eq!(e.to_string(), "validation failed for service: name is required; x");
    assert!(Error::not_found("service", "s1").is_not_found());
    assert!(!Error::conflict("service", "s1").is_not_found());
}
