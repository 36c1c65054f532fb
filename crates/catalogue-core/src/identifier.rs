//! Public identifier resolution.
//!
//! A public id is either a previously issued PID or the local id qualified
//! with its catalogue (`<catalogue>.<local>`). Qualification is idempotent:
//! an id whose first dot-delimited segment already names an approved
//! catalogue (or the owning catalogue itself) passes through unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Snapshot of the approved, active catalogue ids - cheaply cloneable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApprovedCatalogues(Arc<BTreeSet<String>>);

impl ApprovedCatalogues {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(ids.into_iter().map(Into::into).collect()))
    }

    pub fn contains(&self, catalogue_id: &str) -> bool {
        self.0.contains(catalogue_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// How a kind derives the id of its public mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Public id is the externally issued persistent identifier.
    Pid,
    /// Public id is `<catalogue>.<local id>`.
    Prefix,
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pid => write!(f, "pid"),
            Self::Prefix => write!(f, "prefix"),
        }
    }
}

impl std::str::FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pid" => Ok(Self::Pid),
            "prefix" => Ok(Self::Prefix),
            other => Err(format!("unknown id strategy: {}", other)),
        }
    }
}

fn is_qualified(local_id: &str, catalogue_id: &str, approved: &ApprovedCatalogues) -> bool {
    match local_id.split_once('.') {
        Some((head, _)) => head == catalogue_id || approved.contains(head),
        None => false,
    }
}

/// Qualify `local_id` with `catalogue_id` unless it is already qualified.
pub fn resolve_public_id(local_id: &str, catalogue_id: &str, approved: &ApprovedCatalogues) -> String {
    if is_qualified(local_id, catalogue_id, approved) {
        local_id.to_string()
    } else {
        format!("{}.{}", catalogue_id, local_id)
    }
}

/// Qualify every non-blank item; duplicates collapse.
pub fn resolve_public_id_set<I, S>(
    items: I,
    catalogue_id: &str,
    approved: &ApprovedCatalogues,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .filter_map(|item| {
            let item = item.as_ref().trim();
            (!item.is_empty()).then(|| resolve_public_id(item, catalogue_id, approved))
        })
        .collect()
}

/// Binds a catalogue and an approved snapshot so cross-reference rewriting
/// reads as plain field assignments.
#[derive(Clone, Debug)]
pub struct Qualifier {
    catalogue_id: String,
    approved: ApprovedCatalogues,
}

impl Qualifier {
    pub fn new(catalogue_id: impl Into<String>, approved: ApprovedCatalogues) -> Self {
        Self {
            catalogue_id: catalogue_id.into(),
            approved,
        }
    }

    pub fn catalogue_id(&self) -> &str {
        &self.catalogue_id
    }

    pub fn approved(&self) -> &ApprovedCatalogues {
        &self.approved
    }

    /// Single required reference. Blank stays blank.
    pub fn one(&self, id: &str) -> String {
        let id = id.trim();
        if id.is_empty() {
            return String::new();
        }
        resolve_public_id(id, &self.catalogue_id, &self.approved)
    }

    /// Optional reference; blank collapses to `None`.
    pub fn opt(&self, id: Option<&str>) -> Option<String> {
        id.map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| resolve_public_id(id, &self.catalogue_id, &self.approved))
    }

    /// Reference list with set semantics, returned in sorted order.
    pub fn set(&self, ids: &[String]) -> Vec<String> {
        resolve_public_id_set(ids, &self.catalogue_id, &self.approved)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved() -> ApprovedCatalogues {
        ApprovedCatalogues::new(["eosc", "eic"])
    }

    #[test]
    fn qualifies_local_id() {
        assert_eq!(resolve_public_id("svc-42", "eosc", &approved()), "eosc.svc-42");
    }

    #[test]
    fn already_qualified_is_unchanged() {
        assert_eq!(resolve_public_id("eosc.svc-42", "eosc", &approved()), "eosc.svc-42");
        assert_eq!(resolve_public_id("eic.svc-42", "eosc", &approved()), "eic.svc-42");
    }

    #[test]
    fn unknown_prefix_gets_qualified() {
        assert_eq!(
            resolve_public_id("other.svc-42", "eosc", &approved()),
            "eosc.other.svc-42"
        );
    }

    #[test]
    fn idempotent_even_when_catalogue_not_approved() {
        let empty = ApprovedCatalogues::default();
        let once = resolve_public_id("x", "local", &empty);
        assert_eq!(resolve_public_id(&once, "local", &empty), once);
    }

    #[test]
    fn set_drops_blanks_and_duplicates() {
        let set = resolve_public_id_set(["p1", "eosc.p2", "", "  ", "eosc.p1"], "eosc", &approved());
        let expected: BTreeSet<String> = ["eosc.p1", "eosc.p2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn qualifier_opt_blank_is_none() {
        let q = Qualifier::new("eosc", approved());
        assert_eq!(q.opt(Some(" ")), None);
        assert_eq!(q.opt(None), None);
        assert_eq!(q.opt(Some("p1")).as_deref(), Some("eosc.p1"));
        assert_eq!(q.one(""), "");
    }

    #[test]
    fn strategy_parses() {
        assert_eq!("PID".parse::<IdStrategy>().unwrap(), IdStrategy::Pid);
        assert_eq!("prefix".parse::<IdStrategy>().unwrap(), IdStrategy::Prefix);
        assert!("handle".parse::<IdStrategy>().is_err());
    }
}
