//! Entity references used by the protect and force lists

use leftovers_cloud::EntityKind;
use serde::{Deserialize, Serialize};

/// A (type, name) pair naming one entity on the management plane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub kind: EntityKind,

    pub name: String,

    /// Why the entry exists; never affects decisions
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn matches(&self, kind: EntityKind, name: &str) -> bool {
        self.kind == kind && self.name == name
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.name)
    }
}

/// Ordered list of entity references, looked up by (type, name)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityList(Vec<EntityRef>);

impl EntityList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry unless the same (type, name) is already listed
    pub fn push(&mut self, entry: EntityRef) {
        if !self.contains(entry.kind, &entry.name) {
            self.0.push(entry);
        }
    }

    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        self.0.iter().any(|e| e.matches(kind, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<EntityRef> for EntityList {
    fn from_iter<I: IntoIterator<Item = EntityRef>>(iter: I) -> Self {
        let mut list = EntityList::new();
        for entry in iter {
            list.push(entry);
        }
        list
    }
}

impl From<Vec<EntityRef>> for EntityList {
    fn from(entries: Vec<EntityRef>) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_keyed_by_type_and_name() {
        let list: EntityList = vec![
            EntityRef::new(EntityKind::Vapp, "TestVapp").with_comment("shared fixture"),
            EntityRef::new(EntityKind::Org, "org1"),
        ]
        .into();

        assert!(list.contains(EntityKind::Vapp, "TestVapp"));
        assert!(list.contains(EntityKind::Org, "org1"));
        // same name, different type
        assert!(!list.contains(EntityKind::Org, "TestVapp"));
        assert!(!list.contains(EntityKind::Vapp, "testvapp"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let list: EntityList = vec![
            EntityRef::new(EntityKind::Org, "org1"),
            EntityRef::new(EntityKind::Org, "org1").with_comment("again"),
        ]
        .into();
        assert_eq!(list.len(), 1);
    }
}
