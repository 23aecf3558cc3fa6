//! Summary of a completed sweep

use leftovers_cloud::EntityKind;
use serde::Serialize;

use crate::lister::{Listed, join_path};

/// An entity removed by the sweep (or that would be, in a dry run)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub kind: EntityKind,
    pub parent: String,
    pub name: String,
}

impl Removal {
    pub fn path(&self) -> String {
        join_path(&self.parent, &self.name)
    }
}

impl From<&Listed> for Removal {
    fn from(listed: &Listed) -> Self {
        Self {
            kind: listed.kind(),
            parent: listed.parent.clone(),
            name: listed.name().to_string(),
        }
    }
}

/// A selected entity left in place because something it depends on was kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Retained {
    pub kind: EntityKind,
    pub path: String,
    pub reason: String,
}

/// A pass that did not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPass {
    pub pass: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Removals in the order they were issued
    pub removed: Vec<Removal>,

    /// Number of entities decided as kept
    pub kept: usize,

    pub retained: Vec<Retained>,

    pub skipped: Vec<SkippedPass>,

    pub dry_run: bool,

    pub duration_ms: u64,
}

impl SweepReport {
    /// Position of the first removal of `(kind, name)`
    pub fn position(&self, kind: EntityKind, name: &str) -> Option<usize> {
        self.removed
            .iter()
            .position(|r| r.kind == kind && r.name == name)
    }

    pub fn removed_count(&self, kind: EntityKind) -> usize {
        self.removed.iter().filter(|r| r.kind == kind).count()
    }
}

impl std::fmt::Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.dry_run { "would be removed" } else { "removed" };
        write!(f, "{} {}, {} kept", self.removed.len(), verb, self.kept)?;
        if !self.retained.is_empty() {
            write!(f, ", {} retained", self.retained.len())?;
        }
        if !self.skipped.is_empty() {
            write!(f, ", {} passes skipped", self.skipped.len())?;
        }
        write!(f, " ({}ms)", self.duration_ms)
    }
}
