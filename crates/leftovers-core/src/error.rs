use leftovers_cloud::{CloudError, EntityKind};
use thiserror::Error;

use crate::lister::Listed;

/// Failure that aborted a sweep
///
/// Every variant keeps the management plane error as its source together with
/// the kind, parent path and name of the entity being handled.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Failed to list {kind} in '{parent}': {source}")]
    List {
        kind: EntityKind,
        parent: String,
        source: CloudError,
    },

    #[error("Failed to look up {kind} '{name}' in '{parent}': {source}")]
    Lookup {
        kind: EntityKind,
        parent: String,
        name: String,
        source: CloudError,
    },

    #[error("Failed to delete {kind} '{name}' in '{parent}': {source}")]
    Delete {
        kind: EntityKind,
        parent: String,
        name: String,
        source: CloudError,
    },

    #[error("Task removing {kind} '{name}' in '{parent}' failed: {source}")]
    Task {
        kind: EntityKind,
        parent: String,
        name: String,
        source: CloudError,
    },
}

impl SweepError {
    pub(crate) fn list(kind: EntityKind, parent: &str, source: CloudError) -> Self {
        SweepError::List {
            kind,
            parent: parent.to_string(),
            source,
        }
    }

    pub(crate) fn lookup(listed: &Listed, source: CloudError) -> Self {
        SweepError::Lookup {
            kind: listed.kind(),
            parent: listed.parent.clone(),
            name: listed.name().to_string(),
            source,
        }
    }

    pub(crate) fn delete(listed: &Listed, source: CloudError) -> Self {
        SweepError::Delete {
            kind: listed.kind(),
            parent: listed.parent.clone(),
            name: listed.name().to_string(),
            source,
        }
    }

    pub(crate) fn task(listed: &Listed, source: CloudError) -> Self {
        SweepError::Task {
            kind: listed.kind(),
            parent: listed.parent.clone(),
            name: listed.name().to_string(),
            source,
        }
    }

    /// Kind of the entity the sweep was handling
    pub fn kind(&self) -> EntityKind {
        match self {
            SweepError::List { kind, .. }
            | SweepError::Lookup { kind, .. }
            | SweepError::Delete { kind, .. }
            | SweepError::Task { kind, .. } => *kind,
        }
    }

    pub fn cloud_error(&self) -> &CloudError {
        match self {
            SweepError::List { source, .. }
            | SweepError::Lookup { source, .. }
            | SweepError::Delete { source, .. }
            | SweepError::Task { source, .. } => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
