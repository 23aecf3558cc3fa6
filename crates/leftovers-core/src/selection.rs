//! Keep-or-delete decisions
//!
//! A decision starts from the test name pattern, is overridden by the force
//! list and finally by the protect list, which always has the last word.

use leftovers_cloud::EntityKind;
use leftovers_config::{EntityList, SweepConfig};
use regex::Regex;
use serde::Serialize;

/// Rule that produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Name pattern match (or mismatch)
    Default,
    /// Listed in `also_delete`
    Forced,
    /// Listed in `do_not_delete`
    Protected,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Default => write!(f, "default"),
            Reason::Forced => write!(f, "forced"),
            Reason::Protected => write!(f, "protected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub delete: bool,
    pub reason: Reason,

    /// Entry present in the force list, whether or not it won
    pub forced: bool,

    /// Entry present in the protect list
    pub protected: bool,
}

impl Decision {
    /// Decision for an entity that only exists because of a parent being removed
    ///
    /// Such entities are removed unless explicitly protected.
    pub fn dependent(protected: bool) -> Self {
        Self {
            delete: !protected,
            reason: if protected {
                Reason::Protected
            } else {
                Reason::Default
            },
            forced: false,
            protected,
        }
    }

    /// `+` for a force list entry, `-` for a protect list entry
    pub fn markers(&self) -> String {
        let mut markers = String::new();
        if self.forced {
            markers.push_str(" +");
        }
        if self.protected {
            markers.push_str(" -");
        }
        markers
    }

    pub fn verdict(&self) -> &'static str {
        if self.delete { "DELETE" } else { "no" }
    }
}

/// Decide whether the entity `(kind, name)` is a leftover to delete
pub fn decide(
    protect: &EntityList,
    force: &EntityList,
    is_test: &Regex,
    name: &str,
    kind: EntityKind,
) -> Decision {
    let mut decision = Decision {
        delete: is_test.is_match(name),
        reason: Reason::Default,
        forced: false,
        protected: false,
    };

    if force.contains(kind, name) {
        decision.delete = true;
        decision.reason = Reason::Forced;
        decision.forced = true;
    }

    if protect.contains(kind, name) {
        decision.delete = false;
        decision.reason = Reason::Protected;
        decision.protected = true;
    }

    decision
}

/// [`decide`] against the lists of a [`SweepConfig`]
pub fn decide_with(config: &SweepConfig, name: &str, kind: EntityKind) -> Decision {
    decide(
        config.do_not_delete(),
        config.also_delete(),
        config.is_test(),
        name,
        kind,
    )
}
