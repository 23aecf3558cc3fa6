//! Progress reporting for sweeps
//!
//! The walker reports through the [`Progress`] trait. [`LineProgress`] writes
//! the classic indented lines:
//!
//! ```text
//! [vcd_org] test-org (DELETE)
//!   [vcd_org_vdc] ProductionVdc (no)
//! REMOVING org test-org
//! ```
//!
//! [`TracingProgress`] emits the same information as `tracing` events.

use leftovers_cloud::EntityKind;
use leftovers_config::EntityRef;
use std::io::Write;
use std::sync::Mutex;

use crate::selection::Decision;

/// Receiver of sweep progress
pub trait Progress: Send + Sync {
    /// A decision worth showing: the entity is deleted or its kind is always shown
    fn decision(&self, depth: usize, entity: &EntityRef, decision: &Decision);

    /// An entity is about to be removed (or would be, in a dry run)
    fn removing(&self, depth: usize, kind: EntityKind, path: &str, dry_run: bool);

    /// A whole pass was skipped
    fn skipped(&self, pass: &str, reason: &str);
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

pub fn format_decision(depth: usize, entity: &EntityRef, decision: &Decision) -> String {
    format!(
        "{}[{}] {} ({}{})",
        indent(depth),
        entity.kind,
        entity.name,
        decision.verdict(),
        decision.markers()
    )
}

/// Removal announcement: `REMOVING <kind> <path>`
///
/// `path` is `<parent>/<name>`; top-level entities have no parent and are
/// announced by name alone (`REMOVING org test-org`).
pub fn format_removing(depth: usize, kind: EntityKind, path: &str, dry_run: bool) -> String {
    let verb = if dry_run { "WOULD REMOVE" } else { "REMOVING" };
    format!("{}{} {} {}", indent(depth), verb, kind.label(), path)
}

/// Line oriented progress written to any [`Write`] sink
///
/// Decisions and skipped passes are only written in verbose mode, removals
/// always are.
pub struct LineProgress<W: Write + Send> {
    out: Mutex<W>,
    verbose: bool,
}

/// Progress printed on standard output
pub type ConsoleProgress = LineProgress<std::io::Stdout>;

impl LineProgress<std::io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(std::io::stdout(), verbose)
    }
}

impl<W: Write + Send> LineProgress<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out: Mutex::new(out),
            verbose,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{}", line) {
            tracing::warn!("Failed to write progress line: {}", e);
        }
    }
}

impl<W: Write + Send> Progress for LineProgress<W> {
    fn decision(&self, depth: usize, entity: &EntityRef, decision: &Decision) {
        if self.verbose {
            self.line(&format_decision(depth, entity, decision));
        }
    }

    fn removing(&self, depth: usize, kind: EntityKind, path: &str, dry_run: bool) {
        self.line(&format_removing(depth, kind, path, dry_run));
    }

    fn skipped(&self, pass: &str, reason: &str) {
        if self.verbose {
            self.line(&format!("# skipping {}: {}", pass, reason));
        }
    }
}

/// Progress reported as structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn decision(&self, depth: usize, entity: &EntityRef, decision: &Decision) {
        tracing::debug!(
            kind = %entity.kind,
            name = %entity.name,
            depth,
            delete = decision.delete,
            reason = %decision.reason,
            "Decision"
        );
    }

    fn removing(&self, depth: usize, kind: EntityKind, path: &str, dry_run: bool) {
        tracing::info!(kind = %kind, path, depth, dry_run, "Removing {}", kind.label());
    }

    fn skipped(&self, pass: &str, reason: &str) {
        tracing::warn!(pass, "Skipping pass: {}", reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Reason;

    fn lines(progress: LineProgress<Vec<u8>>) -> Vec<String> {
        String::from_utf8(progress.into_inner())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_decision_lines() {
        let delete = Decision {
            delete: true,
            reason: Reason::Forced,
            forced: true,
            protected: false,
        };
        let kept = Decision {
            delete: false,
            reason: Reason::Default,
            forced: false,
            protected: false,
        };

        assert_eq!(
            format_decision(0, &EntityRef::new(EntityKind::Org, "org1"), &delete),
            "[vcd_org] org1 (DELETE +)"
        );
        assert_eq!(
            format_decision(2, &EntityRef::new(EntityKind::Vdc, "ProductionVdc"), &kept),
            "    [vcd_org_vdc] ProductionVdc (no)"
        );
    }

    #[test]
    fn test_removing_lines() {
        assert_eq!(
            format_removing(0, EntityKind::Org, "test-org", false),
            "REMOVING org test-org"
        );
        assert_eq!(
            format_removing(1, EntityKind::Catalog, "prod-org/test-cat", true),
            "  WOULD REMOVE catalog prod-org/test-cat"
        );
    }

    #[test]
    fn test_quiet_progress_only_shows_removals() {
        let progress = LineProgress::new(Vec::new(), false);
        let entity = EntityRef::new(EntityKind::Org, "test-org");
        progress.decision(0, &entity, &Decision::dependent(false));
        progress.removing(0, EntityKind::Org, "test-org", false);
        progress.skipped("IP spaces", "API version too old");

        assert_eq!(lines(progress), vec!["REMOVING org test-org"]);
    }

    #[test]
    fn test_verbose_progress() {
        let progress = LineProgress::new(Vec::new(), true);
        let entity = EntityRef::new(EntityKind::Vapp, "TestVapp");
        progress.decision(2, &entity, &Decision::dependent(false));
        progress.removing(2, EntityKind::Vapp, "org/vdc/TestVapp", true);

        assert_eq!(
            lines(progress),
            vec![
                "    [vcd_vapp] TestVapp (DELETE)",
                "    WOULD REMOVE vApp org/vdc/TestVapp"
            ]
        );
    }
}
