//! Top-down discovery and removal of leftovers
//!
//! The walker lists one level of the containment tree at a time, decides on
//! every entity and either removes it or, for containers that are kept,
//! descends into their content. A removed container is never listed again:
//! the platform deletes its content with it.

use leftovers_cloud::ManagementPlane;
use leftovers_config::SweepConfig;
use std::time::Instant;

use crate::deleter;
use crate::error::Result;
use crate::lister::{self, Listed};
use crate::progress::{ConsoleProgress, Progress};
use crate::report::{Removal, Retained, SkippedPass, SweepReport};
use crate::selection::{Decision, decide_with};

pub(crate) const NOT_SYS_ADMIN: &str = "requires system administrator privileges";

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOptions {
    /// Print every decision, not only removals
    pub verbose: bool,

    /// Decide and report without issuing any mutating call
    pub dry_run: bool,
}

/// Outcome of visiting one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Removed, together with anything it contained
    Deleted,
    /// Kept; its content still has to be walked
    KeptRecurse,
    /// Kept, nothing below it to walk
    KeptLeaf,
}

/// Serial sweep over a management plane
pub struct Walker<'a> {
    plane: &'a dyn ManagementPlane,
    config: &'a SweepConfig,
    progress: &'a dyn Progress,
    options: SweepOptions,
    report: SweepReport,
}

impl<'a> Walker<'a> {
    pub fn new(
        plane: &'a dyn ManagementPlane,
        config: &'a SweepConfig,
        progress: &'a dyn Progress,
        options: SweepOptions,
    ) -> Self {
        Self {
            plane,
            config,
            progress,
            options,
            report: SweepReport {
                dry_run: options.dry_run,
                ..Default::default()
            },
        }
    }

    /// Run every pass in order, stopping at the first error
    pub async fn run(mut self) -> Result<SweepReport> {
        let started = Instant::now();
        tracing::info!(
            sys_admin = self.plane.is_sys_admin(),
            api_version = %self.plane.api_version(),
            dry_run = self.options.dry_run,
            "Starting leftover sweep"
        );

        self.sweep_alb().await?;
        self.sweep_provider_vdcs().await?;
        self.sweep_orgs().await?;
        self.sweep_rde_types().await?;
        self.sweep_rde_interfaces().await?;
        self.sweep_external_networks().await?;
        self.sweep_ip_spaces().await?;
        self.sweep_ui_plugins().await?;

        self.report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!("Leftover sweep finished: {}", self.report);
        Ok(self.report)
    }

    pub(crate) fn plane(&self) -> &'a dyn ManagementPlane {
        self.plane
    }

    /// Decide on `listed` and report the decision when it is worth showing
    pub(crate) fn select(&mut self, depth: usize, listed: &Listed) -> Decision {
        let decision = decide_with(self.config, listed.name(), listed.kind());
        self.report_decision(depth, listed, decision)
    }

    /// Decide on an entity that only goes away because its owner does
    pub(crate) fn select_dependent(&mut self, depth: usize, listed: &Listed) -> Decision {
        let protected = self
            .config
            .do_not_delete()
            .contains(listed.kind(), listed.name());
        self.report_decision(depth, listed, Decision::dependent(protected))
    }

    fn report_decision(&mut self, depth: usize, listed: &Listed, decision: Decision) -> Decision {
        if decision.delete || self.config.always_shows(listed.kind()) {
            self.progress.decision(depth, &listed.entity, &decision);
        }
        if !decision.delete {
            self.report.kept += 1;
        }
        decision
    }

    /// Announce and remove `listed`
    pub(crate) async fn remove(&mut self, depth: usize, listed: &Listed) -> Result<()> {
        let path = listed.path();
        self.progress
            .removing(depth, listed.kind(), &path, self.options.dry_run);

        if !self.options.dry_run {
            deleter::remove(self.plane, listed).await?;
            tracing::info!(kind = %listed.kind(), path = %path, "Removed {}", listed.kind().label());
        }
        self.report.removed.push(Removal::from(listed));
        Ok(())
    }

    /// Leave a selected entity in place because something it depends on was kept
    pub(crate) fn retain(&mut self, listed: &Listed, reason: impl Into<String>) {
        let reason = reason.into();
        let path = listed.path();
        tracing::warn!(
            kind = %listed.kind(),
            path = %path,
            "Keeping {} selected for removal: {}",
            listed.kind().label(),
            reason
        );
        self.report.retained.push(Retained {
            kind: listed.kind(),
            path,
            reason,
        });
    }

    pub(crate) fn skip(&mut self, pass: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.progress.skipped(pass, &reason);
        self.report.skipped.push(SkippedPass {
            pass: pass.to_string(),
            reason,
        });
    }

    /// Decide on `listed`, removing it when selected
    pub(crate) async fn visit(&mut self, depth: usize, listed: &Listed) -> Result<Visit> {
        if self.select(depth, listed).delete {
            self.remove(depth, listed).await?;
            return Ok(Visit::Deleted);
        }
        Ok(if listed.kind().cascades() {
            Visit::KeptRecurse
        } else {
            Visit::KeptLeaf
        })
    }

    async fn sweep_provider_vdcs(&mut self) -> Result<()> {
        if !self.plane.is_sys_admin() {
            self.skip("provider VDCs", NOT_SYS_ADMIN);
            return Ok(());
        }
        for provider_vdc in lister::provider_vdcs(self.plane).await? {
            self.visit(0, &provider_vdc).await?;
        }
        Ok(())
    }

    async fn sweep_orgs(&mut self) -> Result<()> {
        for org in lister::orgs(self.plane).await? {
            if self.visit(0, &org).await? != Visit::KeptRecurse {
                continue;
            }
            self.sweep_catalogs(1, &org).await?;
            self.sweep_vdcs(1, &org).await?;
        }
        Ok(())
    }

    async fn sweep_catalogs(&mut self, depth: usize, org: &Listed) -> Result<()> {
        for catalog in lister::catalogs(self.plane, org).await? {
            if self.visit(depth, &catalog).await? != Visit::KeptRecurse {
                continue;
            }
            for template in lister::vapp_templates(self.plane, &catalog).await? {
                self.visit(depth + 1, &template).await?;
            }
            for media in lister::media(self.plane, &catalog).await? {
                self.visit(depth + 1, &media).await?;
            }
        }
        Ok(())
    }

    async fn sweep_vdcs(&mut self, depth: usize, org: &Listed) -> Result<()> {
        for vdc in lister::vdcs(self.plane, org).await? {
            if self.visit(depth, &vdc).await? != Visit::KeptRecurse {
                continue;
            }
            for vapp in lister::vapps(self.plane, &vdc).await? {
                self.visit(depth + 1, &vapp).await?;
            }
            for vm in lister::standalone_vms(self.plane, &vdc).await? {
                self.visit(depth + 1, &vm).await?;
            }
            for network in lister::org_networks(self.plane, &vdc).await? {
                self.visit(depth + 1, &network).await?;
            }
            for gateway in lister::edge_gateways(self.plane, &vdc).await? {
                self.visit(depth + 1, &gateway).await?;
            }
        }
        Ok(())
    }

    /// RDE types refuse removal while they have instances, so a selected
    /// type is emptied first. Instances of kept types are decided one by one.
    async fn sweep_rde_types(&mut self) -> Result<()> {
        for rde_type in lister::rde_types(self.plane).await? {
            let remove_type = self.select(0, &rde_type).delete;
            let instances = lister::rdes(self.plane, &rde_type).await?;

            if !remove_type {
                for rde in &instances {
                    self.visit(1, rde).await?;
                }
                continue;
            }

            let mut kept = 0;
            for rde in &instances {
                if self.select_dependent(1, rde).delete {
                    self.remove(1, rde).await?;
                } else {
                    kept += 1;
                }
            }
            if kept > 0 {
                self.retain(&rde_type, format!("{} protected RDE instances", kept));
            } else {
                self.remove(0, &rde_type).await?;
            }
        }
        Ok(())
    }

    async fn sweep_rde_interfaces(&mut self) -> Result<()> {
        for interface in lister::rde_interfaces(self.plane).await? {
            self.visit(0, &interface).await?;
        }
        Ok(())
    }

    async fn sweep_external_networks(&mut self) -> Result<()> {
        if !self.plane.is_sys_admin() {
            self.skip("external networks", NOT_SYS_ADMIN);
            return Ok(());
        }
        for network in lister::external_networks(self.plane).await? {
            self.visit(0, &network).await?;
        }
        Ok(())
    }

    async fn sweep_ui_plugins(&mut self) -> Result<()> {
        for plugin in lister::ui_plugins(self.plane).await? {
            self.visit(0, &plugin).await?;
        }
        Ok(())
    }
}

/// Sweep `plane` with `config`, printing progress on standard output
pub async fn remove_leftovers(
    plane: &dyn ManagementPlane,
    config: &SweepConfig,
    options: SweepOptions,
) -> Result<SweepReport> {
    let progress = ConsoleProgress::stdout(options.verbose);
    Walker::new(plane, config, &progress, options).run().await
}
