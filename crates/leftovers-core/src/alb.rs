//! Load balancer (NSX-T ALB) pass
//!
//! ALB configuration is two chains joined by service engine group
//! assignments:
//!
//! ```text
//! provider:  Controller ── Cloud ── Service Engine Group
//!                                          │ assigned to
//! tenant:    Edge Gateway ── Settings ── Assignment ── Pools ── Virtual Services
//! ```
//!
//! Nothing here cascades, so removal runs in reverse dependency order:
//! virtual services, pools, the assignment and the settings of every edge
//! gateway, then the service engine group, its cloud and its controller. A
//! layer is only removed once everything depending on it is gone; when a
//! dependent is kept the selected parent is retained instead.
//!
//! Every selected group walks every edge gateway, so tenant objects are
//! decided once per pass and the outcome is reused for the next group.

use leftovers_cloud::EntityKind;
use std::collections::HashMap;

use crate::deleter::Deletable;
use crate::error::Result;
use crate::lister::{self, Listed};
use crate::walker::{NOT_SYS_ADMIN, Visit, Walker};

const SERVICE_ENGINE_GROUP_DEPTH: usize = 2;
const TENANT_DEPTH: usize = 3;

/// Tenant objects already decided during the pass
#[derive(Debug, Default)]
struct TenantLedger {
    seen: HashMap<(EntityKind, String), Visit>,
}

impl TenantLedger {
    fn get(&self, listed: &Listed) -> Option<Visit> {
        self.seen
            .get(&(listed.kind(), listed.id().to_string()))
            .copied()
    }

    fn record(&mut self, listed: &Listed, visit: Visit) {
        self.seen.insert((listed.kind(), listed.id().to_string()), visit);
    }

    /// Removed earlier in the pass; in a dry run it is still listed
    fn removed(&self, listed: &Listed) -> bool {
        self.get(listed) == Some(Visit::Deleted)
    }
}

impl Walker<'_> {
    pub(crate) async fn sweep_alb(&mut self) -> Result<()> {
        if !self.plane().is_sys_admin() {
            self.skip("ALB", NOT_SYS_ADMIN);
            return Ok(());
        }

        let mut ledger = TenantLedger::default();
        for controller in lister::alb_controllers(self.plane()).await? {
            let remove_controller = self.select(0, &controller).delete;

            let mut kept_clouds = 0;
            for cloud in lister::alb_clouds(self.plane(), &controller).await? {
                if !self.sweep_alb_cloud(&mut ledger, &cloud).await? {
                    kept_clouds += 1;
                }
            }

            if !remove_controller {
                continue;
            }
            if kept_clouds > 0 {
                self.retain(&controller, format!("{} ALB clouds kept", kept_clouds));
                continue;
            }
            self.remove(0, &controller).await?;
        }
        Ok(())
    }

    /// Returns whether the cloud was removed
    async fn sweep_alb_cloud(
        &mut self,
        ledger: &mut TenantLedger,
        cloud: &Listed,
    ) -> Result<bool> {
        let remove_cloud = self.select(1, cloud).delete;

        let mut kept_groups = 0;
        for group in lister::alb_service_engine_groups(self.plane(), cloud).await? {
            if !self.sweep_alb_service_engine_group(ledger, &group).await? {
                kept_groups += 1;
            }
        }

        if !remove_cloud {
            return Ok(false);
        }
        if kept_groups > 0 {
            self.retain(cloud, format!("{} service engine groups kept", kept_groups));
            return Ok(false);
        }
        self.remove(1, cloud).await?;
        Ok(true)
    }

    /// Returns whether the service engine group was removed
    async fn sweep_alb_service_engine_group(
        &mut self,
        ledger: &mut TenantLedger,
        group: &Listed,
    ) -> Result<bool> {
        if !self.select(SERVICE_ENGINE_GROUP_DEPTH, group).delete {
            return Ok(false);
        }

        // Assignments only exist on the gateways using the group, which can
        // belong to any org
        let mut still_assigned = Vec::new();
        for gateway in lister::all_edge_gateways(self.plane()).await? {
            if !self.sweep_alb_tenant(ledger, group, &gateway).await? {
                still_assigned.push(gateway.path());
            }
        }

        if !still_assigned.is_empty() {
            self.retain(
                group,
                format!("still assigned to {}", still_assigned.join(", ")),
            );
            return Ok(false);
        }
        self.remove(SERVICE_ENGINE_GROUP_DEPTH, group).await?;
        Ok(true)
    }

    /// Clear the load balancer objects of `gateway` that keep `group` in use,
    /// then disable its load balancer once no group is assigned any more
    ///
    /// Returns `false` when the group remains assigned to the gateway.
    async fn sweep_alb_tenant(
        &mut self,
        ledger: &mut TenantLedger,
        group: &Listed,
        gateway: &Listed,
    ) -> Result<bool> {
        let mut blocking = 0;
        for virtual_service in lister::alb_virtual_services(self.plane(), gateway).await? {
            let visit = self.visit_tenant(ledger, &virtual_service).await?;
            if visit != Visit::Deleted && runs_on(&virtual_service, group.id()) {
                blocking += 1;
            }
        }
        for pool in lister::alb_pools(self.plane(), gateway).await? {
            self.visit_tenant(ledger, &pool).await?;
        }

        let (assigned, others): (Vec<Listed>, Vec<Listed>) =
            lister::alb_assignments(self.plane(), gateway)
                .await?
                .into_iter()
                .partition(|a| is_assignment_of(a, group.id()));
        if blocking > 0 {
            if assigned.is_empty() {
                return Ok(true);
            }
            tracing::warn!(
                gateway = %gateway.path(),
                group = %group.name(),
                "{} ALB virtual services kept on the group, leaving the assignment in place",
                blocking
            );
            return Ok(false);
        }

        for assignment in &assigned {
            if !self.select_dependent(TENANT_DEPTH, assignment).delete {
                return Ok(false);
            }
            self.remove(TENANT_DEPTH, assignment).await?;
            ledger.record(assignment, Visit::Deleted);
        }

        // The platform refuses to disable a load balancer with a group assigned
        if others.iter().any(|a| !ledger.removed(a)) {
            return Ok(true);
        }
        if let Some(settings) = lister::alb_settings(self.plane(), gateway).await? {
            self.visit_tenant(ledger, &settings).await?;
        }
        Ok(true)
    }

    async fn visit_tenant(&mut self, ledger: &mut TenantLedger, listed: &Listed) -> Result<Visit> {
        if let Some(visit) = ledger.get(listed) {
            return Ok(visit);
        }
        let visit = self.visit(TENANT_DEPTH, listed).await?;
        ledger.record(listed, visit);
        Ok(visit)
    }
}

fn is_assignment_of(assignment: &Listed, group_id: &str) -> bool {
    matches!(
        &assignment.target,
        Deletable::AlbAssignment { service_engine_group_id, .. } if service_engine_group_id == group_id
    )
}

fn runs_on(virtual_service: &Listed, group_id: &str) -> bool {
    matches!(
        &virtual_service.target,
        Deletable::AlbVirtualService { service_engine_group_id, .. } if service_engine_group_id == group_id
    )
}
