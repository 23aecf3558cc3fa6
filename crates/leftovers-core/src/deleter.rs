//! Per-kind removal of a single entity
//!
//! Deletions the platform runs as tasks are waited on before returning, so
//! the next call of the sweep always sees their effect.

use leftovers_cloud::{AllocationKind, EntityKind, ManagementPlane, TaskHandle};

use crate::error::{Result, SweepError};
use crate::lister::Listed;

/// Identifiers needed to remove one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletable {
    ProviderVdc { id: String },
    Org { id: String },
    Catalog { id: String },
    VappTemplate { id: String },
    Media { id: String },
    Vdc { id: String },
    Vapp { id: String },
    Vm { id: String },
    OrgNetwork { id: String },
    EdgeGateway { id: String },
    RdeType { id: String },
    Rde { id: String },
    RdeInterface { id: String },
    ExternalNetwork { id: String },
    IpSpace { id: String },
    IpAllocation {
        ip_space_id: String,
        id: String,
        kind: AllocationKind,
    },
    UiPlugin { id: String },
    AlbController { id: String },
    AlbCloud { id: String },
    AlbServiceEngineGroup { id: String },
    /// Removing the settings disables the load balancer of the gateway
    AlbSettings { edge_gateway_id: String },
    AlbAssignment {
        id: String,
        service_engine_group_id: String,
    },
    AlbPool { id: String },
    AlbVirtualService {
        id: String,
        service_engine_group_id: String,
    },
}

impl Deletable {
    pub fn id(&self) -> &str {
        match self {
            Deletable::ProviderVdc { id }
            | Deletable::Org { id }
            | Deletable::Catalog { id }
            | Deletable::VappTemplate { id }
            | Deletable::Media { id }
            | Deletable::Vdc { id }
            | Deletable::Vapp { id }
            | Deletable::Vm { id }
            | Deletable::OrgNetwork { id }
            | Deletable::EdgeGateway { id }
            | Deletable::RdeType { id }
            | Deletable::Rde { id }
            | Deletable::RdeInterface { id }
            | Deletable::ExternalNetwork { id }
            | Deletable::IpSpace { id }
            | Deletable::IpAllocation { id, .. }
            | Deletable::UiPlugin { id }
            | Deletable::AlbController { id }
            | Deletable::AlbCloud { id }
            | Deletable::AlbServiceEngineGroup { id }
            | Deletable::AlbAssignment { id, .. }
            | Deletable::AlbPool { id }
            | Deletable::AlbVirtualService { id, .. } => id,
            Deletable::AlbSettings { edge_gateway_id } => edge_gateway_id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Deletable::ProviderVdc { .. } => EntityKind::ProviderVdc,
            Deletable::Org { .. } => EntityKind::Org,
            Deletable::Catalog { .. } => EntityKind::Catalog,
            Deletable::VappTemplate { .. } => EntityKind::VappTemplate,
            Deletable::Media { .. } => EntityKind::Media,
            Deletable::Vdc { .. } => EntityKind::Vdc,
            Deletable::Vapp { .. } => EntityKind::Vapp,
            Deletable::Vm { .. } => EntityKind::Vm,
            Deletable::OrgNetwork { .. } => EntityKind::OrgNetwork,
            Deletable::EdgeGateway { .. } => EntityKind::EdgeGateway,
            Deletable::RdeType { .. } => EntityKind::RdeType,
            Deletable::Rde { .. } => EntityKind::Rde,
            Deletable::RdeInterface { .. } => EntityKind::RdeInterface,
            Deletable::ExternalNetwork { .. } => EntityKind::ExternalNetwork,
            Deletable::IpSpace { .. } => EntityKind::IpSpace,
            Deletable::IpAllocation {
                kind: AllocationKind::FloatingIp,
                ..
            } => EntityKind::FloatingIpAllocation,
            Deletable::IpAllocation {
                kind: AllocationKind::IpPrefix,
                ..
            } => EntityKind::IpPrefixAllocation,
            Deletable::UiPlugin { .. } => EntityKind::UiPlugin,
            Deletable::AlbController { .. } => EntityKind::AlbController,
            Deletable::AlbCloud { .. } => EntityKind::AlbCloud,
            Deletable::AlbServiceEngineGroup { .. } => EntityKind::AlbServiceEngineGroup,
            Deletable::AlbSettings { .. } => EntityKind::AlbSettings,
            Deletable::AlbAssignment { .. } => EntityKind::AlbServiceEngineGroupAssignment,
            Deletable::AlbPool { .. } => EntityKind::AlbPool,
            Deletable::AlbVirtualService { .. } => EntityKind::AlbVirtualService,
        }
    }
}

/// Remove `listed` from the management plane, waiting for any task it starts
pub async fn remove(plane: &dyn ManagementPlane, listed: &Listed) -> Result<()> {
    let delete_err = |e| SweepError::delete(listed, e);

    match &listed.target {
        Deletable::ProviderVdc { id } => {
            plane.disable_provider_vdc(id).await.map_err(delete_err)?;
            let task = plane.delete_provider_vdc(id).await.map_err(delete_err)?;
            wait(listed, task).await
        }
        Deletable::Org { id } => plane.delete_org(id).await.map_err(delete_err),
        Deletable::Catalog { id } => plane.delete_catalog(id).await.map_err(delete_err),
        Deletable::VappTemplate { id } => {
            let task = plane.delete_vapp_template(id).await.map_err(delete_err)?;
            wait(listed, task).await
        }
        Deletable::Media { id } => {
            let task = plane.delete_media(id).await.map_err(delete_err)?;
            wait(listed, task).await
        }
        Deletable::Vdc { id } => {
            let task = plane.delete_vdc(id).await.map_err(delete_err)?;
            wait(listed, task).await
        }
        Deletable::Vapp { id } => remove_vapp(plane, listed, id).await,
        Deletable::Vm { id } => plane.delete_vm(id).await.map_err(delete_err),
        Deletable::OrgNetwork { id } => plane.delete_org_network(id).await.map_err(delete_err),
        Deletable::EdgeGateway { id } => plane.delete_edge_gateway(id).await.map_err(delete_err),
        Deletable::RdeType { id } => plane.delete_rde_type(id).await.map_err(delete_err),
        Deletable::Rde { id } => plane.delete_rde(id).await.map_err(delete_err),
        Deletable::RdeInterface { id } => plane.delete_rde_interface(id).await.map_err(delete_err),
        Deletable::ExternalNetwork { id } => {
            plane.delete_external_network(id).await.map_err(delete_err)
        }
        Deletable::IpSpace { id } => plane.delete_ip_space(id).await.map_err(delete_err),
        Deletable::IpAllocation {
            ip_space_id, id, ..
        } => plane
            .delete_ip_allocation(ip_space_id, id)
            .await
            .map_err(delete_err),
        Deletable::UiPlugin { id } => plane.delete_ui_plugin(id).await.map_err(delete_err),
        Deletable::AlbController { id } => {
            plane.delete_alb_controller(id).await.map_err(delete_err)
        }
        Deletable::AlbCloud { id } => plane.delete_alb_cloud(id).await.map_err(delete_err),
        Deletable::AlbServiceEngineGroup { id } => plane
            .delete_alb_service_engine_group(id)
            .await
            .map_err(delete_err),
        Deletable::AlbSettings { edge_gateway_id } => {
            plane.disable_alb(edge_gateway_id).await.map_err(delete_err)
        }
        Deletable::AlbAssignment { id, .. } => {
            plane.delete_alb_assignment(id).await.map_err(delete_err)
        }
        Deletable::AlbPool { id } => plane.delete_alb_pool(id).await.map_err(delete_err),
        Deletable::AlbVirtualService { id, .. } => {
            plane.delete_alb_virtual_service(id).await.map_err(delete_err)
        }
    }
}

/// Refresh the vApp, then undeploy it and detach its networks when needed
async fn remove_vapp(plane: &dyn ManagementPlane, listed: &Listed, id: &str) -> Result<()> {
    let vapp = plane
        .get_vapp(id)
        .await
        .map_err(|e| SweepError::lookup(listed, e))?;

    if vapp.deployed {
        tracing::debug!(vapp = %vapp.name, "Undeploying vApp");
        let task = plane
            .undeploy_vapp(id)
            .await
            .map_err(|e| SweepError::delete(listed, e))?;
        wait(listed, task).await?;
    }

    if vapp.networks > 0 {
        tracing::debug!(vapp = %vapp.name, networks = vapp.networks, "Removing vApp networks");
        let task = plane
            .remove_vapp_networks(id)
            .await
            .map_err(|e| SweepError::delete(listed, e))?;
        wait(listed, task).await?;
    }

    let task = plane
        .delete_vapp(id)
        .await
        .map_err(|e| SweepError::delete(listed, e))?;
    wait(listed, task).await
}

async fn wait(listed: &Listed, task: TaskHandle) -> Result<()> {
    tracing::debug!(task = task.id(), "Waiting for {} {}", listed.kind().label(), listed.name());
    task.wait_completion()
        .await
        .map_err(|e| SweepError::task(listed, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leftovers_cloud::inventory::{ATTR_DEPLOYED, ATTR_NETWORKS};
    use leftovers_cloud::{CallAction, Inventory, InventoryObject, InventoryPlane};

    fn vapp_plane(deployed: bool, networks: u32) -> InventoryPlane {
        InventoryPlane::new(
            Inventory::new()
                .with(InventoryObject::new("org-1", EntityKind::Org, "org"))
                .with(InventoryObject::new("vdc-1", EntityKind::Vdc, "vdc").with_parent("org-1"))
                .with(
                    InventoryObject::new("vapp-1", EntityKind::Vapp, "TestVapp")
                        .with_parent("vdc-1")
                        .with_attribute(ATTR_DEPLOYED, serde_json::json!(deployed))
                        .with_attribute(ATTR_NETWORKS, serde_json::json!(networks)),
                ),
        )
    }

    fn vapp() -> Listed {
        Listed::new(
            EntityKind::Vapp,
            "TestVapp",
            "org/vdc",
            Deletable::Vapp {
                id: "vapp-1".to_string(),
            },
        )
    }

    fn actions(plane: &InventoryPlane) -> Vec<CallAction> {
        plane.trace().iter().map(|c| c.action).collect()
    }

    #[tokio::test]
    async fn test_running_vapp_is_undeployed_and_detached_first() {
        let plane = vapp_plane(true, 2);
        remove(&plane, &vapp()).await.unwrap();

        assert_eq!(
            actions(&plane),
            vec![
                CallAction::Get,
                CallAction::Undeploy,
                CallAction::DetachNetworks,
                CallAction::Delete
            ]
        );
        assert!(!plane.contains("vapp-1"));
    }

    #[tokio::test]
    async fn test_stopped_vapp_is_deleted_directly() {
        let plane = vapp_plane(false, 0);
        remove(&plane, &vapp()).await.unwrap();
        assert_eq!(actions(&plane), vec![CallAction::Get, CallAction::Delete]);
    }

    #[tokio::test]
    async fn test_task_failure_is_reported_as_task_error() {
        let plane = vapp_plane(false, 0);
        plane.fail_task(CallAction::Delete, "vapp-1");

        let err = remove(&plane, &vapp()).await.unwrap_err();
        assert!(matches!(
            &err,
            SweepError::Task { kind: EntityKind::Vapp, name, parent, .. }
                if name == "TestVapp" && parent == "org/vdc"
        ));
        assert!(plane.contains("vapp-1"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_reported_as_lookup_error() {
        let plane = vapp_plane(true, 0);
        plane.fail_call(CallAction::Get, "vapp-1");

        let err = remove(&plane, &vapp()).await.unwrap_err();
        assert!(matches!(err, SweepError::Lookup { .. }));
    }

    #[test]
    fn test_allocation_kind_maps_to_entity_kind() {
        let floating = Deletable::IpAllocation {
            ip_space_id: "ips-1".to_string(),
            id: "a-1".to_string(),
            kind: AllocationKind::FloatingIp,
        };
        assert_eq!(floating.kind(), EntityKind::FloatingIpAllocation);
        assert_eq!(floating.id(), "a-1");

        let settings = Deletable::AlbSettings {
            edge_gateway_id: "egw-1".to_string(),
        };
        assert_eq!(settings.kind(), EntityKind::AlbSettings);
        assert_eq!(settings.id(), "egw-1");
    }
}
