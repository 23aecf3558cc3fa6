//! One enumeration function per entity kind
//!
//! Each function turns the management plane's list result into [`Listed`]
//! items: the `(kind, name)` pair the selection engine sees, the path of the
//! parent for messages, and the [`Deletable`] needed to remove the entity.

use leftovers_cloud::{AllocationKind, EntityKind, ManagementPlane, RemoteObject};
use leftovers_config::EntityRef;

use crate::deleter::Deletable;
use crate::error::{Result, SweepError};

/// An entity found on the management plane
#[derive(Debug, Clone)]
pub struct Listed {
    pub entity: EntityRef,

    /// Path of the containing entities (`org/vdc`), empty for top-level entities
    pub parent: String,

    pub target: Deletable,
}

impl Listed {
    pub fn new(
        kind: EntityKind,
        name: impl Into<String>,
        parent: impl Into<String>,
        target: Deletable,
    ) -> Self {
        Self {
            entity: EntityRef::new(kind, name),
            parent: parent.into(),
            target,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }

    pub fn id(&self) -> &str {
        self.target.id()
    }

    /// Path of this entity, used as the parent path of its children
    pub fn path(&self) -> String {
        join_path(&self.parent, self.name())
    }
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn listed(
    kind: EntityKind,
    parent: &str,
    objects: Vec<RemoteObject>,
    target: impl Fn(String) -> Deletable,
) -> Vec<Listed> {
    tracing::debug!(kind = %kind, parent = parent, count = objects.len(), "Listed entities");
    objects
        .into_iter()
        .map(|o| Listed::new(kind, o.name, parent, target(o.id)))
        .collect()
}

pub async fn provider_vdcs(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::ProviderVdc;
    let objects = plane
        .list_provider_vdcs()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(listed(kind, "", objects, |id| Deletable::ProviderVdc { id }))
}

pub async fn orgs(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::Org;
    let objects = plane
        .list_orgs()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(listed(kind, "", objects, |id| Deletable::Org { id }))
}

pub async fn catalogs(plane: &dyn ManagementPlane, org: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::Catalog;
    let parent = org.path();
    let objects = plane
        .list_catalogs(org.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::Catalog { id }))
}

pub async fn vapp_templates(plane: &dyn ManagementPlane, catalog: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::VappTemplate;
    let parent = catalog.path();
    let objects = plane
        .list_vapp_templates(catalog.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::VappTemplate { id }))
}

pub async fn media(plane: &dyn ManagementPlane, catalog: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::Media;
    let parent = catalog.path();
    let objects = plane
        .list_media(catalog.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::Media { id }))
}

pub async fn vdcs(plane: &dyn ManagementPlane, org: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::Vdc;
    let parent = org.path();
    let objects = plane
        .list_vdcs(org.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::Vdc { id }))
}

pub async fn vapps(plane: &dyn ManagementPlane, vdc: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::Vapp;
    let parent = vdc.path();
    let objects = plane
        .list_vapps(vdc.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::Vapp { id }))
}

/// VMs not belonging to a user-visible vApp
///
/// VMs inside a regular vApp go away with it; only VMs living in a hidden
/// "auto nature" vApp are listed here.
pub async fn standalone_vms(plane: &dyn ManagementPlane, vdc: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::Vm;
    let parent = vdc.path();
    let vms = plane
        .list_vms(vdc.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;

    let mut standalone = Vec::new();
    for vm in vms {
        if !vm.auto_nature {
            tracing::debug!(vm = %vm.name, vapp = %vm.vapp_name, "Skipping VM owned by a vApp");
            continue;
        }
        standalone.push(Listed::new(kind, vm.name, &parent, Deletable::Vm { id: vm.id }));
    }
    Ok(standalone)
}

pub async fn org_networks(plane: &dyn ManagementPlane, vdc: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::OrgNetwork;
    let parent = vdc.path();
    let objects = plane
        .list_org_networks(vdc.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::OrgNetwork { id }))
}

pub async fn edge_gateways(plane: &dyn ManagementPlane, vdc: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::EdgeGateway;
    let parent = vdc.path();
    let gateways = plane
        .list_edge_gateways(vdc.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(gateways
        .into_iter()
        .map(|g| Listed::new(kind, g.name, &parent, Deletable::EdgeGateway { id: g.id }))
        .collect())
}

/// Every edge gateway of the platform, with its `org/vdc` owner path
pub async fn all_edge_gateways(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::EdgeGateway;
    let gateways = plane
        .list_all_edge_gateways()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(gateways
        .into_iter()
        .map(|g| {
            let parent = g.owner_path();
            Listed::new(kind, g.name, parent, Deletable::EdgeGateway { id: g.id })
        })
        .collect())
}

pub async fn rde_types(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::RdeType;
    let types = plane
        .list_rde_types()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(types
        .into_iter()
        .map(|t| {
            tracing::debug!(
                vendor = %t.vendor,
                nss = %t.nss,
                version = %t.version,
                "Listed RDE type {}",
                t.name
            );
            Listed::new(kind, t.name, "", Deletable::RdeType { id: t.id })
        })
        .collect())
}

pub async fn rdes(plane: &dyn ManagementPlane, rde_type: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::Rde;
    let parent = rde_type.path();
    let objects = plane
        .list_rdes(rde_type.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::Rde { id }))
}

pub async fn rde_interfaces(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::RdeInterface;
    let objects = plane
        .list_rde_interfaces()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(listed(kind, "", objects, |id| Deletable::RdeInterface { id }))
}

pub async fn external_networks(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::ExternalNetwork;
    let objects = plane
        .list_external_networks()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(listed(kind, "", objects, |id| Deletable::ExternalNetwork { id }))
}

pub async fn ip_spaces(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::IpSpace;
    let objects = plane
        .list_ip_spaces()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(listed(kind, "", objects, |id| Deletable::IpSpace { id }))
}

/// Allocations of one sub-collection of an IP space, named by their value
pub async fn ip_allocations(
    plane: &dyn ManagementPlane,
    ip_space: &Listed,
    allocation: AllocationKind,
) -> Result<Vec<Listed>> {
    let kind = match allocation {
        AllocationKind::FloatingIp => EntityKind::FloatingIpAllocation,
        AllocationKind::IpPrefix => EntityKind::IpPrefixAllocation,
    };
    let parent = ip_space.path();
    let allocations = plane
        .list_ip_allocations(ip_space.id(), allocation)
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(allocations
        .into_iter()
        .map(|a| {
            let target = Deletable::IpAllocation {
                ip_space_id: ip_space.id().to_string(),
                id: a.id,
                kind: allocation,
            };
            Listed::new(kind, a.value, &parent, target)
        })
        .collect())
}

pub async fn ui_plugins(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::UiPlugin;
    let objects = plane
        .list_ui_plugins()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(listed(kind, "", objects, |id| Deletable::UiPlugin { id }))
}

pub async fn alb_controllers(plane: &dyn ManagementPlane) -> Result<Vec<Listed>> {
    let kind = EntityKind::AlbController;
    let objects = plane
        .list_alb_controllers()
        .await
        .map_err(|e| SweepError::list(kind, "", e))?;
    Ok(listed(kind, "", objects, |id| Deletable::AlbController { id }))
}

pub async fn alb_clouds(plane: &dyn ManagementPlane, controller: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::AlbCloud;
    let parent = controller.path();
    let objects = plane
        .list_alb_clouds(controller.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::AlbCloud { id }))
}

pub async fn alb_service_engine_groups(
    plane: &dyn ManagementPlane,
    cloud: &Listed,
) -> Result<Vec<Listed>> {
    let kind = EntityKind::AlbServiceEngineGroup;
    let parent = cloud.path();
    let objects = plane
        .list_alb_service_engine_groups(cloud.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| {
        Deletable::AlbServiceEngineGroup { id }
    }))
}

pub async fn alb_virtual_services(
    plane: &dyn ManagementPlane,
    gateway: &Listed,
) -> Result<Vec<Listed>> {
    let kind = EntityKind::AlbVirtualService;
    let parent = gateway.path();
    let services = plane
        .list_alb_virtual_services(gateway.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(services
        .into_iter()
        .map(|vs| {
            let target = Deletable::AlbVirtualService {
                id: vs.id,
                service_engine_group_id: vs.service_engine_group_id,
            };
            Listed::new(kind, vs.name, &parent, target)
        })
        .collect())
}

pub async fn alb_pools(plane: &dyn ManagementPlane, gateway: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::AlbPool;
    let parent = gateway.path();
    let objects = plane
        .list_alb_pools(gateway.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(listed(kind, &parent, objects, |id| Deletable::AlbPool { id }))
}

/// Service engine group assignments of an edge gateway, named after their group
pub async fn alb_assignments(plane: &dyn ManagementPlane, gateway: &Listed) -> Result<Vec<Listed>> {
    let kind = EntityKind::AlbServiceEngineGroupAssignment;
    let parent = gateway.path();
    let assignments = plane
        .list_alb_assignments(gateway.id())
        .await
        .map_err(|e| SweepError::list(kind, &parent, e))?;
    Ok(assignments
        .into_iter()
        .map(|a| {
            let target = Deletable::AlbAssignment {
                id: a.id,
                service_engine_group_id: a.service_engine_group_id,
            };
            Listed::new(kind, a.service_engine_group_name, &parent, target)
        })
        .collect())
}

/// Load balancer settings of an edge gateway
///
/// Settings have no name of their own; the returned entity is named `Test`
/// followed by the gateway name so that the name pattern selects it, and
/// `None` is returned when the load balancer is already disabled.
pub async fn alb_settings(plane: &dyn ManagementPlane, gateway: &Listed) -> Result<Option<Listed>> {
    let settings = plane
        .get_alb_settings(gateway.id())
        .await
        .map_err(|e| SweepError::lookup(gateway, e))?;
    if !settings.enabled {
        return Ok(None);
    }
    Ok(Some(Listed::new(
        EntityKind::AlbSettings,
        format!("Test{}", gateway.name()),
        gateway.path(),
        Deletable::AlbSettings {
            edge_gateway_id: gateway.id().to_string(),
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leftovers_cloud::{Inventory, InventoryObject, InventoryPlane};
    use leftovers_cloud::inventory::{ATTR_ALB_ENABLED, ATTR_AUTO_NATURE};

    fn plane() -> InventoryPlane {
        InventoryPlane::new(
            Inventory::new()
                .with(InventoryObject::new("org-1", EntityKind::Org, "test-org"))
                .with(InventoryObject::new("vdc-1", EntityKind::Vdc, "vdc").with_parent("org-1"))
                .with(
                    InventoryObject::new("vapp-1", EntityKind::Vapp, "TestVapp")
                        .with_parent("vdc-1"),
                )
                .with(InventoryObject::new("vm-1", EntityKind::Vm, "TestVm1").with_parent("vapp-1"))
                .with(
                    InventoryObject::new("vapp-2", EntityKind::Vapp, "hidden")
                        .with_parent("vdc-1")
                        .with_attribute(ATTR_AUTO_NATURE, serde_json::json!(true)),
                )
                .with(InventoryObject::new("vm-2", EntityKind::Vm, "TestVm2").with_parent("vapp-2"))
                .with(
                    InventoryObject::new("egw-1", EntityKind::EdgeGateway, "gw")
                        .with_parent("vdc-1")
                        .with_attribute(ATTR_ALB_ENABLED, serde_json::json!(true)),
                ),
        )
    }

    #[tokio::test]
    async fn test_children_carry_parent_path() {
        let plane = plane();
        let orgs = orgs(&plane).await.unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].parent, "");
        assert_eq!(orgs[0].path(), "test-org");

        let vdcs = vdcs(&plane, &orgs[0]).await.unwrap();
        assert_eq!(vdcs[0].path(), "test-org/vdc");

        let vapps = vapps(&plane, &vdcs[0]).await.unwrap();
        assert_eq!(vapps.len(), 1);
        assert_eq!(vapps[0].parent, "test-org/vdc");
        assert_eq!(vapps[0].id(), "vapp-1");
    }

    #[tokio::test]
    async fn test_only_standalone_vms_are_listed() {
        let plane = plane();
        let orgs = orgs(&plane).await.unwrap();
        let vdcs = vdcs(&plane, &orgs[0]).await.unwrap();

        let vms = standalone_vms(&plane, &vdcs[0]).await.unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].name(), "TestVm2");
    }

    #[tokio::test]
    async fn test_alb_settings_use_synthetic_name() {
        let plane = plane();
        let gateways = all_edge_gateways(&plane).await.unwrap();
        assert_eq!(gateways[0].parent, "test-org/vdc");

        let settings = alb_settings(&plane, &gateways[0]).await.unwrap().unwrap();
        assert_eq!(settings.kind(), EntityKind::AlbSettings);
        assert_eq!(settings.name(), "Testgw");
        assert_eq!(settings.parent, "test-org/vdc/gw");
    }

    #[tokio::test]
    async fn test_list_errors_carry_context() {
        let plane = plane();
        plane.fail_call(leftovers_cloud::CallAction::List, "org-1");
        let orgs = orgs(&plane).await.unwrap();

        let err = catalogs(&plane, &orgs[0]).await.unwrap_err();
        assert!(matches!(
            &err,
            SweepError::List { kind: EntityKind::Catalog, parent, .. } if parent == "test-org"
        ));
    }
}
