//! Entity kinds known to the management plane

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CloudError;

/// Closed set of entity kinds the cleanup engine can list and remove.
///
/// The serialized form is the provider resource name (`vcd_org`, `vcd_vapp`, ...),
/// which is also the tag used in protect/force lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "vcd_provider_vdc")]
    ProviderVdc,
    #[serde(rename = "vcd_org")]
    Org,
    #[serde(rename = "vcd_catalog")]
    Catalog,
    #[serde(rename = "vcd_catalog_vapp_template")]
    VappTemplate,
    #[serde(rename = "vcd_catalog_media")]
    Media,
    #[serde(rename = "vcd_org_vdc")]
    Vdc,
    #[serde(rename = "vcd_vapp")]
    Vapp,
    #[serde(rename = "vcd_vm")]
    Vm,
    #[serde(rename = "vcd_network")]
    OrgNetwork,
    #[serde(rename = "vcd_nsxt_edgegateway")]
    EdgeGateway,
    #[serde(rename = "vcd_rde_type")]
    RdeType,
    #[serde(rename = "vcd_rde")]
    Rde,
    #[serde(rename = "vcd_rde_interface")]
    RdeInterface,
    #[serde(rename = "vcd_external_network_v2")]
    ExternalNetwork,
    #[serde(rename = "vcd_ip_space")]
    IpSpace,
    #[serde(rename = "vcd_ip_space_ip_allocation")]
    FloatingIpAllocation,
    #[serde(rename = "vcd_ip_space_prefix_allocation")]
    IpPrefixAllocation,
    #[serde(rename = "vcd_ui_plugin")]
    UiPlugin,
    #[serde(rename = "vcd_nsxt_alb_controller")]
    AlbController,
    #[serde(rename = "vcd_nsxt_alb_cloud")]
    AlbCloud,
    #[serde(rename = "vcd_nsxt_alb_service_engine_group")]
    AlbServiceEngineGroup,
    #[serde(rename = "vcd_nsxt_alb_settings")]
    AlbSettings,
    #[serde(rename = "vcd_nsxt_alb_edgegateway_service_engine_group")]
    AlbServiceEngineGroupAssignment,
    #[serde(rename = "vcd_nsxt_alb_pool")]
    AlbPool,
    #[serde(rename = "vcd_nsxt_alb_virtual_service")]
    AlbVirtualService,
}

impl EntityKind {
    pub const ALL: [EntityKind; 25] = [
        EntityKind::ProviderVdc,
        EntityKind::Org,
        EntityKind::Catalog,
        EntityKind::VappTemplate,
        EntityKind::Media,
        EntityKind::Vdc,
        EntityKind::Vapp,
        EntityKind::Vm,
        EntityKind::OrgNetwork,
        EntityKind::EdgeGateway,
        EntityKind::RdeType,
        EntityKind::Rde,
        EntityKind::RdeInterface,
        EntityKind::ExternalNetwork,
        EntityKind::IpSpace,
        EntityKind::FloatingIpAllocation,
        EntityKind::IpPrefixAllocation,
        EntityKind::UiPlugin,
        EntityKind::AlbController,
        EntityKind::AlbCloud,
        EntityKind::AlbServiceEngineGroup,
        EntityKind::AlbSettings,
        EntityKind::AlbServiceEngineGroupAssignment,
        EntityKind::AlbPool,
        EntityKind::AlbVirtualService,
    ];

    /// Provider resource name used as the kind tag
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::ProviderVdc => "vcd_provider_vdc",
            EntityKind::Org => "vcd_org",
            EntityKind::Catalog => "vcd_catalog",
            EntityKind::VappTemplate => "vcd_catalog_vapp_template",
            EntityKind::Media => "vcd_catalog_media",
            EntityKind::Vdc => "vcd_org_vdc",
            EntityKind::Vapp => "vcd_vapp",
            EntityKind::Vm => "vcd_vm",
            EntityKind::OrgNetwork => "vcd_network",
            EntityKind::EdgeGateway => "vcd_nsxt_edgegateway",
            EntityKind::RdeType => "vcd_rde_type",
            EntityKind::Rde => "vcd_rde",
            EntityKind::RdeInterface => "vcd_rde_interface",
            EntityKind::ExternalNetwork => "vcd_external_network_v2",
            EntityKind::IpSpace => "vcd_ip_space",
            EntityKind::FloatingIpAllocation => "vcd_ip_space_ip_allocation",
            EntityKind::IpPrefixAllocation => "vcd_ip_space_prefix_allocation",
            EntityKind::UiPlugin => "vcd_ui_plugin",
            EntityKind::AlbController => "vcd_nsxt_alb_controller",
            EntityKind::AlbCloud => "vcd_nsxt_alb_cloud",
            EntityKind::AlbServiceEngineGroup => "vcd_nsxt_alb_service_engine_group",
            EntityKind::AlbSettings => "vcd_nsxt_alb_settings",
            EntityKind::AlbServiceEngineGroupAssignment => {
                "vcd_nsxt_alb_edgegateway_service_engine_group"
            }
            EntityKind::AlbPool => "vcd_nsxt_alb_pool",
            EntityKind::AlbVirtualService => "vcd_nsxt_alb_virtual_service",
        }
    }

    /// Human readable label used in removal announcements
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::ProviderVdc => "provider VDC",
            EntityKind::Org => "org",
            EntityKind::Catalog => "catalog",
            EntityKind::VappTemplate => "vApp template",
            EntityKind::Media => "media",
            EntityKind::Vdc => "VDC",
            EntityKind::Vapp => "vApp",
            EntityKind::Vm => "VM",
            EntityKind::OrgNetwork => "network",
            EntityKind::EdgeGateway => "edge gateway",
            EntityKind::RdeType => "RDE type",
            EntityKind::Rde => "RDE",
            EntityKind::RdeInterface => "RDE interface",
            EntityKind::ExternalNetwork => "external network",
            EntityKind::IpSpace => "IP space",
            EntityKind::FloatingIpAllocation => "floating IP allocation",
            EntityKind::IpPrefixAllocation => "IP prefix allocation",
            EntityKind::UiPlugin => "UI plugin",
            EntityKind::AlbController => "ALB controller",
            EntityKind::AlbCloud => "ALB cloud",
            EntityKind::AlbServiceEngineGroup => "ALB service engine group",
            EntityKind::AlbSettings => "ALB settings",
            EntityKind::AlbServiceEngineGroupAssignment => "ALB service engine group assignment",
            EntityKind::AlbPool => "ALB pool",
            EntityKind::AlbVirtualService => "ALB virtual service",
        }
    }

    /// Whether removing an entity of this kind also removes everything it contains
    pub fn cascades(&self) -> bool {
        matches!(
            self,
            EntityKind::Org
                | EntityKind::Catalog
                | EntityKind::Vdc
                | EntityKind::Vapp
                | EntityKind::EdgeGateway
        )
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for EntityKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| CloudError::InventoryError(format!("unknown entity kind: {}", s)))
    }
}
