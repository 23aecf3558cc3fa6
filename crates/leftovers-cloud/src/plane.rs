//! Management plane client trait definition

use crate::error::Result;
use crate::model::{
    AlbAssignment, AlbSettings, AlbVirtualService, AllocationKind, EdgeGatewaySummary,
    IpAllocation, RdeTypeSummary, RemoteObject, VappSummary, VmSummary,
};
use crate::version::ApiVersion;
use async_trait::async_trait;

/// Handle to an asynchronous operation accepted by the management plane
#[async_trait]
pub trait Task: Send + Sync {
    /// Task identifier assigned by the management plane
    fn id(&self) -> &str;

    /// Block until the task finishes, returning its failure if any
    async fn wait_completion(&self) -> Result<()>;
}

pub type TaskHandle = Box<dyn Task>;

/// Capability-typed management plane client
///
/// Every entity kind the cleanup engine handles exposes a list call scoped by its
/// parent's identifier and a delete call taking the entity's own identifier.
/// Deletions the platform runs asynchronously return a [`TaskHandle`].
#[async_trait]
pub trait ManagementPlane: Send + Sync {
    /// Whether the connected credential has provider (system administrator) privileges
    fn is_sys_admin(&self) -> bool;

    /// API version negotiated with the management plane
    fn api_version(&self) -> ApiVersion;

    // Provider VDCs
    async fn list_provider_vdcs(&self) -> Result<Vec<RemoteObject>>;
    async fn disable_provider_vdc(&self, id: &str) -> Result<()>;
    async fn delete_provider_vdc(&self, id: &str) -> Result<TaskHandle>;

    // Organizations and catalogs
    async fn list_orgs(&self) -> Result<Vec<RemoteObject>>;
    async fn delete_org(&self, id: &str) -> Result<()>;
    async fn list_catalogs(&self, org_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_catalog(&self, id: &str) -> Result<()>;
    async fn list_vapp_templates(&self, catalog_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_vapp_template(&self, id: &str) -> Result<TaskHandle>;
    async fn list_media(&self, catalog_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_media(&self, id: &str) -> Result<TaskHandle>;

    // VDCs and their content
    async fn list_vdcs(&self, org_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_vdc(&self, id: &str) -> Result<TaskHandle>;
    async fn list_vapps(&self, vdc_id: &str) -> Result<Vec<RemoteObject>>;
    async fn get_vapp(&self, id: &str) -> Result<VappSummary>;
    async fn undeploy_vapp(&self, id: &str) -> Result<TaskHandle>;
    async fn remove_vapp_networks(&self, id: &str) -> Result<TaskHandle>;
    async fn delete_vapp(&self, id: &str) -> Result<TaskHandle>;
    async fn list_vms(&self, vdc_id: &str) -> Result<Vec<VmSummary>>;
    async fn delete_vm(&self, id: &str) -> Result<()>;
    async fn list_org_networks(&self, vdc_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_org_network(&self, id: &str) -> Result<()>;
    async fn list_edge_gateways(&self, vdc_id: &str) -> Result<Vec<EdgeGatewaySummary>>;
    async fn list_all_edge_gateways(&self) -> Result<Vec<EdgeGatewaySummary>>;
    async fn delete_edge_gateway(&self, id: &str) -> Result<()>;

    // Runtime defined entities
    async fn list_rde_types(&self) -> Result<Vec<RdeTypeSummary>>;
    async fn delete_rde_type(&self, id: &str) -> Result<()>;
    async fn list_rdes(&self, rde_type_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_rde(&self, id: &str) -> Result<()>;
    async fn list_rde_interfaces(&self) -> Result<Vec<RemoteObject>>;
    async fn delete_rde_interface(&self, id: &str) -> Result<()>;

    // External networks / provider gateways
    async fn list_external_networks(&self) -> Result<Vec<RemoteObject>>;
    async fn delete_external_network(&self, id: &str) -> Result<()>;

    // IP spaces
    async fn list_ip_spaces(&self) -> Result<Vec<RemoteObject>>;
    async fn list_ip_allocations(
        &self,
        ip_space_id: &str,
        kind: AllocationKind,
    ) -> Result<Vec<IpAllocation>>;
    async fn delete_ip_allocation(&self, ip_space_id: &str, allocation_id: &str) -> Result<()>;
    async fn delete_ip_space(&self, id: &str) -> Result<()>;

    // UI plugins
    async fn list_ui_plugins(&self) -> Result<Vec<RemoteObject>>;
    async fn delete_ui_plugin(&self, id: &str) -> Result<()>;

    // NSX-T ALB, provider side
    async fn list_alb_controllers(&self) -> Result<Vec<RemoteObject>>;
    async fn delete_alb_controller(&self, id: &str) -> Result<()>;
    async fn list_alb_clouds(&self, controller_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_alb_cloud(&self, id: &str) -> Result<()>;
    async fn list_alb_service_engine_groups(&self, cloud_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_alb_service_engine_group(&self, id: &str) -> Result<()>;

    // NSX-T ALB, tenant side
    async fn list_alb_virtual_services(
        &self,
        edge_gateway_id: &str,
    ) -> Result<Vec<AlbVirtualService>>;
    async fn delete_alb_virtual_service(&self, id: &str) -> Result<()>;
    async fn list_alb_pools(&self, edge_gateway_id: &str) -> Result<Vec<RemoteObject>>;
    async fn delete_alb_pool(&self, id: &str) -> Result<()>;
    async fn list_alb_assignments(&self, edge_gateway_id: &str) -> Result<Vec<AlbAssignment>>;
    async fn delete_alb_assignment(&self, id: &str) -> Result<()>;
    async fn get_alb_settings(&self, edge_gateway_id: &str) -> Result<AlbSettings>;
    async fn disable_alb(&self, edge_gateway_id: &str) -> Result<()>;
}
