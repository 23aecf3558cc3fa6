//! Summaries returned by management plane list and lookup calls

use serde::{Deserialize, Serialize};

/// Identifier and name of a remote object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
}

impl RemoteObject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Current state of a vApp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VappSummary {
    pub id: String,
    pub name: String,

    /// Whether the vApp is deployed (powered on, suspended or partially running)
    pub deployed: bool,

    /// Number of vApp networks still attached
    pub networks: u32,
}

/// A VM as seen from its VDC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSummary {
    pub id: String,
    pub name: String,

    /// Name of the vApp holding the VM
    pub vapp_name: String,

    /// Standalone VMs live in a hidden vApp flagged with "auto nature"
    pub auto_nature: bool,
}

/// An NSX-T edge gateway and its owners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeGatewaySummary {
    pub id: String,
    pub name: String,
    pub org: String,
    pub vdc: String,
}

impl EdgeGatewaySummary {
    /// `org/vdc` path used in progress lines and error context
    pub fn owner_path(&self) -> String {
        format!("{}/{}", self.org, self.vdc)
    }
}

/// Runtime defined entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdeTypeSummary {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub nss: String,
    pub version: String,
}

/// Sub-collection of IP space allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    FloatingIp,
    IpPrefix,
}

impl std::fmt::Display for AllocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationKind::FloatingIp => write!(f, "floating-ip"),
            AllocationKind::IpPrefix => write!(f, "ip-prefix"),
        }
    }
}

/// A single IP space allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAllocation {
    pub id: String,

    /// Allocated address or prefix
    pub value: String,
}

/// Assignment of a service engine group to an edge gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbAssignment {
    pub id: String,
    pub service_engine_group_id: String,
    pub service_engine_group_name: String,
}

/// A virtual service and the service engine group it runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbVirtualService {
    pub id: String,
    pub name: String,
    pub service_engine_group_id: String,
}

/// Load balancer settings of an edge gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbSettings {
    pub enabled: bool,
}
