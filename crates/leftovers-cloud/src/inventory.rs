//! In-memory management plane backed by an inventory snapshot
//!
//! An [`Inventory`] is a flat list of objects linked to their container through
//! `parent` and to non-containment dependencies through `refs`. Snapshots are
//! stored as JSON or YAML. [`InventoryPlane`] serves an inventory through the
//! [`ManagementPlane`] trait, enforces the platform's referential rules on every
//! mutating call and records each call in a trace.

use crate::error::{CloudError, Result};
use crate::kind::EntityKind;
use crate::model::{
    AlbAssignment, AlbSettings, AlbVirtualService, AllocationKind, EdgeGatewaySummary,
    IpAllocation, RdeTypeSummary, RemoteObject, VappSummary, VmSummary,
};
use crate::plane::{ManagementPlane, Task, TaskHandle};
use crate::version::ApiVersion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::fs;

const INVENTORY_VERSION: u32 = 1;

/// API version assumed when a snapshot does not carry one
pub const DEFAULT_API_VERSION: ApiVersion = ApiVersion::new(38, 0);

pub const ATTR_ENABLED: &str = "enabled";
pub const ATTR_DEPLOYED: &str = "deployed";
pub const ATTR_NETWORKS: &str = "networks";
pub const ATTR_AUTO_NATURE: &str = "auto_nature";
pub const ATTR_ALB_ENABLED: &str = "alb_enabled";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_VENDOR: &str = "vendor";
pub const ATTR_NSS: &str = "nss";
pub const ATTR_VERSION: &str = "version";

/// Snapshot of the objects present on a management plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// Snapshot format version
    pub version: u32,

    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,

    /// API version of the platform the snapshot was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<ApiVersion>,

    /// All objects, containers first
    #[serde(default)]
    pub objects: Vec<InventoryObject>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            version: INVENTORY_VERSION,
            captured_at: Utc::now(),
            api_version: None,
            objects: Vec::new(),
        }
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Add an object, builder style
    pub fn with(mut self, object: InventoryObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn add(&mut self, object: InventoryObject) {
        self.objects.push(object);
    }

    pub fn get(&self, id: &str) -> Option<&InventoryObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut InventoryObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects of `kind` directly contained in `parent` (top-level objects when `None`)
    pub fn children(&self, kind: EntityKind, parent: Option<&str>) -> Vec<&InventoryObject> {
        self.objects
            .iter()
            .filter(|o| o.kind == kind && o.parent.as_deref() == parent)
            .collect()
    }

    /// Objects of any kind whose `refs` point at `id`
    pub fn dependents(&self, id: &str) -> Vec<&InventoryObject> {
        self.objects
            .iter()
            .filter(|o| o.refs.iter().any(|r| r == id))
            .collect()
    }

    /// Objects of `kind` anywhere below `ancestor`
    pub fn descendants(&self, kind: EntityKind, ancestor: &str) -> Vec<&InventoryObject> {
        self.objects
            .iter()
            .filter(|o| o.kind == kind && self.is_below(&o.id, ancestor))
            .collect()
    }

    fn is_below(&self, id: &str, ancestor: &str) -> bool {
        let mut current = self.get(id).and_then(|o| o.parent.clone());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(&parent).and_then(|o| o.parent.clone());
        }
        false
    }

    /// Remove an object together with everything it contains
    pub fn remove_tree(&mut self, id: &str) -> Vec<InventoryObject> {
        let mut doomed: HashSet<String> = HashSet::new();
        doomed.insert(id.to_string());
        // Containers precede their content in the list, but the order is not
        // guaranteed for hand-written snapshots, so iterate to a fixed point.
        loop {
            let before = doomed.len();
            for object in &self.objects {
                if let Some(parent) = &object.parent {
                    if doomed.contains(parent) {
                        doomed.insert(object.id.clone());
                    }
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.objects)
            .into_iter()
            .partition(|o| doomed.contains(&o.id));
        self.objects = kept;
        removed
    }

    /// Check identifiers are unique and every parent exists
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for object in &self.objects {
            if !seen.insert(object.id.as_str()) {
                return Err(CloudError::InventoryError(format!(
                    "duplicate object id {}",
                    object.id
                )));
            }
        }
        for object in &self.objects {
            if let Some(parent) = &object.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(CloudError::InventoryError(format!(
                        "{} {} refers to missing parent {}",
                        object.kind, object.name, parent
                    )));
                }
            }
        }
        Ok(())
    }

    /// Load a snapshot; `.yaml`/`.yml` files are read as YAML, anything else as JSON
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let inventory: Inventory = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        if inventory.version > INVENTORY_VERSION {
            return Err(CloudError::InventoryError(format!(
                "Inventory version {} is newer than supported version {}",
                inventory.version, INVENTORY_VERSION
            )));
        }
        inventory.validate()?;

        tracing::debug!(
            "Loaded inventory with {} objects from {}",
            inventory.objects.len(),
            path.display()
        );
        Ok(inventory)
    }

    /// Save the snapshot in the format implied by the file extension
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        fs::write(path, content).await?;

        tracing::debug!(
            "Saved inventory with {} objects to {}",
            self.objects.len(),
            path.display()
        );
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// A single object in an inventory snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryObject {
    pub id: String,

    pub kind: EntityKind,

    pub name: String,

    /// Identifier of the containing object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Identifiers of objects this one depends on without being contained in them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<String>,

    /// Kind specific attributes (deployment state, enablement, addresses...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl InventoryObject {
    pub fn new(id: impl Into<String>, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            parent: None,
            refs: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_ref(mut self, target: impl Into<String>) -> Self {
        self.refs.push(target.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.get_attribute::<bool>(key).unwrap_or(default)
    }

    fn remote(&self) -> RemoteObject {
        RemoteObject::new(&self.id, &self.name)
    }
}

/// Kind of call recorded in the plane trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    List,
    Get,
    Delete,
    Disable,
    Undeploy,
    DetachNetworks,
}

impl std::fmt::Display for CallAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallAction::List => write!(f, "list"),
            CallAction::Get => write!(f, "get"),
            CallAction::Delete => write!(f, "delete"),
            CallAction::Disable => write!(f, "disable"),
            CallAction::Undeploy => write!(f, "undeploy"),
            CallAction::DetachNetworks => write!(f, "detach-networks"),
        }
    }
}

/// A call observed by [`InventoryPlane`]
///
/// Mutations are recorded when they take effect: synchronous deletes at call
/// time, task based ones when the task is waited on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneCall {
    pub action: CallAction,

    pub kind: EntityKind,

    /// Target entity id, or the parent id for list calls (empty for top-level lists)
    pub target: String,

    /// Name of the target, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl std::fmt::Display for PlaneCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {} {} ({})", self.action, self.kind, name, self.target),
            None => write!(f, "{} {} ({})", self.action, self.kind, self.target),
        }
    }
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    action: CallAction,
    target: String,
    on_task: bool,
}

#[derive(Debug)]
struct PlaneState {
    inventory: Inventory,
    trace: Vec<PlaneCall>,
    failures: Vec<InjectedFailure>,
    next_task: u64,
}

impl PlaneState {
    fn check(&self, action: CallAction, target: &str, on_task: bool) -> Result<()> {
        let injected = self
            .failures
            .iter()
            .any(|f| f.action == action && f.target == target && f.on_task == on_task);
        if !injected {
            return Ok(());
        }
        if on_task {
            Err(CloudError::TaskFailed {
                task: format!("{}-{}", action, target),
                message: "injected failure".to_string(),
            })
        } else {
            Err(CloudError::ApiError(format!(
                "injected failure on {} {}",
                action, target
            )))
        }
    }

    fn record(&mut self, action: CallAction, kind: EntityKind, target: &str, name: Option<&str>) {
        self.trace.push(PlaneCall {
            action,
            kind,
            target: target.to_string(),
            name: name.map(str::to_string),
        });
    }

    fn find(&self, kind: EntityKind, id: &str) -> Result<&InventoryObject> {
        self.inventory
            .get(id)
            .filter(|o| o.kind == kind)
            .ok_or_else(|| CloudError::NotFound(format!("{} {}", kind, id)))
    }

    fn find_mut(&mut self, kind: EntityKind, id: &str) -> Result<&mut InventoryObject> {
        self.inventory
            .get_mut(id)
            .filter(|o| o.kind == kind)
            .ok_or_else(|| CloudError::NotFound(format!("{} {}", kind, id)))
    }

    fn list(&mut self, kind: EntityKind, parent: Option<&str>) -> Result<Vec<InventoryObject>> {
        let target = parent.unwrap_or("");
        self.check(CallAction::List, target, false)?;
        if let Some(parent) = parent {
            if !self.inventory.contains(parent) {
                return Err(CloudError::NotFound(format!(
                    "parent {} of {} list",
                    parent, kind
                )));
            }
        }
        self.record(CallAction::List, kind, target, None);
        Ok(self
            .inventory
            .children(kind, parent)
            .into_iter()
            .cloned()
            .collect())
    }

    fn list_remote(&mut self, kind: EntityKind, parent: Option<&str>) -> Result<Vec<RemoteObject>> {
        Ok(self
            .list(kind, parent)?
            .iter()
            .map(InventoryObject::remote)
            .collect())
    }

    /// Fail with a conflict when `id` still has contained objects of `kind`
    fn ensure_no_children(&self, object: &InventoryObject, kind: EntityKind) -> Result<()> {
        let children = self.inventory.children(kind, Some(&object.id));
        if let Some(child) = children.first() {
            return Err(CloudError::Conflict(format!(
                "{} {} still contains {} {}",
                object.kind,
                object.name,
                kind,
                child.name
            )));
        }
        Ok(())
    }

    /// Fail with a conflict when an object of `kind` still refers to `object`
    fn ensure_no_dependents(&self, object: &InventoryObject, kind: EntityKind) -> Result<()> {
        let dependents = self.inventory.dependents(&object.id);
        if let Some(dependent) = dependents.iter().find(|d| d.kind == kind) {
            return Err(CloudError::Conflict(format!(
                "{} {} is used by {} {}",
                object.kind, object.name, kind, dependent.name
            )));
        }
        Ok(())
    }

    fn delete_now(&mut self, kind: EntityKind, id: &str) -> Result<()> {
        self.check(CallAction::Delete, id, false)?;
        let name = self.find(kind, id)?.name.clone();
        self.inventory.remove_tree(id);
        self.record(CallAction::Delete, kind, id, Some(&name));
        tracing::debug!("Removed {} {} from inventory", kind, name);
        Ok(())
    }

    fn owner_names(&self, edge_gateway: &InventoryObject) -> (String, String) {
        let vdc = edge_gateway
            .parent
            .as_deref()
            .and_then(|id| self.inventory.get(id));
        let org = vdc
            .and_then(|v| v.parent.as_deref())
            .and_then(|id| self.inventory.get(id));
        (
            org.map(|o| o.name.clone()).unwrap_or_default(),
            vdc.map(|v| v.name.clone()).unwrap_or_default(),
        )
    }

    fn edge_gateway_summary(&self, edge_gateway: &InventoryObject) -> EdgeGatewaySummary {
        let (org, vdc) = self.owner_names(edge_gateway);
        EdgeGatewaySummary {
            id: edge_gateway.id.clone(),
            name: edge_gateway.name.clone(),
            org,
            vdc,
        }
    }
}

/// Effect applied when an [`InventoryTask`] completes
#[derive(Debug, Clone, Copy)]
enum TaskEffect {
    Remove,
    Undeploy,
    DetachNetworks,
}

struct InventoryTask {
    id: String,
    kind: EntityKind,
    target: String,
    effect: TaskEffect,
    state: Arc<Mutex<PlaneState>>,
}

#[async_trait]
impl Task for InventoryTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn wait_completion(&self) -> Result<()> {
        let mut state = lock(&self.state);
        let action = match self.effect {
            TaskEffect::Remove => CallAction::Delete,
            TaskEffect::Undeploy => CallAction::Undeploy,
            TaskEffect::DetachNetworks => CallAction::DetachNetworks,
        };
        state.check(action, &self.target, true)?;

        let object = state.find_mut(self.kind, &self.target)?;
        let name = object.name.clone();
        match self.effect {
            TaskEffect::Remove => {
                state.inventory.remove_tree(&self.target);
            }
            TaskEffect::Undeploy => {
                object.set_attribute(ATTR_DEPLOYED, serde_json::json!(false));
            }
            TaskEffect::DetachNetworks => {
                object.set_attribute(ATTR_NETWORKS, serde_json::json!(0));
            }
        }
        state.record(action, self.kind, &self.target, Some(&name));
        tracing::debug!("Task {} completed ({} {} {})", self.id, action, self.kind, name);
        Ok(())
    }
}

fn lock(state: &Arc<Mutex<PlaneState>>) -> MutexGuard<'_, PlaneState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`ManagementPlane`] implementation serving an [`Inventory`] from memory
pub struct InventoryPlane {
    state: Arc<Mutex<PlaneState>>,
    sys_admin: bool,
    api_version: ApiVersion,
}

impl InventoryPlane {
    /// Serve `inventory` with provider privileges
    pub fn new(inventory: Inventory) -> Self {
        let api_version = inventory.api_version.unwrap_or(DEFAULT_API_VERSION);
        Self {
            state: Arc::new(Mutex::new(PlaneState {
                inventory,
                trace: Vec::new(),
                failures: Vec::new(),
                next_task: 1,
            })),
            sys_admin: true,
            api_version,
        }
    }

    pub fn with_sys_admin(mut self, sys_admin: bool) -> Self {
        self.sys_admin = sys_admin;
        self
    }

    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Make the call `action` on `target` fail immediately
    pub fn fail_call(&self, action: CallAction, target: impl Into<String>) {
        lock(&self.state).failures.push(InjectedFailure {
            action,
            target: target.into(),
            on_task: false,
        });
    }

    /// Accept the call `action` on `target` but fail its task on completion
    pub fn fail_task(&self, action: CallAction, target: impl Into<String>) {
        lock(&self.state).failures.push(InjectedFailure {
            action,
            target: target.into(),
            on_task: true,
        });
    }

    /// Calls observed so far
    pub fn trace(&self) -> Vec<PlaneCall> {
        lock(&self.state).trace.clone()
    }

    /// Current content of the plane
    pub fn inventory(&self) -> Inventory {
        lock(&self.state).inventory.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.state).inventory.contains(id)
    }

    fn task(&self, kind: EntityKind, target: &str, effect: TaskEffect) -> TaskHandle {
        let mut state = lock(&self.state);
        let id = format!("task-{}", state.next_task);
        state.next_task += 1;
        Box::new(InventoryTask {
            id,
            kind,
            target: target.to_string(),
            effect,
            state: Arc::clone(&self.state),
        })
    }

    fn delete_now(&self, kind: EntityKind, id: &str) -> Result<()> {
        lock(&self.state).delete_now(kind, id)
    }

    /// Validate a task based deletion and hand back its task
    fn delete_later(&self, kind: EntityKind, id: &str) -> Result<TaskHandle> {
        {
            let state = lock(&self.state);
            state.check(CallAction::Delete, id, false)?;
            state.find(kind, id)?;
        }
        Ok(self.task(kind, id, TaskEffect::Remove))
    }
}

#[async_trait]
impl ManagementPlane for InventoryPlane {
    fn is_sys_admin(&self) -> bool {
        self.sys_admin
    }

    fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    async fn list_provider_vdcs(&self) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::ProviderVdc, None)
    }

    async fn disable_provider_vdc(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.check(CallAction::Disable, id, false)?;
        let object = state.find_mut(EntityKind::ProviderVdc, id)?;
        object.set_attribute(ATTR_ENABLED, serde_json::json!(false));
        let name = object.name.clone();
        state.record(CallAction::Disable, EntityKind::ProviderVdc, id, Some(&name));
        Ok(())
    }

    async fn delete_provider_vdc(&self, id: &str) -> Result<TaskHandle> {
        {
            let state = lock(&self.state);
            state.check(CallAction::Delete, id, false)?;
            let object = state.find(EntityKind::ProviderVdc, id)?;
            if object.flag(ATTR_ENABLED, true) {
                return Err(CloudError::Conflict(format!(
                    "provider VDC {} must be disabled before removal",
                    object.name
                )));
            }
            state.ensure_no_dependents(object, EntityKind::Vdc)?;
        }
        Ok(self.task(EntityKind::ProviderVdc, id, TaskEffect::Remove))
    }

    async fn list_orgs(&self) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::Org, None)
    }

    async fn delete_org(&self, id: &str) -> Result<()> {
        self.delete_now(EntityKind::Org, id)
    }

    async fn list_catalogs(&self, org_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::Catalog, Some(org_id))
    }

    async fn delete_catalog(&self, id: &str) -> Result<()> {
        self.delete_now(EntityKind::Catalog, id)
    }

    async fn list_vapp_templates(&self, catalog_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::VappTemplate, Some(catalog_id))
    }

    async fn delete_vapp_template(&self, id: &str) -> Result<TaskHandle> {
        self.delete_later(EntityKind::VappTemplate, id)
    }

    async fn list_media(&self, catalog_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::Media, Some(catalog_id))
    }

    async fn delete_media(&self, id: &str) -> Result<TaskHandle> {
        self.delete_later(EntityKind::Media, id)
    }

    async fn list_vdcs(&self, org_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::Vdc, Some(org_id))
    }

    async fn delete_vdc(&self, id: &str) -> Result<TaskHandle> {
        self.delete_later(EntityKind::Vdc, id)
    }

    async fn list_vapps(&self, vdc_id: &str) -> Result<Vec<RemoteObject>> {
        // Hidden vApps of standalone VMs are not part of the vApp list
        Ok(lock(&self.state)
            .list(EntityKind::Vapp, Some(vdc_id))?
            .iter()
            .filter(|o| !o.flag(ATTR_AUTO_NATURE, false))
            .map(InventoryObject::remote)
            .collect())
    }

    async fn get_vapp(&self, id: &str) -> Result<VappSummary> {
        let mut state = lock(&self.state);
        state.check(CallAction::Get, id, false)?;
        let object = state.find(EntityKind::Vapp, id)?;
        let summary = VappSummary {
            id: object.id.clone(),
            name: object.name.clone(),
            deployed: object.flag(ATTR_DEPLOYED, false),
            networks: object.get_attribute::<u32>(ATTR_NETWORKS).unwrap_or(0),
        };
        state.record(CallAction::Get, EntityKind::Vapp, id, Some(&summary.name));
        Ok(summary)
    }

    async fn undeploy_vapp(&self, id: &str) -> Result<TaskHandle> {
        {
            let state = lock(&self.state);
            state.check(CallAction::Undeploy, id, false)?;
            state.find(EntityKind::Vapp, id)?;
        }
        Ok(self.task(EntityKind::Vapp, id, TaskEffect::Undeploy))
    }

    async fn remove_vapp_networks(&self, id: &str) -> Result<TaskHandle> {
        {
            let state = lock(&self.state);
            state.check(CallAction::DetachNetworks, id, false)?;
            let object = state.find(EntityKind::Vapp, id)?;
            if object.flag(ATTR_DEPLOYED, false) {
                return Err(CloudError::Conflict(format!(
                    "vApp {} must be undeployed before removing its networks",
                    object.name
                )));
            }
        }
        Ok(self.task(EntityKind::Vapp, id, TaskEffect::DetachNetworks))
    }

    async fn delete_vapp(&self, id: &str) -> Result<TaskHandle> {
        {
            let state = lock(&self.state);
            state.check(CallAction::Delete, id, false)?;
            let object = state.find(EntityKind::Vapp, id)?;
            if object.flag(ATTR_DEPLOYED, false) {
                return Err(CloudError::Conflict(format!(
                    "vApp {} is still deployed",
                    object.name
                )));
            }
        }
        Ok(self.task(EntityKind::Vapp, id, TaskEffect::Remove))
    }

    async fn list_vms(&self, vdc_id: &str) -> Result<Vec<VmSummary>> {
        let mut state = lock(&self.state);
        state.check(CallAction::List, vdc_id, false)?;
        state.find(EntityKind::Vdc, vdc_id)?;
        state.record(CallAction::List, EntityKind::Vm, vdc_id, None);

        let vapps = state.inventory.children(EntityKind::Vapp, Some(vdc_id));
        let mut vms = Vec::new();
        for vapp in vapps {
            for vm in state.inventory.children(EntityKind::Vm, Some(&vapp.id)) {
                vms.push(VmSummary {
                    id: vm.id.clone(),
                    name: vm.name.clone(),
                    vapp_name: vapp.name.clone(),
                    auto_nature: vapp.flag(ATTR_AUTO_NATURE, false),
                });
            }
        }
        Ok(vms)
    }

    async fn delete_vm(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let parent = state.find(EntityKind::Vm, id)?.parent.clone();
        state.delete_now(EntityKind::Vm, id)?;

        // The hidden vApp of a standalone VM goes away with its last VM
        if let Some(parent) = parent {
            let orphaned = state.inventory.get(&parent).is_some_and(|vapp| {
                vapp.flag(ATTR_AUTO_NATURE, false)
                    && state
                        .inventory
                        .children(EntityKind::Vm, Some(&vapp.id))
                        .is_empty()
            });
            if orphaned {
                state.inventory.remove_tree(&parent);
            }
        }
        Ok(())
    }

    async fn list_org_networks(&self, vdc_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::OrgNetwork, Some(vdc_id))
    }

    async fn delete_org_network(&self, id: &str) -> Result<()> {
        self.delete_now(EntityKind::OrgNetwork, id)
    }

    async fn list_edge_gateways(&self, vdc_id: &str) -> Result<Vec<EdgeGatewaySummary>> {
        let mut state = lock(&self.state);
        let gateways = state.list(EntityKind::EdgeGateway, Some(vdc_id))?;
        Ok(gateways
            .iter()
            .map(|g| state.edge_gateway_summary(g))
            .collect())
    }

    async fn list_all_edge_gateways(&self) -> Result<Vec<EdgeGatewaySummary>> {
        let mut state = lock(&self.state);
        state.check(CallAction::List, "", false)?;
        state.record(CallAction::List, EntityKind::EdgeGateway, "", None);
        Ok(state
            .inventory
            .objects
            .iter()
            .filter(|o| o.kind == EntityKind::EdgeGateway)
            .map(|g| state.edge_gateway_summary(g))
            .collect())
    }

    async fn delete_edge_gateway(&self, id: &str) -> Result<()> {
        self.delete_now(EntityKind::EdgeGateway, id)
    }

    async fn list_rde_types(&self) -> Result<Vec<RdeTypeSummary>> {
        Ok(lock(&self.state)
            .list(EntityKind::RdeType, None)?
            .iter()
            .map(|o| RdeTypeSummary {
                id: o.id.clone(),
                name: o.name.clone(),
                vendor: o.get_attribute(ATTR_VENDOR).unwrap_or_default(),
                nss: o.get_attribute(ATTR_NSS).unwrap_or_default(),
                version: o.get_attribute(ATTR_VERSION).unwrap_or_default(),
            })
            .collect())
    }

    async fn delete_rde_type(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::RdeType, id)?;
        state.ensure_no_children(object, EntityKind::Rde)?;
        state.delete_now(EntityKind::RdeType, id)
    }

    async fn list_rdes(&self, rde_type_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::Rde, Some(rde_type_id))
    }

    async fn delete_rde(&self, id: &str) -> Result<()> {
        self.delete_now(EntityKind::Rde, id)
    }

    async fn list_rde_interfaces(&self) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::RdeInterface, None)
    }

    async fn delete_rde_interface(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::RdeInterface, id)?;
        state.ensure_no_dependents(object, EntityKind::RdeType)?;
        state.delete_now(EntityKind::RdeInterface, id)
    }

    async fn list_external_networks(&self) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::ExternalNetwork, None)
    }

    async fn delete_external_network(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::ExternalNetwork, id)?;
        state.ensure_no_dependents(object, EntityKind::EdgeGateway)?;
        state.delete_now(EntityKind::ExternalNetwork, id)
    }

    async fn list_ip_spaces(&self) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::IpSpace, None)
    }

    async fn list_ip_allocations(
        &self,
        ip_space_id: &str,
        kind: AllocationKind,
    ) -> Result<Vec<IpAllocation>> {
        let entity_kind = match kind {
            AllocationKind::FloatingIp => EntityKind::FloatingIpAllocation,
            AllocationKind::IpPrefix => EntityKind::IpPrefixAllocation,
        };
        Ok(lock(&self.state)
            .list(entity_kind, Some(ip_space_id))?
            .iter()
            .map(|o| IpAllocation {
                id: o.id.clone(),
                value: o.get_attribute(ATTR_VALUE).unwrap_or_else(|| o.name.clone()),
            })
            .collect())
    }

    async fn delete_ip_allocation(&self, ip_space_id: &str, allocation_id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let kind = state
            .inventory
            .get(allocation_id)
            .filter(|o| o.parent.as_deref() == Some(ip_space_id))
            .map(|o| o.kind)
            .ok_or_else(|| {
                CloudError::NotFound(format!(
                    "allocation {} in IP space {}",
                    allocation_id, ip_space_id
                ))
            })?;
        state.delete_now(kind, allocation_id)
    }

    async fn delete_ip_space(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::IpSpace, id)?;
        state.ensure_no_children(object, EntityKind::FloatingIpAllocation)?;
        state.ensure_no_children(object, EntityKind::IpPrefixAllocation)?;
        state.delete_now(EntityKind::IpSpace, id)
    }

    async fn list_ui_plugins(&self) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::UiPlugin, None)
    }

    async fn delete_ui_plugin(&self, id: &str) -> Result<()> {
        self.delete_now(EntityKind::UiPlugin, id)
    }

    async fn list_alb_controllers(&self) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::AlbController, None)
    }

    async fn delete_alb_controller(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::AlbController, id)?;
        state.ensure_no_children(object, EntityKind::AlbCloud)?;
        state.delete_now(EntityKind::AlbController, id)
    }

    async fn list_alb_clouds(&self, controller_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::AlbCloud, Some(controller_id))
    }

    async fn delete_alb_cloud(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::AlbCloud, id)?;
        state.ensure_no_children(object, EntityKind::AlbServiceEngineGroup)?;
        state.delete_now(EntityKind::AlbCloud, id)
    }

    async fn list_alb_service_engine_groups(&self, cloud_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::AlbServiceEngineGroup, Some(cloud_id))
    }

    async fn delete_alb_service_engine_group(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::AlbServiceEngineGroup, id)?;
        state.ensure_no_dependents(object, EntityKind::AlbServiceEngineGroupAssignment)?;
        state.delete_now(EntityKind::AlbServiceEngineGroup, id)
    }

    async fn list_alb_virtual_services(
        &self,
        edge_gateway_id: &str,
    ) -> Result<Vec<AlbVirtualService>> {
        let mut state = lock(&self.state);
        let services = state.list(EntityKind::AlbVirtualService, Some(edge_gateway_id))?;
        // refs hold the pool and the group; pick the one that is a group
        Ok(services
            .iter()
            .map(|vs| {
                let group_id = vs
                    .refs
                    .iter()
                    .find(|r| {
                        state
                            .inventory
                            .get(r)
                            .is_some_and(|o| o.kind == EntityKind::AlbServiceEngineGroup)
                    })
                    .cloned()
                    .unwrap_or_default();
                AlbVirtualService {
                    id: vs.id.clone(),
                    name: vs.name.clone(),
                    service_engine_group_id: group_id,
                }
            })
            .collect())
    }

    async fn delete_alb_virtual_service(&self, id: &str) -> Result<()> {
        self.delete_now(EntityKind::AlbVirtualService, id)
    }

    async fn list_alb_pools(&self, edge_gateway_id: &str) -> Result<Vec<RemoteObject>> {
        lock(&self.state).list_remote(EntityKind::AlbPool, Some(edge_gateway_id))
    }

    async fn delete_alb_pool(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::AlbPool, id)?;
        state.ensure_no_dependents(object, EntityKind::AlbVirtualService)?;
        state.delete_now(EntityKind::AlbPool, id)
    }

    async fn list_alb_assignments(&self, edge_gateway_id: &str) -> Result<Vec<AlbAssignment>> {
        let mut state = lock(&self.state);
        let assignments = state.list(
            EntityKind::AlbServiceEngineGroupAssignment,
            Some(edge_gateway_id),
        )?;
        Ok(assignments
            .iter()
            .map(|a| {
                let group_id = a.refs.first().cloned().unwrap_or_default();
                let group_name = state
                    .inventory
                    .get(&group_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| a.name.clone());
                AlbAssignment {
                    id: a.id.clone(),
                    service_engine_group_id: group_id,
                    service_engine_group_name: group_name,
                }
            })
            .collect())
    }

    async fn delete_alb_assignment(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let object = state.find(EntityKind::AlbServiceEngineGroupAssignment, id)?;
        if let Some(group_id) = object.refs.first() {
            let in_use = state
                .inventory
                .children(EntityKind::AlbVirtualService, object.parent.as_deref())
                .into_iter()
                .find(|vs| vs.refs.iter().any(|r| r == group_id));
            if let Some(vs) = in_use {
                return Err(CloudError::Conflict(format!(
                    "service engine group assignment {} is used by virtual service {}",
                    object.name, vs.name
                )));
            }
        }
        state.delete_now(EntityKind::AlbServiceEngineGroupAssignment, id)
    }

    async fn get_alb_settings(&self, edge_gateway_id: &str) -> Result<AlbSettings> {
        let mut state = lock(&self.state);
        state.check(CallAction::Get, edge_gateway_id, false)?;
        let gateway = state.find(EntityKind::EdgeGateway, edge_gateway_id)?;
        let settings = AlbSettings {
            enabled: gateway.flag(ATTR_ALB_ENABLED, false),
        };
        let name = gateway.name.clone();
        state.record(CallAction::Get, EntityKind::AlbSettings, edge_gateway_id, Some(&name));
        Ok(settings)
    }

    async fn disable_alb(&self, edge_gateway_id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.check(CallAction::Disable, edge_gateway_id, false)?;
        let gateway = state.find(EntityKind::EdgeGateway, edge_gateway_id)?;
        state.ensure_no_children(gateway, EntityKind::AlbServiceEngineGroupAssignment)?;
        let name = gateway.name.clone();

        let gateway = state.find_mut(EntityKind::EdgeGateway, edge_gateway_id)?;
        gateway.set_attribute(ATTR_ALB_ENABLED, serde_json::json!(false));
        state.record(
            CallAction::Disable,
            EntityKind::AlbSettings,
            edge_gateway_id,
            Some(&name),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ip_space_inventory() -> Inventory {
        Inventory::new()
            .with(InventoryObject::new("ips-1", EntityKind::IpSpace, "test-space"))
            .with(
                InventoryObject::new("fip-1", EntityKind::FloatingIpAllocation, "fip")
                    .with_parent("ips-1")
                    .with_attribute(ATTR_VALUE, serde_json::json!("10.0.0.5")),
            )
    }

    #[tokio::test]
    async fn test_inventory_save_load_json_and_yaml() {
        let temp_dir = tempdir().unwrap();
        let inventory = ip_space_inventory().with_api_version(ApiVersion::new(37, 2));

        for file in ["inventory.json", "inventory.yaml"] {
            let path = temp_dir.path().join(file);
            inventory.save(&path).await.unwrap();

            let loaded = Inventory::load(&path).await.unwrap();
            assert_eq!(loaded.objects, inventory.objects);
            assert_eq!(loaded.api_version, Some(ApiVersion::new(37, 2)));
        }
    }

    #[tokio::test]
    async fn test_load_rejects_missing_parent() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");
        let inventory = Inventory::new().with(
            InventoryObject::new("cat-1", EntityKind::Catalog, "test-cat").with_parent("org-x"),
        );
        inventory.save(&path).await.unwrap();

        let err = Inventory::load(&path).await.unwrap_err();
        assert!(matches!(err, CloudError::InventoryError(_)));
    }

    #[test]
    fn test_remove_tree_takes_descendants() {
        let mut inventory = Inventory::new()
            .with(InventoryObject::new("org-1", EntityKind::Org, "test-org"))
            .with(InventoryObject::new("vdc-1", EntityKind::Vdc, "vdc").with_parent("org-1"))
            .with(InventoryObject::new("net-1", EntityKind::OrgNetwork, "net").with_parent("vdc-1"))
            .with(InventoryObject::new("org-2", EntityKind::Org, "other"));

        let removed = inventory.remove_tree("org-1");
        assert_eq!(removed.len(), 3);
        assert_eq!(inventory.len(), 1);
        assert!(inventory.contains("org-2"));
    }

    #[tokio::test]
    async fn test_ip_space_with_allocations_cannot_be_deleted() {
        let plane = InventoryPlane::new(ip_space_inventory());

        let err = plane.delete_ip_space("ips-1").await.unwrap_err();
        assert!(matches!(err, CloudError::Conflict(_)));

        plane.delete_ip_allocation("ips-1", "fip-1").await.unwrap();
        plane.delete_ip_space("ips-1").await.unwrap();
        assert!(plane.inventory().is_empty());
    }

    #[tokio::test]
    async fn test_task_deletion_applies_on_wait() {
        let inventory = Inventory::new()
            .with(InventoryObject::new("org-1", EntityKind::Org, "org"))
            .with(InventoryObject::new("vdc-1", EntityKind::Vdc, "test-vdc").with_parent("org-1"));
        let plane = InventoryPlane::new(inventory);

        let task = plane.delete_vdc("vdc-1").await.unwrap();
        assert!(plane.contains("vdc-1"));

        task.wait_completion().await.unwrap();
        assert!(!plane.contains("vdc-1"));
        assert_eq!(
            plane.trace().last().map(|c| c.action),
            Some(CallAction::Delete)
        );
    }

    #[tokio::test]
    async fn test_provider_vdc_must_be_disabled_first() {
        let inventory = Inventory::new().with(InventoryObject::new(
            "pvdc-1",
            EntityKind::ProviderVdc,
            "test-pvdc",
        ));
        let plane = InventoryPlane::new(inventory);

        assert!(matches!(
            plane.delete_provider_vdc("pvdc-1").await,
            Err(CloudError::Conflict(_))
        ));

        plane.disable_provider_vdc("pvdc-1").await.unwrap();
        let task = plane.delete_provider_vdc("pvdc-1").await.unwrap();
        task.wait_completion().await.unwrap();
        assert!(!plane.contains("pvdc-1"));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let plane = InventoryPlane::new(ip_space_inventory());
        plane.fail_call(CallAction::List, "");

        assert!(matches!(
            plane.list_ip_spaces().await,
            Err(CloudError::ApiError(_))
        ));
        // failed calls are not traced
        assert!(plane.trace().is_empty());
    }

    #[test]
    fn test_standalone_vms_live_in_hidden_vapps() {
        let inventory = Inventory::new()
            .with(InventoryObject::new("org-1", EntityKind::Org, "org"))
            .with(InventoryObject::new("vdc-1", EntityKind::Vdc, "vdc").with_parent("org-1"))
            .with(
                InventoryObject::new("vapp-1", EntityKind::Vapp, "hidden")
                    .with_parent("vdc-1")
                    .with_attribute(ATTR_AUTO_NATURE, serde_json::json!(true)),
            )
            .with(InventoryObject::new("vm-1", EntityKind::Vm, "test-vm").with_parent("vapp-1"));
        let plane = InventoryPlane::new(inventory);

        let vapps = tokio_test::block_on(plane.list_vapps("vdc-1")).unwrap();
        assert!(vapps.is_empty());

        let vms = tokio_test::block_on(plane.list_vms("vdc-1")).unwrap();
        assert_eq!(vms.len(), 1);
        assert!(vms[0].auto_nature);

        tokio_test::block_on(plane.delete_vm("vm-1")).unwrap();
        assert!(!plane.contains("vapp-1"));
    }

    #[tokio::test]
    async fn test_virtual_services_report_their_group() {
        let inventory = Inventory::new()
            .with(InventoryObject::new("seg-1", EntityKind::AlbServiceEngineGroup, "test-seg"))
            .with(InventoryObject::new("seg-2", EntityKind::AlbServiceEngineGroup, "prod-seg"))
            .with(InventoryObject::new("egw-1", EntityKind::EdgeGateway, "gw"))
            .with(
                InventoryObject::new("asg-1", EntityKind::AlbServiceEngineGroupAssignment, "a1")
                    .with_parent("egw-1")
                    .with_ref("seg-1"),
            )
            .with(InventoryObject::new("pool-1", EntityKind::AlbPool, "prod-pool").with_parent("egw-1"))
            .with(
                InventoryObject::new("vs-1", EntityKind::AlbVirtualService, "prod-vs")
                    .with_parent("egw-1")
                    .with_ref("pool-1")
                    .with_ref("seg-2"),
            );
        let plane = InventoryPlane::new(inventory);

        let services = plane.list_alb_virtual_services("egw-1").await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_engine_group_id, "seg-2");

        // a virtual service on another group does not hold the assignment
        plane.delete_alb_assignment("asg-1").await.unwrap();
        assert!(!plane.contains("asg-1"));
    }
}
