//! Leftovers management plane abstraction
//!
//! This crate describes the virtualization management plane the cleanup engine
//! talks to: the closed set of entity kinds, the summaries returned by list and
//! lookup calls, and the capability-typed [`ManagementPlane`] client trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 leftovers-core                   │
//! │          (selection, walker, ALB, IP)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                leftovers-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        Management plane abstraction       │   │
//! │  │  trait ManagementPlane { ... }            │   │
//! │  │  trait Task { wait_completion() }         │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Entity kinds │  │  Inventory   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  API client   │ │ InventoryPlane│
//! │  (external)   │ │  (snapshots)  │
//! └───────────────┘ └───────────────┘
//! ```

pub mod error;
pub mod inventory;
pub mod kind;
pub mod model;
pub mod plane;
pub mod version;

// Re-exports
pub use error::{CloudError, Result};
pub use inventory::{CallAction, Inventory, InventoryObject, InventoryPlane, PlaneCall};
pub use kind::EntityKind;
pub use model::{
    AlbAssignment, AlbSettings, AlbVirtualService, AllocationKind, EdgeGatewaySummary,
    IpAllocation, RdeTypeSummary, RemoteObject, VappSummary, VmSummary,
};
pub use plane::{ManagementPlane, Task, TaskHandle};
pub use version::ApiVersion;
