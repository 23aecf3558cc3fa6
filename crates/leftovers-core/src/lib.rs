//! Leftovers cleanup engine
//!
//! Finds the objects acceptance tests left behind on a management plane and
//! removes them in an order the platform accepts, never touching protected
//! entities.
//!
//! ```text
//! Walker ──► lister ──► ManagementPlane::list_*
//!   │
//!   ├──► selection::decide  (pattern, force list, protect list)
//!   ├──► deleter::remove    ──► ManagementPlane::delete_* + Task::wait_completion
//!   └──► Progress           (decision lines, removals, skipped passes)
//! ```
//!
//! Passes run in this order: load balancer, provider VDCs, organizations
//! (catalogs, VDCs and their content), RDE types, RDE interfaces, external
//! networks, IP spaces, UI plugins. The first error aborts the sweep.

mod alb;
pub mod deleter;
pub mod error;
pub mod ip_space;
pub mod lister;
pub mod progress;
pub mod report;
pub mod selection;
pub mod walker;

// Re-exports
pub use deleter::Deletable;
pub use error::{Result, SweepError};
pub use ip_space::MIN_IP_SPACE_VERSION;
pub use lister::Listed;
pub use progress::{ConsoleProgress, LineProgress, Progress, TracingProgress};
pub use report::{Removal, Retained, SkippedPass, SweepReport};
pub use selection::{Decision, Reason, decide, decide_with};
pub use walker::{SweepOptions, Visit, Walker, remove_leftovers};
