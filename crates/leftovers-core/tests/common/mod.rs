use leftovers_cloud::{CallAction, EntityKind, InventoryObject, InventoryPlane, PlaneCall};
use leftovers_config::SweepConfig;
use leftovers_core::{LineProgress, SweepOptions, SweepReport, Walker};

/// Result of a sweep run with captured progress lines
pub struct Sweep {
    pub report: SweepReport,
    #[allow(dead_code)]
    pub lines: Vec<String>,
}

pub async fn sweep(
    plane: &InventoryPlane,
    config: &SweepConfig,
    options: SweepOptions,
) -> leftovers_core::Result<Sweep> {
    let progress = LineProgress::new(Vec::new(), options.verbose);
    let report = Walker::new(plane, config, &progress, options).run().await?;
    let lines = String::from_utf8(progress.into_inner())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    Ok(Sweep { report, lines })
}

/// Sweep with the default configuration
#[allow(dead_code)]
pub async fn sweep_default(plane: &InventoryPlane) -> Sweep {
    sweep(plane, &SweepConfig::default(), SweepOptions::default())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub fn object(id: &str, kind: EntityKind, name: &str) -> InventoryObject {
    InventoryObject::new(id, kind, name)
}

#[allow(dead_code)]
pub fn child(id: &str, kind: EntityKind, name: &str, parent: &str) -> InventoryObject {
    InventoryObject::new(id, kind, name).with_parent(parent)
}

/// Calls that changed the plane, in order
#[allow(dead_code)]
pub fn mutations(plane: &InventoryPlane) -> Vec<PlaneCall> {
    plane
        .trace()
        .into_iter()
        .filter(|c| !matches!(c.action, CallAction::List | CallAction::Get))
        .collect()
}

/// `(action, target)` pairs of the mutating calls
#[allow(dead_code)]
pub fn mutation_targets(plane: &InventoryPlane) -> Vec<(CallAction, String)> {
    mutations(plane)
        .into_iter()
        .map(|c| (c.action, c.target))
        .collect()
}

/// Targets of every list call
#[allow(dead_code)]
pub fn listed_parents(plane: &InventoryPlane) -> Vec<String> {
    plane
        .trace()
        .into_iter()
        .filter(|c| c.action == CallAction::List)
        .map(|c| c.target)
        .collect()
}
