mod common;

use common::{child, mutation_targets, object, sweep, sweep_default};
use leftovers_cloud::inventory::ATTR_ALB_ENABLED;
use leftovers_cloud::{CallAction, EntityKind, Inventory, InventoryObject, InventoryPlane};
use leftovers_config::SweepConfig;
use leftovers_core::SweepOptions;

fn provider_chain() -> Inventory {
    Inventory::new()
        .with(object("ctrl-1", EntityKind::AlbController, "test-ctrl"))
        .with(child("cloud-1", EntityKind::AlbCloud, "test-cloud", "ctrl-1"))
        .with(child(
            "seg-1",
            EntityKind::AlbServiceEngineGroup,
            "test-seg",
            "cloud-1",
        ))
        .with(object("org-1", EntityKind::Org, "shared-org"))
        .with(child("vdc-1", EntityKind::Vdc, "shared-vdc", "org-1"))
}

fn gateway(id: &str, name: &str) -> InventoryObject {
    child(id, EntityKind::EdgeGateway, name, "vdc-1")
        .with_attribute(ATTR_ALB_ENABLED, serde_json::json!(true))
}

fn assignment(id: &str, gateway: &str, group: &str) -> InventoryObject {
    child(
        id,
        EntityKind::AlbServiceEngineGroupAssignment,
        "assignment",
        gateway,
    )
    .with_ref(group)
}

fn virtual_service(id: &str, name: &str, gateway: &str, pool: &str, group: &str) -> InventoryObject {
    child(id, EntityKind::AlbVirtualService, name, gateway)
        .with_ref(pool)
        .with_ref(group)
}

#[tokio::test]
async fn test_tenant_side_is_removed_before_service_engine_group() {
    let inventory = provider_chain()
        .with(gateway("egw-1", "shared-gw"))
        .with(assignment("asg-1", "egw-1", "seg-1"))
        .with(child("pool-1", EntityKind::AlbPool, "test-pool", "egw-1"))
        .with(virtual_service("vs-1", "test-vs1", "egw-1", "pool-1", "seg-1"))
        .with(virtual_service("vs-2", "test-vs2", "egw-1", "pool-1", "seg-1"));
    let plane = InventoryPlane::new(inventory);

    let result = sweep_default(&plane).await;

    assert_eq!(
        mutation_targets(&plane),
        vec![
            (CallAction::Delete, "vs-1".to_string()),
            (CallAction::Delete, "vs-2".to_string()),
            (CallAction::Delete, "pool-1".to_string()),
            (CallAction::Delete, "asg-1".to_string()),
            (CallAction::Disable, "egw-1".to_string()),
            (CallAction::Delete, "seg-1".to_string()),
            (CallAction::Delete, "cloud-1".to_string()),
            (CallAction::Delete, "ctrl-1".to_string()),
        ]
    );
    assert_eq!(result.report.removed_count(EntityKind::AlbVirtualService), 2);
    assert!(result.report.retained.is_empty());
    // the gateway itself is not a leftover
    assert!(plane.contains("egw-1"));
}

#[tokio::test]
async fn test_every_gateway_using_the_group_is_cleared() {
    // two gateways in the same VDC share the group
    let inventory = provider_chain()
        .with(gateway("egw-1", "gw-a"))
        .with(gateway("egw-2", "gw-b"))
        .with(assignment("asg-1", "egw-1", "seg-1"))
        .with(assignment("asg-2", "egw-2", "seg-1"))
        .with(child("pool-2", EntityKind::AlbPool, "test-pool", "egw-2"))
        .with(virtual_service("vs-2", "test-vs", "egw-2", "pool-2", "seg-1"));
    let plane = InventoryPlane::new(inventory);

    sweep_default(&plane).await;

    let targets = mutation_targets(&plane);
    let position = |target: &str| {
        targets
            .iter()
            .position(|(_, t)| t == target)
            .unwrap_or_else(|| panic!("{} was not touched", target))
    };
    let group = position("seg-1");
    for dependent in ["asg-1", "asg-2", "vs-2", "pool-2"] {
        assert!(position(dependent) < group, "{} after group", dependent);
    }
    assert!(position("vs-2") < position("pool-2"));
    assert!(position("pool-2") < position("asg-2"));
    // both gateways lose their load balancer
    assert_eq!(
        targets
            .iter()
            .filter(|(action, _)| *action == CallAction::Disable)
            .count(),
        2
    );
}

#[tokio::test]
async fn test_kept_virtual_service_retains_the_provider_chain() {
    let inventory = provider_chain()
        .with(gateway("egw-1", "shared-gw"))
        .with(assignment("asg-1", "egw-1", "seg-1"))
        .with(child("pool-1", EntityKind::AlbPool, "prod-pool", "egw-1"))
        .with(virtual_service("vs-1", "prod-vs", "egw-1", "pool-1", "seg-1"));
    let plane = InventoryPlane::new(inventory);

    let result = sweep_default(&plane).await;

    assert!(mutation_targets(&plane).is_empty());
    let retained: Vec<EntityKind> = result.report.retained.iter().map(|r| r.kind).collect();
    assert_eq!(
        retained,
        vec![
            EntityKind::AlbServiceEngineGroup,
            EntityKind::AlbCloud,
            EntityKind::AlbController
        ]
    );
    assert!(result.report.retained[0].reason.contains("shared-org/shared-vdc/shared-gw"));
}

#[tokio::test]
async fn test_settings_stay_enabled_while_another_group_is_assigned() {
    let inventory = provider_chain()
        .with(child(
            "seg-2",
            EntityKind::AlbServiceEngineGroup,
            "prod-seg",
            "cloud-1",
        ))
        .with(gateway("egw-1", "shared-gw"))
        .with(assignment("asg-1", "egw-1", "seg-1"))
        .with(assignment("asg-2", "egw-1", "seg-2"));
    let plane = InventoryPlane::new(inventory);

    let result = sweep_default(&plane).await;

    assert_eq!(
        mutation_targets(&plane),
        vec![
            (CallAction::Delete, "asg-1".to_string()),
            (CallAction::Delete, "seg-1".to_string()),
        ]
    );
    // the cloud still holds prod-seg
    assert_eq!(result.report.retained.len(), 2);
    assert!(plane.contains("asg-2"));
}

#[tokio::test]
async fn test_protected_group_is_left_alone() {
    let inventory = provider_chain()
        .with(gateway("egw-1", "shared-gw"))
        .with(assignment("asg-1", "egw-1", "seg-1"));
    let plane = InventoryPlane::new(inventory);
    let config = SweepConfig::builder()
        .protect(EntityKind::AlbServiceEngineGroup, "test-seg")
        .build()
        .unwrap();

    let result = sweep(&plane, &config, SweepOptions::default()).await.unwrap();

    assert!(mutation_targets(&plane).is_empty());
    // no tenant sweep for a kept group
    assert!(
        !plane
            .trace()
            .iter()
            .any(|c| c.kind == EntityKind::AlbServiceEngineGroupAssignment)
    );
    assert_eq!(result.report.retained.len(), 2);
}

#[tokio::test]
async fn test_verbose_lines_are_indented_by_layer() {
    let inventory = provider_chain()
        .with(gateway("egw-1", "shared-gw"))
        .with(assignment("asg-1", "egw-1", "seg-1"));
    let plane = InventoryPlane::new(inventory);
    let options = SweepOptions {
        verbose: true,
        dry_run: false,
    };

    let result = sweep(&plane, &SweepConfig::default(), options).await.unwrap();

    let expected = [
        "[vcd_nsxt_alb_controller] test-ctrl (DELETE)",
        "  [vcd_nsxt_alb_cloud] test-cloud (DELETE)",
        "    [vcd_nsxt_alb_service_engine_group] test-seg (DELETE)",
        "      REMOVING ALB service engine group assignment shared-org/shared-vdc/shared-gw/test-seg",
        "      [vcd_nsxt_alb_settings] Testshared-gw (DELETE)",
        "      REMOVING ALB settings shared-org/shared-vdc/shared-gw/Testshared-gw",
        "    REMOVING ALB service engine group test-ctrl/test-cloud/test-seg",
        "  REMOVING ALB cloud test-ctrl/test-cloud",
        "REMOVING ALB controller test-ctrl",
    ];
    for line in expected {
        assert!(
            result.lines.iter().any(|l| l == line),
            "missing line {:?} in {:#?}",
            line,
            result.lines
        );
    }
}

#[tokio::test]
async fn test_settings_are_disabled_on_gateway_without_assignment() {
    // an earlier run removed the assignment but never got to the settings
    let inventory = provider_chain().with(gateway("egw-1", "shared-gw"));
    let plane = InventoryPlane::new(inventory);

    let result = sweep_default(&plane).await;

    assert_eq!(
        mutation_targets(&plane),
        vec![
            (CallAction::Disable, "egw-1".to_string()),
            (CallAction::Delete, "seg-1".to_string()),
            (CallAction::Delete, "cloud-1".to_string()),
            (CallAction::Delete, "ctrl-1".to_string()),
        ]
    );
    assert_eq!(result.report.removed_count(EntityKind::AlbSettings), 1);
}

#[tokio::test]
async fn test_virtual_service_on_another_group_does_not_block() {
    let inventory = provider_chain()
        .with(child(
            "seg-2",
            EntityKind::AlbServiceEngineGroup,
            "prod-seg",
            "cloud-1",
        ))
        .with(gateway("egw-1", "shared-gw"))
        .with(assignment("asg-1", "egw-1", "seg-1"))
        .with(assignment("asg-2", "egw-1", "seg-2"))
        .with(child("pool-1", EntityKind::AlbPool, "prod-pool", "egw-1"))
        .with(virtual_service("vs-1", "prod-vs", "egw-1", "pool-1", "seg-2"));
    let plane = InventoryPlane::new(inventory);

    let result = sweep_default(&plane).await;

    assert_eq!(
        mutation_targets(&plane),
        vec![
            (CallAction::Delete, "asg-1".to_string()),
            (CallAction::Delete, "seg-1".to_string()),
        ]
    );
    assert!(plane.contains("vs-1"));
    assert!(plane.contains("asg-2"));
    // only prod-seg holds the provider chain
    let retained: Vec<EntityKind> = result.report.retained.iter().map(|r| r.kind).collect();
    assert_eq!(retained, vec![EntityKind::AlbCloud, EntityKind::AlbController]);
}

fn two_groups_and_a_kept_pool() -> Inventory {
    provider_chain()
        .with(child(
            "seg-2",
            EntityKind::AlbServiceEngineGroup,
            "test-seg2",
            "cloud-1",
        ))
        .with(gateway("egw-1", "shared-gw"))
        .with(child("pool-9", EntityKind::AlbPool, "prod-pool", "egw-1"))
}

fn pool_options(dry_run: bool) -> (SweepConfig, SweepOptions) {
    let config = SweepConfig::builder()
        .always_show([EntityKind::AlbPool])
        .build()
        .unwrap();
    let options = SweepOptions {
        verbose: true,
        dry_run,
    };
    (config, options)
}

fn count_lines(lines: &[String], needle: &str) -> usize {
    lines.iter().filter(|l| l.contains(needle)).count()
}

#[tokio::test]
async fn test_tenant_objects_are_decided_once_per_pass() {
    let plane = InventoryPlane::new(two_groups_and_a_kept_pool());
    let (config, options) = pool_options(false);

    let result = sweep(&plane, &config, options).await.unwrap();

    assert_eq!(
        mutation_targets(&plane),
        vec![
            (CallAction::Disable, "egw-1".to_string()),
            (CallAction::Delete, "seg-1".to_string()),
            (CallAction::Delete, "seg-2".to_string()),
            (CallAction::Delete, "cloud-1".to_string()),
            (CallAction::Delete, "ctrl-1".to_string()),
        ]
    );
    assert_eq!(count_lines(&result.lines, "[vcd_nsxt_alb_pool] prod-pool (no)"), 1);
    // prod-pool, shared-org, shared-vdc and shared-gw
    assert_eq!(result.report.kept, 4);
}

#[tokio::test]
async fn test_dry_run_announces_each_tenant_removal_once() {
    let plane = InventoryPlane::new(two_groups_and_a_kept_pool());
    let (config, options) = pool_options(true);

    let result = sweep(&plane, &config, options).await.unwrap();

    assert!(mutation_targets(&plane).is_empty());
    assert_eq!(count_lines(&result.lines, "WOULD REMOVE ALB settings"), 1);
    assert_eq!(
        count_lines(&result.lines, "WOULD REMOVE ALB service engine group test"),
        2
    );
    assert_eq!(count_lines(&result.lines, "[vcd_nsxt_alb_pool] prod-pool (no)"), 1);
    assert_eq!(result.report.kept, 4);
    assert_eq!(result.report.removed_count(EntityKind::AlbSettings), 1);
}
