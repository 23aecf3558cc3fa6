//! Sweep configuration: protect list, force list, test name pattern and always-show kinds

use crate::entity::{EntityList, EntityRef};
use crate::error::Result;
use leftovers_cloud::EntityKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Names created by the acceptance tests start with "Test" or "test"
pub const DEFAULT_IS_TEST: &str = "^[Tt]est";

/// Kinds reported in verbose output even when they are kept
pub const DEFAULT_ALWAYS_SHOW: [EntityKind; 7] = [
    EntityKind::ProviderVdc,
    EntityKind::Org,
    EntityKind::Catalog,
    EntityKind::Vdc,
    EntityKind::AlbController,
    EntityKind::AlbCloud,
    EntityKind::AlbServiceEngineGroup,
];

/// On-disk shape of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_is_test")]
    is_test: String,

    #[serde(default = "default_always_show")]
    always_show: Vec<EntityKind>,

    #[serde(default)]
    do_not_delete: EntityList,

    #[serde(default)]
    also_delete: EntityList,
}

fn default_is_test() -> String {
    DEFAULT_IS_TEST.to_string()
}

fn default_always_show() -> Vec<EntityKind> {
    DEFAULT_ALWAYS_SHOW.to_vec()
}

/// Immutable configuration shared by every pass of a sweep
///
/// Built once, through [`SweepConfig::builder`] or from a YAML file, and then only
/// borrowed by the engine.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    do_not_delete: EntityList,
    also_delete: EntityList,
    is_test: Regex,
    always_show: BTreeSet<EntityKind>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            do_not_delete: EntityList::new(),
            also_delete: EntityList::new(),
            is_test: Regex::new(DEFAULT_IS_TEST).expect("default test pattern is valid"),
            always_show: DEFAULT_ALWAYS_SHOW.into_iter().collect(),
        }
    }
}

impl SweepConfig {
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder::default()
    }

    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        Ok(Self {
            is_test: Regex::new(&file.is_test)?,
            always_show: file.always_show.into_iter().collect(),
            do_not_delete: file.do_not_delete,
            also_delete: file.also_delete,
        })
    }

    /// Read a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!(
            "Loaded sweep config from {} ({} protected, {} forced)",
            path.display(),
            config.do_not_delete.len(),
            config.also_delete.len()
        );
        Ok(config)
    }

    /// Serialize back to the file format
    pub fn to_yaml(&self) -> Result<String> {
        let file = ConfigFile {
            is_test: self.is_test.as_str().to_string(),
            always_show: self.always_show.iter().copied().collect(),
            do_not_delete: self.do_not_delete.clone(),
            also_delete: self.also_delete.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Entities that must never be deleted
    pub fn do_not_delete(&self) -> &EntityList {
        &self.do_not_delete
    }

    /// Entities that must be deleted even when their name does not look like a test name
    pub fn also_delete(&self) -> &EntityList {
        &self.also_delete
    }

    pub fn is_test(&self) -> &Regex {
        &self.is_test
    }

    pub fn always_shows(&self, kind: EntityKind) -> bool {
        self.always_show.contains(&kind)
    }

    pub fn always_show(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.always_show.iter().copied()
    }
}

/// Builder for [`SweepConfig`]
#[derive(Debug, Clone)]
pub struct SweepConfigBuilder {
    do_not_delete: EntityList,
    also_delete: EntityList,
    is_test: String,
    always_show: BTreeSet<EntityKind>,
}

impl Default for SweepConfigBuilder {
    fn default() -> Self {
        Self {
            do_not_delete: EntityList::new(),
            also_delete: EntityList::new(),
            is_test: default_is_test(),
            always_show: DEFAULT_ALWAYS_SHOW.into_iter().collect(),
        }
    }
}

impl SweepConfigBuilder {
    pub fn protect(mut self, kind: EntityKind, name: impl Into<String>) -> Self {
        self.do_not_delete.push(EntityRef::new(kind, name));
        self
    }

    pub fn force(mut self, kind: EntityKind, name: impl Into<String>) -> Self {
        self.also_delete.push(EntityRef::new(kind, name));
        self
    }

    pub fn protect_entry(mut self, entry: EntityRef) -> Self {
        self.do_not_delete.push(entry);
        self
    }

    pub fn force_entry(mut self, entry: EntityRef) -> Self {
        self.also_delete.push(entry);
        self
    }

    pub fn is_test(mut self, pattern: impl Into<String>) -> Self {
        self.is_test = pattern.into();
        self
    }

    pub fn always_show(mut self, kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        self.always_show = kinds.into_iter().collect();
        self
    }

    pub fn build(self) -> Result<SweepConfig> {
        Ok(SweepConfig {
            is_test: Regex::new(&self.is_test)?,
            do_not_delete: self.do_not_delete,
            also_delete: self.also_delete,
            always_show: self.always_show,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert!(config.is_test().is_match("TestVapp"));
        assert!(config.is_test().is_match("test-org"));
        assert!(!config.is_test().is_match("ProductionVdc"));
        assert!(!config.is_test().is_match("my-test"));
        assert!(config.always_shows(EntityKind::Org));
        assert!(!config.always_shows(EntityKind::Vapp));
        assert!(config.do_not_delete().is_empty());
        assert!(config.also_delete().is_empty());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
is_test: "^(Test|tf-)"
always_show: [vcd_org]
do_not_delete:
  - type: vcd_catalog
    name: test-shared-catalog
    comment: shared fixture used by every run
also_delete:
  - { type: vcd_org, name: org1 }
"#;
        let config = SweepConfig::from_yaml(yaml).unwrap();
        assert!(config.is_test().is_match("tf-network"));
        assert!(!config.is_test().is_match("test-network"));
        assert!(config.always_shows(EntityKind::Org));
        assert!(!config.always_shows(EntityKind::Vdc));
        assert!(
            config
                .do_not_delete()
                .contains(EntityKind::Catalog, "test-shared-catalog")
        );
        assert!(config.also_delete().contains(EntityKind::Org, "org1"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = SweepConfig::from_yaml("also_delete: []").unwrap();
        assert_eq!(config.is_test().as_str(), DEFAULT_IS_TEST);
        assert!(config.always_shows(EntityKind::AlbServiceEngineGroup));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        // unknown entity type
        let err = SweepConfig::from_yaml("do_not_delete: [{type: org, name: x}]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        // unknown key
        let err = SweepConfig::from_yaml("protect: []").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = SweepConfig::from_yaml("is_test: \"[\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern(_)));
    }

    #[test]
    fn test_yaml_round_trip_keeps_lists() {
        let config = SweepConfig::builder()
            .protect(EntityKind::Vapp, "TestVapp")
            .force(EntityKind::Org, "org1")
            .build()
            .unwrap();

        let reloaded = SweepConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert!(reloaded.do_not_delete().contains(EntityKind::Vapp, "TestVapp"));
        assert!(reloaded.also_delete().contains(EntityKind::Org, "org1"));
        assert_eq!(reloaded.is_test().as_str(), config.is_test().as_str());
    }
}
