//! Engine configuration.
//!
//! Every tunable of the engine lives here and is loaded from a TOML file:
//!
//! ```toml
//! [bounds]
//! min_cell_count = 5
//! max_cell_count = 40
//!
//! [search]
//! max_full_resamples = 20
//!
//! [weighting]
//! lookback_days = 7
//! decay = 0.5
//!
//! [quality]
//! attempts = 10
//! threshold = 0.8
//!
//! [catalog]
//! min_choice_population = 5
//! excluded_kinds = ["olympic_medalist"]
//!
//! [catalog.priorities]
//! team = 3.0
//! ```
//!
//! Missing sections and fields fall back to their defaults.

use crate::builder::SearchConfig;
use crate::error::ConfigError;
use crate::filter::{FilterCatalog, MIN_CATALOG_KINDS};
use crate::player::PlayerSnapshot;
use crate::quality::QualityConfig;
use crate::validator::Bounds;
use crate::weights::{UsageWeighter, MAX_LOOKBACK_DAYS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration for the grid engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cell and axis population bounds
    pub bounds: Bounds,

    /// Builder search budget
    pub search: SearchConfig,

    /// Usage history decay
    pub weighting: UsageWeighter,

    /// Best-of-N selection by grid quality
    pub quality: QualityConfig,

    /// Standard catalog tuning
    pub catalog: CatalogConfig,
}

/// How the standard catalog is derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Players an option of a choice filter must match to be offered
    #[serde(default = "default_min_choice_population")]
    pub min_choice_population: usize,

    /// Kinds removed from the catalog
    #[serde(default)]
    pub excluded_kinds: Vec<String>,

    /// Selection priority overrides by kind
    #[serde(default)]
    pub priorities: BTreeMap<String, f64>,
}

fn default_min_choice_population() -> usize {
    5
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            min_choice_population: default_min_choice_population(),
            excluded_kinds: Vec::new(),
            priorities: BTreeMap::new(),
        }
    }
}

impl CatalogConfig {
    /// Build the standard catalog for `snapshot` with exclusions and priorities applied
    pub fn build(&self, snapshot: &PlayerSnapshot) -> Result<FilterCatalog, ConfigError> {
        let mut catalog = FilterCatalog::standard(snapshot, self.min_choice_population);
        catalog.exclude(&self.excluded_kinds);
        for (kind, priority) in &self.priorities {
            catalog.set_priority(kind, *priority)?;
        }
        if catalog.len() < MIN_CATALOG_KINDS {
            return Err(ConfigError::CatalogTooSmall {
                needed: MIN_CATALOG_KINDS,
                found: catalog.len(),
            });
        }
        Ok(catalog)
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Load from `path` when given and present, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse TOML text; `origin` names the source in errors
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidSetting(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounds.check()?;
        self.search.check()?;
        self.quality.check()?;

        let decay = self.weighting.decay;
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ConfigError::InvalidSetting(format!(
                "weighting.decay must be in (0, 1), got {}",
                decay
            )));
        }
        let lookback = self.weighting.lookback_days;
        if lookback == 0 || lookback > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::InvalidSetting(format!(
                "weighting.lookback_days must be in 1..={}, got {}",
                MAX_LOOKBACK_DAYS, lookback
            )));
        }
        if self.catalog.min_choice_population == 0 {
            return Err(ConfigError::InvalidSetting(
                "catalog.min_choice_population must be at least 1".to_string(),
            ));
        }
        for (kind, priority) in &self.catalog.priorities {
            if !(priority.is_finite() && *priority > 0.0) {
                return Err(ConfigError::InvalidSetting(format!(
                    "priority of '{}' must be positive, got {}",
                    kind, priority
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use std::io::Write;
    use std::path::PathBuf;

    fn snapshot() -> PlayerSnapshot {
        let players = (0..20)
            .map(|i| {
                let mut p = Player::new(i, format!("Player Adams{}", i));
                p.teams = vec!["Boston Celtics".to_string()];
                p.position = "Guard".to_string();
                p
            })
            .collect();
        PlayerSnapshot::new(players)
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.bounds, Bounds::default());
        assert_eq!(config.search, SearchConfig::default());
        assert_eq!(config.weighting, UsageWeighter::default());
        assert_eq!(config.quality, QualityConfig::default());
        assert_eq!(config.catalog.min_choice_population, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
            [bounds]
            min_cell_count = 3

            [weighting]
            decay = 0.25

            [catalog]
            excluded_kinds = ["olympic_medalist"]

            [catalog.priorities]
            team = 4.0
        "#;
        let config = EngineConfig::parse(toml, Path::new("inline.toml")).unwrap();
        assert_eq!(config.bounds.min_cell_count, 3);
        assert_eq!(config.bounds.max_cell_count, 40);
        assert_eq!(config.weighting.decay, 0.25);
        assert_eq!(config.weighting.lookback_days, 7);
        assert_eq!(config.search.max_full_resamples, 20);
        assert_eq!(config.catalog.excluded_kinds, vec!["olympic_medalist"]);
        assert_eq!(config.catalog.priorities.get("team"), Some(&4.0));
    }

    #[test]
    fn test_rejects_bad_settings() {
        let cases = [
            "[bounds]\nmin_cell_count = 0",
            "[bounds]\nmin_cell_count = 50\nmax_cell_count = 10",
            "[bounds]\nmax_axis_saturation = 1.5",
            "[weighting]\ndecay = 1.0",
            "[weighting]\nlookback_days = 0",
            "[weighting]\nlookback_days = 3651",
            "[weighting]\nlookback_days = 4000000000",
            "[search]\nmax_full_resamples = 0",
            "[quality]\nattempts = 0",
            "[quality]\nthreshold = 1.2",
            "[catalog.priorities]\nteam = -1.0",
        ];
        for case in cases {
            let result = EngineConfig::parse(case, Path::new("inline.toml"));
            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidBounds(_)) | Err(ConfigError::InvalidSetting(_))
                ),
                "accepted: {}",
                case
            );
        }
    }

    #[test]
    fn test_lookback_upper_bound_accepted() {
        let config = EngineConfig::parse("[weighting]\nlookback_days = 3650", Path::new("inline.toml"))
            .unwrap();
        assert_eq!(config.weighting.lookback_days, MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = EngineConfig::parse("[bounds\n", Path::new("broken.toml")).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, PathBuf::from("broken.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nmax_repairs_per_slot = 7").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.search.max_repairs_per_slot, 7);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            EngineConfig::from_file(&missing),
            Err(ConfigError::FileRead { .. })
        ));
        assert_eq!(
            EngineConfig::load_or_default(Some(&missing)).unwrap(),
            EngineConfig::default()
        );
        assert_eq!(EngineConfig::load_or_default(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.catalog.priorities.insert("all_star".to_string(), 1.5);
        config.search.deadline_ms = Some(2_000);
        config.quality = QualityConfig::new(12, 0.75).unwrap();
        let text = config.to_toml().unwrap();
        let parsed = EngineConfig::parse(&text, Path::new("round.toml")).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_build_catalog_applies_overrides() {
        let mut config = CatalogConfig::default();
        config.excluded_kinds = vec!["olympic_medalist".to_string()];
        config.priorities.insert("team".to_string(), 4.0);
        let catalog = config.build(&snapshot()).unwrap();
        assert!(catalog.descriptor("olympic_medalist").is_none());
        assert_eq!(catalog.descriptor("team").unwrap().priority, 4.0);
    }

    #[test]
    fn test_build_catalog_unknown_priority_kind() {
        let mut config = CatalogConfig::default();
        config.priorities.insert("mystery".to_string(), 2.0);
        assert!(matches!(
            config.build(&snapshot()),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_build_catalog_too_small() {
        let config = CatalogConfig {
            excluded_kinds: FilterCatalog::standard(&snapshot(), 5).kind_ids(),
            ..CatalogConfig::default()
        };
        assert!(matches!(
            config.build(&snapshot()),
            Err(ConfigError::CatalogTooSmall { found: 0, .. })
        ));
    }
}
