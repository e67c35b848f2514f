use super::{ChoiceField, Comparison, Filter, FilterConfig, Flag, StatField, ThresholdSpec};
use crate::error::ConfigError;
use crate::player::{Player, PlayerSnapshot};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Distinct kinds a grid needs: three rows plus three columns
pub const MIN_CATALOG_KINDS: usize = 6;

/// Legal configuration space of one filter kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum KindSpec {
    Flag { flag: Flag },
    Choice { field: ChoiceField, options: Vec<String> },
    Threshold { spec: ThresholdSpec },
}

/// Catalog entry describing one filter kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDescriptor {
    pub kind: String,
    /// Display name template
    pub name: String,
    /// What the kind selects and how the underlying data is counted
    pub description: String,
    pub spec: KindSpec,
    /// Multiplier applied to the usage weight when drawing kinds
    pub priority: f64,
    /// Whether the kind may be placed on either axis
    pub axis_agnostic: bool,
}

impl FilterDescriptor {
    pub fn flag(flag: Flag) -> Self {
        Self {
            kind: flag.key().to_string(),
            name: flag.label().to_string(),
            description: flag.description().to_string(),
            spec: KindSpec::Flag { flag },
            priority: 1.0,
            axis_agnostic: true,
        }
    }

    pub fn choice(field: ChoiceField, options: Vec<String>) -> Self {
        Self {
            kind: field.key().to_string(),
            name: field.label(&format!("<{}>", field.key())),
            description: field.description().to_string(),
            spec: KindSpec::Choice { field, options },
            priority: 1.0,
            axis_agnostic: true,
        }
    }

    pub fn threshold(spec: ThresholdSpec) -> Self {
        let sign = match spec.comparison {
            Comparison::AtLeast => "+",
            Comparison::AtMost => "-",
        };
        let unit = spec
            .unit
            .as_deref()
            .map(|u| format!(" {}", u))
            .unwrap_or_default();
        let bound = match spec.comparison {
            Comparison::AtLeast => "at least",
            Comparison::AtMost => "at most",
        };
        Self {
            kind: spec.kind_id(),
            name: format!("{} <value>{}{}", spec.prefix, sign, unit),
            description: format!("Players whose {} is {} the chosen value.", spec.field.key(), bound),
            spec: KindSpec::Threshold { spec },
            priority: 1.0,
            axis_agnostic: true,
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self.spec, KindSpec::Flag { .. })
    }

    /// Configuration used when no explicit value is given
    pub fn default_config(&self) -> FilterConfig {
        match &self.spec {
            KindSpec::Flag { .. } => FilterConfig::Empty,
            KindSpec::Choice { options, .. } => options
                .first()
                .map(|o| FilterConfig::Choice(o.clone()))
                .unwrap_or(FilterConfig::Empty),
            KindSpec::Threshold { spec } => {
                let values = spec.values();
                FilterConfig::Value(values.get(values.len() / 2).copied().unwrap_or(spec.min))
            }
        }
    }

    /// Every legal configuration of this kind
    pub fn legal_configs(&self) -> Vec<FilterConfig> {
        match &self.spec {
            KindSpec::Flag { .. } => vec![FilterConfig::Empty],
            KindSpec::Choice { options, .. } => {
                options.iter().cloned().map(FilterConfig::Choice).collect()
            }
            KindSpec::Threshold { spec } => {
                spec.values().into_iter().map(FilterConfig::Value).collect()
            }
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !(self.priority.is_finite() && self.priority > 0.0) {
            return Err(ConfigError::InvalidSetting(format!(
                "priority of '{}' must be positive, got {}",
                self.kind, self.priority
            )));
        }
        match &self.spec {
            KindSpec::Flag { .. } => Ok(()),
            KindSpec::Choice { options, .. } if options.is_empty() => Err(
                ConfigError::InvalidSetting(format!("choice kind '{}' has no options", self.kind)),
            ),
            KindSpec::Choice { .. } => Ok(()),
            KindSpec::Threshold { spec } if spec.step <= 0 || spec.min > spec.max => {
                Err(ConfigError::InvalidSetting(format!(
                    "threshold kind '{}' has an empty value range {}..={} step {}",
                    self.kind, spec.min, spec.max, spec.step
                )))
            }
            KindSpec::Threshold { .. } => Ok(()),
        }
    }
}

/// The set of filter kinds available to a build.
///
/// Passed explicitly to the builder, validator and session so that
/// independent catalogs can coexist.
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    descriptors: Vec<FilterDescriptor>,
}

impl FilterCatalog {
    /// Create a catalog, rejecting duplicate kinds and empty value spaces
    pub fn new(descriptors: Vec<FilterDescriptor>) -> Result<Self, ConfigError> {
        let mut seen = std::collections::BTreeSet::new();
        for descriptor in &descriptors {
            descriptor.check()?;
            if !seen.insert(descriptor.kind.clone()) {
                return Err(ConfigError::InvalidSetting(format!(
                    "duplicate filter kind '{}'",
                    descriptor.kind
                )));
            }
        }
        Ok(Self { descriptors })
    }

    /// The production catalog.
    ///
    /// Team and surname-initial options come from the snapshot; an option is
    /// kept only if at least `min_choice_population` players match it.
    pub fn standard(snapshot: &PlayerSnapshot, min_choice_population: usize) -> Self {
        let mut descriptors: Vec<FilterDescriptor> =
            Flag::ALL.into_iter().map(FilterDescriptor::flag).collect();

        let players = snapshot.players();
        let team_options = frequent_values(players, min_choice_population, |p| {
            p.teams.iter().cloned().collect()
        });
        let position_options: Vec<String> = ["Guard", "Forward", "Center"]
            .into_iter()
            .filter(|pos| {
                players
                    .iter()
                    .filter(|p| ChoiceField::Position.evaluate(p, pos))
                    .count()
                    >= min_choice_population
            })
            .map(str::to_string)
            .collect();
        let letter_options = frequent_values(players, min_choice_population, |p| {
            p.surname()
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect::<String>())
                .into_iter()
                .collect()
        });

        for (field, options, priority) in [
            (ChoiceField::Team, team_options, 2.5),
            (ChoiceField::Position, position_options, 1.0),
            (ChoiceField::LastNameInitial, letter_options, 2.0),
        ] {
            if !options.is_empty() {
                descriptors.push(FilterDescriptor::choice(field, options).with_priority(priority));
            }
        }

        descriptors.extend(
            standard_thresholds()
                .into_iter()
                .map(|(spec, description)| FilterDescriptor::threshold(spec).with_description(description)),
        );
        Self { descriptors }
    }

    pub fn list_available(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptor(&self, kind: &str) -> Option<&FilterDescriptor> {
        self.descriptors.iter().find(|d| d.kind == kind)
    }

    pub fn kind_ids(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.kind.clone()).collect()
    }

    /// Drop the named kinds
    pub fn exclude(&mut self, kinds: &[String]) {
        self.descriptors.retain(|d| !kinds.contains(&d.kind));
    }

    /// Override the selection priority of one kind
    pub fn set_priority(&mut self, kind: &str, priority: f64) -> Result<(), ConfigError> {
        if !(priority.is_finite() && priority > 0.0) {
            return Err(ConfigError::InvalidSetting(format!(
                "priority of '{}' must be positive, got {}",
                kind, priority
            )));
        }
        let descriptor = self
            .descriptors
            .iter_mut()
            .find(|d| d.kind == kind)
            .ok_or_else(|| ConfigError::UnknownKind(kind.to_string()))?;
        descriptor.priority = priority;
        Ok(())
    }

    /// Build a filter of `kind` from a configuration payload
    pub fn instantiate(&self, kind: &str, config: &FilterConfig) -> Result<Filter, ConfigError> {
        let descriptor = self
            .descriptor(kind)
            .ok_or_else(|| ConfigError::UnknownKind(kind.to_string()))?;
        match (&descriptor.spec, config) {
            (KindSpec::Flag { flag }, FilterConfig::Empty) => Ok(Filter::Flag(*flag)),
            (KindSpec::Flag { .. }, _) => Err(ConfigError::WrongShape {
                kind: kind.to_string(),
                expected: "empty",
            }),
            (KindSpec::Choice { field, options }, FilterConfig::Choice(value)) => {
                if options.contains(value) {
                    Ok(Filter::choice(*field, value.clone()))
                } else {
                    Err(ConfigError::UnknownOption {
                        kind: kind.to_string(),
                        value: value.clone(),
                    })
                }
            }
            (KindSpec::Choice { .. }, _) => Err(ConfigError::WrongShape {
                kind: kind.to_string(),
                expected: "choice",
            }),
            (KindSpec::Threshold { spec }, FilterConfig::Value(value)) => {
                let value = *value;
                if value < spec.min || value > spec.max {
                    return Err(ConfigError::OutOfRange {
                        kind: kind.to_string(),
                        value,
                        min: spec.min,
                        max: spec.max,
                    });
                }
                if !spec.contains(value) {
                    return Err(ConfigError::OffStep {
                        kind: kind.to_string(),
                        value,
                        min: spec.min,
                        step: spec.step,
                    });
                }
                Ok(Filter::threshold(spec.clone(), value))
            }
            (KindSpec::Threshold { .. }, _) => Err(ConfigError::WrongShape {
                kind: kind.to_string(),
                expected: "numeric",
            }),
        }
    }

    /// Instantiate `kind` with a configuration drawn uniformly from its legal space
    pub fn random_instance<R: Rng + ?Sized>(
        &self,
        kind: &str,
        rng: &mut R,
    ) -> Result<Filter, ConfigError> {
        let descriptor = self
            .descriptor(kind)
            .ok_or_else(|| ConfigError::UnknownKind(kind.to_string()))?;
        let configs = descriptor.legal_configs();
        let config = configs
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| descriptor.default_config());
        self.instantiate(kind, &config)
    }

    pub fn evaluate(&self, filter: &Filter, player: &Player) -> bool {
        filter.evaluate(player)
    }

    /// Number of players in the snapshot that satisfy `filter`
    pub fn population_count(&self, filter: &Filter, snapshot: &PlayerSnapshot) -> usize {
        snapshot
            .players()
            .iter()
            .filter(|p| filter.evaluate(p))
            .count()
    }
}

/// Values produced by `extract` that at least `min_count` players share, sorted
fn frequent_values<F>(players: &[Player], min_count: usize, extract: F) -> Vec<String>
where
    F: Fn(&Player) -> Vec<String>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for player in players {
        let mut values = extract(player);
        values.sort();
        values.dedup();
        for value in values {
            *counts.entry(value).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count.max(1))
        .map(|(value, _)| value)
        .collect()
}

fn standard_thresholds() -> Vec<(ThresholdSpec, &'static str)> {
    use Comparison::{AtLeast, AtMost};
    const REGULAR_SEASON: &str = "Only regular season games count.";
    const SINGLE_GAME: &str = "Regular season and playoff games count.";
    vec![
        (
            ThresholdSpec::new(
                StatField::BaseSalary,
                AtLeast,
                10_000_000,
                45_000_000,
                5_000_000,
                "Salary 24/25 more than",
            )
            .with_stats_prefix("Salary 24/25:")
            .with_unit("M USD"),
            "Players with a base salary of at least the amount for the 2024/25 season.",
        ),
        (
            ThresholdSpec::new(StatField::CareerPpg, AtLeast, 10, 28, 2, "Career points per game:"),
            REGULAR_SEASON,
        ),
        (
            ThresholdSpec::new(StatField::CareerRpg, AtLeast, 4, 12, 1, "Career rebounds per game:"),
            REGULAR_SEASON,
        ),
        (
            ThresholdSpec::new(StatField::CareerApg, AtLeast, 2, 9, 1, "Career assists per game:"),
            REGULAR_SEASON,
        ),
        (
            ThresholdSpec::new(StatField::CareerGp, AtLeast, 300, 1200, 50, "Career games played:"),
            "Regular season games the player appeared in; games missed through injury or \
             suspension do not count.",
        ),
        (
            ThresholdSpec::new(StatField::NumSeasons, AtLeast, 5, 16, 1, "More than")
                .with_stats_prefix("Total seasons:")
                .with_unit("seasons"),
            "A season counts once the player appears in one regular season game. Suspended \
             and lockout-shortened seasons count in full.",
        ),
        (
            ThresholdSpec::new(StatField::NumSeasons, AtMost, 1, 5, 1, "No more than")
                .with_stats_prefix("Total seasons:")
                .with_unit("seasons"),
            "A season counts once the player appears in one game. G-League and international \
             seasons do not count.",
        ),
        (
            ThresholdSpec::new(StatField::HeightCm, AtLeast, 195, 220, 5, "Taller than")
                .with_stats_prefix("Height:")
                .with_unit("cm"),
            "Listed height in centimeters.",
        ),
        (
            ThresholdSpec::new(StatField::HeightCm, AtMost, 180, 200, 5, "Smaller than")
                .with_stats_prefix("Height:")
                .with_unit("cm"),
            "Listed height in centimeters.",
        ),
        (
            ThresholdSpec::new(StatField::CareerHighPts, AtLeast, 30, 70, 5, "Career high points:"),
            SINGLE_GAME,
        ),
        (
            ThresholdSpec::new(StatField::CareerHighReb, AtLeast, 10, 30, 5, "Career high rebounds:"),
            SINGLE_GAME,
        ),
        (
            ThresholdSpec::new(StatField::CareerHighAst, AtLeast, 10, 20, 2, "Career high assists:"),
            SINGLE_GAME,
        ),
        (
            ThresholdSpec::new(StatField::CareerHighStl, AtLeast, 3, 9, 1, "Career high steals:"),
            SINGLE_GAME,
        ),
        (
            ThresholdSpec::new(StatField::CareerHighBlk, AtLeast, 3, 10, 1, "Career high blocks:"),
            SINGLE_GAME,
        ),
        (
            ThresholdSpec::new(StatField::TeamCount, AtLeast, 3, 10, 1, "Teams played for:"),
            "Distinct franchises the player appeared in at least one game for.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    fn sample_snapshot() -> PlayerSnapshot {
        let teams = ["Boston Celtics", "Chicago Bulls", "Utah Jazz"];
        let players = (0..30)
            .map(|i| Player {
                last_name: format!("{}son", ["A", "B", "C"][i % 3]),
                position: ["Guard", "Forward", "Center"][i % 3].to_string(),
                teams: vec![teams[i % 3].to_string()],
                career_ppg: (i % 25) as f32,
                ..Player::new(i as u64, format!("Player {}", i))
            })
            .collect();
        PlayerSnapshot::new(players)
    }

    #[test]
    fn test_standard_catalog_kinds() {
        let catalog = FilterCatalog::standard(&sample_snapshot(), 5);
        assert!(catalog.len() >= MIN_CATALOG_KINDS);
        assert!(catalog.descriptor("all_star").is_some());
        assert!(catalog.descriptor("num_seasons_at_most").is_some());
        assert!(catalog.descriptor("num_seasons_at_least").is_some());

        let team = catalog.descriptor("team").unwrap();
        assert_eq!(team.priority, 2.5);
        match &team.spec {
            KindSpec::Choice { options, .. } => assert_eq!(options.len(), 3),
            other => panic!("unexpected spec {:?}", other),
        }
        assert_eq!(catalog.descriptor("last_name_initial").unwrap().priority, 2.0);
    }

    #[test]
    fn test_descriptions() {
        let catalog = FilterCatalog::standard(&sample_snapshot(), 5);
        assert!(catalog.list_available().iter().all(|d| !d.description.is_empty()));
        assert!(catalog
            .descriptor("born_in_usa")
            .unwrap()
            .description
            .contains("Puerto Rico"));
        assert!(catalog
            .descriptor("career_ppg_at_least")
            .unwrap()
            .description
            .contains("regular season"));
        assert!(catalog
            .descriptor("base_salary_at_least")
            .unwrap()
            .name
            .starts_with("Salary 24/25 more than"));

        let custom = FilterDescriptor::flag(Flag::AllStar).with_description("Any All-Star nod");
        assert_eq!(custom.description, "Any All-Star nod");
        let generic = FilterDescriptor::threshold(ThresholdSpec::new(
            StatField::HeightCm,
            Comparison::AtMost,
            180,
            200,
            5,
            "Smaller than",
        ));
        assert_eq!(generic.description, "Players whose height_cm is at most the chosen value.");
    }

    #[test]
    fn test_rare_options_dropped() {
        let catalog = FilterCatalog::standard(&sample_snapshot(), 11);
        assert!(catalog.descriptor("team").is_none());
        assert!(catalog.descriptor("position").is_none());
    }

    #[test]
    fn test_instantiate_checks_config() {
        let catalog = FilterCatalog::standard(&sample_snapshot(), 1);

        let filter = catalog
            .instantiate("career_ppg_at_least", &FilterConfig::Value(20))
            .unwrap();
        assert_eq!(filter.label(), "Career points per game: 20+");

        assert!(matches!(
            catalog.instantiate("career_ppg_at_least", &FilterConfig::Value(40)),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            catalog.instantiate("career_ppg_at_least", &FilterConfig::Value(21)),
            Err(ConfigError::OffStep { .. })
        ));
        assert!(matches!(
            catalog.instantiate("career_ppg_at_least", &FilterConfig::Empty),
            Err(ConfigError::WrongShape { .. })
        ));
        assert!(matches!(
            catalog.instantiate("all_star", &FilterConfig::Value(1)),
            Err(ConfigError::WrongShape { .. })
        ));
        assert!(matches!(
            catalog.instantiate("team", &FilterConfig::Choice("Seattle SuperSonics".into())),
            Err(ConfigError::UnknownOption { .. })
        ));
        assert!(matches!(
            catalog.instantiate("weight_kg_at_least", &FilterConfig::Value(100)),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = FilterCatalog::new(vec![
            FilterDescriptor::flag(Flag::AllStar),
            FilterDescriptor::flag(Flag::AllStar),
        ]);
        assert!(result.is_err());

        let empty_choice = FilterCatalog::new(vec![FilterDescriptor::choice(
            ChoiceField::Team,
            Vec::new(),
        )]);
        assert!(empty_choice.is_err());
    }

    #[test]
    fn test_random_instance_is_legal() {
        let catalog = FilterCatalog::standard(&sample_snapshot(), 1);
        let mut rng = seeded(3);
        for kind in catalog.kind_ids() {
            let filter = catalog.random_instance(&kind, &mut rng).unwrap();
            assert_eq!(filter.kind_id(), kind);
            assert!(catalog.instantiate(&kind, &filter.config()).is_ok());
        }
    }

    #[test]
    fn test_population_count() {
        let snapshot = sample_snapshot();
        let catalog = FilterCatalog::standard(&snapshot, 1);
        let centers = catalog
            .instantiate("position", &FilterConfig::Choice("Center".into()))
            .unwrap();
        assert_eq!(catalog.population_count(&centers, &snapshot), 10);
    }

    #[test]
    fn test_overrides() {
        let mut catalog = FilterCatalog::standard(&sample_snapshot(), 1);
        catalog.exclude(&["team".to_string()]);
        assert!(catalog.descriptor("team").is_none());
        catalog.set_priority("all_nba", 3.0).unwrap();
        assert_eq!(catalog.descriptor("all_nba").unwrap().priority, 3.0);
        assert!(catalog.set_priority("all_nba", 0.0).is_err());
        assert!(catalog.set_priority("missing", 1.0).is_err());
    }
}
