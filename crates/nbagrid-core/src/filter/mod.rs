//! Filter kinds and their predicates.
//!
//! Filters form a closed set of three families:
//!
//! - [`Flag`]: fixed predicates with no configuration ("All-Star player")
//! - [`ChoiceFilter`]: one value picked among peers ("Played for Boston Celtics")
//! - [`ThresholdFilter`]: a stat compared against a stepped threshold
//!
//! Labels are always derived from the configuration, never stored.

mod catalog;

pub use catalog::{FilterCatalog, FilterDescriptor, KindSpec, MIN_CATALOG_KINDS};

use crate::player::Player;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Configuration payload ====================

/// Kind-specific configuration of a filter instance.
///
/// JSON form: `{}` for flags, `{"value": "Center"}` for choices,
/// `{"value": 20}` for thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", try_from = "serde_json::Value")]
pub enum FilterConfig {
    Empty,
    Choice(String),
    Value(i64),
}

impl FilterConfig {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FilterConfig::Empty => serde_json::json!({}),
            FilterConfig::Choice(value) => serde_json::json!({ "value": value }),
            FilterConfig::Value(value) => serde_json::json!({ "value": value }),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("configuration must be an object, got {}", value))?;
        if object.is_empty() {
            return Ok(FilterConfig::Empty);
        }
        if object.len() > 1 || !object.contains_key("value") {
            return Err(format!("unexpected configuration keys in {}", value));
        }
        match &object["value"] {
            serde_json::Value::String(s) => Ok(FilterConfig::Choice(s.clone())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(FilterConfig::Value)
                .ok_or_else(|| format!("threshold must be an integer, got {}", n)),
            other => Err(format!("unsupported configuration value {}", other)),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            FilterConfig::Empty => "empty",
            FilterConfig::Choice(_) => "choice",
            FilterConfig::Value(_) => "numeric",
        }
    }
}

impl From<FilterConfig> for serde_json::Value {
    fn from(config: FilterConfig) -> Self {
        config.to_json()
    }
}

impl TryFrom<serde_json::Value> for FilterConfig {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        FilterConfig::from_json(&value)
    }
}

impl fmt::Display for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterConfig::Empty => f.write_str("-"),
            FilterConfig::Choice(value) => f.write_str(value),
            FilterConfig::Value(value) => write!(f, "{}", value),
        }
    }
}

// ==================== Flags ====================

/// Static filters without configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    BornInUsa,
    International,
    AllNba,
    AllDefensive,
    AllRookie,
    NbaChampion,
    AllStar,
    OlympicMedalist,
    Top10DraftPick,
}

impl Flag {
    pub const ALL: [Flag; 9] = [
        Flag::BornInUsa,
        Flag::International,
        Flag::AllNba,
        Flag::AllDefensive,
        Flag::AllRookie,
        Flag::NbaChampion,
        Flag::AllStar,
        Flag::OlympicMedalist,
        Flag::Top10DraftPick,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Flag::BornInUsa => "born_in_usa",
            Flag::International => "international",
            Flag::AllNba => "all_nba",
            Flag::AllDefensive => "all_defensive",
            Flag::AllRookie => "all_rookie",
            Flag::NbaChampion => "nba_champion",
            Flag::AllStar => "all_star",
            Flag::OlympicMedalist => "olympic_medalist",
            Flag::Top10DraftPick => "top10_draft_pick",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Flag::BornInUsa => "Born in USA",
            Flag::International => "Born outside of USA",
            Flag::AllNba => "All-NBA player",
            Flag::AllDefensive => "All-Defensive player",
            Flag::AllRookie => "All-Rookie player",
            Flag::NbaChampion => "NBA Champion",
            Flag::AllStar => "All-Star player",
            Flag::OlympicMedalist => "Olympic medalist",
            Flag::Top10DraftPick => "Top 10 Draft Pick",
        }
    }

    /// Longer explanation shown when browsing the catalog
    pub fn description(self) -> &'static str {
        match self {
            Flag::BornInUsa => {
                "Players born in the United States. Players born in U.S. territories such as \
                 Puerto Rico, or naturalized later, do not count."
            }
            Flag::International => {
                "Players born outside the United States, including U.S. territories such as \
                 Puerto Rico."
            }
            Flag::AllNba => "Players named to at least one All-NBA team (first, second or third).",
            Flag::AllDefensive => {
                "Players named to at least one All-Defensive team (first or second)."
            }
            Flag::AllRookie => {
                "Players named to an All-Rookie team (first or second) in their debut season."
            }
            Flag::NbaChampion => {
                "Players who were on the roster of an NBA Finals winner, whatever their role \
                 or minutes."
            }
            Flag::AllStar => {
                "Players selected to at least one All-Star Game, by fan, player or coach vote."
            }
            Flag::OlympicMedalist => {
                "Players who won an Olympic basketball medal (gold, silver or bronze) for any \
                 country."
            }
            Flag::Top10DraftPick => {
                "Players taken within the first ten picks of an NBA draft. Later picks and \
                 undrafted players do not count."
            }
        }
    }

    pub fn evaluate(self, player: &Player) -> bool {
        match self {
            Flag::BornInUsa => player.is_born_in_usa(),
            Flag::International => !player.is_born_in_usa(),
            Flag::AllNba => player.is_all_nba,
            Flag::AllDefensive => player.is_all_defensive,
            Flag::AllRookie => player.is_all_rookie,
            Flag::NbaChampion => player.is_champion,
            Flag::AllStar => player.is_all_star,
            Flag::OlympicMedalist => player.is_olympic_medalist,
            Flag::Top10DraftPick => player.is_top10_pick(),
        }
    }

    fn describe(self, player: &Player) -> String {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        match self {
            Flag::BornInUsa | Flag::International => format!("Birthplace: {}", player.country),
            Flag::AllNba => format!("All-NBA: {}", yes_no(player.is_all_nba)),
            Flag::AllDefensive => format!("All-Defensive: {}", yes_no(player.is_all_defensive)),
            Flag::AllRookie => format!("All-Rookie: {}", yes_no(player.is_all_rookie)),
            Flag::NbaChampion => format!("NBA Champion: {}", yes_no(player.is_champion)),
            Flag::AllStar => format!("All-Star: {}", yes_no(player.is_all_star)),
            Flag::OlympicMedalist => format!("Olympic medal: {}", yes_no(player.is_olympic_medalist)),
            Flag::Top10DraftPick => match (player.is_undrafted, player.draft_number) {
                (false, Some(number)) => match player.draft_year {
                    Some(year) => format!("Draft Pick: #{} in {}", number, year),
                    None => format!("Draft Pick: #{}", number),
                },
                _ => "Draft Pick: undrafted".to_string(),
            },
        }
    }
}

// ==================== Choices ====================

/// Categorical attribute a choice filter selects on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceField {
    Team,
    Position,
    LastNameInitial,
}

impl ChoiceField {
    pub const ALL: [ChoiceField; 3] = [
        ChoiceField::Team,
        ChoiceField::Position,
        ChoiceField::LastNameInitial,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ChoiceField::Team => "team",
            ChoiceField::Position => "position",
            ChoiceField::LastNameInitial => "last_name_initial",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    pub fn label(self, value: &str) -> String {
        match self {
            ChoiceField::Team => format!("Played for {}", value),
            ChoiceField::Position => format!("Plays {} position", value),
            ChoiceField::LastNameInitial => format!("Last name starts with {}", value),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ChoiceField::Team => {
                "Players who appeared in at least one game for the team at any point of their career."
            }
            ChoiceField::Position => {
                "Players listed at the position. Compound listings such as Guard-Forward count \
                 for each position they name."
            }
            ChoiceField::LastNameInitial => "Players whose last name starts with the letter.",
        }
    }

    pub fn evaluate(self, player: &Player, value: &str) -> bool {
        match self {
            ChoiceField::Team => player.teams.iter().any(|team| team == value),
            // Compound positions ("Guard-Forward") count for both
            ChoiceField::Position => player.position.contains(value),
            ChoiceField::LastNameInitial => {
                let surname = player.surname().to_uppercase();
                !value.is_empty() && surname.starts_with(&value.to_uppercase())
            }
        }
    }

    fn describe(self, player: &Player) -> String {
        match self {
            ChoiceField::Team => format!("Teams: {}", player.teams.join(", ")),
            ChoiceField::Position => format!("Position: {}", player.position),
            ChoiceField::LastNameInitial => format!("Last name: {}", player.surname()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceFilter {
    pub field: ChoiceField,
    pub value: String,
}

// ==================== Thresholds ====================

/// Numeric player attribute a threshold filter compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    CareerPpg,
    CareerRpg,
    CareerApg,
    CareerGp,
    NumSeasons,
    HeightCm,
    WeightKg,
    CareerHighPts,
    CareerHighReb,
    CareerHighAst,
    CareerHighStl,
    CareerHighBlk,
    BaseSalary,
    TeamCount,
}

impl StatField {
    pub fn key(self) -> &'static str {
        match self {
            StatField::CareerPpg => "career_ppg",
            StatField::CareerRpg => "career_rpg",
            StatField::CareerApg => "career_apg",
            StatField::CareerGp => "career_gp",
            StatField::NumSeasons => "num_seasons",
            StatField::HeightCm => "height_cm",
            StatField::WeightKg => "weight_kg",
            StatField::CareerHighPts => "career_high_pts",
            StatField::CareerHighReb => "career_high_reb",
            StatField::CareerHighAst => "career_high_ast",
            StatField::CareerHighStl => "career_high_stl",
            StatField::CareerHighBlk => "career_high_blk",
            StatField::BaseSalary => "base_salary",
            StatField::TeamCount => "team_count",
        }
    }

    pub fn value(self, player: &Player) -> f64 {
        match self {
            StatField::CareerPpg => f64::from(player.career_ppg),
            StatField::CareerRpg => f64::from(player.career_rpg),
            StatField::CareerApg => f64::from(player.career_apg),
            StatField::CareerGp => f64::from(player.career_gp),
            StatField::NumSeasons => f64::from(player.num_seasons),
            StatField::HeightCm => f64::from(player.height_cm),
            StatField::WeightKg => f64::from(player.weight_kg),
            StatField::CareerHighPts => f64::from(player.career_high_pts),
            StatField::CareerHighReb => f64::from(player.career_high_reb),
            StatField::CareerHighAst => f64::from(player.career_high_ast),
            StatField::CareerHighStl => f64::from(player.career_high_stl),
            StatField::CareerHighBlk => f64::from(player.career_high_blk),
            StatField::BaseSalary => player.base_salary as f64,
            StatField::TeamCount => player.teams.len() as f64,
        }
    }

    fn is_fractional(self) -> bool {
        matches!(
            self,
            StatField::CareerPpg | StatField::CareerRpg | StatField::CareerApg
        )
    }
}

/// Direction of a threshold comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    AtMost,
}

impl Comparison {
    pub fn key(self) -> &'static str {
        match self {
            Comparison::AtLeast => "at_least",
            Comparison::AtMost => "at_most",
        }
    }

    pub fn holds(self, stat: f64, threshold: i64) -> bool {
        let threshold = threshold as f64;
        match self {
            Comparison::AtLeast => stat >= threshold,
            Comparison::AtMost => stat <= threshold,
        }
    }

    fn sign(self) -> &'static str {
        match self {
            Comparison::AtLeast => "+",
            Comparison::AtMost => "-",
        }
    }
}

/// Legal value space and presentation of a threshold kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub field: StatField,
    pub comparison: Comparison,
    pub min: i64,
    pub max: i64,
    pub step: i64,
    /// Label text before the value
    pub prefix: String,
    /// Text used when describing a player's value, defaults to `prefix`
    #[serde(default)]
    pub stats_prefix: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ThresholdSpec {
    pub fn new(
        field: StatField,
        comparison: Comparison,
        min: i64,
        max: i64,
        step: i64,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            field,
            comparison,
            min,
            max,
            step,
            prefix: prefix.into(),
            stats_prefix: None,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_stats_prefix(mut self, stats_prefix: impl Into<String>) -> Self {
        self.stats_prefix = Some(stats_prefix.into());
        self
    }

    pub fn kind_id(&self) -> String {
        format!("{}_{}", self.field.key(), self.comparison.key())
    }

    /// Every value on the legal grid, ascending
    pub fn values(&self) -> Vec<i64> {
        if self.step <= 0 || self.min > self.max {
            return Vec::new();
        }
        (self.min..=self.max).step_by(self.step as usize).collect()
    }

    pub fn contains(&self, value: i64) -> bool {
        self.step > 0
            && value >= self.min
            && value <= self.max
            && (value - self.min) % self.step == 0
    }

    /// The value one step stricter, if still legal
    pub fn narrower(&self, value: i64) -> Option<i64> {
        let next = match self.comparison {
            Comparison::AtLeast => value + self.step,
            Comparison::AtMost => value - self.step,
        };
        self.contains(next).then_some(next)
    }

    /// The value one step looser, if still legal
    pub fn wider(&self, value: i64) -> Option<i64> {
        let next = match self.comparison {
            Comparison::AtLeast => value - self.step,
            Comparison::AtMost => value + self.step,
        };
        self.contains(next).then_some(next)
    }

    pub fn label(&self, value: i64) -> String {
        format!(
            "{} {}{}{}",
            self.prefix,
            display_amount(value as f64, false),
            self.comparison.sign(),
            self.unit_suffix()
        )
    }

    fn unit_suffix(&self) -> String {
        self.unit
            .as_deref()
            .map(|unit| format!(" {}", unit))
            .unwrap_or_default()
    }
}

fn display_amount(value: f64, fractional: bool) -> String {
    if value > 1_000_000.0 {
        format!("{:.1}", value / 1_000_000.0)
    } else if fractional {
        format!("{:.1}", value)
    } else {
        format!("{}", value.round() as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThresholdFilter {
    pub spec: ThresholdSpec,
    pub value: i64,
}

// ==================== Filter ====================

/// Ordering of two filters by how many players they admit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strictness {
    /// Admits a subset of the other filter's players
    Stricter,
    /// Admits a superset of the other filter's players
    Looser,
    Equivalent,
    /// Not comparable: different kinds, or choices among peers
    Unordered,
}

/// A configured predicate over player records
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    Flag(Flag),
    Choice(ChoiceFilter),
    Threshold(ThresholdFilter),
}

impl Filter {
    pub fn choice(field: ChoiceField, value: impl Into<String>) -> Self {
        Filter::Choice(ChoiceFilter {
            field,
            value: value.into(),
        })
    }

    pub fn threshold(spec: ThresholdSpec, value: i64) -> Self {
        Filter::Threshold(ThresholdFilter { spec, value })
    }

    pub fn kind_id(&self) -> String {
        match self {
            Filter::Flag(flag) => flag.key().to_string(),
            Filter::Choice(choice) => choice.field.key().to_string(),
            Filter::Threshold(threshold) => threshold.spec.kind_id(),
        }
    }

    /// Display label, regenerated from the configuration on every call
    pub fn label(&self) -> String {
        match self {
            Filter::Flag(flag) => flag.label().to_string(),
            Filter::Choice(choice) => choice.field.label(&choice.value),
            Filter::Threshold(threshold) => threshold.spec.label(threshold.value),
        }
    }

    pub fn config(&self) -> FilterConfig {
        match self {
            Filter::Flag(_) => FilterConfig::Empty,
            Filter::Choice(choice) => FilterConfig::Choice(choice.value.clone()),
            Filter::Threshold(threshold) => FilterConfig::Value(threshold.value),
        }
    }

    /// Whether the filter carries adjustable configuration
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Filter::Flag(_))
    }

    pub fn evaluate(&self, player: &Player) -> bool {
        match self {
            Filter::Flag(flag) => flag.evaluate(player),
            Filter::Choice(choice) => choice.field.evaluate(player, &choice.value),
            Filter::Threshold(threshold) => threshold
                .spec
                .comparison
                .holds(threshold.spec.field.value(player), threshold.value),
        }
    }

    /// Same kind and same configuration
    pub fn is_equivalent(&self, other: &Filter) -> bool {
        self.kind_id() == other.kind_id() && self.config() == other.config()
    }

    pub fn strictness(&self, other: &Filter) -> Strictness {
        if self.is_equivalent(other) {
            return Strictness::Equivalent;
        }
        match (self, other) {
            (Filter::Threshold(a), Filter::Threshold(b)) if a.spec.kind_id() == b.spec.kind_id() => {
                let a_stricter = match a.spec.comparison {
                    Comparison::AtLeast => a.value > b.value,
                    Comparison::AtMost => a.value < b.value,
                };
                if a_stricter {
                    Strictness::Stricter
                } else {
                    Strictness::Looser
                }
            }
            _ => Strictness::Unordered,
        }
    }

    /// The player's value for this filter, for listing a cell's players
    pub fn describe_player(&self, player: &Player) -> String {
        match self {
            Filter::Flag(flag) => flag.describe(player),
            Filter::Choice(choice) => choice.field.describe(player),
            Filter::Threshold(threshold) => {
                let spec = &threshold.spec;
                let prefix = spec.stats_prefix.as_deref().unwrap_or(&spec.prefix);
                format!(
                    "{} {}{}",
                    prefix,
                    display_amount(spec.field.value(player), spec.field.is_fractional()),
                    spec.unit_suffix()
                )
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ppg_spec() -> ThresholdSpec {
        ThresholdSpec::new(
            StatField::CareerPpg,
            Comparison::AtLeast,
            10,
            28,
            2,
            "Career points per game:",
        )
    }

    fn seasons_at_most() -> ThresholdSpec {
        ThresholdSpec::new(StatField::NumSeasons, Comparison::AtMost, 1, 5, 1, "No more than")
            .with_unit("seasons")
    }

    fn scorer(ppg: f32) -> Player {
        Player {
            career_ppg: ppg,
            ..Player::new(1, "Test Player")
        }
    }

    #[test]
    fn test_threshold_kind_id() {
        assert_eq!(ppg_spec().kind_id(), "career_ppg_at_least");
        assert_eq!(seasons_at_most().kind_id(), "num_seasons_at_most");
    }

    #[test]
    fn test_threshold_label() {
        assert_eq!(
            Filter::threshold(ppg_spec(), 20).label(),
            "Career points per game: 20+"
        );
        assert_eq!(
            Filter::threshold(seasons_at_most(), 3).label(),
            "No more than 3- seasons"
        );
        let salary = ThresholdSpec::new(
            StatField::BaseSalary,
            Comparison::AtLeast,
            10_000_000,
            45_000_000,
            5_000_000,
            "Salary 24/25 more than",
        )
        .with_unit("M USD");
        assert_eq!(
            Filter::threshold(salary, 25_000_000).label(),
            "Salary 24/25 more than 25.0+ M USD"
        );
        assert_eq!(
            Filter::choice(ChoiceField::Position, "Center").label(),
            "Plays Center position"
        );
    }

    #[test]
    fn test_threshold_evaluate() {
        let filter = Filter::threshold(ppg_spec(), 20);
        assert!(filter.evaluate(&scorer(20.0)));
        assert!(filter.evaluate(&scorer(27.1)));
        assert!(!filter.evaluate(&scorer(19.9)));

        let veteran = Player {
            num_seasons: 4,
            ..Player::new(2, "Short Career")
        };
        assert!(Filter::threshold(seasons_at_most(), 4).evaluate(&veteran));
        assert!(!Filter::threshold(seasons_at_most(), 3).evaluate(&veteran));
    }

    #[test]
    fn test_spec_steps() {
        let spec = ppg_spec();
        assert_eq!(spec.values().len(), 10);
        assert!(spec.contains(12));
        assert!(!spec.contains(13));
        assert!(!spec.contains(30));
        assert_eq!(spec.narrower(20), Some(22));
        assert_eq!(spec.wider(20), Some(18));
        assert_eq!(spec.narrower(28), None);
        assert_eq!(spec.wider(10), None);

        let at_most = seasons_at_most();
        assert_eq!(at_most.narrower(3), Some(2));
        assert_eq!(at_most.wider(3), Some(4));
        assert_eq!(at_most.narrower(1), None);
    }

    #[test]
    fn test_choice_filters() {
        let mut player = Player::new(1, "Kevin Garnett");
        player.position = "Forward-Center".to_string();
        player.teams = vec!["Boston Celtics".to_string(), "Brooklyn Nets".to_string()];

        assert!(Filter::choice(ChoiceField::Position, "Center").evaluate(&player));
        assert!(Filter::choice(ChoiceField::Position, "Forward").evaluate(&player));
        assert!(!Filter::choice(ChoiceField::Position, "Guard").evaluate(&player));
        assert!(Filter::choice(ChoiceField::Team, "Brooklyn Nets").evaluate(&player));
        assert!(!Filter::choice(ChoiceField::Team, "Chicago Bulls").evaluate(&player));
        assert!(Filter::choice(ChoiceField::LastNameInitial, "G").evaluate(&player));
        assert!(!Filter::choice(ChoiceField::LastNameInitial, "K").evaluate(&player));
        assert_eq!(
            Filter::choice(ChoiceField::Team, "Boston Celtics").label(),
            "Played for Boston Celtics"
        );
    }

    #[test]
    fn test_flags() {
        let mut player = Player::new(1, "Dirk Nowitzki");
        player.country = "Germany".to_string();
        player.draft_number = Some(9);
        assert!(Filter::Flag(Flag::International).evaluate(&player));
        assert!(!Filter::Flag(Flag::BornInUsa).evaluate(&player));
        assert!(Filter::Flag(Flag::Top10DraftPick).evaluate(&player));
        assert_eq!(Flag::from_key("all_star"), Some(Flag::AllStar));
        assert_eq!(Flag::from_key("nope"), None);
    }

    #[test]
    fn test_strictness() {
        let a = Filter::threshold(ppg_spec(), 20);
        let b = Filter::threshold(ppg_spec(), 22);
        assert_eq!(b.strictness(&a), Strictness::Stricter);
        assert_eq!(a.strictness(&b), Strictness::Looser);
        assert_eq!(a.strictness(&a.clone()), Strictness::Equivalent);

        let c = Filter::threshold(seasons_at_most(), 2);
        let d = Filter::threshold(seasons_at_most(), 4);
        assert_eq!(c.strictness(&d), Strictness::Stricter);

        assert_eq!(a.strictness(&c), Strictness::Unordered);
        assert_eq!(
            Filter::choice(ChoiceField::Team, "A").strictness(&Filter::choice(ChoiceField::Team, "B")),
            Strictness::Unordered
        );
    }

    #[test]
    fn test_describe_player() {
        let filter = Filter::threshold(ppg_spec().with_stats_prefix("PPG:"), 20);
        assert_eq!(filter.describe_player(&scorer(24.3)), "PPG: 24.3");
        let player = Player {
            draft_number: Some(1),
            draft_year: Some(2003),
            ..Player::new(1, "LeBron James")
        };
        assert_eq!(
            Filter::Flag(Flag::Top10DraftPick).describe_player(&player),
            "Draft Pick: #1 in 2003"
        );
    }

    #[test]
    fn test_config_json() {
        assert_eq!(FilterConfig::Empty.to_json(), serde_json::json!({}));
        assert_eq!(
            FilterConfig::from_json(&serde_json::json!({"value": 20})).unwrap(),
            FilterConfig::Value(20)
        );
        assert_eq!(
            FilterConfig::from_json(&serde_json::json!({"value": "Guard"})).unwrap(),
            FilterConfig::Choice("Guard".to_string())
        );
        assert!(FilterConfig::from_json(&serde_json::json!({"value": 2.5})).is_err());
        assert!(FilterConfig::from_json(&serde_json::json!({"other": 1})).is_err());
        assert!(FilterConfig::from_json(&serde_json::json!(5)).is_err());

        let config: FilterConfig = serde_json::from_str(r#"{"value": 7}"#).unwrap();
        assert_eq!(config, FilterConfig::Value(7));
        assert_eq!(serde_json::to_string(&config).unwrap(), r#"{"value":7}"#);
    }
}
