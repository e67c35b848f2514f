//! Player records and the population snapshot the filters evaluate against.

use crate::error::StoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single player record as delivered by the data provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub id: u64,
    pub name: String,
    /// Surname; falls back to the last word of `name` when empty
    pub last_name: String,
    pub country: String,
    /// Listed position, possibly compound ("Guard-Forward")
    pub position: String,
    /// Names of every team the player appeared for
    pub teams: Vec<String>,
    pub draft_year: Option<i32>,
    pub draft_number: Option<u32>,
    pub is_undrafted: bool,
    pub num_seasons: u32,
    pub height_cm: u32,
    pub weight_kg: u32,
    pub career_gp: u32,
    pub career_ppg: f32,
    pub career_rpg: f32,
    pub career_apg: f32,
    pub career_high_pts: u32,
    pub career_high_reb: u32,
    pub career_high_ast: u32,
    pub career_high_stl: u32,
    pub career_high_blk: u32,
    pub base_salary: u64,
    pub is_all_nba: bool,
    pub is_all_defensive: bool,
    pub is_all_rookie: bool,
    pub is_champion: bool,
    pub is_all_star: bool,
    pub is_olympic_medalist: bool,
}

impl Player {
    /// Create a player with only identity fields set
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn surname(&self) -> &str {
        if !self.last_name.is_empty() {
            return &self.last_name;
        }
        self.name.split_whitespace().last().unwrap_or("")
    }

    pub fn is_born_in_usa(&self) -> bool {
        self.country == "USA"
    }

    pub fn is_top10_pick(&self) -> bool {
        !self.is_undrafted && matches!(self.draft_number, Some(n) if (1..=10).contains(&n))
    }
}

/// Immutable view of the player population for one build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub as_of: Option<NaiveDate>,
    players: Vec<Player>,
}

impl PlayerSnapshot {
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            as_of: None,
            players,
        }
    }

    pub fn with_date(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

// ==================== Provider ====================

/// Source of player populations
pub trait PopulationProvider {
    /// Materialize the population as it stood on `as_of`
    fn query_population(&self, as_of: NaiveDate) -> Result<PlayerSnapshot, StoreError>;
}

/// Provider that always returns the same player list
#[derive(Debug, Clone, Default)]
pub struct StaticPopulation {
    players: Vec<Player>,
}

impl StaticPopulation {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }
}

impl PopulationProvider for StaticPopulation {
    fn query_population(&self, as_of: NaiveDate) -> Result<PlayerSnapshot, StoreError> {
        Ok(PlayerSnapshot::new(self.players.clone()).with_date(as_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surname_fallback() {
        let mut player = Player::new(1, "Nikola Jokic");
        assert_eq!(player.surname(), "Jokic");
        player.last_name = "Jokić".to_string();
        assert_eq!(player.surname(), "Jokić");
    }

    #[test]
    fn test_top10_pick() {
        let mut player = Player::new(1, "A B");
        assert!(!player.is_top10_pick());
        player.draft_number = Some(10);
        assert!(player.is_top10_pick());
        player.draft_number = Some(11);
        assert!(!player.is_top10_pick());
        player.draft_number = Some(3);
        player.is_undrafted = true;
        assert!(!player.is_top10_pick());
    }

    #[test]
    fn test_deserialize_sparse_record() {
        let player: Player =
            serde_json::from_str(r#"{"id": 4, "name": "Tim Duncan", "is_champion": true}"#).unwrap();
        assert_eq!(player.id, 4);
        assert!(player.is_champion);
        assert!(player.teams.is_empty());
    }

    #[test]
    fn test_static_population_stamps_date() {
        let provider = StaticPopulation::new(vec![Player::new(1, "A B")]);
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let snapshot = provider.query_population(date).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.as_of, Some(date));
    }
}
