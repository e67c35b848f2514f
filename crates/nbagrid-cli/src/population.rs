//! Player population files.
//!
//! Two formats are accepted: a JSON array of player objects, or a CSV file
//! with one player per row and the team history in a single `;`-separated
//! `teams` column.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use nbagrid_core::error::StoreError;
use nbagrid_core::player::{Player, PlayerSnapshot, PopulationProvider};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One CSV row; columns mirror [`Player`] except `teams`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvPlayerRow {
    id: u64,
    name: String,
    last_name: String,
    country: String,
    position: String,
    teams: String,
    draft_year: Option<i32>,
    draft_number: Option<u32>,
    is_undrafted: bool,
    num_seasons: u32,
    height_cm: u32,
    weight_kg: u32,
    career_gp: u32,
    career_ppg: f32,
    career_rpg: f32,
    career_apg: f32,
    career_high_pts: u32,
    career_high_reb: u32,
    career_high_ast: u32,
    career_high_stl: u32,
    career_high_blk: u32,
    base_salary: u64,
    is_all_nba: bool,
    is_all_defensive: bool,
    is_all_rookie: bool,
    is_champion: bool,
    is_all_star: bool,
    is_olympic_medalist: bool,
}

impl From<CsvPlayerRow> for Player {
    fn from(row: CsvPlayerRow) -> Self {
        Player {
            id: row.id,
            name: row.name,
            last_name: row.last_name,
            country: row.country,
            position: row.position,
            teams: row
                .teams
                .split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            draft_year: row.draft_year,
            draft_number: row.draft_number,
            is_undrafted: row.is_undrafted,
            num_seasons: row.num_seasons,
            height_cm: row.height_cm,
            weight_kg: row.weight_kg,
            career_gp: row.career_gp,
            career_ppg: row.career_ppg,
            career_rpg: row.career_rpg,
            career_apg: row.career_apg,
            career_high_pts: row.career_high_pts,
            career_high_reb: row.career_high_reb,
            career_high_ast: row.career_high_ast,
            career_high_stl: row.career_high_stl,
            career_high_blk: row.career_high_blk,
            base_salary: row.base_salary,
            is_all_nba: row.is_all_nba,
            is_all_defensive: row.is_all_defensive,
            is_all_rookie: row.is_all_rookie,
            is_champion: row.is_champion,
            is_all_star: row.is_all_star,
            is_olympic_medalist: row.is_olympic_medalist,
        }
    }
}

/// A population loaded once from disk
pub struct PlayerFile {
    path: PathBuf,
    players: Vec<Player>,
}

impl PlayerFile {
    /// Load players from `path`; `.csv` files are read as CSV, anything else as JSON
    pub fn load(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let players = if is_csv {
            read_csv(path)?
        } else {
            read_json(path)?
        };
        tracing::debug!(path = %path.display(), players = players.len(), "population loaded");
        Ok(Self {
            path: path.to_path_buf(),
            players,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }
}

impl PopulationProvider for PlayerFile {
    fn query_population(&self, as_of: NaiveDate) -> Result<PlayerSnapshot, StoreError> {
        Ok(PlayerSnapshot::new(self.players.clone()).with_date(as_of))
    }
}

fn read_json(path: &Path) -> Result<Vec<Player>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read player file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse player JSON: {}", path.display()))
}

fn read_csv(path: &Path) -> Result<Vec<Player>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let mut players = Vec::new();
    for (line, row) in reader.deserialize::<CsvPlayerRow>().enumerate() {
        let row = row.with_context(|| format!("Bad player row {} in {}", line + 2, path.display()))?;
        players.push(Player::from(row));
    }
    Ok(players)
}
