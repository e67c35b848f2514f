//! Quality score of a finished grid.
//!
//! Four components in `[0, 1]`, combined with fixed weights:
//!
//! | Component   | Weight | Measures |
//! |-------------|--------|----------|
//! | balance     | 0.3    | `1 / (1 + variance / 100)` of the nine cell counts |
//! | difficulty  | 0.4    | share of cells inside `min_cell_count..=max_cell_count` |
//! | variety     | 0.2    | distinct filter kinds over the six slots |
//! | reliability | 0.1    | 1.0 when no cell is empty, 0.5 otherwise |

use crate::error::ConfigError;
use crate::grid::{GridAssignment, GRID_SIZE};
use crate::validator::{Bounds, CellCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

const BALANCE_WEIGHT: f64 = 0.3;
const DIFFICULTY_WEIGHT: f64 = 0.4;
const VARIETY_WEIGHT: f64 = 0.2;
const RELIABILITY_WEIGHT: f64 = 0.1;

/// Best-of-N settings, the `[quality]` section of the engine config
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Builds tried per date; the best scoring one is kept
    pub attempts: usize,
    /// Stop early at this score; a best score below it is rejected
    pub threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            threshold: 0.0,
        }
    }
}

impl QualityConfig {
    pub fn new(attempts: usize, threshold: f64) -> Result<Self, ConfigError> {
        let config = Self { attempts, threshold };
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.attempts == 0 {
            return Err(ConfigError::InvalidSetting(
                "quality.attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidSetting(format!(
                "quality.threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Whether `quality` passes the threshold
    pub fn accepts(&self, quality: &GridQuality) -> bool {
        quality.score() >= self.threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridQuality {
    pub balance: f64,
    pub difficulty: f64,
    pub variety: f64,
    pub reliability: f64,
}

impl GridQuality {
    pub fn evaluate(assignment: &GridAssignment, counts: &CellCounts, bounds: &Bounds) -> Self {
        let cells: Vec<usize> = counts.iter().flatten().copied().collect();
        let n = cells.len() as f64;

        let mean = cells.iter().sum::<usize>() as f64 / n;
        let variance = cells
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let in_range = cells
            .iter()
            .filter(|&&c| (bounds.min_cell_count..=bounds.max_cell_count).contains(&c))
            .count();
        let kinds: BTreeSet<String> = assignment.kind_ids().into_iter().collect();

        Self {
            balance: 1.0 / (1.0 + variance / 100.0),
            difficulty: in_range as f64 / n,
            variety: kinds.len() as f64 / (2 * GRID_SIZE) as f64,
            reliability: if cells.iter().all(|&c| c > 0) { 1.0 } else { 0.5 },
        }
    }

    /// Weighted total in `[0, 1]`
    pub fn score(&self) -> f64 {
        self.balance * BALANCE_WEIGHT
            + self.difficulty * DIFFICULTY_WEIGHT
            + self.variety * VARIETY_WEIGHT
            + self.reliability * RELIABILITY_WEIGHT
    }
}

impl fmt::Display for GridQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} (balance {:.2}, difficulty {:.2}, variety {:.2}, reliability {:.1})",
            self.score(),
            self.balance,
            self.difficulty,
            self.variety,
            self.reliability
        )
    }
}
