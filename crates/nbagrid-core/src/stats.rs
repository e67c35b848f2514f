use crate::validator::CellCounts;
use serde::{Deserialize, Serialize};

/// Read projection over a grid's cell populations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    /// Sum of all cell populations
    pub total: usize,
    /// Mean over the cells that have at least one player
    pub average: f64,
    pub cells: CellCounts,
}

impl GridStats {
    pub fn from_counts(cells: CellCounts) -> Self {
        let total: usize = cells.iter().flatten().sum();
        let filled = cells.iter().flatten().filter(|&&c| c > 0).count();
        let average = if filled == 0 {
            0.0
        } else {
            total as f64 / filled as f64
        };
        Self {
            total,
            average,
            cells,
        }
    }

    pub fn min_cell(&self) -> usize {
        self.cells.iter().flatten().copied().min().unwrap_or(0)
    }

    pub fn max_cell(&self) -> usize {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}
