//! Grid-level constraint checks.
//!
//! `validate` is a pure function of assignment, snapshot and bounds. It never
//! mutates its inputs and reports every violated constraint, not just the first.

use crate::error::{ConfigError, GridError};
use crate::grid::{Axis, GridAssignment, Slot, GRID_SIZE};
use crate::mask::PlayerMask;
use crate::player::PlayerSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Population count per cell, indexed `[row][col]`
pub type CellCounts = [[usize; GRID_SIZE]; GRID_SIZE];

/// Tunable limits a playable grid must respect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    /// Smallest allowed cell population, at least 1
    pub min_cell_count: usize,
    /// Largest allowed cell population
    pub max_cell_count: usize,
    /// Smallest population a row or column filter may match on its own
    pub min_axis_count: usize,
    /// Largest share of the snapshot a single row or column filter may match
    pub max_axis_saturation: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_cell_count: 5,
            max_cell_count: 40,
            min_axis_count: 5,
            max_axis_saturation: 0.9,
        }
    }
}

impl Bounds {
    pub fn new(
        min_cell_count: usize,
        max_cell_count: usize,
        min_axis_count: usize,
        max_axis_saturation: f64,
    ) -> Result<Self, ConfigError> {
        let bounds = Self {
            min_cell_count,
            max_cell_count,
            min_axis_count,
            max_axis_saturation,
        };
        bounds.check()?;
        Ok(bounds)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.min_cell_count < 1 {
            return Err(ConfigError::InvalidBounds(
                "min_cell_count must be at least 1".to_string(),
            ));
        }
        if self.min_cell_count > self.max_cell_count {
            return Err(ConfigError::InvalidBounds(format!(
                "min_cell_count {} exceeds max_cell_count {}",
                self.min_cell_count, self.max_cell_count
            )));
        }
        if !(self.max_axis_saturation > 0.0 && self.max_axis_saturation <= 1.0) {
            return Err(ConfigError::InvalidBounds(format!(
                "max_axis_saturation must be in (0, 1], got {}",
                self.max_axis_saturation
            )));
        }
        Ok(())
    }

    /// Largest axis population allowed for a snapshot of `population` players
    pub fn max_axis_count(&self, population: usize) -> usize {
        (self.max_axis_saturation * population as f64).floor() as usize
    }
}

/// A single violated grid constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    EmptyCell {
        row: usize,
        col: usize,
    },
    BelowMinimum {
        row: usize,
        col: usize,
        count: usize,
        min: usize,
    },
    AboveMaximum {
        row: usize,
        col: usize,
        count: usize,
        max: usize,
    },
    /// Two slots on one axis hold the same kind with the same configuration
    DuplicateFilter {
        axis: Axis,
        first: usize,
        second: usize,
        kind: String,
    },
    /// A row and a column hold the same filter
    SharedAcrossAxes {
        row: usize,
        col: usize,
        kind: String,
    },
    AxisTooNarrow {
        slot: Slot,
        count: usize,
        min: usize,
    },
    AxisSaturated {
        slot: Slot,
        count: usize,
        max: usize,
    },
}

impl Violation {
    /// Cell this violation is about, if any
    pub fn cell(&self) -> Option<(usize, usize)> {
        match self {
            Violation::EmptyCell { row, col }
            | Violation::BelowMinimum { row, col, .. }
            | Violation::AboveMaximum { row, col, .. } => Some((*row, *col)),
            _ => None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::EmptyCell { row, col } => write!(f, "cell ({}, {}) has no players", row, col),
            Violation::BelowMinimum {
                row,
                col,
                count,
                min,
            } => write!(
                f,
                "cell ({}, {}) has {} players, below minimum {}",
                row, col, count, min
            ),
            Violation::AboveMaximum {
                row,
                col,
                count,
                max,
            } => write!(
                f,
                "cell ({}, {}) has {} players, above maximum {}",
                row, col, count, max
            ),
            Violation::DuplicateFilter {
                axis,
                first,
                second,
                kind,
            } => write!(
                f,
                "{} slots {} and {} both hold '{}' with the same configuration",
                axis, first, second, kind
            ),
            Violation::SharedAcrossAxes { row, col, kind } => write!(
                f,
                "row {} and col {} both hold '{}' with the same configuration",
                row, col, kind
            ),
            Violation::AxisTooNarrow { slot, count, min } => write!(
                f,
                "{} matches {} players on its own, below minimum {}",
                slot, count, min
            ),
            Violation::AxisSaturated { slot, count, max } => write!(
                f,
                "{} matches {} players on its own, above saturation limit {}",
                slot, count, max
            ),
        }
    }
}

/// Outcome of validating one assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub counts: CellCounts,
    /// Population of each row filter on its own
    pub row_totals: [usize; GRID_SIZE],
    /// Population of each column filter on its own
    pub col_totals: [usize; GRID_SIZE],
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into the cell counts, or the violations as an error
    pub fn into_result(self) -> Result<CellCounts, GridError> {
        if self.violations.is_empty() {
            Ok(self.counts)
        } else {
            Err(GridError::Invalid {
                violations: self.violations,
            })
        }
    }

    /// Slots blamed for the violations, worst first.
    ///
    /// A bad cell blames its row and column once each. Axis, duplicate and
    /// shared violations blame their slot for a whole line of cells.
    pub fn offending_slots(&self) -> Vec<(Slot, usize)> {
        const LINE: usize = GRID_SIZE * GRID_SIZE;
        let mut blame = [0usize; 2 * GRID_SIZE];
        for violation in &self.violations {
            match violation {
                Violation::EmptyCell { row, col }
                | Violation::BelowMinimum { row, col, .. }
                | Violation::AboveMaximum { row, col, .. } => {
                    blame[Slot::row(*row).flat_index()] += 1;
                    blame[Slot::col(*col).flat_index()] += 1;
                }
                Violation::DuplicateFilter { axis, second, .. } => {
                    let slot = Slot {
                        axis: *axis,
                        index: *second,
                    };
                    blame[slot.flat_index()] += LINE;
                }
                Violation::SharedAcrossAxes { col, .. } => {
                    blame[Slot::col(*col).flat_index()] += LINE;
                }
                Violation::AxisTooNarrow { slot, .. } | Violation::AxisSaturated { slot, .. } => {
                    blame[slot.flat_index()] += LINE;
                }
            }
        }
        let mut slots: Vec<(Slot, usize)> = Slot::all()
            .map(|slot| (slot, blame[slot.flat_index()]))
            .filter(|(_, b)| *b > 0)
            .collect();
        slots.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        slots
    }

    /// Bad cells along `slot`'s line as (too small, too large)
    pub fn cell_pressure(&self, slot: Slot) -> (usize, usize) {
        let mut small = 0;
        let mut large = 0;
        for violation in &self.violations {
            let Some((row, col)) = violation.cell() else {
                continue;
            };
            let on_line = match slot.axis {
                Axis::Row => row == slot.index,
                Axis::Col => col == slot.index,
            };
            if !on_line {
                continue;
            }
            match violation {
                Violation::AboveMaximum { .. } => large += 1,
                _ => small += 1,
            }
        }
        (small, large)
    }
}

/// Evaluate every slot's filter once, rows then columns
pub fn slot_masks(assignment: &GridAssignment, snapshot: &PlayerSnapshot) -> Vec<PlayerMask> {
    assignment
        .slots()
        .map(|(_, filter)| PlayerMask::from_filter(filter, snapshot))
        .collect()
}

/// Check every grid invariant for `assignment` against `snapshot`
pub fn validate(
    assignment: &GridAssignment,
    snapshot: &PlayerSnapshot,
    bounds: &Bounds,
) -> ValidationReport {
    let masks = slot_masks(assignment, snapshot);
    validate_masks(assignment, &masks, snapshot.len(), bounds)
}

/// Validation over precomputed slot masks (rows then columns)
pub fn validate_masks(
    assignment: &GridAssignment,
    masks: &[PlayerMask],
    population: usize,
    bounds: &Bounds,
) -> ValidationReport {
    let mut violations = Vec::new();
    let mut counts: CellCounts = [[0; GRID_SIZE]; GRID_SIZE];
    let mut row_totals = [0; GRID_SIZE];
    let mut col_totals = [0; GRID_SIZE];

    for i in 0..GRID_SIZE {
        row_totals[i] = masks[Slot::row(i).flat_index()].count();
        col_totals[i] = masks[Slot::col(i).flat_index()].count();
    }

    for (row, row_counts) in counts.iter_mut().enumerate() {
        let row_mask = &masks[Slot::row(row).flat_index()];
        for (col, cell) in row_counts.iter_mut().enumerate() {
            let count = row_mask.intersection_count(&masks[Slot::col(col).flat_index()]);
            *cell = count;
            if count == 0 {
                violations.push(Violation::EmptyCell { row, col });
            } else if count < bounds.min_cell_count {
                violations.push(Violation::BelowMinimum {
                    row,
                    col,
                    count,
                    min: bounds.min_cell_count,
                });
            } else if count > bounds.max_cell_count {
                violations.push(Violation::AboveMaximum {
                    row,
                    col,
                    count,
                    max: bounds.max_cell_count,
                });
            }
        }
    }

    for axis in [Axis::Row, Axis::Col] {
        let filters = assignment.axis(axis);
        for first in 0..GRID_SIZE {
            for second in first + 1..GRID_SIZE {
                if filters[first].is_equivalent(&filters[second]) {
                    violations.push(Violation::DuplicateFilter {
                        axis,
                        first,
                        second,
                        kind: filters[first].kind_id(),
                    });
                }
            }
        }
    }

    for (row, row_filter) in assignment.rows.iter().enumerate() {
        for (col, col_filter) in assignment.cols.iter().enumerate() {
            if row_filter.is_equivalent(col_filter) {
                violations.push(Violation::SharedAcrossAxes {
                    row,
                    col,
                    kind: row_filter.kind_id(),
                });
            }
        }
    }

    let max_axis = bounds.max_axis_count(population);
    for slot in Slot::all() {
        let count = masks[slot.flat_index()].count();
        if count < bounds.min_axis_count {
            violations.push(Violation::AxisTooNarrow {
                slot,
                count,
                min: bounds.min_axis_count,
            });
        } else if count > max_axis {
            violations.push(Violation::AxisSaturated {
                slot,
                count,
                max: max_axis,
            });
        }
    }

    ValidationReport {
        counts,
        row_totals,
        col_totals,
        violations,
    }
}
