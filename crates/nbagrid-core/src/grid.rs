use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid dimension along each axis
pub const GRID_SIZE: usize = 3;

/// Row or column role of a filter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Col,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::Row => Axis::Col,
            Axis::Col => Axis::Row,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Col => "col",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the six filter positions in a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub axis: Axis,
    pub index: usize,
}

impl Slot {
    pub fn row(index: usize) -> Self {
        Self {
            axis: Axis::Row,
            index,
        }
    }

    pub fn col(index: usize) -> Self {
        Self {
            axis: Axis::Col,
            index,
        }
    }

    /// All six slots, rows first
    pub fn all() -> impl Iterator<Item = Slot> {
        (0..GRID_SIZE)
            .map(Slot::row)
            .chain((0..GRID_SIZE).map(Slot::col))
    }

    /// Position in a flat rows-then-cols array
    pub fn flat_index(self) -> usize {
        match self.axis {
            Axis::Row => self.index,
            Axis::Col => GRID_SIZE + self.index,
        }
    }

    pub fn is_valid(self) -> bool {
        self.index < GRID_SIZE
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.axis, self.index)
    }
}

impl std::str::FromStr for Slot {
    type Err = String;

    /// Parse `row:N` or `col:N`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (axis, index) = s
            .split_once(':')
            .ok_or_else(|| format!("expected row:N or col:N, got '{}'", s))?;
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| format!("invalid slot index '{}'", index))?;
        let slot = match axis.trim().to_ascii_lowercase().as_str() {
            "row" => Slot::row(index),
            "col" | "column" => Slot::col(index),
            other => return Err(format!("unknown axis '{}'", other)),
        };
        if !slot.is_valid() {
            return Err(format!("slot index {} is outside 0..{}", index, GRID_SIZE));
        }
        Ok(slot)
    }
}

/// A complete 3x3 assignment: three row filters and three column filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridAssignment {
    pub rows: [Filter; GRID_SIZE],
    pub cols: [Filter; GRID_SIZE],
}

impl GridAssignment {
    pub fn new(rows: [Filter; GRID_SIZE], cols: [Filter; GRID_SIZE]) -> Self {
        Self { rows, cols }
    }

    pub fn axis(&self, axis: Axis) -> &[Filter; GRID_SIZE] {
        match axis {
            Axis::Row => &self.rows,
            Axis::Col => &self.cols,
        }
    }

    /// Filter in the given slot, `None` if the index is out of range
    pub fn get(&self, slot: Slot) -> Option<&Filter> {
        self.axis(slot.axis).get(slot.index)
    }

    pub fn set(&mut self, slot: Slot, filter: Filter) {
        let filters = match slot.axis {
            Axis::Row => &mut self.rows,
            Axis::Col => &mut self.cols,
        };
        if let Some(target) = filters.get_mut(slot.index) {
            *target = filter;
        }
    }

    /// Slots paired with their filters, rows first
    pub fn slots(&self) -> impl Iterator<Item = (Slot, &Filter)> {
        Slot::all().zip(self.rows.iter().chain(self.cols.iter()))
    }

    pub fn kind_ids(&self) -> Vec<String> {
        self.slots().map(|(_, f)| f.kind_id()).collect()
    }
}
