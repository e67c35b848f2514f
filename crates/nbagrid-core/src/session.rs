//! Interactive grid authoring.
//!
//! A `GridSession` holds a possibly incomplete grid. Every mutation is
//! applied exactly as requested; nothing is repaired behind the caller's
//! back, so call [`GridSession::validate`] after changes.

use crate::adjust::{self, AdjustOutcome, Adjustment};
use crate::error::{GridError, Result};
use crate::filter::{Filter, FilterCatalog, FilterConfig};
use crate::grid::{GridAssignment, Slot, GRID_SIZE};
use crate::mask::PlayerMask;
use crate::player::{Player, PlayerSnapshot};
use crate::rng::{fresh_seed, seeded, GridRng};
use crate::stats::GridStats;
use crate::transport::{self, GridDocument};
use crate::validator::{self, Bounds, CellCounts, ValidationReport};
use tracing::debug;

/// A player in a cell, with the values that put them there
#[derive(Debug, Clone, PartialEq)]
pub struct CellPlayer<'a> {
    pub player: &'a Player,
    pub row_detail: String,
    pub col_detail: String,
}

pub struct GridSession<'a> {
    catalog: &'a FilterCatalog,
    snapshot: &'a PlayerSnapshot,
    bounds: Bounds,
    slots: [Option<Filter>; 2 * GRID_SIZE],
    title: Option<String>,
    rng: GridRng,
}

impl<'a> GridSession<'a> {
    /// Create an empty session
    pub fn new(catalog: &'a FilterCatalog, snapshot: &'a PlayerSnapshot) -> Self {
        Self {
            catalog,
            snapshot,
            bounds: Bounds::default(),
            slots: Default::default(),
            title: None,
            rng: seeded(fresh_seed()),
        }
    }

    /// Create a session pre-filled with a complete assignment
    pub fn from_assignment(
        catalog: &'a FilterCatalog,
        snapshot: &'a PlayerSnapshot,
        assignment: GridAssignment,
    ) -> Self {
        let mut session = Self::new(catalog, snapshot);
        session.fill(assignment);
        session
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Fix the seed used by randomize
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = seeded(seed);
        self
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) -> Result<()> {
        transport::check_title(title.as_deref())?;
        self.title = title;
        Ok(())
    }

    pub fn get(&self, slot: Slot) -> Option<&Filter> {
        self.slots.get(slot.flat_index()).and_then(Option::as_ref)
    }

    /// Put `filter` in `slot`, bypassing weighting
    pub fn assign(&mut self, slot: Slot, filter: Filter) -> Result<()> {
        if !slot.is_valid() {
            return Err(GridError::SlotOutOfRange(slot));
        }
        debug!(%slot, label = %filter.label(), "assigned filter");
        self.slots[slot.flat_index()] = Some(filter);
        Ok(())
    }

    /// Instantiate `kind` through the catalog and put it in `slot`
    pub fn assign_kind(&mut self, slot: Slot, kind: &str, config: &FilterConfig) -> Result<&Filter> {
        let filter = self.catalog.instantiate(kind, config)?;
        self.assign(slot, filter)?;
        self.get(slot).ok_or(GridError::SlotOutOfRange(slot))
    }

    pub fn clear(&mut self, slot: Slot) {
        if let Some(entry) = self.slots.get_mut(slot.flat_index()) {
            *entry = None;
        }
    }

    pub fn missing_slots(&self) -> Vec<Slot> {
        Slot::all().filter(|s| self.get(*s).is_none()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The complete assignment, or the list of empty slots
    pub fn assignment(&self) -> Result<GridAssignment> {
        let missing = self.missing_slots();
        let filters: Vec<Filter> = self.slots.iter().flatten().cloned().collect();
        match <[Filter; 2 * GRID_SIZE]>::try_from(filters) {
            Ok([r0, r1, r2, c0, c1, c2]) if missing.is_empty() => {
                Ok(GridAssignment::new([r0, r1, r2], [c0, c1, c2]))
            }
            _ => Err(GridError::IncompleteGrid { missing }),
        }
    }

    /// Run the validator over the complete grid
    pub fn validate(&self) -> Result<ValidationReport> {
        let assignment = self.assignment()?;
        Ok(validator::validate(&assignment, self.snapshot, &self.bounds))
    }

    /// Narrow, widen or randomize the filter in `slot`
    pub fn adjust(&mut self, slot: Slot, adjustment: Adjustment) -> Result<AdjustOutcome> {
        let filter = self
            .get(slot)
            .cloned()
            .ok_or_else(|| GridError::IncompleteGrid {
                missing: vec![slot],
            })?;
        let outcome = adjust::adjust(
            &filter,
            adjustment,
            self.catalog,
            self.snapshot,
            &mut self.rng,
        )?;
        if let AdjustOutcome::Applied(adjusted) = &outcome {
            self.slots[slot.flat_index()] = Some(adjusted.filter.clone());
        }
        Ok(outcome)
    }

    /// Number of players matching the filter in `slot` on its own
    pub fn slot_population(&self, slot: Slot) -> Option<usize> {
        self.get(slot)
            .map(|filter| self.catalog.population_count(filter, self.snapshot))
    }

    /// Players satisfying both the row and the column filter of a cell
    pub fn cell_players(&self, row: usize, col: usize) -> Result<Vec<CellPlayer<'a>>> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return Err(GridError::CellOutOfRange { row, col });
        }
        let (row_slot, col_slot) = (Slot::row(row), Slot::col(col));
        let missing: Vec<Slot> = [row_slot, col_slot]
            .into_iter()
            .filter(|s| self.get(*s).is_none())
            .collect();
        let (Some(row_filter), Some(col_filter)) = (self.get(row_slot), self.get(col_slot)) else {
            return Err(GridError::IncompleteGrid { missing });
        };

        let snapshot: &'a PlayerSnapshot = self.snapshot;
        let cell = PlayerMask::from_filter(row_filter, snapshot)
            .intersect(&PlayerMask::from_filter(col_filter, snapshot));
        Ok(cell
            .indices()
            .filter_map(|i| snapshot.get(i))
            .map(|player| CellPlayer {
                player,
                row_detail: row_filter.describe_player(player),
                col_detail: col_filter.describe_player(player),
            })
            .collect())
    }

    /// Cell counts over the filled slots; cells with an empty side count 0
    pub fn cell_counts(&self) -> CellCounts {
        let masks: Vec<Option<PlayerMask>> = Slot::all()
            .map(|slot| {
                self.get(slot)
                    .map(|filter| PlayerMask::from_filter(filter, self.snapshot))
            })
            .collect();
        let mut counts: CellCounts = [[0; GRID_SIZE]; GRID_SIZE];
        for (row, row_counts) in counts.iter_mut().enumerate() {
            for (col, cell) in row_counts.iter_mut().enumerate() {
                if let (Some(r), Some(c)) = (
                    &masks[Slot::row(row).flat_index()],
                    &masks[Slot::col(col).flat_index()],
                ) {
                    *cell = r.intersection_count(c);
                }
            }
        }
        counts
    }

    pub fn stats(&self) -> GridStats {
        GridStats::from_counts(self.cell_counts())
    }

    /// Transport form of the complete grid and title
    pub fn export(&self) -> Result<GridDocument> {
        let assignment = self.assignment()?;
        Ok(transport::export(&assignment, self.title())?)
    }

    /// Replace the whole grid from a document; nothing changes on error
    pub fn import(&mut self, document: &GridDocument) -> Result<()> {
        let (assignment, title) = transport::import(document, self.catalog)?;
        self.fill(assignment);
        self.title = title;
        Ok(())
    }

    fn fill(&mut self, assignment: GridAssignment) {
        let GridAssignment { rows, cols } = assignment;
        for (i, filter) in rows.into_iter().chain(cols).enumerate() {
            self.slots[i] = Some(filter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::Inapplicable;
    use crate::error::TransportError;
    use crate::filter::{ChoiceField, Comparison, FilterDescriptor, Flag, StatField, ThresholdSpec};

    fn ppg() -> ThresholdSpec {
        ThresholdSpec::new(StatField::CareerPpg, Comparison::AtLeast, 10, 28, 2, "PPG:")
    }

    fn snapshot() -> PlayerSnapshot {
        PlayerSnapshot::new(
            (0..60u64)
                .map(|i| Player {
                    position: ["Guard", "Forward", "Center"][(i % 3) as usize].to_string(),
                    career_ppg: (i % 30) as f32,
                    is_all_star: i % 2 == 0,
                    is_champion: i % 5 == 0,
                    is_all_nba: i % 4 == 0,
                    ..Player::new(i, format!("Player {}", i))
                })
                .collect(),
        )
    }

    fn catalog() -> FilterCatalog {
        FilterCatalog::new(vec![
            FilterDescriptor::flag(Flag::AllStar),
            FilterDescriptor::flag(Flag::NbaChampion),
            FilterDescriptor::flag(Flag::AllNba),
            FilterDescriptor::choice(
                ChoiceField::Position,
                vec!["Guard".into(), "Forward".into(), "Center".into()],
            ),
            FilterDescriptor::threshold(ppg()),
        ])
        .unwrap()
    }

    fn fill(session: &mut GridSession<'_>) {
        session.assign(Slot::row(0), Filter::Flag(Flag::AllStar)).unwrap();
        session.assign(Slot::row(1), Filter::Flag(Flag::NbaChampion)).unwrap();
        session.assign(Slot::row(2), Filter::Flag(Flag::AllNba)).unwrap();
        session
            .assign_kind(Slot::col(0), "position", &FilterConfig::Choice("Guard".into()))
            .unwrap();
        session
            .assign_kind(Slot::col(1), "position", &FilterConfig::Choice("Center".into()))
            .unwrap();
        session
            .assign_kind(Slot::col(2), "career_ppg_at_least", &FilterConfig::Value(20))
            .unwrap();
    }

    #[test]
    fn test_incomplete_grid() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot);
        session.assign(Slot::row(0), Filter::Flag(Flag::AllStar)).unwrap();
        match session.validate() {
            Err(GridError::IncompleteGrid { missing }) => assert_eq!(missing.len(), 5),
            other => panic!("unexpected {:?}", other),
        }
        assert!(session.export().is_err());
    }

    #[test]
    fn test_assign_and_validate_verbatim() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot)
            .with_bounds(Bounds::new(1, 40, 1, 1.0).unwrap());
        fill(&mut session);
        assert!(session.is_complete());
        let report = session.validate().unwrap();
        assert!(report.is_valid(), "{:?}", report.violations);

        // A duplicate is stored as given and only reported on validation
        session.assign(Slot::col(1), Filter::choice(ChoiceField::Position, "Guard")).unwrap();
        assert_eq!(session.get(Slot::col(1)), session.get(Slot::col(0)));
        assert!(!session.validate().unwrap().is_valid());
    }

    #[test]
    fn test_assign_kind_rejects_bad_config() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot);
        let err = session
            .assign_kind(Slot::col(2), "career_ppg_at_least", &FilterConfig::Value(21))
            .unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
        assert!(session.get(Slot::col(2)).is_none());
        assert!(matches!(
            session.assign(Slot { axis: crate::grid::Axis::Row, index: 5 }, Filter::Flag(Flag::AllStar)),
            Err(GridError::SlotOutOfRange(_))
        ));
    }

    #[test]
    fn test_adjust_slot() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot).with_seed(4);
        fill(&mut session);

        let outcome = session.adjust(Slot::col(2), Adjustment::Narrow).unwrap();
        let adjusted = outcome.applied().unwrap();
        assert_eq!(adjusted.label, "PPG: 22+");
        assert_eq!(session.get(Slot::col(2)).unwrap().config(), FilterConfig::Value(22));

        assert_eq!(
            session.adjust(Slot::row(0), Adjustment::Widen).unwrap(),
            AdjustOutcome::Inapplicable(Inapplicable::Static)
        );

        let before = session.get(Slot::col(0)).cloned();
        session.adjust(Slot::col(0), Adjustment::Randomize).unwrap();
        assert_ne!(session.get(Slot::col(0)).cloned(), before);

        session.clear(Slot::row(1));
        assert!(matches!(
            session.adjust(Slot::row(1), Adjustment::Narrow),
            Err(GridError::IncompleteGrid { .. })
        ));
    }

    #[test]
    fn test_cell_players() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot);
        fill(&mut session);

        // All-Star (even) and ppg >= 20: i % 30 in 20..30, even
        let players = session.cell_players(0, 2).unwrap();
        assert_eq!(players.len(), 10);
        assert!(players.iter().all(|p| p.player.is_all_star));
        assert_eq!(players[0].row_detail, "All-Star: yes");
        assert!(players[0].col_detail.starts_with("PPG: 2"));

        assert!(matches!(
            session.cell_players(3, 0),
            Err(GridError::CellOutOfRange { row: 3, col: 0 })
        ));
        session.clear(Slot::col(2));
        match session.cell_players(0, 2) {
            Err(GridError::IncompleteGrid { missing }) => assert_eq!(missing, vec![Slot::col(2)]),
            other => panic!("unexpected {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_stats_over_filled_cells() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot);
        fill(&mut session);
        let full = session.stats();
        assert_eq!(full.cells[0][2], 10);

        session.clear(Slot::row(2));
        let partial = session.stats();
        assert_eq!(partial.cells[2], [0, 0, 0]);
        assert_eq!(partial.cells[0], full.cells[0]);
    }

    #[test]
    fn test_export_import() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot);
        fill(&mut session);
        session.set_title(Some("Guards and scorers".into())).unwrap();
        let doc = session.export().unwrap();

        let mut other = GridSession::new(&catalog, &snapshot);
        other.import(&doc).unwrap();
        assert_eq!(other.assignment().unwrap(), session.assignment().unwrap());
        assert_eq!(other.title(), Some("Guards and scorers"));

        let mut broken = doc.clone();
        broken.row = None;
        assert!(other.import(&broken).is_err());
        assert_eq!(other.assignment().unwrap(), session.assignment().unwrap());

        assert!(session.set_title(Some("x".repeat(41))).is_err());
    }

    #[test]
    fn test_set_title_length() {
        let catalog = catalog();
        let snapshot = snapshot();
        let mut session = GridSession::new(&catalog, &snapshot);
        session.set_title(Some("é".repeat(40))).unwrap();
        assert_eq!(session.title().map(|t| t.chars().count()), Some(40));

        let err = session.set_title(Some("y".repeat(41))).unwrap_err();
        assert!(matches!(
            err,
            GridError::Transport(TransportError::TitleTooLong { len: 41, max: 40 })
        ));
        assert_eq!(session.title(), Some("é".repeat(40).as_str()));

        session.set_title(None).unwrap();
        assert_eq!(session.title(), None);
    }
}
