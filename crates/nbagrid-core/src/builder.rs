//! Bounded-effort grid search.
//!
//! One build is a loop of full resamples. Each resample draws six distinct
//! kinds by weight, then repairs the worst-blamed slot until the grid is
//! valid or every slot has spent its repair budget. Threshold slots are
//! tuned one step at a time; everything else is replaced by an unused kind.

use crate::adjust::{self, AdjustOutcome, Adjustment};
use crate::error::{ConfigError, GridError};
use crate::filter::{Filter, FilterCatalog, MIN_CATALOG_KINDS};
use crate::grid::{GridAssignment, Slot, GRID_SIZE};
use crate::mask::PlayerMask;
use crate::player::PlayerSnapshot;
use crate::quality::{GridQuality, QualityConfig};
use crate::rng::{seeded, GridRng};
use crate::validator::{validate_masks, Bounds, CellCounts, ValidationReport, Violation};
use crate::weights::{draw_kinds, FilterWeights};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Effort budget for one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Full resamples of all six slots before giving up
    pub max_full_resamples: usize,
    /// Repairs allowed per slot within one resample
    pub max_repairs_per_slot: usize,
    /// Wall-clock limit in milliseconds, checked between repairs
    pub deadline_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_full_resamples: 20,
            max_repairs_per_slot: 20,
            deadline_ms: None,
        }
    }
}

impl SearchConfig {
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_full_resamples == 0 {
            return Err(ConfigError::InvalidSetting(
                "max_full_resamples must be at least 1".to_string(),
            ));
        }
        if self.max_repairs_per_slot == 0 {
            return Err(ConfigError::InvalidSetting(
                "max_repairs_per_slot must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

/// Cooperative cancellation flag shared with a running build
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A validated grid and how much effort it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltGrid {
    pub assignment: GridAssignment,
    pub counts: CellCounts,
    pub seed: u64,
    pub full_resamples: usize,
    pub repairs: usize,
}

/// The best of several builds with its quality score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredGrid {
    pub built: BuiltGrid,
    pub quality: GridQuality,
    /// Builds run, including exhausted ones
    pub attempts: usize,
}

/// Assembles valid grids from a catalog and a player snapshot
pub struct GridBuilder<'a> {
    catalog: &'a FilterCatalog,
    snapshot: &'a PlayerSnapshot,
    bounds: Bounds,
    config: SearchConfig,
    weights: FilterWeights,
    cancel: Option<CancelToken>,
}

impl<'a> GridBuilder<'a> {
    /// Create a builder with default bounds, budget and uniform weights
    pub fn new(catalog: &'a FilterCatalog, snapshot: &'a PlayerSnapshot) -> Self {
        Self {
            catalog,
            snapshot,
            bounds: Bounds::default(),
            config: SearchConfig::default(),
            weights: FilterWeights::default(),
            cancel: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_weights(mut self, weights: FilterWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Search for a valid grid; identical inputs and seed give identical output
    pub fn build(&self, seed: u64) -> Result<BuiltGrid, GridError> {
        if self.catalog.len() < MIN_CATALOG_KINDS {
            return Err(ConfigError::CatalogTooSmall {
                needed: MIN_CATALOG_KINDS,
                found: self.catalog.len(),
            }
            .into());
        }
        self.bounds.check()?;
        self.config.check()?;

        let mut search = Search {
            builder: self,
            rng: seeded(seed),
            masks: HashMap::new(),
            started: Instant::now(),
            repairs: 0,
        };

        for resample in 0..self.config.max_full_resamples {
            search.check_interrupt(resample)?;
            let mut assignment = search.draw_assignment()?;
            let mut repairs_per_slot = [0usize; 2 * GRID_SIZE];
            let mut last_step: [Option<Adjustment>; 2 * GRID_SIZE] = [None; 2 * GRID_SIZE];

            loop {
                search.check_interrupt(resample)?;
                let report = search.validate(&assignment);
                if report.is_valid() {
                    info!(
                        seed,
                        full_resamples = resample,
                        repairs = search.repairs,
                        kinds = ?assignment.kind_ids(),
                        "grid built"
                    );
                    return Ok(BuiltGrid {
                        assignment,
                        counts: report.counts,
                        seed,
                        full_resamples: resample,
                        repairs: search.repairs,
                    });
                }

                let candidates: Vec<Slot> = report
                    .offending_slots()
                    .into_iter()
                    .map(|(slot, _)| slot)
                    .filter(|slot| repairs_per_slot[slot.flat_index()] < self.config.max_repairs_per_slot)
                    .collect();
                if candidates.is_empty() {
                    debug!(resample, violations = report.violations.len(), "repair budget spent, resampling");
                    break;
                }

                let mut changed = false;
                for slot in candidates {
                    let i = slot.flat_index();
                    repairs_per_slot[i] += 1;
                    search.repairs += 1;
                    if search.repair(&mut assignment, slot, &report, &mut last_step[i])? {
                        changed = true;
                        break;
                    }
                }
                if !changed {
                    debug!(resample, "no offending slot could change, resampling");
                    break;
                }
            }
        }

        warn!(
            seed,
            full_resamples = self.config.max_full_resamples,
            repairs = search.repairs,
            "grid search exhausted"
        );
        Err(GridError::Exhausted {
            full_resamples: self.config.max_full_resamples,
            repairs: search.repairs,
        })
    }

    /// Run up to `quality.attempts` builds and keep the highest scoring grid.
    ///
    /// Attempt `i` uses seed `seed + i` and the loop stops at the first grid
    /// reaching `quality.threshold`. Exhausted attempts are skipped; the error
    /// is returned only when every attempt was exhausted. Cancellation ends
    /// the loop immediately.
    pub fn build_best(&self, seed: u64, quality: &QualityConfig) -> Result<ScoredGrid, GridError> {
        quality.check()?;

        let mut best: Option<(BuiltGrid, GridQuality)> = None;
        let mut last_error = None;
        let mut runs = 0;
        for attempt in 0..quality.attempts {
            runs += 1;
            let attempt_seed = seed.wrapping_add(attempt as u64);
            let built = match self.build(attempt_seed) {
                Ok(built) => built,
                Err(e @ GridError::Exhausted { .. }) => {
                    debug!(attempt, seed = attempt_seed, "attempt exhausted");
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let score = GridQuality::evaluate(&built.assignment, &built.counts, &self.bounds);
            debug!(attempt, seed = attempt_seed, score = score.score(), "scored grid");

            let accepted = quality.accepts(&score);
            if best.as_ref().map_or(true, |(_, q)| score.score() > q.score()) {
                best = Some((built, score));
            }
            if accepted {
                break;
            }
        }

        match best {
            Some((built, score)) => {
                info!(seed = built.seed, attempts = runs, score = score.score(), "kept best grid");
                Ok(ScoredGrid {
                    built,
                    quality: score,
                    attempts: runs,
                })
            }
            None => Err(last_error.unwrap_or(GridError::Exhausted {
                full_resamples: self.config.max_full_resamples,
                repairs: 0,
            })),
        }
    }
}

/// Mutable state of one build
struct Search<'b, 'a> {
    builder: &'b GridBuilder<'a>,
    rng: GridRng,
    masks: HashMap<Filter, PlayerMask>,
    started: Instant,
    repairs: usize,
}

impl Search<'_, '_> {
    fn check_interrupt(&self, resample: usize) -> Result<(), GridError> {
        let cancelled = self
            .builder
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled);
        let expired = self
            .builder
            .config
            .deadline()
            .is_some_and(|limit| self.started.elapsed() >= limit);
        if cancelled || expired {
            warn!(resample, cancelled, expired, "grid search interrupted");
            return Err(GridError::Cancelled {
                full_resamples: resample,
            });
        }
        Ok(())
    }

    fn draw_assignment(&mut self) -> Result<GridAssignment, GridError> {
        let catalog = self.builder.catalog;
        let kinds = draw_kinds(
            catalog,
            &self.builder.weights,
            2 * GRID_SIZE,
            &[],
            &mut self.rng,
        );
        let filters = kinds
            .iter()
            .map(|kind| catalog.random_instance(kind, &mut self.rng))
            .collect::<Result<Vec<_>, _>>()?;
        match <[Filter; 2 * GRID_SIZE]>::try_from(filters) {
            Ok([r0, r1, r2, c0, c1, c2]) => {
                let assignment = GridAssignment::new([r0, r1, r2], [c0, c1, c2]);
                debug!(kinds = ?assignment.kind_ids(), "drew candidate grid");
                Ok(assignment)
            }
            Err(filters) => Err(ConfigError::CatalogTooSmall {
                needed: MIN_CATALOG_KINDS,
                found: filters.len(),
            }
            .into()),
        }
    }

    fn mask(&mut self, filter: &Filter) -> PlayerMask {
        let snapshot = self.builder.snapshot;
        self.masks
            .entry(filter.clone())
            .or_insert_with(|| PlayerMask::from_filter(filter, snapshot))
            .clone()
    }

    fn validate(&mut self, assignment: &GridAssignment) -> ValidationReport {
        let masks: Vec<PlayerMask> = assignment
            .slots()
            .map(|(_, filter)| self.mask(filter))
            .collect();
        validate_masks(
            assignment,
            &masks,
            self.builder.snapshot.len(),
            &self.builder.bounds,
        )
    }

    fn repair(
        &mut self,
        assignment: &mut GridAssignment,
        slot: Slot,
        report: &ValidationReport,
        last_step: &mut Option<Adjustment>,
    ) -> Result<bool, GridError> {
        let Some(current) = assignment.get(slot).cloned() else {
            return Ok(false);
        };

        if let (Filter::Threshold(_), Some(direction)) = (&current, tuning_direction(report, slot)) {
            let reverses = matches!(
                (*last_step, direction),
                (Some(Adjustment::Narrow), Adjustment::Widen)
                    | (Some(Adjustment::Widen), Adjustment::Narrow)
            );
            if reverses {
                debug!(%slot, kind = %current.kind_id(), "tuning oscillates, replacing filter");
            } else {
                let outcome = match direction {
                    Adjustment::Narrow => adjust::narrow(&current, self.builder.snapshot),
                    _ => adjust::widen(&current, self.builder.snapshot),
                };
                match outcome {
                    AdjustOutcome::Applied(adjusted) => {
                        debug!(%slot, %direction, label = %adjusted.label, population = adjusted.population, "tuned filter");
                        assignment.set(slot, adjusted.filter);
                        *last_step = Some(direction);
                        return Ok(true);
                    }
                    AdjustOutcome::Inapplicable(reason) => {
                        debug!(%slot, %direction, %reason, "tuning inapplicable, replacing filter");
                    }
                }
            }
        }

        let used = assignment.kind_ids();
        let catalog = self.builder.catalog;
        let replacement = match draw_kinds(catalog, &self.builder.weights, 1, &used, &mut self.rng)
            .into_iter()
            .next()
        {
            Some(kind) => catalog.random_instance(&kind, &mut self.rng)?,
            None => catalog.random_instance(&current.kind_id(), &mut self.rng)?,
        };
        if replacement == current {
            return Ok(false);
        }
        debug!(%slot, from = %current, to = %replacement, "replaced filter");
        assignment.set(slot, replacement);
        *last_step = None;
        Ok(true)
    }
}

/// Narrow when every signal on the slot says "too many", widen when every
/// signal says "too few", otherwise no direction.
fn tuning_direction(report: &ValidationReport, slot: Slot) -> Option<Adjustment> {
    let (mut small, mut large) = report.cell_pressure(slot);
    for violation in &report.violations {
        match violation {
            Violation::AxisTooNarrow { slot: s, .. } if *s == slot => small += 1,
            Violation::AxisSaturated { slot: s, .. } if *s == slot => large += 1,
            Violation::DuplicateFilter { .. } | Violation::SharedAcrossAxes { .. } => {
                if blames_identity(violation, slot) {
                    return None;
                }
            }
            _ => {}
        }
    }
    match (small, large) {
        (0, l) if l > 0 => Some(Adjustment::Narrow),
        (s, 0) if s > 0 => Some(Adjustment::Widen),
        _ => None,
    }
}

fn blames_identity(violation: &Violation, slot: Slot) -> bool {
    match violation {
        Violation::DuplicateFilter { axis, second, .. } => slot.axis == *axis && slot.index == *second,
        Violation::SharedAcrossAxes { col, .. } => slot == Slot::col(*col),
        _ => false,
    }
}
