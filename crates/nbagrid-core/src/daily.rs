//! Scheduled generation of the daily grid.
//!
//! One run targets one date: skip if the store already holds a grid for it,
//! otherwise query the population, weight filter kinds by recent usage,
//! build the best of `quality.attempts` grids, and commit it when it reaches
//! `quality.threshold`. A batch runs consecutive dates in order, so each
//! committed grid weighs on the next date's draw.

use crate::builder::{BuiltGrid, CancelToken, GridBuilder};
use crate::quality::GridQuality;
use crate::config::EngineConfig;
use crate::error::{ConfigError, GridError, StoreError};
use crate::filter::FilterCatalog;
use crate::player::PopulationProvider;
use crate::store::{CommitOutcome, GridRecord, GridStore};
use chrono::{Days, NaiveDate};
use std::borrow::Cow;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Days searched ahead for a date without a grid
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Title given to generated grids
pub fn default_title(date: NaiveDate) -> String {
    format!("Grid for {}", date)
}

#[derive(Debug, Clone, PartialEq)]
pub enum DailyOutcome {
    /// The date already had a grid; nothing was built
    Skipped(NaiveDate),
    /// A new grid was built and committed
    Generated {
        record: GridRecord,
        built: BuiltGrid,
        quality: GridQuality,
    },
    /// The best grid scored below the quality threshold; nothing was committed
    Rejected { date: NaiveDate, quality: GridQuality },
    /// Every build attempt for the date ran out of budget (batches only)
    Exhausted(NaiveDate),
}

impl DailyOutcome {
    pub fn date(&self) -> NaiveDate {
        match self {
            DailyOutcome::Skipped(date) | DailyOutcome::Exhausted(date) => *date,
            DailyOutcome::Generated { record, .. } => record.date,
            DailyOutcome::Rejected { date, .. } => *date,
        }
    }

    pub fn record(&self) -> Option<&GridRecord> {
        match self {
            DailyOutcome::Generated { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Builds and commits grids for target dates
pub struct DailyGenerator<'a> {
    population: &'a dyn PopulationProvider,
    store: &'a dyn GridStore,
    config: EngineConfig,
    catalog: Option<FilterCatalog>,
    cancel: Option<CancelToken>,
}

impl<'a> DailyGenerator<'a> {
    /// Create a new generator with the default engine configuration
    pub fn new(population: &'a dyn PopulationProvider, store: &'a dyn GridStore) -> Self {
        Self {
            population,
            store,
            config: EngineConfig::default(),
            catalog: None,
            cancel: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a fixed catalog instead of deriving the standard one from each snapshot
    pub fn with_catalog(mut self, catalog: FilterCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate the grid for `date` unless one exists
    pub fn run(&self, date: NaiveDate, seed: u64) -> Result<DailyOutcome, GridError> {
        if self.store.exists(date)? {
            info!(%date, backend = self.store.backend_name(), "grid already exists, skipping");
            return Ok(DailyOutcome::Skipped(date));
        }

        let snapshot = self.population.query_population(date)?;
        let catalog = match &self.catalog {
            Some(catalog) => Cow::Borrowed(catalog),
            None => Cow::Owned(self.config.catalog.build(&snapshot)?),
        };

        let weighter = self.config.weighting;
        let window_end = date.pred_opt().ok_or_else(|| {
            ConfigError::InvalidSetting(format!("no day precedes {}", date))
        })?;
        let usage = self
            .store
            .read_usage(weighter.window_start(date)?, window_end)?;
        let weights = weighter.compute_weights(&usage, date);
        debug!(
            %date,
            players = snapshot.len(),
            kinds = catalog.len(),
            recent_uses = usage.len(),
            "starting daily build"
        );

        let mut builder = GridBuilder::new(&catalog, &snapshot)
            .with_bounds(self.config.bounds)
            .with_config(self.config.search.clone())
            .with_weights(weights);
        if let Some(cancel) = &self.cancel {
            builder = builder.with_cancel(cancel.clone());
        }
        let scored = builder.build_best(seed, &self.config.quality)?;
        let (built, quality) = (scored.built, scored.quality);
        if !self.config.quality.accepts(&quality) {
            warn!(
                %date,
                score = quality.score(),
                threshold = self.config.quality.threshold,
                "best grid below quality threshold"
            );
            return Ok(DailyOutcome::Rejected { date, quality });
        }

        let record = GridRecord::new(date, &built.assignment, Some(default_title(date)), built.counts)?;
        match self.store.commit(record.clone())? {
            CommitOutcome::Committed => {
                info!(%date, seed = built.seed, score = quality.score(), kinds = ?record.kinds(), "daily grid committed");
                Ok(DailyOutcome::Generated {
                    record,
                    built,
                    quality,
                })
            }
            CommitOutcome::AlreadyExists => {
                warn!(%date, "grid appeared while building, discarding");
                Ok(DailyOutcome::Skipped(date))
            }
        }
    }

    /// Run `count` consecutive dates from `start`.
    ///
    /// Date `i` uses seed `seed + i * quality.attempts` so attempts never share
    /// a seed. An exhausted date is reported and the batch moves on; any other
    /// error, cancellation included, ends the batch.
    pub fn run_batch(
        &self,
        start: NaiveDate,
        count: usize,
        seed: u64,
    ) -> Result<Vec<DailyOutcome>, GridError> {
        let stride = self.config.quality.attempts as u64;
        let mut outcomes = Vec::with_capacity(count);
        for i in 0..count {
            let date = start.checked_add_days(Days::new(i as u64)).ok_or_else(|| {
                ConfigError::InvalidSetting(format!("{} days after {} leaves the calendar", i, start))
            })?;
            let date_seed = seed.wrapping_add((i as u64).wrapping_mul(stride));
            match self.run(date, date_seed) {
                Ok(outcome) => outcomes.push(outcome),
                Err(GridError::Exhausted { full_resamples, repairs }) => {
                    warn!(%date, full_resamples, repairs, "no grid for date");
                    outcomes.push(DailyOutcome::Exhausted(date));
                }
                Err(e) => return Err(e),
            }
        }
        let generated = outcomes.iter().filter(|o| o.record().is_some()).count();
        info!(%start, count, generated, "batch finished");
        Ok(outcomes)
    }
}

/// First date on or after `from` without a committed grid, looking `horizon_days` ahead
pub fn next_missing_date(
    store: &dyn GridStore,
    from: NaiveDate,
    horizon_days: u32,
) -> Result<Option<NaiveDate>, StoreError> {
    let taken: BTreeSet<NaiveDate> = store.dates()?.into_iter().collect();
    Ok(from
        .iter_days()
        .take(horizon_days as usize)
        .find(|date| !taken.contains(date)))
}
