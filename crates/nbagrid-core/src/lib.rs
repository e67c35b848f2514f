//! Daily NBA grid construction engine
//!
//! A grid is three row filters and three column filters over a player
//! population; every one of the nine cells must be matched by a bounded
//! number of players. This crate provides the filter catalog, dynamic
//! threshold adjustment, usage-history weighting, constraint validation,
//! a seeded search that assembles valid grids, quality scoring for
//! best-of-N selection, and an authoring session for building grids by hand.

pub mod adjust;
pub mod builder;
pub mod config;
pub mod daily;
pub mod error;
pub mod filter;
pub mod grid;
pub mod mask;
pub mod player;
pub mod quality;
pub mod rng;
pub mod session;
pub mod stats;
pub mod store;
pub mod transport;
pub mod validator;
pub mod weights;


pub use adjust::{AdjustOutcome, Adjusted, Adjustment, Inapplicable};
pub use builder::{BuiltGrid, CancelToken, GridBuilder, ScoredGrid, SearchConfig};
pub use config::{CatalogConfig, EngineConfig};
pub use daily::{next_missing_date, DailyGenerator, DailyOutcome, DEFAULT_HORIZON_DAYS};
pub use quality::{GridQuality, QualityConfig};
pub use error::{ConfigError, GridError, Result, StoreError, TransportError};
pub use filter::{
    ChoiceField, Comparison, Filter, FilterCatalog, FilterConfig, FilterDescriptor, Flag,
    StatField, Strictness, ThresholdSpec,
};
pub use grid::{Axis, GridAssignment, Slot, GRID_SIZE};
pub use player::{Player, PlayerSnapshot, PopulationProvider, StaticPopulation};
pub use session::{CellPlayer, GridSession};
pub use stats::GridStats;
pub use store::{CommitOutcome, GridRecord, GridStore, JsonFileGridStore, MemoryGridStore, UsageHistory};
pub use transport::{GridDocument, SlotDocument};
pub use validator::{Bounds, CellCounts, ValidationReport, Violation};
pub use weights::{FilterWeights, UsageRecord, UsageWeighter};
