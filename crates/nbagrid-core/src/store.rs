//! Persistence and usage-history collaborators.
//!
//! The engine only talks to storage through [`GridStore`] and [`UsageHistory`].
//! A commit is a single idempotent create keyed by date: a second commit for
//! a date that already has a grid is refused, never overwritten.

use crate::error::{StoreError, TransportError};
use crate::grid::GridAssignment;
use crate::transport::{self, GridDocument};
use crate::validator::CellCounts;
use crate::weights::UsageRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

/// A committed grid for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRecord {
    pub date: NaiveDate,
    pub title: Option<String>,
    pub document: GridDocument,
    pub counts: CellCounts,
}

impl GridRecord {
    pub fn new(
        date: NaiveDate,
        assignment: &GridAssignment,
        title: Option<String>,
        counts: CellCounts,
    ) -> Result<Self, TransportError> {
        let document = transport::export(assignment, title.as_deref())?;
        Ok(Self {
            date,
            title,
            document,
            counts,
        })
    }

    /// Kind identifiers of all six slots, rows first
    pub fn kinds(&self) -> Vec<String> {
        [&self.document.row, &self.document.col]
            .into_iter()
            .flatten()
            .flat_map(|slots| slots.values().map(|s| s.kind.clone()))
            .collect()
    }

    fn usage(&self) -> Vec<UsageRecord> {
        self.kinds()
            .into_iter()
            .map(|kind| UsageRecord::new(self.date, kind))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    AlreadyExists,
}

/// Read access to the filter usage log
pub trait UsageHistory: Send + Sync {
    /// Usage records dated within `from..=to`, ordered by date
    fn read_usage(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<UsageRecord>, StoreError>;
}

/// Date-keyed storage of committed grids
pub trait GridStore: UsageHistory {
    /// Store `record` unless its date already has a grid; appends usage on success
    fn commit(&self, record: GridRecord) -> Result<CommitOutcome, StoreError>;

    fn exists(&self, date: NaiveDate) -> Result<bool, StoreError>;

    fn get(&self, date: NaiveDate) -> Result<Option<GridRecord>, StoreError>;

    /// All dates with a committed grid, ascending
    fn dates(&self) -> Result<Vec<NaiveDate>, StoreError>;

    /// Backend name for display
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    grids: BTreeMap<NaiveDate, GridRecord>,
    usage: Vec<UsageRecord>,
}

impl StoreData {
    fn commit(&mut self, record: GridRecord) -> CommitOutcome {
        if self.grids.contains_key(&record.date) {
            return CommitOutcome::AlreadyExists;
        }
        self.usage.extend(record.usage());
        self.usage.sort();
        self.grids.insert(record.date, record);
        CommitOutcome::Committed
    }

    fn read_usage(&self, from: NaiveDate, to: NaiveDate) -> Vec<UsageRecord> {
        self.usage
            .iter()
            .filter(|u| u.date >= from && u.date <= to)
            .cloned()
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
}

// ==================== Memory Backend ====================

/// In-memory store for tests and one-shot runs
pub struct MemoryGridStore {
    data: Mutex<StoreData>,
    available: Mutex<bool>,
}

impl MemoryGridStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(StoreData::default()),
            available: Mutex::new(true),
        }
    }

    /// Seed the usage log with records from outside the store
    pub fn with_usage(self, usage: Vec<UsageRecord>) -> Self {
        if let Ok(mut data) = self.data.lock() {
            data.usage.extend(usage);
            data.usage.sort();
        }
        self
    }

    /// Simulate an unreachable backend
    pub fn set_available(&self, available: bool) {
        if let Ok(mut flag) = self.available.lock() {
            *flag = available;
        }
    }

    fn data(&self) -> Result<MutexGuard<'_, StoreData>, StoreError> {
        if !*lock(&self.available)? {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        lock(&self.data)
    }
}

impl Default for MemoryGridStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageHistory for MemoryGridStore {
    fn read_usage(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<UsageRecord>, StoreError> {
        Ok(self.data()?.read_usage(from, to))
    }
}

impl GridStore for MemoryGridStore {
    fn commit(&self, record: GridRecord) -> Result<CommitOutcome, StoreError> {
        let date = record.date;
        let outcome = self.data()?.commit(record);
        log_commit(date, outcome);
        Ok(outcome)
    }

    fn exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.data()?.grids.contains_key(&date))
    }

    fn get(&self, date: NaiveDate) -> Result<Option<GridRecord>, StoreError> {
        Ok(self.data()?.grids.get(&date).cloned())
    }

    fn dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self.data()?.grids.keys().copied().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// ==================== JSON File Backend ====================

/// Store kept in a single JSON file, rewritten through a temp file and rename.
///
/// Reads are served from a cache filled on first use. `commit` rereads the
/// file first, so grids committed by other processes since then are kept and
/// their dates are seen as taken. Writers are not locked against each other:
/// two commits racing between reread and rename can still lose one grid.
pub struct JsonFileGridStore {
    path: PathBuf,
    cache: Mutex<Option<StoreData>>,
}

impl JsonFileGridStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load<'g>(
        &self,
        cache: &'g mut MutexGuard<'_, Option<StoreData>>,
    ) -> Result<&'g mut StoreData, StoreError> {
        if cache.is_none() {
            **cache = Some(self.read_file()?);
        }
        Option::as_mut(&mut **cache)
            .ok_or_else(|| StoreError::Unavailable("store cache empty".to_string()))
    }

    fn read_file(&self) -> Result<StoreData, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreData::default()),
            Err(e) => Err(StoreError::io(
                format!("reading {}", self.path.display()),
                e,
            )),
        }
    }

    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::io(format!("creating {}", parent.display()), e))?;
        }
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| StoreError::io(format!("writing {}", tmp.display()), e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::io(format!("renaming into {}", self.path.display()), e))
    }

    fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> Result<T, StoreError> {
        let mut cache = lock(&self.cache)?;
        let data = self.load(&mut cache)?;
        Ok(f(data))
    }
}

impl UsageHistory for JsonFileGridStore {
    fn read_usage(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<UsageRecord>, StoreError> {
        self.read(|data| data.read_usage(from, to))
    }
}

impl GridStore for JsonFileGridStore {
    fn commit(&self, record: GridRecord) -> Result<CommitOutcome, StoreError> {
        let date = record.date;
        let mut cache = lock(&self.cache)?;
        let mut current = self.read_file()?;
        let outcome = current.commit(record);
        if outcome == CommitOutcome::Committed {
            self.save(&current)?;
        }
        *cache = Some(current);
        log_commit(date, outcome);
        Ok(outcome)
    }

    fn exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        self.read(|data| data.grids.contains_key(&date))
    }

    fn get(&self, date: NaiveDate) -> Result<Option<GridRecord>, StoreError> {
        self.read(|data| data.grids.get(&date).cloned())
    }

    fn dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        self.read(|data| data.grids.keys().copied().collect())
    }

    fn backend_name(&self) -> &'static str {
        "json-file"
    }
}

fn log_commit(date: NaiveDate, outcome: CommitOutcome) {
    match outcome {
        CommitOutcome::Committed => info!(%date, "grid committed"),
        CommitOutcome::AlreadyExists => warn!(%date, "grid already exists, commit skipped"),
    }
}
