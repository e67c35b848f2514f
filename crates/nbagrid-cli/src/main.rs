//! nbagrid - build, inspect and author daily NBA grids

mod population;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use nbagrid_core::adjust::AdjustOutcome;
use nbagrid_core::filter::KindSpec;
use nbagrid_core::rng::fresh_seed;
use nbagrid_core::{
    next_missing_date, Adjustment, CommitOutcome, DailyGenerator, DailyOutcome, EngineConfig,
    Filter, FilterCatalog, GridDocument, GridRecord, GridSession, GridStore, JsonFileGridStore,
    PlayerSnapshot, PopulationProvider, Slot, DEFAULT_HORIZON_DAYS, GRID_SIZE,
};
use population::PlayerFile;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "nbagrid", version)]
#[command(about = "Build and inspect daily NBA grids")]
struct Cli {
    /// Player population file (JSON array or CSV)
    #[arg(long, global = true, default_value = "players.json")]
    players: PathBuf,

    /// Grid store file (defaults to the platform data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Engine configuration file (TOML); defaults apply when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log search decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where a grid document comes from
#[derive(Args)]
struct GridSource {
    /// Grid document file (JSON transport form)
    #[arg(long, required_unless_present = "date", conflicts_with = "date")]
    grid: Option<PathBuf>,

    /// Date of a committed grid in the store
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the filter kinds available for the population
    Catalog,
    /// Build and commit a grid for a date (tomorrow by default)
    Generate {
        #[arg(long, conflicts_with = "next_missing")]
        date: Option<NaiveDate>,

        /// Target the first date from tomorrow on without a grid
        #[arg(long)]
        next_missing: bool,

        /// Fixed random seed for a reproducible build
        #[arg(long)]
        seed: Option<u64>,

        /// Number of consecutive dates to generate, starting at the target date
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        /// Builds tried per date, keeping the best scoring grid
        #[arg(long)]
        attempts: Option<usize>,

        /// Minimum quality score in [0, 1] a grid needs to be committed
        #[arg(long)]
        quality_threshold: Option<f64>,
    },
    /// Show cell counts and totals of a grid
    Stats {
        #[command(flatten)]
        source: GridSource,
    },
    /// List the players of one cell
    Cell {
        #[command(flatten)]
        source: GridSource,

        #[arg(long)]
        row: usize,

        #[arg(long)]
        col: usize,
    },
    /// Narrow, widen or randomize one slot of a grid file, rewriting it
    Adjust {
        /// Grid document file
        #[arg(long)]
        grid: PathBuf,

        /// Slot to change: row:N or col:N
        #[arg(long)]
        slot: Slot,

        /// narrow, widen or randomize
        #[arg(long)]
        action: Adjustment,

        /// Write the result here instead of over the input
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a committed grid as a document
    Export {
        #[arg(long)]
        date: NaiveDate,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate a grid document and commit it to the store
    Import {
        #[arg(long)]
        grid: PathBuf,

        /// Target date (first date from tomorrow on without a grid by default)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = EngineConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load engine configuration")?;
    let store = JsonFileGridStore::new(cli.store.clone().unwrap_or_else(default_store_path));

    match cli.command {
        Commands::Catalog => {
            let (snapshot, catalog) = load_catalog(&cli.players, &config, today())?;
            print_catalog(&catalog, &snapshot);
        }
        Commands::Generate {
            date,
            next_missing,
            seed,
            count,
            attempts,
            quality_threshold,
        } => {
            let mut config = config;
            if let Some(attempts) = attempts {
                config.quality.attempts = attempts;
            }
            if let Some(threshold) = quality_threshold {
                config.quality.threshold = threshold;
            }
            config.validate().context("Invalid generation settings")?;

            let population = PlayerFile::load(&cli.players)?;
            let date = match (date, next_missing) {
                (Some(date), _) => date,
                (None, true) => next_missing_date(&store, tomorrow(), DEFAULT_HORIZON_DAYS)?
                    .context("No free date within the search horizon")?,
                (None, false) => tomorrow(),
            };
            let seed = seed.unwrap_or_else(fresh_seed);
            info!(
                %date,
                seed,
                players = population.len(),
                source = %population.path().display(),
                store = %store.path().display(),
                "generating"
            );

            let generator = DailyGenerator::new(&population, &store).with_config(config);
            let outcomes = if count == 1 {
                vec![generator.run(date, seed)?]
            } else {
                generator.run_batch(date, count as usize, seed)?
            };
            for outcome in &outcomes {
                print_outcome(outcome);
            }
            if count > 1 {
                let generated = outcomes.iter().filter(|o| o.record().is_some()).count();
                println!("{} of {} date(s) generated", generated, count);
            }
        }
        Commands::Stats { source } => {
            let (document, date) = read_source(&source, &store)?;
            let (snapshot, catalog) = load_catalog(&cli.players, &config, date)?;
            let mut session = GridSession::new(&catalog, &snapshot).with_bounds(config.bounds);
            session.import(&document)?;
            print_stats(&session)?;
        }
        Commands::Cell { source, row, col } => {
            let (document, date) = read_source(&source, &store)?;
            let (snapshot, catalog) = load_catalog(&cli.players, &config, date)?;
            let mut session = GridSession::new(&catalog, &snapshot);
            session.import(&document)?;
            let players = session.cell_players(row, col)?;
            println!("{} player(s) in cell ({}, {})", players.len(), row, col);
            for cell in players {
                println!(
                    "  {:<28} {:<32} {}",
                    cell.player.name, cell.row_detail, cell.col_detail
                );
            }
        }
        Commands::Adjust {
            grid,
            slot,
            action,
            out,
            seed,
        } => {
            let document = read_document(&grid)?;
            let (snapshot, catalog) = load_catalog(&cli.players, &config, today())?;
            let mut session = GridSession::new(&catalog, &snapshot)
                .with_bounds(config.bounds)
                .with_seed(seed.unwrap_or_else(fresh_seed));
            session.import(&document)?;
            match session.adjust(slot, action)? {
                AdjustOutcome::Applied(adjusted) => {
                    println!("{} -> {} ({} players)", slot, adjusted.label, adjusted.population);
                    let target = out.unwrap_or(grid);
                    write_document(&session.export()?, Some(&target))?;
                    print_stats(&session)?;
                }
                AdjustOutcome::Inapplicable(reason) => {
                    println!("{} unchanged: {}", slot, reason);
                }
            }
        }
        Commands::Export { date, out } => {
            let record = store
                .get(date)?
                .with_context(|| format!("No grid stored for {}", date))?;
            write_document(&record.document, out.as_deref())?;
        }
        Commands::Import { grid, date } => {
            let document = read_document(&grid)?;
            let date = match date {
                Some(date) => date,
                None => next_missing_date(&store, tomorrow(), DEFAULT_HORIZON_DAYS)?
                    .context("No free date within the search horizon")?,
            };
            let (snapshot, catalog) = load_catalog(&cli.players, &config, date)?;
            let mut session = GridSession::new(&catalog, &snapshot).with_bounds(config.bounds);
            session.import(&document)?;
            let counts = session.validate()?.into_result()?;
            let assignment = session.assignment()?;
            let record = GridRecord::new(date, &assignment, session.title().map(str::to_string), counts)?;
            match store.commit(record)? {
                CommitOutcome::Committed => println!("Committed grid for {}", date),
                CommitOutcome::AlreadyExists => bail!("A grid for {} already exists", date),
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nbagrid")
        .join("grids.json")
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn tomorrow() -> NaiveDate {
    today() + Duration::days(1)
}

fn load_catalog(
    players: &Path,
    config: &EngineConfig,
    as_of: NaiveDate,
) -> Result<(PlayerSnapshot, FilterCatalog)> {
    let population = PlayerFile::load(players)?;
    let snapshot = population.query_population(as_of)?;
    let catalog = config
        .catalog
        .build(&snapshot)
        .context("Failed to build the filter catalog")?;
    Ok((snapshot, catalog))
}

// ==================== Documents ====================

fn read_document(path: &Path) -> Result<GridDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read grid file: {}", path.display()))?;
    GridDocument::from_json(&json)
        .with_context(|| format!("Failed to parse grid file: {}", path.display()))
}

fn read_source(source: &GridSource, store: &JsonFileGridStore) -> Result<(GridDocument, NaiveDate)> {
    match (&source.grid, source.date) {
        (Some(path), _) => Ok((read_document(path)?, today())),
        (None, Some(date)) => {
            let record = store
                .get(date)?
                .with_context(|| format!("No grid stored for {}", date))?;
            Ok((record.document, date))
        }
        (None, None) => bail!("Either --grid or --date is required"),
    }
}

fn write_document(document: &GridDocument, out: Option<&Path>) -> Result<()> {
    let json = document.to_json()?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write grid file: {}", path.display()))?;
            info!(path = %path.display(), "grid written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ==================== Output ====================

fn print_catalog(catalog: &FilterCatalog, snapshot: &PlayerSnapshot) {
    println!("{} filter kinds over {} players", catalog.len(), snapshot.len());
    for descriptor in catalog.list_available() {
        let detail = match &descriptor.spec {
            KindSpec::Flag { flag } => {
                let filter = Filter::Flag(*flag);
                format!("{} players", catalog.population_count(&filter, snapshot))
            }
            KindSpec::Choice { options, .. } => format!("{} options", options.len()),
            KindSpec::Threshold { spec } => {
                format!("{}..={} step {}", spec.min, spec.max, spec.step)
            }
        };
        println!(
            "  {:<26} {:<34} x{:<4} {}",
            descriptor.kind, descriptor.name, descriptor.priority, detail
        );
        println!("  {:<26} {}", "", descriptor.description);
    }
}

fn print_outcome(outcome: &DailyOutcome) {
    match outcome {
        DailyOutcome::Skipped(date) => println!("Grid for {} already exists", date),
        DailyOutcome::Generated {
            record,
            built,
            quality,
        } => {
            println!(
                "Committed {} (seed {}, {} resample(s), {} repair(s), quality {})",
                record.date, built.seed, built.full_resamples, built.repairs, quality
            );
            print_record(record);
        }
        DailyOutcome::Rejected { date, quality } => {
            println!("No grid for {}: best quality {} is below the threshold", date, quality)
        }
        DailyOutcome::Exhausted(date) => println!("No grid for {}: search budget spent", date),
    }
}

fn print_record(record: &GridRecord) {
    if let Some(title) = &record.title {
        println!("{}", title);
    }
    for (axis, slots) in [("row", &record.document.row), ("col", &record.document.col)] {
        for (index, slot) in slots.iter().flatten() {
            println!("  {}:{}  {}", axis, index, slot.label);
        }
    }
}

fn print_stats(session: &GridSession<'_>) -> Result<()> {
    let report = session.validate()?;
    let stats = session.stats();
    let labels = |slot: Slot| session.get(slot).map(|f| f.label()).unwrap_or_default();

    if let Some(title) = session.title() {
        println!("{}", title);
    }
    print!("{:<30}", "");
    for col in 0..GRID_SIZE {
        print!("{:>30}", labels(Slot::col(col)));
    }
    println!();
    for row in 0..GRID_SIZE {
        print!("{:<30}", labels(Slot::row(row)));
        for col in 0..GRID_SIZE {
            print!("{:>30}", stats.cells[row][col]);
        }
        println!();
    }
    println!("total {}  average {:.1}", stats.total, stats.average);

    if report.is_valid() {
        println!("valid");
    } else {
        for violation in &report.violations {
            println!("  ! {}", violation);
        }
    }
    Ok(())
}
