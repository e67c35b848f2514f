//! Basic example of using the grid engine

use nbagrid_core::{
    Adjustment, Bounds, EngineConfig, GridBuilder, GridSession, Player, PlayerSnapshot, Slot,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TEAMS: [&str; 6] = [
    "Boston Celtics",
    "Chicago Bulls",
    "Los Angeles Lakers",
    "Miami Heat",
    "San Antonio Spurs",
    "Golden State Warriors",
];

/// A made-up league with loosely realistic careers
fn synthetic_league(size: u64) -> PlayerSnapshot {
    let mut rng = ChaCha8Rng::seed_from_u64(2003);
    let players = (0..size)
        .map(|id| {
            let seasons = rng.gen_range(1..=19);
            let ppg: f32 = rng.gen_range(2.0..30.0);
            let team_count = rng.gen_range(1..=4);
            let mut teams: Vec<String> = TEAMS
                .choose_multiple(&mut rng, team_count)
                .map(|t| t.to_string())
                .collect();
            teams.sort();
            Player {
                country: if rng.gen_bool(0.75) { "USA" } else { "Canada" }.to_string(),
                position: ["Guard", "Forward", "Center", "Guard-Forward"]
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or("Guard")
                    .to_string(),
                teams,
                draft_number: rng.gen_bool(0.8).then(|| rng.gen_range(1..=60)),
                num_seasons: seasons,
                height_cm: rng.gen_range(180..=224),
                career_gp: seasons * rng.gen_range(30..=82),
                career_ppg: ppg,
                career_rpg: rng.gen_range(1.0..13.0),
                career_apg: rng.gen_range(0.5..10.0),
                career_high_pts: (ppg * 2.2) as u32 + rng.gen_range(0..12),
                is_all_star: ppg > 18.0 && rng.gen_bool(0.6),
                is_all_nba: ppg > 22.0 && rng.gen_bool(0.5),
                is_champion: rng.gen_bool(0.2),
                is_all_defensive: rng.gen_bool(0.1),
                is_all_rookie: rng.gen_bool(0.2),
                ..Player::new(id, format!("Player {:03}", id))
            }
        })
        .collect();
    PlayerSnapshot::new(players)
}

fn main() {
    let snapshot = synthetic_league(1500);
    let config = EngineConfig::default();
    let catalog = match config.catalog.build(&snapshot) {
        Ok(catalog) => catalog,
        Err(e) => {
            println!("Catalog rejected: {}", e);
            return;
        }
    };
    println!("{} filter kinds over {} players\n", catalog.len(), snapshot.len());

    // Build a grid
    let bounds = Bounds {
        max_cell_count: 250,
        ..Bounds::default()
    };
    let built = match GridBuilder::new(&catalog, &snapshot)
        .with_bounds(bounds)
        .build(42)
    {
        Ok(built) => built,
        Err(e) => {
            println!("No grid: {}", e);
            return;
        }
    };
    println!(
        "Built with seed {} after {} resample(s) and {} repair(s):",
        built.seed, built.full_resamples, built.repairs
    );
    for (slot, filter) in built.assignment.slots() {
        println!("  {:<6} {}", slot.to_string(), filter);
    }

    // Inspect and tweak it by hand
    let mut session = GridSession::from_assignment(&catalog, &snapshot, built.assignment)
        .with_bounds(bounds)
        .with_seed(7);
    let stats = session.stats();
    println!("\nTotal {}  average {:.1}", stats.total, stats.average);
    for row in stats.cells {
        println!("  {:>5} {:>5} {:>5}", row[0], row[1], row[2]);
    }

    if let Ok(players) = session.cell_players(0, 0) {
        println!("\nFirst players of cell (0, 0):");
        for cell in players.iter().take(3) {
            println!("  {:<12} {:<28} {}", cell.player.name, cell.row_detail, cell.col_detail);
        }
    }

    for slot in Slot::all() {
        if let Ok(outcome) = session.adjust(slot, Adjustment::Narrow) {
            if let Some(adjusted) = outcome.applied() {
                println!("\nNarrowed {} to '{}' ({} players)", slot, adjusted.label, adjusted.population);
                break;
            }
        }
    }
    match session.validate() {
        Ok(report) if report.is_valid() => println!("Still valid after narrowing"),
        Ok(report) => {
            for violation in report.violations {
                println!("  ! {}", violation);
            }
        }
        Err(e) => println!("Validation failed: {}", e),
    }

    // Export for sharing
    session.set_title(Some("Demo grid".to_string())).ok();
    match session.export().map(|doc| doc.to_json()) {
        Ok(Ok(json)) => println!("\n{}", json),
        Ok(Err(e)) => println!("Export failed: {}", e),
        Err(e) => println!("Export failed: {}", e),
    }
}
