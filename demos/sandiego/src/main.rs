//! sandiego — a delivery fleet driving a synthetic San Diego street grid.
//!
//! Three warehouses each dispatch trucks to random points in the city.  A
//! truck drives out, waits for its return route, drives back, and is
//! replaced by a fresh truck from the same warehouse.  Observations are
//! written to `output/sandiego/`.
//!
//! Usage: `sandiego [config.json]`.  The optional JSON file overrides any
//! `SimConfig` field, e.g. `{ "speed_factor": 20.0, "trucks_per_warehouse": 5 }`.

mod network;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;

use fleet_core::{Position, SimConfig, SpatialReference};
use fleet_dispatch::WarehouseSet;
use fleet_output::{CsvWriter, OutputSink};
use fleet_sim::SimulationScheduler;
use fleet_spatial::NetworkSolver;

use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Destination extent, Web Mercator metres: `[min_x, min_y, max_x, max_y]`.
const EXTENT: [f64; 4] = [
    -13_053_376.102_524_61,
    3_851_361.701_892_350_8,
    -13_029_715.044_618_936,
    3_863_009.455_819_231,
];

/// Wall-clock seconds to run at each speed.
const RUN_SECS: u64 = 5;

const OUTPUT_DIR: &str = "output/sandiego";

fn warehouse_points() -> Vec<(String, Position)> {
    vec![
        ("Otay Mesa".to_string(),  Position::new(-117.080, 32.690)),
        ("Kearny".to_string(),     Position::new(-117.150, 32.740)),
        ("Point Loma".to_string(), Position::new(-117.230, 32.720)),
    ]
}

fn load_config() -> Result<SimConfig> {
    match std::env::args().nth(1) {
        None => Ok(SimConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== sandiego — fleet route simulator ===");
    let config = load_config()?;
    println!(
        "Trucks/warehouse: {}  |  Speed: {}x  |  Step: {} s  |  Seed: {}",
        config.trucks_per_warehouse, config.speed_factor, config.tick_step_secs, config.seed
    );

    // 1. Road network and solver.
    let network = build_network();
    println!("Road network: {} nodes, {} edges", network.node_count(), network.edge_count());
    let solver = NetworkSolver::new(network);

    // 2. Warehouses and destination extent.
    let warehouses = WarehouseSet::with_bounds(warehouse_points(), EXTENT, SpatialReference::WebMercator)?;
    info!("[Demo] {} warehouses", warehouses.len());

    // 3. Output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let sink = Arc::new(OutputSink::new(CsvWriter::new(Path::new(OUTPUT_DIR))?, config.tick_step_secs));

    // 4. Run at the configured speed, then twice as fast.
    let speed = config.speed_factor;
    let scheduler = SimulationScheduler::new(config, warehouses, solver, Arc::clone(&sink))?;
    let t0 = Instant::now();
    scheduler.start().await?;

    tokio::time::sleep(Duration::from_secs(RUN_SECS)).await;
    scheduler.set_speed(speed * 2.0)?;
    info!("[Demo] speed doubled to {}x", scheduler.speed());
    tokio::time::sleep(Duration::from_secs(RUN_SECS)).await;

    scheduler.shutdown().await;
    scheduler.wait_for_routing(Duration::from_millis(10)).await;
    sink.finish()?;

    // 5. Summary.
    let stats = scheduler.stats();
    println!();
    println!("Ran for {:.1} s", t0.elapsed().as_secs_f64());
    println!("  ticks run        : {}", stats.ticks_run);
    println!("  ticks skipped    : {}", stats.ticks_skipped);
    println!("  routing requests : {}", stats.requests_issued);
    println!("  late results     : {}", stats.responses_discarded);

    let counts = scheduler.with_fleet(|fleet| fleet.status_counts()).await.unwrap_or_default();
    println!();
    println!("{:<16} {:>6}", "Status", "Trucks");
    println!("{}", "-".repeat(23));
    for (label, n) in ["EnRoute", "Returning", "AtDestination", "Complete"].iter().zip(counts) {
        println!("{label:<16} {n:>6}");
    }
    println!();
    println!("Output written to {OUTPUT_DIR}/");

    Ok(())
}
