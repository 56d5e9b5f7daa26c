//! decay — small end-to-end model for the rust_ssa simulator.
//!
//! Precursors `X` decay into freshly made cells.  Each cell is individually
//! tracked: while alive it may be damaged (a transformation), and after
//! `MATURATION` time units it leaves the pool through a sorting branch that
//! sends damaged cells to `Damaged` and intact ones to `Mature`.  A timer
//! injects a second batch of precursors halfway through.
//!
//! ```text
//! usage: decay [config.json] [output-dir]
//! ```
//!
//! `config.json` holds a `SimConfig` (`{"seed": 42, "log_period": 1.0}`).
//! Set `RUST_LOG=debug` for per-tick logs.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use ssa_core::SimConfig;
use ssa_expr::MevalExpression;
use ssa_output::{CsvObserver, CsvWriter};
use ssa_reaction::Rate;
use ssa_sim::SimBuilder;

// ── Constants ─────────────────────────────────────────────────────────────────

const PRECURSORS: u64 = 1_000;
const DECAY_RATE: f64 = 0.1;
const DAMAGE_RATE: f64 = 0.02;
const MATURATION: f64 = 10.0;
const MAX_TIME: f64 = 100.0;

fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("opening config {path}"))?;
            serde_json::from_reader(file).with_context(|| format!("parsing config {path}"))?
        }
        None => SimConfig::new(42, 1.0),
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "./output".to_owned()));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    println!("=== decay — rust_ssa ===");
    println!("Seed: {}  |  Log period: {}  |  Max time: {MAX_TIME}", config.seed, config.log_period);

    let mut sim = SimBuilder::new(config)
        .counter("X", PRECURSORS)
        .pool_with_reports("Cells", 0, true)
        .counter("Mature", 0)
        .counter("Damaged", 0)
        .branch(
            "Sort",
            MevalExpression::parse("min(damage, 1)")?,
            &[("Damaged", 1)],
            &[("Mature", 1)],
        )
        .stochastic("decay", Rate::Constant(DECAY_RATE))
        .reactant("X", 1)
        .product("Cells", 1)
        .done()
        .stochastic("damage", Rate::Constant(DAMAGE_RATE))
        .transformee("Cells", 1)
        .done()
        .delay_forwarding("mature", "Cells", MATURATION, &[("Sort", 1)], "damage")
        .timer("refill", MAX_TIME / 2.0, &[("X", PRECURSORS / 2)])
        .build()?;

    let mut observer = CsvObserver::new(CsvWriter::new(&out_dir)?);
    let started = Instant::now();
    sim.run(MAX_TIME, &mut observer)?;
    if let Some(err) = observer.take_error() {
        return Err(err).context("writing output");
    }
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "run complete");

    println!();
    for name in ["X", "Cells", "Mature", "Damaged"] {
        println!("{name:>8}: {}", sim.count(name).unwrap_or(0));
    }
    for name in sim.reaction_names() {
        println!("{name:>8} fired {} times", sim.fired_count(name).unwrap_or(0));
    }
    println!("Output written to {}", out_dir.display());
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
