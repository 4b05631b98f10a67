//! # TESSERA Sandbox
//!
//! Runs the demo population for the configured number of ticks.
//!
//! Usage: `sandbox [CONFIG]` (defaults to `sandbox.toml`). Missing settings
//! are written back with their defaults.

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tessera::demo::spawn_population;
use tessera::timer::{self, Rounds};
use tessera::{
    ConfigStore, EntityId, EntityManager, LoadStatus, LoopConfig, ScopedConnection, Signal,
    SimLoop, Stopwatch,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera=info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("sandbox.toml"), PathBuf::from);
    let mut store = ConfigStore::open(&path);
    match store.load_status() {
        LoadStatus::FileNotFound => {
            tracing::info!(path = %path.display(), "no config file, using defaults");
        }
        LoadStatus::ReadError => {
            tracing::warn!(error = store.last_error().unwrap_or_default(), "config unreadable, using defaults");
        }
        LoadStatus::Success | LoadStatus::NotLoaded => {}
    }

    let config = LoopConfig::from_store(&store);
    config.write_defaults(&mut store)?;
    tracing::info!(?config, "TESSERA sandbox starting");

    let deaths = Signal::<EntityId>::new();
    let death_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&death_count);
    let _on_death = ScopedConnection::new(deaths.connect(move |id| {
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::info!(entity = %id, "entity died");
    }));

    let mut manager = EntityManager::new();
    spawn_population(&mut manager, &config, &deaths)?;

    let progress = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&progress);
    let heartbeat = timer::every(Duration::from_secs(1), Rounds::Infinite, false, move || {
        tracing::info!(tick = seen.load(Ordering::Relaxed), "heartbeat");
    })?;

    let wall = Stopwatch::start();
    let mut sim = SimLoop::new(manager, config);
    sim.run_with(|stats| progress.store(stats.tick, Ordering::Relaxed))
        .log_summary();

    heartbeat.cancel();
    heartbeat.join();

    let survivors = sim.manager().len();
    tracing::info!(
        survivors,
        deaths = death_count.load(Ordering::Relaxed),
        seconds = wall.peek(),
        "sandbox finished"
    );

    store.set("last_run", "survivors", &survivors)?;
    store.set("last_run", "deaths", &death_count.load(Ordering::Relaxed))?;
    store.save()?;
    Ok(())
}
