//! # Simulation Loop
//!
//! Fixed-rate orchestration of an [`EntityManager`]:
//! ```text
//! Tick N:
//! ┌──────────────────────────────────────────────────────────┐
//! │ 1. STEP                                                  │
//! │    └─ update -> draw -> refresh                          │
//! │                                                          │
//! │ 2. RECORD                                                │
//! │    └─ tick time, removals, budget overrun                │
//! │                                                          │
//! │ 3. PACE                                                  │
//! │    └─ sleep out the rest of the tick budget              │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use tessera_core::EntityManager;
use tessera_runtime::{ConfigStore, RuntimeResult, Stopwatch};

/// Config filter holding the loop settings.
pub const CONFIG_FILTER: &str = "sandbox";

/// Settings for a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct LoopConfig {
    /// Entities to spawn.
    pub entities: usize,
    /// Ticks to run.
    pub ticks: u64,
    /// Health every entity starts with.
    pub starting_health: i32,
    /// Ticks per second. Zero or less runs unpaced.
    pub tick_rate: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            entities: 16,
            ticks: 120,
            starting_health: 100,
            tick_rate: 60.0,
        }
    }
}

impl LoopConfig {
    /// Reads the settings from the `[sandbox]` filter of `store`.
    ///
    /// Each absent or unusable key keeps its default.
    #[must_use]
    pub fn from_store(store: &ConfigStore) -> Self {
        let defaults = Self::default();
        Self {
            entities: store.get_or(CONFIG_FILTER, "entities", defaults.entities),
            ticks: store.get_or(CONFIG_FILTER, "ticks", defaults.ticks),
            starting_health: store.get_or(CONFIG_FILTER, "starting_health", defaults.starting_health),
            tick_rate: store.get_or(CONFIG_FILTER, "tick_rate", defaults.tick_rate),
        }
    }

    /// Writes these settings into `store` for every key it lacks.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures from the store.
    pub fn write_defaults(&self, store: &mut ConfigStore) -> RuntimeResult<()> {
        if !store.contains(CONFIG_FILTER, "entities") {
            store.set(CONFIG_FILTER, "entities", &self.entities)?;
        }
        if !store.contains(CONFIG_FILTER, "ticks") {
            store.set(CONFIG_FILTER, "ticks", &self.ticks)?;
        }
        if !store.contains(CONFIG_FILTER, "starting_health") {
            store.set(CONFIG_FILTER, "starting_health", &self.starting_health)?;
        }
        if !store.contains(CONFIG_FILTER, "tick_rate") {
            store.set(CONFIG_FILTER, "tick_rate", &self.tick_rate)?;
        }
        Ok(())
    }

    /// Wall-clock budget of one tick, or `None` when unpaced.
    #[must_use]
    pub fn tick_budget(&self) -> Option<Duration> {
        if self.tick_rate > 0.0 {
            Duration::try_from_secs_f64(self.tick_rate.recip()).ok()
        } else {
            None
        }
    }
}

/// Measurements of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// 1-based tick number.
    pub tick: u64,
    /// Entities dispatched to.
    pub dispatched: usize,
    /// Entities removed by the sweep.
    pub removed: usize,
    /// Time spent in the tick, pacing excluded.
    pub elapsed: Duration,
}

/// Aggregate of recorded ticks.
#[derive(Clone, Debug)]
pub struct TickStatsAccumulator {
    /// Ticks recorded.
    pub ticks_recorded: u64,
    /// Sum of tick times.
    pub total: Duration,
    /// Shortest tick.
    pub min_tick: Duration,
    /// Longest tick.
    pub max_tick: Duration,
    /// Ticks that exceeded the budget.
    pub ticks_over_budget: u64,
    /// Entities removed across all ticks.
    pub removed: usize,
    budget: Option<Duration>,
}

impl TickStatsAccumulator {
    /// Creates an empty accumulator measuring against `budget`.
    #[must_use]
    pub fn new(budget: Option<Duration>) -> Self {
        Self {
            ticks_recorded: 0,
            total: Duration::ZERO,
            min_tick: Duration::MAX,
            max_tick: Duration::ZERO,
            ticks_over_budget: 0,
            removed: 0,
            budget,
        }
    }

    /// Records one tick.
    pub fn record(&mut self, stats: &TickStats) {
        self.ticks_recorded += 1;
        self.total += stats.elapsed;
        self.min_tick = self.min_tick.min(stats.elapsed);
        self.max_tick = self.max_tick.max(stats.elapsed);
        self.removed += stats.removed;

        if self.budget.is_some_and(|budget| stats.elapsed > budget) {
            self.ticks_over_budget += 1;
        }
    }

    /// Average tick time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.ticks_recorded == 0 {
            return 0.0;
        }
        self.total.as_secs_f64() * 1000.0 / self.ticks_recorded as f64
    }

    /// Fraction of ticks over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.ticks_recorded == 0 {
            return 0.0;
        }
        self.ticks_over_budget as f64 / self.ticks_recorded as f64
    }

    /// Logs a one-line summary.
    pub fn log_summary(&self) {
        let min_ms = if self.ticks_recorded == 0 {
            0.0
        } else {
            self.min_tick.as_secs_f64() * 1000.0
        };
        tracing::info!(
            ticks = self.ticks_recorded,
            avg_ms = self.avg_tick_ms(),
            min_ms,
            max_ms = self.max_tick.as_secs_f64() * 1000.0,
            over_budget = self.ticks_over_budget,
            removed = self.removed,
            "tick statistics"
        );
    }
}

/// Drives an [`EntityManager`] at the configured tick rate.
pub struct SimLoop {
    manager: EntityManager,
    config: LoopConfig,
    clock: Stopwatch,
    stats: TickStatsAccumulator,
    tick: u64,
}

impl SimLoop {
    /// Creates a loop over `manager`.
    #[must_use]
    pub fn new(manager: EntityManager, config: LoopConfig) -> Self {
        let stats = TickStatsAccumulator::new(config.tick_budget());
        Self {
            manager,
            config,
            clock: Stopwatch::start(),
            stats,
            tick: 0,
        }
    }

    /// The driven manager.
    #[inline]
    #[must_use]
    pub fn manager(&self) -> &EntityManager {
        &self.manager
    }

    /// The driven manager, mutably.
    #[inline]
    pub fn manager_mut(&mut self) -> &mut EntityManager {
        &mut self.manager
    }

    /// Settings of this loop.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Statistics recorded so far.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &TickStatsAccumulator {
        &self.stats
    }

    /// Ticks run so far.
    #[inline]
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Runs one tick and records it.
    pub fn step(&mut self) -> TickStats {
        self.clock.reset();
        let report = self.manager.tick();
        self.tick += 1;

        let stats = TickStats {
            tick: self.tick,
            dispatched: report.dispatched,
            removed: report.removed,
            elapsed: self.clock.elapsed(),
        };
        self.stats.record(&stats);

        if let Some(budget) = self.config.tick_budget() {
            if stats.elapsed > budget {
                tracing::debug!(
                    tick = stats.tick,
                    elapsed_us = stats.elapsed.as_micros(),
                    budget_us = budget.as_micros(),
                    "tick exceeded budget"
                );
            }
        }
        tracing::trace!(tick = stats.tick, removed = stats.removed, "tick complete");
        stats
    }

    /// Sleeps out whatever remains of the current tick budget.
    pub fn pace(&self) {
        if let Some(budget) = self.config.tick_budget() {
            let remaining = budget.saturating_sub(self.clock.elapsed());
            self.clock.delay(remaining.as_secs_f64());
        }
    }

    /// Runs the configured number of paced ticks.
    pub fn run(&mut self) -> &TickStatsAccumulator {
        self.run_with(|_| {})
    }

    /// Same as [`run`](Self::run), calling `observe` after every tick.
    pub fn run_with<F>(&mut self, mut observe: F) -> &TickStatsAccumulator
    where
        F: FnMut(&TickStats),
    {
        for _ in 0..self.config.ticks {
            let stats = self.step();
            observe(&stats);
            self.pace();
        }
        &self.stats
    }

    /// Gives the manager back.
    #[must_use]
    pub fn into_manager(self) -> EntityManager {
        self.manager
    }
}

impl std::fmt::Debug for SimLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimLoop")
            .field("tick", &self.tick)
            .field("entities", &self.manager.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
