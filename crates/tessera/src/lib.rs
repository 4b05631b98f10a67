//! # TESSERA
//!
//! Composable entities plus the collaborators their components use.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          TESSERA                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────┐          ┌────────────────────────┐  │
//! │  │   tessera_core     │          │   tessera_runtime      │  │
//! │  │  • Registry        │          │  • ConfigStore         │  │
//! │  │  • Component       │<─values──│  • Stopwatch / timer   │  │
//! │  │  • Entity/Manager  │          │  • Signal              │  │
//! │  └─────────┬──────────┘          └───────────┬────────────┘  │
//! │            └──────────────┬──────────────────┘               │
//! │                     ┌─────┴─────┐                            │
//! │                     │  SimLoop  │                            │
//! │                     └───────────┘                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `sim_loop`: Paced tick orchestration and tick statistics
//! - `demo`: Components for the `sandbox` binary

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod demo;
pub mod sim_loop;

// Re-export the layers
pub use tessera_core as ecs;
pub use tessera_runtime as runtime;

// Re-export commonly used types
pub use sim_loop::{LoopConfig, SimLoop, TickStats, TickStatsAccumulator};
pub use tessera_core::{
    CapabilityRegistry, Component, EcsError, EcsResult, Entity, EntityId, EntityManager,
    TickReport,
};
pub use tessera_runtime::{
    timer, ConfigStore, LoadStatus, RuntimeError, RuntimeResult, ScopedConnection, Signal,
    Stopwatch,
};
