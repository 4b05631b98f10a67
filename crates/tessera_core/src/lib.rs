//! # TESSERA Core Engine
//!
//! Composable entities for single-threaded, tick-driven simulations:
//! - Type-indexed component storage with O(1) lookup
//! - Per-tick `update` and `draw` passes over every entity
//! - Deferred removal that is safe to request mid-pass
//!
//! ## Architecture Rules
//!
//! 1. **Validate at attachment** - duplicate kinds and capacity overflow are
//!    reported when a component is added, never during a pass
//! 2. **One owner** - the manager owns entities, entities own components
//! 3. **Two-phase removal** - `destroy()` flags, `refresh()` deallocates
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Component, Entity, EntityManager};
//!
//! struct Lifetime(u32);
//! impl Component for Lifetime {
//!     fn update(&mut self, owner: &mut Entity) {
//!         self.0 = self.0.saturating_sub(1);
//!         if self.0 == 0 {
//!             owner.destroy();
//!         }
//!     }
//! }
//!
//! let mut manager = EntityManager::new();
//! manager.add_entity().add_component(Lifetime(2)).unwrap();
//!
//! assert_eq!(manager.tick().removed, 0);
//! assert_eq!(manager.tick().removed, 1);
//! assert!(manager.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;

pub use ecs::{
    AsAny, CapabilityId, CapabilityRegistry, CapabilitySet, Component, Entity, EntityId,
    EntityManager, EntityState, TickReport, MAX_CAPABILITIES,
};
pub use error::{EcsError, EcsResult};
