//! # Entity Component System
//!
//! Behavior-carrying components composed onto entities.
//!
//! ## Design Philosophy
//!
//! - Each component kind gets a stable capability ID from a registry
//! - Entities index their components by that ID: O(1) lookup, bitmask presence
//! - Composition errors surface at attachment, so dispatch cannot fail
//! - Removal is deferred to an explicit sweep between passes

mod capability;
mod component;
mod entity;
mod manager;

pub use capability::{CapabilityId, CapabilityRegistry, CapabilitySet, MAX_CAPABILITIES};
pub use component::{AsAny, Component};
pub use entity::{Entity, EntityId, EntityState};
pub use manager::{EntityManager, TickReport};
