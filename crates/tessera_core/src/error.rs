//! # Core Error Types
//!
//! Every failure the core can report. All of them surface at attachment
//! or lookup time; the `update`/`draw` passes have no failure path.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors that can occur while composing entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// More distinct component kinds than the registry can index.
    #[error("capability capacity exceeded: {capacity} kinds registered, cannot add {component}")]
    TypeCapacityExceeded {
        /// Registry capacity.
        capacity: usize,
        /// Kind that was rejected.
        component: &'static str,
    },

    /// The entity already has a component of this kind.
    #[error("entity {entity} already has a {component}")]
    DuplicateComponent {
        /// Entity the attachment was attempted on.
        entity: EntityId,
        /// Kind that was already present.
        component: &'static str,
    },

    /// The entity has no component of this kind.
    #[error("entity {entity} has no {component}")]
    MissingComponent {
        /// Entity that was queried.
        entity: EntityId,
        /// Kind that was requested.
        component: &'static str,
    },

    /// The component's own hook is running, so its slot is vacant.
    #[error("{component} on entity {entity} is in use by its own hook")]
    ComponentInUse {
        /// Entity owning the component.
        entity: EntityId,
        /// Kind whose hook is running.
        component: &'static str,
    },
}

/// Result type for core operations.
pub type EcsResult<T> = Result<T, EcsError>;
