//! # Entity Manager
//!
//! The central container for all entities.
//!
//! ## Tick phases
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌───────────┐
//! │  update  │───>│   draw   │───>│  refresh  │
//! └──────────┘    └──────────┘    └───────────┘
//!  every entity    every entity    sweep entities
//!  (any state)     (any state)     flagged inactive
//! ```
//!
//! Removal is two-phase: `destroy()` only flags, `refresh()` deallocates.
//! Hooks may therefore destroy their own owner mid-pass without touching
//! the collection being iterated. Every pass takes `&mut self`, so adding
//! entities while a pass is running does not compile.

use std::sync::Arc;

use super::capability::CapabilityRegistry;
use super::entity::{Entity, EntityId};

/// Outcome of one full [`EntityManager::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entities dispatched to in the update and draw passes.
    pub dispatched: usize,
    /// Entities deallocated by the sweep.
    pub removed: usize,
}

/// Owns every entity and drives the per-tick passes.
///
/// Entities are kept in insertion order. IDs increase monotonically and the
/// sweep preserves relative order, so the collection is always sorted by ID.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, EntityManager};
///
/// struct Health(i32);
/// impl Component for Health {}
///
/// let mut manager = EntityManager::new();
/// let entity = manager.add_entity();
/// entity.add_component(Health(100)).unwrap();
/// entity.destroy();
///
/// assert_eq!(manager.refresh(), 1);
/// assert!(manager.is_empty());
/// ```
pub struct EntityManager {
    registry: Arc<CapabilityRegistry>,
    entities: Vec<Entity>,
    next_id: u64,
}

impl EntityManager {
    /// Creates an empty manager backed by the process-wide registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Arc::clone(CapabilityRegistry::global()))
    }

    /// Creates an empty manager backed by `registry`.
    #[must_use]
    pub fn with_registry(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            entities: Vec::new(),
            next_id: 0,
        }
    }

    /// Registry shared by every entity of this manager.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Number of held entities, including those pending removal.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity is held.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities still active.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_active()).count()
    }

    /// Number of entities flagged for the next sweep.
    #[must_use]
    pub fn pending_removal_count(&self) -> usize {
        self.len() - self.active_count()
    }

    /// Creates a new active entity and returns it.
    pub fn add_entity(&mut self) -> &mut Entity {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        let index = self.entities.len();
        self.entities.push(Entity::new(id, Arc::clone(&self.registry)));
        tracing::trace!(entity = %id, "entity added");

        &mut self.entities[index]
    }

    /// Gets an entity by ID.
    ///
    /// # Returns
    ///
    /// Reference to the entity, or None if it was never added or already swept.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let index = self.position(id)?;
        Some(&self.entities[index])
    }

    /// Gets a mutable entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = self.position(id)?;
        Some(&mut self.entities[index])
    }

    /// Checks whether `id` is still held (active or pending removal).
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.position(id).is_some()
    }

    /// Flags the entity `id` for removal.
    ///
    /// Returns `false` if no such entity is held.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.destroy();
                true
            }
            None => false,
        }
    }

    /// Iterates over held entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Iterates mutably over held entities in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Runs the update pass over every held entity, active or not.
    pub fn update(&mut self) {
        for entity in &mut self.entities {
            entity.update();
        }
    }

    /// Runs the draw pass over every held entity, active or not.
    pub fn draw(&mut self) {
        for entity in &mut self.entities {
            entity.draw();
        }
    }

    /// Deallocates every inactive entity, keeping survivors in order.
    ///
    /// Returns the number of entities removed.
    pub fn refresh(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(Entity::is_active);
        let removed = before - self.entities.len();

        if removed > 0 {
            tracing::debug!(removed, remaining = self.entities.len(), "entities swept");
        }
        removed
    }

    /// Runs one full tick: update, draw, then refresh.
    pub fn tick(&mut self) -> TickReport {
        let dispatched = self.entities.len();
        self.update();
        self.draw();
        let removed = self.refresh();
        TickReport {
            dispatched,
            removed,
        }
    }

    #[inline]
    fn position(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, Entity::id).ok()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("entities", &self.entities.len())
            .field("active", &self.active_count())
            .field("next_id", &self.next_id)
            .finish()
    }
}
