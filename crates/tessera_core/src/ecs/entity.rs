//! # Entity Management
//!
//! An entity owns a bounded set of components, at most one per kind.
//!
//! Storage layout:
//! - `slots`: owned components in attachment order (dispatch order)
//! - `lookup`: capability ID -> slot index, for O(1) typed access
//! - `presence`: bitmask mirroring which capability IDs are attached

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use super::capability::{CapabilityId, CapabilityRegistry, CapabilitySet, MAX_CAPABILITIES};
use super::component::{downcast_mut, downcast_ref, Component};
use crate::error::{EcsError, EcsResult};

/// Unique, stable identifier for an entity.
///
/// IDs are handed out by the [`EntityManager`](super::EntityManager) in
/// increasing order and never reused within one manager, so a stale ID
/// simply fails to resolve once its entity has been swept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates an entity ID from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("#null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Lifecycle state of an entity still held by its manager.
///
/// Removed entities are not represented: after the sweep they no longer exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Dispatched to and kept across sweeps.
    Active,
    /// Flagged by [`Entity::destroy`]; deallocated on the next sweep.
    PendingRemoval,
}

struct Slot {
    capability: CapabilityId,
    /// `None` only while the component's own hook runs.
    component: Option<Box<dyn Component>>,
}

/// A composition of components with an active flag.
///
/// Entities are created by [`EntityManager::add_entity`](super::EntityManager::add_entity)
/// and deallocated only by its sweep.
pub struct Entity {
    id: EntityId,
    registry: Arc<CapabilityRegistry>,
    slots: Vec<Slot>,
    lookup: [Option<u8>; MAX_CAPABILITIES],
    presence: CapabilitySet,
    active: bool,
}

impl Entity {
    pub(crate) fn new(id: EntityId, registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            id,
            registry,
            slots: Vec::new(),
            lookup: [None; MAX_CAPABILITIES],
            presence: CapabilitySet::EMPTY,
            active: true,
        }
    }

    /// The entity's stable ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns `false` once [`destroy`](Self::destroy) has been called.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> EntityState {
        if self.active {
            EntityState::Active
        } else {
            EntityState::PendingRemoval
        }
    }

    /// Flags the entity for removal on the next sweep.
    ///
    /// Idempotent. Components stay attached and keep being dispatched until
    /// the manager actually deallocates the entity.
    #[inline]
    pub fn destroy(&mut self) {
        self.active = false;
    }

    /// Number of attached components.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.slots.len()
    }

    /// Presence set of attached capability IDs.
    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> CapabilitySet {
        self.presence
    }

    /// Capability IDs of the attached components, in attachment order.
    pub fn attachment_order(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.slots.iter().map(|slot| slot.capability)
    }

    /// Registry used to resolve component kinds.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Checks whether a `T` is attached. O(1).
    #[inline]
    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.registry
            .lookup::<T>()
            .is_some_and(|id| self.presence.contains(id))
    }

    /// Borrows the attached `T`, or `None` if there is none.
    ///
    /// Also `None` for the component whose own hook is currently running.
    #[must_use]
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        let index = self.slot_index::<T>()?;
        self.slots[index].component.as_deref().and_then(downcast_ref::<T>)
    }

    /// Mutably borrows the attached `T`, or `None` if there is none.
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        let index = self.slot_index::<T>()?;
        self.slots[index]
            .component
            .as_deref_mut()
            .and_then(downcast_mut::<T>)
    }

    /// Borrows the attached `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if no `T` is reachable.
    pub fn require_component<T: Component>(&self) -> EcsResult<&T> {
        let id = self.id;
        self.get_component::<T>()
            .ok_or_else(|| missing::<T>(id))
    }

    /// Mutably borrows the attached `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if no `T` is reachable.
    pub fn require_component_mut<T: Component>(&mut self) -> EcsResult<&mut T> {
        let id = self.id;
        self.get_component_mut::<T>()
            .ok_or_else(|| missing::<T>(id))
    }

    /// Attaches `component`, runs its `init` hook and returns it.
    ///
    /// The slot is reserved before `init` runs, so the new component sits
    /// after every earlier attachment and before anything `init` attaches.
    ///
    /// # Errors
    ///
    /// - [`EcsError::DuplicateComponent`] if a `T` is already attached; the
    ///   entity is left unchanged
    /// - [`EcsError::TypeCapacityExceeded`] if `T` cannot be registered
    pub fn add_component<T: Component>(&mut self, component: T) -> EcsResult<&mut T> {
        let capability = self.registry.register::<T>()?;
        if self.presence.contains(capability) {
            tracing::warn!(
                entity = %self.id,
                component = type_name::<T>(),
                "duplicate component rejected"
            );
            return Err(EcsError::DuplicateComponent {
                entity: self.id,
                component: type_name::<T>(),
            });
        }

        let index = self.slots.len();
        self.slots.push(Slot {
            capability,
            component: None,
        });
        // At most one slot per capability, so the index always fits.
        self.lookup[capability.index()] = u8::try_from(index).ok();
        self.presence.insert(capability);

        let mut component = component;
        component.init(self);
        self.slots[index].component = Some(Box::new(component));

        let id = self.id;
        self.slots[index]
            .component
            .as_deref_mut()
            .and_then(downcast_mut::<T>)
            .ok_or_else(|| missing::<T>(id))
    }

    /// Swaps the attached `T` for `component` in place and returns the old one.
    ///
    /// The new instance keeps the old attachment position and has its `init`
    /// hook run. The old instance is detached and no longer dispatched.
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingComponent`] if no `T` is attached
    /// - [`EcsError::ComponentInUse`] if called from inside a hook of the
    ///   `T` being replaced
    pub fn replace_component<T: Component>(&mut self, component: T) -> EcsResult<Box<T>> {
        let index = self
            .slot_index::<T>()
            .ok_or_else(|| missing::<T>(self.id))?;
        let Some(old) = self.slots[index].component.take() else {
            return Err(EcsError::ComponentInUse {
                entity: self.id,
                component: type_name::<T>(),
            });
        };

        let mut component = component;
        component.init(self);
        self.slots[index].component = Some(Box::new(component));

        old.into_any()
            .downcast::<T>()
            .map_err(|_| missing::<T>(self.id))
    }

    /// Runs `update` on every component, in attachment order.
    ///
    /// Does not check the active flag; the manager decides who is dispatched.
    pub fn update(&mut self) {
        self.dispatch(|component, owner| component.update(owner));
    }

    /// Runs `draw` on every component, in attachment order.
    pub fn draw(&mut self) {
        self.dispatch(|component, owner| component.draw(owner));
    }

    /// Components attached during the pass are first dispatched next pass.
    fn dispatch(&mut self, hook: fn(&mut dyn Component, &mut Entity)) {
        let attached = self.slots.len();
        for index in 0..attached {
            let Some(mut component) = self.slots[index].component.take() else {
                continue;
            };
            hook(&mut *component, self);
            self.slots[index].component = Some(component);
        }
    }

    #[inline]
    fn slot_index<T: Component>(&self) -> Option<usize> {
        let id = self.registry.lookup::<T>()?;
        if !self.presence.contains(id) {
            return None;
        }
        self.lookup[id.index()].map(usize::from)
    }
}

fn missing<T>(entity: EntityId) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: type_name::<T>(),
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<_> = self
            .attachment_order()
            .map(|id| self.registry.name_of(id).unwrap_or("?"))
            .collect();
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("components", &kinds)
            .finish()
    }
}
