//! # Capability Registry
//!
//! Every distinct component kind gets a small, stable integer the first
//! time it is registered. Entities use that integer to index a fixed-size
//! lookup array and a presence bitmask, which keeps `has`/`get` O(1).
//!
//! ## Identity rules
//!
//! - IDs are handed out sequentially from 0, in first-seen order
//! - The same kind always maps to the same ID for the registry's lifetime
//! - Registration past the registry capacity is rejected, never truncated

use std::any::{type_name, TypeId};
use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::{EcsError, EcsResult};

/// Hard upper bound on component kinds per registry.
///
/// Matches the width of [`CapabilitySet`].
pub const MAX_CAPABILITIES: usize = 32;

/// Stable identifier of one component kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct CapabilityId(u8);

impl CapabilityId {
    /// Index into per-capability arrays (0 to `MAX_CAPABILITIES - 1`).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    const fn bit(self) -> u32 {
        1 << self.0
    }
}

/// Bitmask of attached capabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Checks whether `id` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, id: CapabilityId) -> bool {
        self.0 & id.bit() != 0
    }

    /// Adds `id` to the set.
    #[inline]
    pub fn insert(&mut self, id: CapabilityId) {
        self.0 |= id.bit();
    }

    /// Removes `id` from the set.
    #[inline]
    pub fn remove(&mut self, id: CapabilityId) {
        self.0 &= !id.bit();
    }

    /// Number of capabilities in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if no capability is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the contained IDs in ascending order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(self) -> impl Iterator<Item = CapabilityId> {
        (0..MAX_CAPABILITIES as u8)
            .map(CapabilityId)
            .filter(move |id| self.contains(*id))
    }
}

#[derive(Default)]
struct Table {
    ids: AHashMap<TypeId, CapabilityId>,
    names: Vec<&'static str>,
}

/// Assigns capability IDs to component kinds.
///
/// The registry is shared by reference (usually through an [`Arc`]) between
/// every entity that indexes storage with its IDs. Reads take a shared lock,
/// so lookups from many entities never contend with each other; only the
/// first registration of a kind takes the write lock.
///
/// ## Cost
///
/// Every typed access on an entity (`has_component`, `get_component`, ...)
/// resolves its kind here first: one uncontended `RwLock` read plus one
/// `ahash` hash lookup of a `TypeId` key. The per-entity part after that is a
/// plain array index. Hot loops that touch the same kind on many entities
/// can resolve the [`CapabilityId`] once with [`lookup`](Self::lookup).
///
/// # Example
///
/// ```rust
/// use tessera_core::CapabilityRegistry;
///
/// struct Position;
/// struct Velocity;
///
/// let registry = CapabilityRegistry::new();
/// let position = registry.register::<Position>().unwrap();
/// let velocity = registry.register::<Velocity>().unwrap();
///
/// assert_eq!(position.index(), 0);
/// assert_eq!(velocity.index(), 1);
/// assert_eq!(registry.register::<Position>().unwrap(), position);
/// ```
pub struct CapabilityRegistry {
    capacity: usize,
    table: RwLock<Table>,
}

impl CapabilityRegistry {
    /// Creates an empty registry with the full [`MAX_CAPABILITIES`] capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_CAPABILITIES)
    }

    /// Creates an empty registry accepting at most `capacity` kinds.
    ///
    /// Capacities above [`MAX_CAPABILITIES`] are clamped to it.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.min(MAX_CAPABILITIES),
            table: RwLock::new(Table::default()),
        }
    }

    /// The process-wide registry used by [`EntityManager::new`](crate::EntityManager::new).
    pub fn global() -> &'static Arc<Self> {
        static GLOBAL: OnceLock<Arc<CapabilityRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new()))
    }

    /// Maximum number of kinds this registry accepts.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of kinds registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().names.len()
    }

    /// Returns `true` if no kind has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the ID of `T`, allocating the next one on first reference.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeCapacityExceeded`] if `T` is new and the registry is
    /// already full.
    pub fn register<T: 'static>(&self) -> EcsResult<CapabilityId> {
        let type_id = TypeId::of::<T>();
        if let Some(id) = self.table.read().ids.get(&type_id) {
            return Ok(*id);
        }

        let mut table = self.table.write();
        // Another thread may have registered it between the two locks.
        if let Some(id) = table.ids.get(&type_id) {
            return Ok(*id);
        }

        let next = table.names.len();
        if next >= self.capacity {
            tracing::warn!(
                component = type_name::<T>(),
                capacity = self.capacity,
                "capability registration rejected"
            );
            return Err(EcsError::TypeCapacityExceeded {
                capacity: self.capacity,
                component: type_name::<T>(),
            });
        }

        #[allow(clippy::cast_possible_truncation)]
        let id = CapabilityId(next as u8);
        table.ids.insert(type_id, id);
        table.names.push(type_name::<T>());
        tracing::debug!(component = type_name::<T>(), id = next, "capability registered");
        Ok(id)
    }

    /// Returns the ID of `T` if it was registered, without allocating one.
    #[must_use]
    pub fn lookup<T: 'static>(&self) -> Option<CapabilityId> {
        self.table.read().ids.get(&TypeId::of::<T>()).copied()
    }

    /// Type name of the kind registered under `id`.
    #[must_use]
    pub fn name_of(&self, id: CapabilityId) -> Option<&'static str> {
        self.table.read().names.get(id.index()).copied()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read();
        f.debug_struct("CapabilityRegistry")
            .field("capacity", &self.capacity)
            .field("kinds", &table.names)
            .finish()
    }
}
