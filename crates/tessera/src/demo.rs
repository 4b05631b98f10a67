//! # Demo Components
//!
//! A small population of moving, poisoned, mortal entities used by the
//! `sandbox` binary.

use tessera_core::{Component, EcsResult, Entity, EntityId, EntityManager};
use tessera_runtime::Signal;

use crate::sim_loop::LoopConfig;

/// Location in the plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Component for Position {
    fn draw(&mut self, owner: &mut Entity) {
        tracing::trace!(entity = %owner.id(), x = self.x, y = self.y, "draw");
    }
}

/// Per-tick displacement of the sibling [`Position`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    /// Horizontal step.
    pub dx: f32,
    /// Vertical step.
    pub dy: f32,
}

impl Component for Velocity {
    fn update(&mut self, owner: &mut Entity) {
        if let Some(pos) = owner.get_component_mut::<Position>() {
            pos.x += self.dx;
            pos.y += self.dy;
        }
    }
}

/// Hit points. Announces the owner on `deaths` and destroys it at zero.
#[derive(Debug)]
pub struct Health {
    current: i32,
    max: i32,
    deaths: Signal<EntityId>,
}

impl Health {
    /// Full health of `max`, reporting deaths on `deaths`.
    #[must_use]
    pub fn new(max: i32, deaths: Signal<EntityId>) -> Self {
        Self {
            current: max,
            max,
            deaths,
        }
    }

    /// Remaining hit points.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Starting hit points.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Returns `true` at zero hit points.
    #[inline]
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current <= 0
    }

    /// Subtracts `amount`, never going below zero.
    pub fn damage(&mut self, amount: i32) {
        self.current = self.current.saturating_sub(amount).max(0);
    }
}

impl Component for Health {
    fn init(&mut self, owner: &mut Entity) {
        tracing::trace!(entity = %owner.id(), hp = self.max, "health attached");
    }

    fn update(&mut self, owner: &mut Entity) {
        if self.is_dead() && owner.is_active() {
            self.deaths.emit(&owner.id());
            owner.destroy();
        }
    }
}

/// Damages the sibling [`Health`] every update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Poison {
    /// Damage per tick.
    pub per_tick: i32,
}

impl Component for Poison {
    fn update(&mut self, owner: &mut Entity) {
        if let Some(health) = owner.get_component_mut::<Health>() {
            health.damage(self.per_tick);
        }
    }
}

/// Destroys its owner after a fixed number of updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifetime {
    remaining: u32,
}

impl Lifetime {
    /// Lives for `ticks` updates.
    #[must_use]
    pub const fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }

    /// Updates left.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Component for Lifetime {
    fn update(&mut self, owner: &mut Entity) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            owner.destroy();
        }
    }
}

/// Spawns `config.entities` demo entities into `manager`.
///
/// Entity `i` moves along x and is poisoned with strength `i % 4` when that
/// is nonzero. Every fifth entity expires after half the run.
///
/// # Errors
///
/// Propagates attachment failures, e.g. a full capability registry.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn spawn_population(
    manager: &mut EntityManager,
    config: &LoopConfig,
    deaths: &Signal<EntityId>,
) -> EcsResult<Vec<EntityId>> {
    let lifetime = u32::try_from(config.ticks / 2).unwrap_or(u32::MAX).max(1);
    let mut spawned = Vec::with_capacity(config.entities);

    for i in 0..config.entities {
        let entity = manager.add_entity();
        entity.add_component(Position { x: i as f32, y: 0.0 })?;
        entity.add_component(Velocity {
            dx: 1.0,
            dy: (i % 3) as f32 - 1.0,
        })?;
        entity.add_component(Health::new(config.starting_health, deaths.clone()))?;

        let strength = (i % 4) as i32;
        if strength > 0 {
            entity.add_component(Poison { per_tick: strength })?;
        }
        if i % 5 == 4 {
            entity.add_component(Lifetime::new(lifetime))?;
        }
        spawned.push(entity.id());
    }

    tracing::info!(count = spawned.len(), "population spawned");
    Ok(spawned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tessera_core::CapabilityRegistry;

    fn isolated() -> EntityManager {
        EntityManager::with_registry(Arc::new(CapabilityRegistry::new()))
    }

    #[test]
    fn test_velocity_moves_position() {
        let mut manager = isolated();
        let entity = manager.add_entity();
        entity.add_component(Position::default()).unwrap();
        entity.add_component(Velocity { dx: 2.0, dy: -1.0 }).unwrap();
        let id = entity.id();

        manager.tick();
        manager.tick();

        let pos = manager.get(id).unwrap().get_component::<Position>().unwrap();
        assert_eq!(*pos, Position { x: 4.0, y: -2.0 });
    }

    #[test]
    fn test_poison_kills_and_announces() {
        let deaths = Signal::new();
        let announced = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&announced);
        let _conn = deaths.connect(move |id: &EntityId| sink.lock().unwrap().push(*id));

        let mut manager = isolated();
        let entity = manager.add_entity();
        entity.add_component(Health::new(10, deaths.clone())).unwrap();
        entity.add_component(Poison { per_tick: 5 }).unwrap();
        let id = entity.id();

        assert_eq!(manager.tick().removed, 0);
        assert_eq!(manager.tick().removed, 0);
        assert_eq!(
            manager.get(id).unwrap().get_component::<Health>().unwrap().current(),
            0
        );
        assert!(announced.lock().unwrap().is_empty());

        // Health updates before Poison, so death is noticed one tick late.
        assert_eq!(manager.tick().removed, 1);
        assert_eq!(*announced.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_lifetime_expires() {
        let mut manager = isolated();
        manager.add_entity().add_component(Lifetime::new(3)).unwrap();

        assert_eq!(manager.tick().removed, 0);
        assert_eq!(manager.tick().removed, 0);
        assert_eq!(manager.tick().removed, 1);
    }

    #[test]
    fn test_spawn_population() {
        let deaths = Signal::new();
        let died = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&died);
        let _conn = deaths.connect(move |_: &EntityId| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let config = LoopConfig {
            entities: 8,
            ticks: 10,
            starting_health: 6,
            tick_rate: 0.0,
        };
        let mut manager = isolated();
        let ids = spawn_population(&mut manager, &config, &deaths).unwrap();
        assert_eq!(ids.len(), 8);
        assert_eq!(manager.len(), 8);

        for _ in 0..config.ticks {
            manager.tick();
        }

        // Strength 0 survives; entity 4 has strength 0 but expires.
        let survivors: Vec<EntityId> = manager.iter().map(Entity::id).collect();
        assert_eq!(survivors, vec![ids[0]]);
        assert_eq!(died.load(Ordering::SeqCst), 6);
    }
}
