//! # Component Contract
//!
//! Components are units of behavior owned by exactly one entity.
//! Unlike plain-data ECS designs they carry their own hooks, and the
//! entity drives them directly during each pass.

use std::any::Any;

use super::entity::Entity;

/// Upcast helper so boxed components can be downcast to their concrete kind.
///
/// Implemented for every `'static` type; there is nothing to implement by hand.
pub trait AsAny: Any {
    /// Borrows `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrows `self` as [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Converts the box into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A pluggable unit of behavior attached to an [`Entity`].
///
/// All hooks default to no-ops. Each receives the owning entity, through
/// which the component can inspect or mutate its siblings, read the owner's
/// [`EntityId`](super::EntityId), or flag the owner for removal.
///
/// While a hook runs, the component's own slot on the owner is vacant:
/// `owner.get_component::<Self>()` returns `None` from inside its own hook,
/// even though `owner.has_component::<Self>()` stays `true`.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, Entity, EntityManager};
///
/// struct Position { x: f32, y: f32 }
/// impl Component for Position {}
///
/// struct Velocity { dx: f32, dy: f32 }
/// impl Component for Velocity {
///     fn update(&mut self, owner: &mut Entity) {
///         if let Some(pos) = owner.get_component_mut::<Position>() {
///             pos.x += self.dx;
///             pos.y += self.dy;
///         }
///     }
/// }
///
/// let mut manager = EntityManager::new();
/// let entity = manager.add_entity();
/// entity.add_component(Position { x: 0.0, y: 0.0 }).unwrap();
/// entity.add_component(Velocity { dx: 1.0, dy: 2.0 }).unwrap();
/// let id = entity.id();
///
/// manager.update();
///
/// let pos = manager.get(id).unwrap().get_component::<Position>().unwrap();
/// assert_eq!((pos.x, pos.y), (1.0, 2.0));
/// ```
pub trait Component: AsAny {
    /// Runs once, right after attachment.
    ///
    /// Only components attached earlier than this one are reachable through
    /// `owner` at this point. Components attached from inside `init` are
    /// placed after this one in attachment order.
    ///
    /// Nested attachment: if this `init` attaches a sibling, the sibling's
    /// own `init` runs while this component is still being initialised. The
    /// sibling then sees this kind through `has_component` but not through
    /// `get_component`, since the instance is not in its slot until this
    /// `init` returns.
    fn init(&mut self, _owner: &mut Entity) {}

    /// Runs once per manager update pass.
    fn update(&mut self, _owner: &mut Entity) {}

    /// Runs once per manager draw pass.
    fn draw(&mut self, _owner: &mut Entity) {}
}

#[inline]
pub(crate) fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

#[inline]
pub(crate) fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    component.as_any_mut().downcast_mut::<T>()
}
