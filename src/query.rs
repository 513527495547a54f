// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Filtering entity iteration
//!
//! A query names a set of component types as a tuple, e.g.
//! `world.query::<(Position, Velocity)>()`, and yields the live entities whose
//! mask covers all of them, in ascending index order. The empty tuple `()`
//! yields every live entity.
//!
//! The iterator borrows the world, so attaching, detaching, creating or
//! removing while iterating is rejected at compile time. Collect the handles
//! first, or queue changes in a [`CommandBuffer`](crate::CommandBuffer):
//!
//! ```
//! use lite_ecs::{CommandBuffer, World};
//!
//! #[derive(Default)]
//! struct Health(i32);
//!
//! let mut world = World::new();
//! let entity = world.create_entity().unwrap();
//! world.add_component::<Health>(entity).unwrap();
//!
//! let mut commands = CommandBuffer::new();
//! for entity in world.query::<(Health,)>() {
//!     if world.get_component::<Health>(entity).map_or(false, |h| h.0 <= 0) {
//!         commands.remove_entity(entity);
//!     }
//! }
//! commands.apply(&mut world).unwrap();
//! assert_eq!(world.live_entity_count(), 0);
//! ```

use std::iter::FusedIterator;

use smallvec::{smallvec, SmallVec};

use crate::component::{Component, ComponentRegistry};
use crate::entity::Entity;
use crate::entity_table::EntityTable;
use crate::mask::ComponentMask;

/// Maximum number of component types in one query tuple
pub const MAX_QUERY_COMPONENTS: usize = 8;

/// A list of component types an entity must all carry
pub trait ComponentSet: 'static {
    /// Mask with one bit per type in the set.
    ///
    /// `None` if some type has never been registered, in which case no
    /// entity can match.
    fn required_mask(registry: &ComponentRegistry) -> Option<ComponentMask>;

    /// Type names, for diagnostics
    fn type_names() -> SmallVec<[&'static str; MAX_QUERY_COMPONENTS]>;
}

impl ComponentSet for () {
    fn required_mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
        Some(ComponentMask::with_capacity(registry.capacity()))
    }

    fn type_names() -> SmallVec<[&'static str; MAX_QUERY_COMPONENTS]> {
        SmallVec::new()
    }
}

// Macro for tuple ComponentSet implementations
macro_rules! impl_component_set {
    ($($T:ident),*) => {
        impl<$($T: Component),*> ComponentSet for ($($T,)*) {
            fn required_mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
                let mut mask = ComponentMask::with_capacity(registry.capacity());
                $(mask.set(registry.id_of::<$T>()?);)*
                Some(mask)
            }

            fn type_names() -> SmallVec<[&'static str; MAX_QUERY_COMPONENTS]> {
                smallvec![$(std::any::type_name::<$T>()),*]
            }
        }
    };
}

// Implement for tuples of 1-8 components
impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

#[derive(Debug, Clone)]
enum Filter {
    /// Every live entity
    All,
    /// Live entities whose mask covers this one
    Covers(ComponentMask),
    /// A requested type was never registered
    Nothing,
}

/// Lazy iterator over matching live entities.
///
/// The scan bound is the entity count at construction. Yields the stored
/// handle for each matching index, never the bare index.
#[derive(Debug, Clone)]
pub struct EntityIter<'w> {
    entities: &'w EntityTable,
    index: usize,
    end: usize,
    filter: Filter,
}

impl<'w> EntityIter<'w> {
    /// Iterate the entities carrying every type in `Q`
    pub fn for_set<Q: ComponentSet>(entities: &'w EntityTable, registry: &ComponentRegistry) -> Self {
        let filter = match Q::required_mask(registry) {
            Some(mask) if mask.is_empty() => Filter::All,
            Some(mask) => Filter::Covers(mask),
            None => Filter::Nothing,
        };
        Self::new(entities, filter)
    }

    /// Iterate the entities whose mask covers `required`.
    /// An empty mask matches every live entity.
    pub fn with_mask(entities: &'w EntityTable, required: ComponentMask) -> Self {
        let filter = if required.is_empty() {
            Filter::All
        } else {
            Filter::Covers(required)
        };
        Self::new(entities, filter)
    }

    fn new(entities: &'w EntityTable, filter: Filter) -> Self {
        let end = match filter {
            Filter::Nothing => 0,
            _ => entities.count(),
        };
        Self {
            entities,
            index: 0,
            end,
            filter,
        }
    }

    #[inline]
    fn matches(&self, index: usize) -> Option<Entity> {
        let id = self.entities.id_at(index)?;
        if !id.is_valid() {
            return None;
        }
        match &self.filter {
            Filter::All => Some(id),
            Filter::Covers(required) => self
                .entities
                .mask_at(index)
                .filter(|mask| mask.is_superset_of(required))
                .map(|_| id),
            Filter::Nothing => None,
        }
    }
}

impl Iterator for EntityIter<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.end {
            let index = self.index;
            self.index += 1;
            if let Some(entity) = self.matches(index) {
                return Some(entity);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.index))
    }
}

impl FusedIterator for EntityIter<'_> {}

#[cfg(test)]
mod tests {
    #![allow(dead_code)]
    use super::*;
    use crate::world::World;
    use crate::Result;

    #[derive(Default)]
    struct A(u32);

    #[derive(Default)]
    struct B(u32);

    #[derive(Default)]
    struct C;

    #[test]
    fn test_empty_set_matches_all_live() -> Result<()> {
        let mut world = World::new();
        let e0 = world.create_entity()?;
        let e1 = world.create_entity()?;
        let e2 = world.create_entity()?;
        world.remove_entity(e1)?;

        let all: Vec<Entity> = world.query::<()>().collect();
        assert_eq!(all, vec![e0, e2]);
        Ok(())
    }

    #[test]
    fn test_filters_by_superset() -> Result<()> {
        let mut world = World::new();
        let e0 = world.create_entity()?;
        let e1 = world.create_entity()?;
        let e2 = world.create_entity()?;
        world.add_component::<A>(e0)?;
        world.add_component::<A>(e1)?;
        world.add_component::<B>(e1)?;
        world.add_component::<B>(e2)?;

        assert_eq!(world.query::<(A,)>().collect::<Vec<_>>(), vec![e0, e1]);
        assert_eq!(world.query::<(B,)>().collect::<Vec<_>>(), vec![e1, e2]);
        assert_eq!(world.query::<(A, B)>().collect::<Vec<_>>(), vec![e1]);
        assert_eq!(world.query::<(B, A)>().collect::<Vec<_>>(), vec![e1]);
        Ok(())
    }

    #[test]
    fn test_unregistered_type_matches_nothing() -> Result<()> {
        let mut world = World::new();
        let e0 = world.create_entity()?;
        world.add_component::<A>(e0)?;

        let mut iter = world.query::<(A, C)>();
        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert_eq!(iter.next(), None);
        Ok(())
    }

    #[test]
    fn test_restart_by_reconstruction() -> Result<()> {
        let mut world = World::new();
        let e0 = world.create_entity()?;
        world.add_component::<A>(e0)?;

        let mut first = world.query::<(A,)>();
        assert_eq!(first.next(), Some(e0));
        assert_eq!(first.next(), None);
        assert_eq!(first.next(), None);

        assert_eq!(world.query::<(A,)>().next(), Some(e0));
        Ok(())
    }

    #[test]
    fn test_yields_current_handle_for_reused_index() -> Result<()> {
        let mut world = World::new();
        let old = world.create_entity()?;
        world.remove_entity(old)?;
        let new = world.create_entity()?;

        let all: Vec<Entity> = world.query::<()>().collect();
        assert_eq!(all, vec![new]);
        assert_ne!(all[0], old);
        Ok(())
    }

    #[test]
    fn test_query_by_mask() -> Result<()> {
        let mut world = World::new();
        let e0 = world.create_entity()?;
        let e1 = world.create_entity()?;
        world.add_component::<A>(e0)?;
        world.add_component::<B>(e1)?;

        let b_id = world.component_id::<B>().unwrap();
        let mask: ComponentMask = [b_id].into_iter().collect();
        assert_eq!(world.query_mask(&mask).collect::<Vec<_>>(), vec![e1]);

        let empty = ComponentMask::default();
        assert_eq!(world.query_mask(&empty).count(), 2);
        Ok(())
    }

    #[test]
    fn test_type_names() {
        let names = <(A, B)>::type_names();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("A"));
        assert!(<()>::type_names().is_empty());
    }
}
