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

//! Component trait and per-world type identity
//!
//! Components are plain data attached to entities. Each distinct component
//! type gets a small integer id the first time a world registers it. Ids are
//! owned by the world's [`ComponentRegistry`], not by process-wide state, so
//! two worlds may number the same type differently.

use std::any::TypeId;
use std::fmt;

use ahash::AHashMap;

use crate::error::{EcsError, Result};

/// Marker trait for components
///
/// Components must be 'static (no borrowed data)
pub trait Component: 'static {}

/// Automatically implement Component for all valid types
impl<T: 'static> Component for T {}

/// Small integer identifying a component type within one world.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(u32);

impl ComponentTypeId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        ComponentTypeId(id)
    }

    /// Position of this type's bit in a mask and of its store slot.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registration data for one component type
#[derive(Clone, Debug)]
pub struct ComponentInfo {
    pub id: ComponentTypeId,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

/// Assigns stable ids to component types, in first-registration order.
///
/// Ids are never reclaimed. At most `capacity` distinct types can be
/// registered.
#[derive(Debug)]
pub struct ComponentRegistry {
    ids: AHashMap<TypeId, ComponentTypeId>,
    infos: Vec<ComponentInfo>,
    capacity: usize,
}

impl ComponentRegistry {
    /// Create an empty registry accepting up to `capacity` types
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: AHashMap::with_capacity(capacity),
            infos: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Return the id of `T`, assigning the next free one on first use.
    pub fn register<T: Component>(&mut self) -> Result<ComponentTypeId> {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.ids.get(&type_id) {
            return Ok(id);
        }

        let type_name = std::any::type_name::<T>();
        if self.infos.len() >= self.capacity {
            #[cfg(feature = "profiling")]
            tracing::warn!(
                component = type_name,
                capacity = self.capacity,
                "component type overflow"
            );
            return Err(EcsError::ComponentTypeOverflow {
                capacity: self.capacity,
                component: type_name,
            });
        }

        let id = ComponentTypeId::new(self.infos.len() as u32);
        self.ids.insert(type_id, id);
        self.infos.push(ComponentInfo {
            id,
            type_id,
            type_name,
        });

        #[cfg(feature = "profiling")]
        tracing::debug!(component = type_name, id = id.0, "registered component type");

        Ok(id)
    }

    /// Look up the id of `T` without assigning one
    #[inline]
    pub fn id_of<T: Component>(&self) -> Option<ComponentTypeId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Get registration by id
    pub fn info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// All registrations, in id order
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Maximum number of types this registry accepts
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    #![allow(dead_code)]
    use super::*;

    struct Position {
        x: f32,
    }

    struct Velocity {
        x: f32,
    }

    struct Health(u32);

    #[test]
    fn test_ids_in_first_use_order() {
        let mut registry = ComponentRegistry::new(8);
        let vel = registry.register::<Velocity>().unwrap();
        let pos = registry.register::<Position>().unwrap();

        assert_eq!(vel.index(), 0);
        assert_eq!(pos.index(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = ComponentRegistry::new(8);
        let first = registry.register::<Position>().unwrap();
        let second = registry.register::<Position>().unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.id_of::<Position>(), Some(first));
    }

    #[test]
    fn test_lookup_does_not_assign() {
        let registry = ComponentRegistry::new(8);
        assert_eq!(registry.id_of::<Health>(), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut registry = ComponentRegistry::new(2);
        registry.register::<Position>().unwrap();
        registry.register::<Velocity>().unwrap();

        let err = registry.register::<Health>().unwrap_err();
        assert!(matches!(
            err,
            EcsError::ComponentTypeOverflow { capacity: 2, .. }
        ));
        // Already-known types still resolve
        assert!(registry.register::<Position>().is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_info_records_type_name() {
        let mut registry = ComponentRegistry::new(4);
        let id = registry.register::<Health>().unwrap();
        let info = registry.info(id).unwrap();

        assert_eq!(info.type_id, TypeId::of::<Health>());
        assert!(info.type_name.ends_with("Health"));
    }
}
