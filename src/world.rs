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

//! World: owns the entity table and every component store
//!
//! Typed calls are routed to the store for their component type through a
//! fixed slot array indexed by [`ComponentTypeId`]. Stores are created the
//! first time a type is attached, so unused types cost nothing.

use crate::component::{Component, ComponentRegistry, ComponentTypeId};
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityIndex};
use crate::entity_table::EntityTable;
use crate::error::{EcsError, Result};
use crate::mask::{ComponentMask, OnesIter};
use crate::query::{ComponentSet, EntityIter};
use crate::storage::{ComponentStore, ErasedStore};

/// One optional store per possible component type id
type StoreSlots = [Option<Box<dyn ErasedStore>>];

/// Central ECS world
pub struct World {
    config: WorldConfig,

    /// Entity slots, masks and free indices
    entities: EntityTable,

    /// Type to id assignment, local to this world
    registry: ComponentRegistry,

    /// Lazily created stores, indexed by component type id
    stores: Box<StoreSlots>,
}

impl World {
    /// Create a new, empty world with the default capacities.
    pub fn new() -> Self {
        Self::build(WorldConfig::default())
    }

    /// Create a world with explicit capacities
    pub fn with_config(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        Self {
            config,
            entities: EntityTable::new(config.max_entities, config.max_components),
            registry: ComponentRegistry::new(config.max_components),
            stores: (0..config.max_components).map(|_| None).collect(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // ========== Entity lifecycle ==========

    /// Create an entity with no components.
    ///
    /// Fails with [`EcsError::CapacityExhausted`] once every index up to
    /// `max_entities` is in use.
    pub fn create_entity(&mut self) -> Result<Entity> {
        let entity = self.entities.create()?;
        #[cfg(feature = "profiling")]
        tracing::trace!(entity = %entity, "entity created");
        Ok(entity)
    }

    /// Remove an entity and drop all of its components.
    ///
    /// Stale and unknown handles leave the world untouched and return
    /// [`EcsError::InvalidEntity`].
    pub fn remove_entity(&mut self, entity: Entity) -> Result<()> {
        if !self.entities.is_live(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }

        #[cfg(feature = "profiling")]
        let _span = tracing::trace_span!("world.remove_entity", entity = %entity).entered();

        let index = entity.index();
        let mask = self
            .entities
            .mask_at(index as usize)
            .cloned()
            .unwrap_or_default();
        // The handle dies before any destructor runs
        self.entities.remove(entity)?;

        let mut fan_out = RemovalFanOut {
            stores: &mut self.stores,
            index,
            pending: mask.ones(),
        };
        fan_out.run();
        Ok(())
    }

    /// Check if an entity is alive
    ///
    /// Returns true if the handle's index and generation both match the table.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_live(entity)
    }

    /// High-water mark of entity indices ever allocated. Upper bound for
    /// index-based iteration.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.count()
    }

    /// Number of live entities
    pub fn live_entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Handle stored at `index`; free slots yield an invalid handle
    #[inline]
    pub fn entity_at(&self, index: usize) -> Option<Entity> {
        self.entities.id_at(index)
    }

    /// Mask of a live entity
    pub fn mask_of(&self, entity: Entity) -> Option<&ComponentMask> {
        if self.entities.is_live(entity) {
            self.entities.mask_at(entity.index() as usize)
        } else {
            None
        }
    }

    /// Mask stored at `index`, without a liveness check
    #[inline]
    pub fn mask_at(&self, index: usize) -> Option<&ComponentMask> {
        self.entities.mask_at(index)
    }

    /// Remove every entity and drop every component value.
    ///
    /// Component type ids stay registered and old handles stay dead.
    pub fn clear(&mut self) {
        for store in self.stores.iter_mut().flatten() {
            store.clear();
        }
        self.entities.clear();
    }

    // ========== Component types ==========

    /// Assign `T` an id now instead of on first attach
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentTypeId> {
        self.registry.register::<T>()
    }

    /// Id of `T`, if it has been registered or attached before
    #[inline]
    pub fn component_id<T: Component>(&self) -> Option<ComponentTypeId> {
        self.registry.id_of::<T>()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // ========== Component lifecycle ==========

    /// Attach a default-constructed `T`.
    pub fn add_component<T: Component + Default>(&mut self, entity: Entity) -> Result<()> {
        self.attach_with(entity, T::default)
    }

    /// Attach `component`, moving it into `T`'s dense store.
    pub fn insert_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        self.attach_with(entity, move || component)
    }

    /// Checks run before the value is built, so a failed attach constructs nothing.
    fn attach_with<T: Component>(&mut self, entity: Entity, make: impl FnOnce() -> T) -> Result<()> {
        if !self.entities.is_live(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        let id = self.registry.register::<T>()?;
        let index = entity.index();
        let duplicate = EcsError::DuplicateComponent {
            entity,
            component: std::any::type_name::<T>(),
        };
        if carries(&self.entities, entity, id) {
            return Err(duplicate);
        }

        let slot = &mut self.stores[id.index()];
        if slot.is_none() {
            let capacity = self.config.max_entities;
            let store = ComponentStore::<T>::try_with_capacity(capacity).map_err(|_| {
                #[cfg(feature = "profiling")]
                tracing::warn!(
                    component = std::any::type_name::<T>(),
                    capacity,
                    "component store allocation failed"
                );
                EcsError::StoreAllocation {
                    component: std::any::type_name::<T>(),
                    capacity,
                }
            })?;
            #[cfg(feature = "profiling")]
            tracing::debug!(
                component = std::any::type_name::<T>(),
                capacity,
                "component store created"
            );
            let store: Box<dyn ErasedStore> = Box::new(store);
            *slot = Some(store);
        }
        let store = match slot.as_deref_mut() {
            Some(store) => downcast_mut::<T>(store, id),
            None => unreachable!("store slot {id} was just filled"),
        };
        if store.insert(index, make()).is_err() {
            return Err(duplicate);
        }

        if let Some(mask) = self.entities.mask_at_mut(index as usize) {
            mask.set(id);
        }
        Ok(())
    }

    /// Detach `T` and hand the value back. Dropping it destroys it.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T> {
        if !self.entities.is_live(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        let missing = || EcsError::ComponentNotFound {
            entity,
            component: std::any::type_name::<T>(),
        };
        let id = self.registry.id_of::<T>().ok_or_else(missing)?;
        if !carries(&self.entities, entity, id) {
            return Err(missing());
        }

        let index = entity.index();
        let component = typed_store_mut::<T>(&self.registry, &mut self.stores)
            .and_then(|store| store.remove(index))
            .ok_or_else(missing)?;

        if let Some(mask) = self.entities.mask_at_mut(index as usize) {
            mask.clear(id);
        }
        Ok(component)
    }

    /// Check if entity has a specific component
    #[inline]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        has::<T>(&self.entities, &self.registry, entity)
    }

    /// Get immutable reference to a component on an entity
    ///
    /// The reference borrows the world, so it cannot outlive any later
    /// attach or detach.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.has_component::<T>(entity) {
            return None;
        }
        typed_store::<T>(&self.registry, &self.stores)?.get(entity.index())
    }

    /// Get mutable reference to a component on an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.has_component::<T>(entity) {
            return None;
        }
        typed_store_mut::<T>(&self.registry, &mut self.stores)?.get_mut(entity.index())
    }

    /// Read-only view of `T`'s dense store
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        typed_store::<T>(&self.registry, &self.stores)
    }

    /// Mutable view of `T`'s dense values, e.g. for a tight loop over
    /// [`DenseMut::as_mut_slice`]. Attach and detach still go through the
    /// world so masks stay in sync.
    pub fn store_mut<T: Component>(&mut self) -> Option<DenseMut<'_, T>> {
        typed_store_mut::<T>(&self.registry, &mut self.stores).map(|store| DenseMut { store })
    }

    /// Every (entity, value) pair of type `T`, in dense order
    pub fn iter_component<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        let entities = &self.entities;
        typed_store::<T>(&self.registry, &self.stores)
            .into_iter()
            .flat_map(|store| store.iter())
            .map(move |(index, value)| (resolve(entities, index), value))
    }

    /// Every (entity, value) pair of type `T`, in dense order, mutably
    pub fn iter_component_mut<T: Component>(
        &mut self,
    ) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        let entities = &self.entities;
        typed_store_mut::<T>(&self.registry, &mut self.stores)
            .into_iter()
            .flat_map(|store| store.iter_mut())
            .map(move |(index, value)| (resolve(entities, index), value))
    }

    /// Store slots that have been created, as (type id, store)
    pub(crate) fn erased_stores(&self) -> impl Iterator<Item = (ComponentTypeId, &dyn ErasedStore)> {
        self.stores.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_deref()
                .map(|store| (ComponentTypeId::new(i as u32), store))
        })
    }

    // ========== Queries ==========

    /// Live entities carrying every type in `Q`, ascending by index.
    ///
    /// `()` matches every live entity.
    pub fn query<Q: ComponentSet>(&self) -> EntityIter<'_> {
        EntityIter::for_set::<Q>(&self.entities, &self.registry)
    }

    /// Live entities whose mask covers `required`
    pub fn query_mask(&self, required: &ComponentMask) -> EntityIter<'_> {
        EntityIter::with_mask(&self.entities, required.clone())
    }

    /// Query plus mutable component access for the same pass.
    ///
    /// The returned [`ComponentsMut`] can read and write component values but
    /// cannot attach, detach, create or remove, so the iteration order cannot
    /// be disturbed. Queue structural changes in a
    /// [`CommandBuffer`](crate::CommandBuffer) and apply them afterwards.
    pub fn query_mut<Q: ComponentSet>(&mut self) -> (EntityIter<'_>, ComponentsMut<'_>) {
        let World {
            entities,
            registry,
            stores,
            ..
        } = self;
        let iter = EntityIter::for_set::<Q>(&*entities, &*registry);
        let components = ComponentsMut {
            entities: &*entities,
            registry: &*registry,
            stores: &mut **stores,
        };
        (iter, components)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("live_entities", &self.entities.live_count())
            .field("component_types", &self.registry.len())
            .finish()
    }
}

/// Component access that cannot change which entities exist or what they carry
pub struct ComponentsMut<'w> {
    entities: &'w EntityTable,
    registry: &'w ComponentRegistry,
    stores: &'w mut StoreSlots,
}

impl ComponentsMut<'_> {
    #[inline]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        has::<T>(self.entities, self.registry, entity)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.has::<T>(entity) {
            return None;
        }
        typed_store::<T>(self.registry, self.stores)?.get(entity.index())
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.has::<T>(entity) {
            return None;
        }
        typed_store_mut::<T>(self.registry, self.stores)?.get_mut(entity.index())
    }

    /// Two different component types of one entity, both mutably.
    ///
    /// `None` if `A` and `B` are the same type or either is missing.
    pub fn get_pair_mut<A: Component, B: Component>(
        &mut self,
        entity: Entity,
    ) -> Option<(&mut A, &mut B)> {
        if !self.has::<A>(entity) || !self.has::<B>(entity) {
            return None;
        }
        let a = self.registry.id_of::<A>()?.index();
        let b = self.registry.id_of::<B>()?.index();
        if a == b {
            return None;
        }

        let (slot_a, slot_b) = if a < b {
            let (low, high) = self.stores.split_at_mut(b);
            (&mut low[a], &mut high[0])
        } else {
            let (low, high) = self.stores.split_at_mut(a);
            (&mut high[0], &mut low[b])
        };
        let store_a = slot_a.as_mut()?.as_any_mut().downcast_mut::<ComponentStore<A>>()?;
        let store_b = slot_b.as_mut()?.as_any_mut().downcast_mut::<ComponentStore<B>>()?;
        let index = entity.index();
        Some((store_a.get_mut(index)?, store_b.get_mut(index)?))
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_live(entity)
    }
}

/// Write access to one component store's values, without structural access
pub struct DenseMut<'w, T> {
    store: &'w mut ComponentStore<T>,
}

impl<T: Component> DenseMut<'_, T> {
    /// Values in dense order
    pub fn as_slice(&self) -> &[T] {
        self.store.as_slice()
    }

    /// Values in dense order, mutably
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.store.as_mut_slice()
    }

    /// Entity indices parallel to the value slices
    pub fn entities(&self) -> &[EntityIndex] {
        self.store.entities()
    }

    pub fn get_mut(&mut self, index: EntityIndex) -> Option<&mut T> {
        self.store.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Drops an entity's components store by store. If a destructor panics, the
/// remaining stores are still visited while unwinding.
struct RemovalFanOut<'a, 'm> {
    stores: &'a mut StoreSlots,
    index: EntityIndex,
    pending: OnesIter<'m>,
}

impl RemovalFanOut<'_, '_> {
    fn run(&mut self) {
        for id in self.pending.by_ref() {
            if let Some(store) = self.stores.get_mut(id.index()).and_then(|slot| slot.as_deref_mut()) {
                store.on_entity_removed(self.index);
            }
        }
    }
}

impl Drop for RemovalFanOut<'_, '_> {
    fn drop(&mut self) {
        self.run();
    }
}

#[inline]
fn carries(entities: &EntityTable, entity: Entity, id: ComponentTypeId) -> bool {
    entities
        .mask_at(entity.index() as usize)
        .is_some_and(|mask| mask.contains(id))
}

#[inline]
fn has<T: Component>(entities: &EntityTable, registry: &ComponentRegistry, entity: Entity) -> bool {
    entities.is_live(entity)
        && registry
            .id_of::<T>()
            .is_some_and(|id| carries(entities, entity, id))
}

/// Components only exist for live entities, so the stored id is the live handle
#[inline]
fn resolve(entities: &EntityTable, index: u32) -> Entity {
    entities.id_at(index as usize).unwrap_or(Entity::INVALID)
}

fn typed_store<'a, T: Component>(
    registry: &ComponentRegistry,
    stores: &'a StoreSlots,
) -> Option<&'a ComponentStore<T>> {
    let id = registry.id_of::<T>()?;
    stores
        .get(id.index())?
        .as_deref()?
        .as_any()
        .downcast_ref::<ComponentStore<T>>()
}

fn typed_store_mut<'a, T: Component>(
    registry: &ComponentRegistry,
    stores: &'a mut StoreSlots,
) -> Option<&'a mut ComponentStore<T>> {
    let id = registry.id_of::<T>()?;
    stores
        .get_mut(id.index())?
        .as_deref_mut()?
        .as_any_mut()
        .downcast_mut::<ComponentStore<T>>()
}

/// Slots are only ever filled with the store for the type their id was
/// assigned to.
fn downcast_mut<T: Component>(store: &mut dyn ErasedStore, id: ComponentTypeId) -> &mut ComponentStore<T> {
    match store.as_any_mut().downcast_mut::<ComponentStore<T>>() {
        Some(store) => store,
        None => unreachable!(
            "store slot {id} does not hold {}",
            std::any::type_name::<T>()
        ),
    }
}

#[cfg(test)]
mod tests {
    #![allow(dead_code)]
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[test]
    fn test_world_creation() {
        let world = World::new();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.live_entity_count(), 0);
        assert_eq!(world.config(), &WorldConfig::default());
    }

    #[test]
    fn test_with_config_validates() {
        let bad = WorldConfig::default().with_max_entities(0);
        assert!(matches!(
            World::with_config(bad),
            Err(EcsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_add_get_remove() -> Result<()> {
        let mut world = World::new();
        let entity = world.create_entity()?;

        world.add_component::<Position>(entity)?;
        assert!(world.has_component::<Position>(entity));
        assert_eq!(world.get_component::<Position>(entity), Some(&Position::default()));

        world.get_component_mut::<Position>(entity).unwrap().x = 4.0;
        let removed = world.remove_component::<Position>(entity)?;
        assert_eq!(removed.x, 4.0);
        assert!(!world.has_component::<Position>(entity));
        assert!(world.get_component::<Position>(entity).is_none());
        Ok(())
    }

    #[test]
    fn test_duplicate_attach_fails_without_change() -> Result<()> {
        let mut world = World::new();
        let entity = world.create_entity()?;
        world.insert_component(entity, Position { x: 1.0, y: 1.0 })?;

        let err = world
            .insert_component(entity, Position { x: 9.0, y: 9.0 })
            .unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { .. }));
        assert_eq!(world.get_component::<Position>(entity).unwrap().x, 1.0);
        assert_eq!(world.store::<Position>().unwrap().len(), 1);
        Ok(())
    }

    #[test]
    fn test_detach_missing_fails() -> Result<()> {
        let mut world = World::new();
        let entity = world.create_entity()?;

        // Never-registered type
        assert!(matches!(
            world.remove_component::<Velocity>(entity),
            Err(EcsError::ComponentNotFound { .. })
        ));

        // Registered but not carried by this entity
        let other = world.create_entity()?;
        world.add_component::<Velocity>(other)?;
        assert!(matches!(
            world.remove_component::<Velocity>(entity),
            Err(EcsError::ComponentNotFound { .. })
        ));
        assert!(world.has_component::<Velocity>(other));
        Ok(())
    }

    #[test]
    fn test_stale_handle_operations_fail() -> Result<()> {
        let mut world = World::new();
        let entity = world.create_entity()?;
        world.add_component::<Position>(entity)?;
        world.remove_entity(entity)?;

        assert_eq!(
            world.remove_entity(entity),
            Err(EcsError::InvalidEntity(entity))
        );
        assert_eq!(
            world.add_component::<Position>(entity),
            Err(EcsError::InvalidEntity(entity))
        );
        assert!(world.remove_component::<Position>(entity).is_err());
        assert!(!world.has_component::<Position>(entity));
        assert!(world.get_component::<Position>(entity).is_none());
        assert!(world.mask_of(entity).is_none());
        Ok(())
    }

    #[test]
    fn test_reused_index_does_not_inherit_components() -> Result<()> {
        let mut world = World::new();
        let old = world.create_entity()?;
        world.add_component::<Position>(old)?;
        world.remove_entity(old)?;

        let new = world.create_entity()?;
        assert_eq!(new.index(), old.index());
        assert!(!world.has_component::<Position>(new));
        assert!(world.store::<Position>().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_read_only_calls_do_not_register() -> Result<()> {
        let mut world = World::new();
        let entity = world.create_entity()?;

        assert!(!world.has_component::<Position>(entity));
        assert!(world.get_component::<Position>(entity).is_none());
        assert_eq!(world.query::<(Position,)>().count(), 0);
        assert!(world.component_id::<Position>().is_none());
        assert!(world.registry().is_empty());
        Ok(())
    }

    #[test]
    fn test_type_overflow_is_checked() -> Result<()> {
        let config = WorldConfig::default().with_max_components(1);
        let mut world = World::with_config(config)?;
        let entity = world.create_entity()?;

        world.add_component::<Position>(entity)?;
        assert!(matches!(
            world.add_component::<Velocity>(entity),
            Err(EcsError::ComponentTypeOverflow { capacity: 1, .. })
        ));
        assert!(world.has_component::<Position>(entity));
        Ok(())
    }

    #[test]
    fn test_entity_capacity_is_checked() -> Result<()> {
        let config = WorldConfig::default().with_max_entities(2);
        let mut world = World::with_config(config)?;
        let a = world.create_entity()?;
        world.create_entity()?;

        assert_eq!(
            world.create_entity(),
            Err(EcsError::CapacityExhausted { capacity: 2 })
        );
        world.remove_entity(a)?;
        assert!(world.create_entity().is_ok());
        Ok(())
    }

    #[test]
    fn test_mask_tracks_components() -> Result<()> {
        let mut world = World::new();
        let entity = world.create_entity()?;
        world.add_component::<Position>(entity)?;
        world.add_component::<Velocity>(entity)?;

        let pos = world.component_id::<Position>().unwrap();
        let vel = world.component_id::<Velocity>().unwrap();
        let mask = world.mask_of(entity).unwrap();
        assert!(mask.contains(pos) && mask.contains(vel));

        world.remove_component::<Position>(entity)?;
        let mask = world.mask_of(entity).unwrap();
        assert!(!mask.contains(pos) && mask.contains(vel));
        assert_eq!(world.mask_at(entity.index() as usize), Some(mask));
        Ok(())
    }

    #[test]
    fn test_query_mut_updates_values() -> Result<()> {
        let mut world = World::new();
        for i in 0..4 {
            let entity = world.create_entity()?;
            world.insert_component(entity, Position { x: i as f32, y: 0.0 })?;
            if i % 2 == 0 {
                world.insert_component(entity, Velocity { x: 1.0, y: 2.0 })?;
            }
        }

        let (iter, mut components) = world.query_mut::<(Position, Velocity)>();
        for entity in iter {
            let (pos, vel) = components
                .get_pair_mut::<Position, Velocity>(entity)
                .unwrap();
            pos.x += vel.x;
            pos.y += vel.y;
        }

        let xs: Vec<f32> = world.iter_component::<Position>().map(|(_, p)| p.x).collect();
        assert_eq!(xs, vec![1.0, 1.0, 3.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_pair_mut_rejects_same_type() -> Result<()> {
        let mut world = World::new();
        let entity = world.create_entity()?;
        world.add_component::<Position>(entity)?;

        let (_, mut components) = world.query_mut::<()>();
        assert!(components.get_pair_mut::<Position, Position>(entity).is_none());
        assert!(components.get_mut::<Position>(entity).is_some());
        Ok(())
    }

    #[test]
    fn test_iter_component_mut() -> Result<()> {
        let mut world = World::new();
        let a = world.create_entity()?;
        let b = world.create_entity()?;
        world.add_component::<Velocity>(a)?;
        world.add_component::<Velocity>(b)?;

        for (_, vel) in world.iter_component_mut::<Velocity>() {
            vel.x = 5.0;
        }
        let seen: Vec<Entity> = world.iter_component::<Velocity>().map(|(e, _)| e).collect();
        assert_eq!(seen, vec![a, b]);
        assert_eq!(world.get_component::<Velocity>(b).unwrap().x, 5.0);
        assert_eq!(world.iter_component::<Position>().count(), 0);
        Ok(())
    }

    #[test]
    fn test_clear() -> Result<()> {
        let mut world = World::new();
        let a = world.create_entity()?;
        world.add_component::<Position>(a)?;
        world.clear();

        assert_eq!(world.live_entity_count(), 0);
        assert!(!world.is_alive(a));
        assert!(world.store::<Position>().unwrap().is_empty());
        assert!(world.component_id::<Position>().is_some());
        Ok(())
    }

    #[test]
    fn test_store_mut_edits_dense_values() -> Result<()> {
        let mut world = World::new();
        let a = world.create_entity()?;
        let b = world.create_entity()?;
        world.add_component::<Position>(a)?;
        world.insert_component(b, Position { x: 2.0, y: 0.0 })?;

        {
            let mut dense = world.store_mut::<Position>().unwrap();
            assert_eq!(dense.entities(), &[a.index(), b.index()]);
            for pos in dense.as_mut_slice() {
                pos.x += 1.0;
            }
            assert_eq!(dense.len(), 2);
        }

        assert_eq!(world.get_component::<Position>(a).unwrap().x, 1.0);
        assert_eq!(world.get_component::<Position>(b).unwrap().x, 3.0);
        assert!(world.store_mut::<Velocity>().is_none());
        Ok(())
    }

    /// Large enough that a store for every possible index cannot be mapped
    struct Huge([u64; 1 << 14]);

    impl Default for Huge {
        fn default() -> Self {
            Huge([0; 1 << 14])
        }
    }

    #[test]
    fn test_largest_config_fails_without_aborting() -> Result<()> {
        let config = WorldConfig::default()
            .with_max_entities(u32::MAX as usize)
            .with_max_components(crate::config::MAX_COMPONENT_TYPES);
        let mut world = World::with_config(config)?;

        let entity = world.create_entity()?;
        assert!(matches!(
            world.add_component::<Huge>(entity),
            Err(EcsError::StoreAllocation { .. })
        ));
        assert!(!world.has_component::<Huge>(entity));
        assert!(world.store::<Huge>().is_none());

        world.remove_entity(entity)?;
        assert_eq!(world.live_entity_count(), 0);
        Ok(())
    }

    /// Destructor panics while armed
    struct Volatile(bool);

    impl Drop for Volatile {
        fn drop(&mut self) {
            if self.0 {
                panic!("volatile component dropped");
            }
        }
    }

    struct Counted(std::rc::Rc<std::cell::Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_panicking_destructor_leaves_world_consistent() -> Result<()> {
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let drops = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut world = World::new();
        let entity = world.create_entity()?;
        world.insert_component(entity, Volatile(true))?;
        world.insert_component(entity, Counted(drops.clone()))?;

        let outcome = catch_unwind(AssertUnwindSafe(|| world.remove_entity(entity)));
        assert!(outcome.is_err());

        assert!(!world.is_alive(entity));
        assert!(!world.has_component::<Volatile>(entity));
        assert!(world.get_component::<Volatile>(entity).is_none());
        // Stores after the panicking one were still visited
        assert_eq!(drops.get(), 1);
        assert!(world.store::<Volatile>().unwrap().is_empty());
        assert!(world.store::<Counted>().unwrap().is_empty());

        let reused = world.create_entity()?;
        assert_eq!(reused.index(), entity.index());
        world.insert_component(reused, Volatile(false))?;
        world.insert_component(reused, Counted(drops.clone()))?;
        assert!(world.has_component::<Volatile>(reused));
        Ok(())
    }
}
