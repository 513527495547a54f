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

//! Entity table: slot per index, free-index stack, generation bookkeeping.
//!
//! A slot stores the id currently handed out for its index together with the
//! component mask of that entity. Removing an entity rewrites the stored id to
//! `(INVALID_INDEX, generation + 1)`, so every handle from before the removal
//! stops comparing equal. Freed indices are reused last-in first-out.

use crate::entity::{Entity, EntityGeneration, EntityIndex};
use crate::error::{EcsError, Result};
use crate::mask::ComponentMask;

/// Slots reserved up front, capped by the configured capacity
const INITIAL_SLOTS: usize = 1024;

#[derive(Debug, Clone)]
struct Slot {
    id: Entity,
    mask: ComponentMask,
}

/// Fixed-capacity entity table
#[derive(Debug)]
pub struct EntityTable {
    slots: Vec<Slot>,
    free_indices: Vec<EntityIndex>,
    /// Indices whose generation is exhausted; never handed out again
    retired: usize,
    capacity: usize,
    mask_width: usize,
}

impl EntityTable {
    /// Create a table for at most `capacity` indices, with masks `mask_width` bits wide
    pub fn new(capacity: usize, mask_width: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.min(INITIAL_SLOTS)),
            free_indices: Vec::new(),
            retired: 0,
            capacity,
            mask_width,
        }
    }

    /// Allocate a handle.
    ///
    /// Reuses the most recently freed index if there is one; its generation
    /// was already advanced on removal. Otherwise takes the next unused index
    /// at generation 0.
    pub fn create(&mut self) -> Result<Entity> {
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            let entity = Entity::new(index, slot.id.generation());
            slot.id = entity;
            slot.mask.reset();
            return Ok(entity);
        }

        if self.slots.len() >= self.capacity {
            #[cfg(feature = "profiling")]
            tracing::warn!(capacity = self.capacity, "entity capacity exhausted");
            return Err(EcsError::CapacityExhausted {
                capacity: self.capacity,
            });
        }

        let entity = Entity::new(self.slots.len() as EntityIndex, 0);
        self.slots.push(Slot {
            id: entity,
            mask: ComponentMask::with_capacity(self.mask_width),
        });
        Ok(entity)
    }

    /// Invalidate `entity` and free its index.
    ///
    /// Only touches the table; component data must already be detached.
    pub fn remove(&mut self, entity: Entity) -> Result<()> {
        if !self.is_live(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }

        let index = entity.index();
        let next_generation: EntityGeneration = entity.generation().wrapping_add(1);
        let slot = &mut self.slots[index as usize];
        slot.id = Entity::new(Entity::INVALID_INDEX, next_generation);
        slot.mask.reset();

        // A generation of MAX would wrap to 0 on the next removal and let
        // ancient handles alias new ones, so the index is retired instead.
        if next_generation == EntityGeneration::MAX {
            self.retired += 1;
            #[cfg(feature = "profiling")]
            tracing::debug!(index, "entity index retired after generation exhaustion");
        } else {
            self.free_indices.push(index);
        }
        Ok(())
    }

    /// Index in range and stored id equal (index and generation).
    #[inline]
    pub fn is_live(&self, entity: Entity) -> bool {
        entity.is_valid()
            && self
                .slots
                .get(entity.index() as usize)
                .is_some_and(|slot| slot.id == entity)
    }

    /// Id stored at `index`. Free slots hold an id with the sentinel index.
    #[inline]
    pub fn id_at(&self, index: usize) -> Option<Entity> {
        self.slots.get(index).map(|slot| slot.id)
    }

    #[inline]
    pub fn mask_at(&self, index: usize) -> Option<&ComponentMask> {
        self.slots.get(index).map(|slot| &slot.mask)
    }

    #[inline]
    pub(crate) fn mask_at_mut(&mut self, index: usize) -> Option<&mut ComponentMask> {
        self.slots.get_mut(index).map(|slot| &mut slot.mask)
    }

    /// High-water mark of allocated indices, free ones included.
    #[inline]
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Number of handles currently live
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_indices.len() - self.retired
    }

    /// Indices waiting for reuse
    pub fn free_count(&self) -> usize {
        self.free_indices.len()
    }

    pub fn retired_count(&self) -> usize {
        self.retired
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Width of every mask in the table, in bits
    pub fn mask_width(&self) -> usize {
        self.mask_width
    }

    /// Remove every live entity. Generations advance as for individual
    /// removals, so handles from before the clear stay dead.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            let id = self.slots[index].id;
            if id.is_valid() {
                // Stored id is the live handle for a valid slot
                let _ = self.remove(id);
            }
        }
    }
}
