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

//! Per-type dense component storage with swap-remove compaction
//!
//! Each [`ComponentStore`] owns a fixed buffer of uninitialized slots. Values
//! are constructed in place at `dense[len]` and destroyed in place on removal;
//! the last value is moved into the hole so `dense[0..len]` never has gaps.
//!
//! Two index maps tie dense slots to entity indices:
//!
//! ```text
//! forward[entity_index] = dense_index   (ABSENT if no value)
//! reverse[dense_index]  = entity_index  (ABSENT past len)
//! ```
//!
//! References handed out by [`ComponentStore::get`] borrow the store, so a
//! swap-remove cannot run while one is held.

use std::any::Any;
use std::collections::TryReserveError;
use std::mem::MaybeUninit;
use std::ptr;

use crate::component::Component;
use crate::entity::EntityIndex;

/// Map marker for "no entry"
const ABSENT: u32 = u32::MAX;

/// Capability shared by every store regardless of component type.
///
/// The world keeps stores behind this trait so it can fan out entity removal
/// without knowing the concrete types.
pub trait ErasedStore: Any {
    /// Drop this type's value for `index`, if there is one
    fn on_entity_removed(&mut self, index: EntityIndex);

    /// Number of stored values
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored value
    fn clear(&mut self);

    /// Name of the stored component type
    fn type_name(&self) -> &'static str;

    /// Downcast to Any
    fn as_any(&self) -> &dyn Any;

    /// Downcast to mutable Any
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense store for one component type
pub struct ComponentStore<T> {
    dense: Box<[MaybeUninit<T>]>,
    forward: Box<[u32]>,
    reverse: Box<[u32]>,
    len: usize,
}

impl<T: Component> ComponentStore<T> {
    /// Create a store for entity indices in `0..capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity <= ABSENT as usize);
        let dense: Vec<MaybeUninit<T>> = std::iter::repeat_with(MaybeUninit::uninit)
            .take(capacity)
            .collect();
        Self {
            dense: dense.into_boxed_slice(),
            forward: vec![ABSENT; capacity].into_boxed_slice(),
            reverse: vec![ABSENT; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Like [`with_capacity`](Self::with_capacity), but reports allocation
    /// failure instead of aborting. The dense buffer is reserved first.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        debug_assert!(capacity <= ABSENT as usize);
        let mut dense: Vec<MaybeUninit<T>> = Vec::new();
        dense.try_reserve_exact(capacity)?;
        dense.resize_with(capacity, MaybeUninit::uninit);

        let mut forward: Vec<u32> = Vec::new();
        forward.try_reserve_exact(capacity)?;
        forward.resize(capacity, ABSENT);

        let mut reverse: Vec<u32> = Vec::new();
        reverse.try_reserve_exact(capacity)?;
        reverse.resize(capacity, ABSENT);

        Ok(Self {
            dense: dense.into_boxed_slice(),
            forward: forward.into_boxed_slice(),
            reverse: reverse.into_boxed_slice(),
            len: 0,
        })
    }

    /// Move `value` into the next dense slot for `index`.
    ///
    /// Gives the value back if `index` is out of range or already has one.
    pub fn insert(&mut self, index: EntityIndex, value: T) -> Result<(), T> {
        let slot = index as usize;
        if slot >= self.forward.len() || self.forward[slot] != ABSENT {
            return Err(value);
        }
        // One value per index and index < capacity, so a free slot exists
        debug_assert!(self.len < self.dense.len());

        let dense_index = self.len;
        self.dense[dense_index].write(value);
        self.forward[slot] = dense_index as u32;
        self.reverse[dense_index] = index;
        self.len += 1;
        Ok(())
    }

    /// Construct a default value in place for `index`
    pub fn insert_default(&mut self, index: EntityIndex) -> Result<(), T>
    where
        T: Default,
    {
        self.insert(index, T::default())
    }

    /// Swap-remove the value for `index` and return it.
    ///
    /// The last dense value moves into the freed slot and both maps are
    /// rewritten for it. O(1) regardless of store size.
    pub fn remove(&mut self, index: EntityIndex) -> Option<T> {
        let slot = index as usize;
        let dense_index = *self.forward.get(slot)?;
        if dense_index == ABSENT {
            return None;
        }
        let dense_index = dense_index as usize;
        let last = self.len - 1;

        // SAFETY: dense_index < len, so the slot is initialized. Reading it
        // out leaves the slot logically uninitialized.
        let removed = unsafe { self.dense[dense_index].assume_init_read() };

        if dense_index != last {
            // SAFETY: last < len is initialized; after the read it is treated
            // as uninitialized, so the value lives only in dense_index.
            let moved = unsafe { self.dense[last].assume_init_read() };
            self.dense[dense_index].write(moved);

            let moved_entity = self.reverse[last];
            self.forward[moved_entity as usize] = dense_index as u32;
            self.reverse[dense_index] = moved_entity;
        }

        self.forward[slot] = ABSENT;
        self.reverse[last] = ABSENT;
        self.len = last;
        Some(removed)
    }

    #[inline]
    pub fn has(&self, index: EntityIndex) -> bool {
        self.dense_index_of(index).is_some()
    }

    /// Get component for `index`
    #[inline]
    pub fn get(&self, index: EntityIndex) -> Option<&T> {
        let dense_index = self.dense_index_of(index)?;
        // SAFETY: forward only points at initialized slots below len
        Some(unsafe { self.dense[dense_index].assume_init_ref() })
    }

    /// Get mutable component for `index`
    #[inline]
    pub fn get_mut(&mut self, index: EntityIndex) -> Option<&mut T> {
        let dense_index = self.dense_index_of(index)?;
        // SAFETY: forward only points at initialized slots below len
        Some(unsafe { self.dense[dense_index].assume_init_mut() })
    }

    /// Dense slot currently holding the value for `index`
    #[inline]
    pub fn dense_index_of(&self, index: EntityIndex) -> Option<usize> {
        match self.forward.get(index as usize) {
            Some(&d) if d != ABSENT => Some(d as usize),
            _ => None,
        }
    }

    /// Entity index owning dense slot `dense_index`
    pub fn entity_at(&self, dense_index: usize) -> Option<EntityIndex> {
        if dense_index < self.len {
            Some(self.reverse[dense_index])
        } else {
            None
        }
    }

    /// All values, packed, in dense order
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: dense[0..len] is initialized and MaybeUninit<T> has T's layout
        unsafe { std::slice::from_raw_parts(self.dense.as_ptr() as *const T, self.len) }
    }

    /// All values, packed, in dense order
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: dense[0..len] is initialized and MaybeUninit<T> has T's layout
        unsafe { std::slice::from_raw_parts_mut(self.dense.as_mut_ptr() as *mut T, self.len) }
    }

    /// Entity indices in dense order, parallel to [`as_slice`](Self::as_slice)
    pub fn entities(&self) -> &[EntityIndex] {
        &self.reverse[..self.len]
    }

    /// (entity index, value) pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (EntityIndex, &T)> + '_ {
        self.entities().iter().copied().zip(self.as_slice().iter())
    }

    /// (entity index, value) pairs in dense order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityIndex, &mut T)> + '_ {
        let len = self.len;
        // SAFETY: dense[0..len] is initialized; reverse and dense are disjoint fields
        let values = unsafe {
            std::slice::from_raw_parts_mut(self.dense.as_mut_ptr() as *mut T, len)
        };
        self.reverse[..len].iter().copied().zip(values.iter_mut())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of dense slots
    pub fn capacity(&self) -> usize {
        self.dense.len()
    }

    /// Drop every value and empty both maps
    pub fn clear(&mut self) {
        let len = self.len;
        // Set first so a panicking destructor cannot cause a double drop
        self.len = 0;
        for dense_index in 0..len {
            let entity = self.reverse[dense_index];
            self.forward[entity as usize] = ABSENT;
            self.reverse[dense_index] = ABSENT;
        }
        // SAFETY: dense[0..len] was initialized and is no longer reachable
        unsafe {
            ptr::drop_in_place(std::slice::from_raw_parts_mut(
                self.dense.as_mut_ptr() as *mut T,
                len,
            ));
        }
    }

    /// Check that the two maps mirror each other and cover exactly
    /// `0..len`. O(capacity); meant for tests and debugging.
    pub fn is_consistent(&self) -> bool {
        let dense_ok = (0..self.len).all(|d| {
            let entity = self.reverse[d];
            entity != ABSENT && self.forward[entity as usize] == d as u32
        });
        let tail_ok = self.reverse[self.len..].iter().all(|&e| e == ABSENT);
        let mapped = self.forward.iter().filter(|&&d| d != ABSENT).count();
        dense_ok && tail_ok && mapped == self.len
    }
}

impl<T> Drop for ComponentStore<T> {
    fn drop(&mut self) {
        if std::mem::needs_drop::<T>() {
            // SAFETY: dense[0..len] is initialized and dropped exactly once here
            unsafe {
                ptr::drop_in_place(std::slice::from_raw_parts_mut(
                    self.dense.as_mut_ptr() as *mut T,
                    self.len,
                ));
            }
        }
    }
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn on_entity_removed(&mut self, index: EntityIndex) {
        drop(self.remove(index));
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Component + std::fmt::Debug> std::fmt::Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
