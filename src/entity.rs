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

//! Generational entity handles.
//!
//! An [`Entity`] packs a 32-bit index and a 32-bit generation into one `u64`:
//!
//! ```text
//! generation (high 32 bits) | index (low 32 bits)
//! ```
//!
//! Handles carry no ownership. A handle is only meaningful together with the
//! world that produced it, which decides liveness by comparing generations.

use std::fmt;

/// Index half of an [`Entity`].
pub type EntityIndex = u32;

/// Generation half of an [`Entity`].
pub type EntityGeneration = u32;

/// Entity handle: packed (generation, index)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity(u64);

impl Entity {
    /// Index value reserved to mean "no entity".
    pub const INVALID_INDEX: EntityIndex = EntityIndex::MAX;

    /// The null handle. Never live.
    pub const INVALID: Entity = Entity::new(Self::INVALID_INDEX, 0);

    /// Pack an index and a generation.
    #[inline]
    pub const fn new(index: EntityIndex, generation: EntityGeneration) -> Self {
        Entity(((generation as u64) << 32) | index as u64)
    }

    /// Rebuild a handle from [`Entity::to_bits`].
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Entity(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> EntityIndex {
        self.0 as EntityIndex
    }

    #[inline]
    pub const fn generation(self) -> EntityGeneration {
        (self.0 >> 32) as EntityGeneration
    }

    /// False for handles carrying the sentinel index (the null handle and
    /// the ids stored in free table slots). Says nothing about liveness.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.index() != Self::INVALID_INDEX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::INVALID
    }
}

/// Orders by index, then generation, matching query iteration order
impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.index(), self.generation()).cmp(&(other.index(), other.generation()))
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}v{}", self.index(), self.generation())
        } else {
            write!(f, "invalid(v{})", self.generation())
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({self})")
    }
}
