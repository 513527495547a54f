//! Component mask: one bit per component type id.
//! Backed by a SmallVec of u64 words, so masks up to 128 bits never touch the heap.

use smallvec::{smallvec, SmallVec};

use crate::component::ComponentTypeId;

const WORD_BITS: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask {
    words: SmallVec<[u64; 2]>,
}

impl ComponentMask {
    /// Create an empty mask capable of holding at least `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        let num_words = capacity.div_ceil(WORD_BITS).max(1);
        Self {
            words: smallvec![0; num_words],
        }
    }

    /// Set the bit for `id`.
    /// Grows if the id is past the current width.
    pub fn set(&mut self, id: ComponentTypeId) {
        let (word_idx, bit_idx) = split(id.index());
        if word_idx >= self.words.len() {
            self.words.resize(word_idx + 1, 0);
        }
        self.words[word_idx] |= 1u64 << bit_idx;
    }

    /// Clear the bit for `id`.
    pub fn clear(&mut self, id: ComponentTypeId) {
        let (word_idx, bit_idx) = split(id.index());
        if let Some(word) = self.words.get_mut(word_idx) {
            *word &= !(1u64 << bit_idx);
        }
    }

    /// Check if the bit for `id` is set.
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        let (word_idx, bit_idx) = split(id.index());
        match self.words.get(word_idx) {
            Some(word) => (word & (1u64 << bit_idx)) != 0,
            None => false,
        }
    }

    /// True if every bit set in `required` is also set here.
    pub fn is_superset_of(&self, required: &Self) -> bool {
        required.words.iter().enumerate().all(|(i, &req)| {
            let have = self.words.get(i).copied().unwrap_or(0);
            have & req == req
        })
    }

    /// Returns true if this mask shares any set bits with `other`.
    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }

    /// Clear every bit, keeping the width.
    pub fn reset(&mut self) {
        for word in self.words.iter_mut() {
            *word = 0;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns iterator over the ids of set bits, ascending
    pub fn ones(&self) -> OnesIter<'_> {
        OnesIter {
            mask: self,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }
}

#[inline]
fn split(bit: usize) -> (usize, usize) {
    (bit / WORD_BITS, bit % WORD_BITS)
}

pub struct OnesIter<'a> {
    mask: &'a ComponentMask,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for OnesIter<'_> {
    type Item = ComponentTypeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let trailing = self.current_word.trailing_zeros();
                self.current_word &= !(1u64 << trailing); // Clear the bit we just found
                let bit = self.word_idx * WORD_BITS + trailing as usize;
                return Some(ComponentTypeId::new(bit as u32));
            }

            self.word_idx += 1;
            if self.word_idx >= self.mask.words.len() {
                return None;
            }
            self.current_word = self.mask.words[self.word_idx];
        }
    }
}

impl FromIterator<ComponentTypeId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentTypeId>>(iter: I) -> Self {
        let mut mask = ComponentMask::with_capacity(WORD_BITS);
        for id in iter {
            mask.set(id);
        }
        mask
    }
}
