//! Flattened candidate key space.
//!
//! The W nested loops over the variable key bytes are collapsed into one
//! linear range `[0, R^W)`. Index `i` decodes to coordinates by base-R
//! positional encoding with the first segment byte most significant, so
//! walking indices in order walks candidates lexicographically.

use crate::error::Result;
use crate::oracle::{KEY_LEN, Key};
use crate::search::config::KeyLayout;
use std::ops::Range;

/// Enumerator over every candidate key for a [`KeyLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    /// Prefix and suffix in place, segment bytes set to `range_start`
    template: Key,
    offset: usize,
    width: usize,
    start: u8,
    end: u8,
    radix: u64,
    total: u64,
}

impl KeySpace {
    /// Validate `layout` and build its key space.
    pub fn new(layout: &KeyLayout) -> Result<Self> {
        layout.validate()?;

        let offset = layout.prefix.len();
        let width = layout.width;
        let mut template = [layout.range_start; KEY_LEN];
        template[..offset].copy_from_slice(&layout.prefix);
        template[offset + width..].copy_from_slice(&layout.suffix);

        let radix = layout.radix();
        // validate() already proved this fits
        let total = radix.pow(width as u32);

        Ok(Self {
            template,
            offset,
            width,
            start: layout.range_start,
            end: layout.range_end,
            radix,
            total,
        })
    }

    /// Number of candidates, R^W.
    pub fn total_size(&self) -> u64 {
        self.total
    }

    pub fn radix(&self) -> u64 {
        self.radix
    }

    /// Build the key for a coordinate tuple.
    ///
    /// Returns `None` if `coords` is not exactly W long or holds a byte
    /// outside the candidate range.
    pub fn candidate_at(&self, coords: &[u8]) -> Option<Key> {
        if coords.len() != self.width || !coords.iter().all(|&c| self.in_range(c)) {
            return None;
        }
        let mut key = self.template;
        key[self.offset..self.offset + self.width].copy_from_slice(coords);
        Some(key)
    }

    /// Decode a linear index into segment bytes.
    ///
    /// # Panics
    /// Panics if `index >= total_size()`.
    pub fn coordinates_of(&self, index: u64) -> Vec<u8> {
        assert!(index < self.total, "index {} outside key space", index);
        let mut coords = vec![self.start; self.width];
        let mut rest = index;
        for slot in coords.iter_mut().rev() {
            *slot = self.start + (rest % self.radix) as u8;
            rest /= self.radix;
        }
        coords
    }

    /// Key for a linear index.
    ///
    /// # Panics
    /// Panics if `index >= total_size()`.
    pub fn key_at(&self, index: u64) -> Key {
        let mut key = self.template;
        key[self.offset..self.offset + self.width].copy_from_slice(&self.coordinates_of(index));
        key
    }

    /// Linear index of `key`, if the key belongs to this space.
    pub fn index_of(&self, key: &Key) -> Option<u64> {
        let segment = self.offset..self.offset + self.width;
        if key[..segment.start] != self.template[..segment.start]
            || key[segment.end..] != self.template[segment.end..]
        {
            return None;
        }
        key[segment].iter().try_fold(0u64, |acc, &byte| {
            self.in_range(byte)
                .then(|| acc * self.radix + u64::from(byte - self.start))
        })
    }

    /// Iterate `(index, key)` over `range` in lexicographic order.
    ///
    /// `range` is clamped to the key space.
    pub fn candidates(&self, range: Range<u64>) -> Candidates<'_> {
        let end = range.end.min(self.total);
        let next = range.start.min(end);
        let key = if next < end { self.key_at(next) } else { self.template };
        Candidates {
            space: self,
            key,
            next,
            end,
        }
    }

    fn in_range(&self, byte: u8) -> bool {
        (self.start..=self.end).contains(&byte)
    }
}

/// Odometer-style walk over a subrange of a [`KeySpace`].
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    space: &'a KeySpace,
    key: Key,
    next: u64,
    end: u64,
}

impl Iterator for Candidates<'_> {
    type Item = (u64, Key);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let item = (self.next, self.key);
        self.next += 1;

        if self.next < self.end {
            // Increment the least significant segment byte with carry.
            let segment = self.space.offset..self.space.offset + self.space.width;
            for byte in self.key[segment].iter_mut().rev() {
                if *byte < self.space.end {
                    *byte += 1;
                    break;
                }
                *byte = self.space.start;
            }
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
