//! Fixed-size ring buffer of nearby bodies that block fire.
//!
//! When the eligibility filter meets a candidate it cannot shoot (same team or
//! not damageable) the candidate's body capsule is remembered here for one full
//! phase rotation. Later candidates whose firing line crosses a live entry are
//! rejected without paying for a visibility trace. Entries are snapshots of
//! geometry, so a cached agent that moves away keeps blocking until its entry
//! expires.

use crate::geometry::Capsule;

/// Number of slots in every agent's cache.
pub const BLOCKING_CACHE_CAPACITY: usize = 10;

/// One remembered obstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockingEntry {
    pub capsule: Capsule,
    /// Passes left before the entry goes inert.
    pub phases_left: u8,
}

impl BlockingEntry {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.phases_left > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockingCache {
    entries: [BlockingEntry; BLOCKING_CACHE_CAPACITY],
    next_index: usize,
}

impl BlockingCache {
    /// Overwrite the oldest slot with `capsule`, live for `phase_count` passes.
    pub fn insert(&mut self, capsule: Capsule, phase_count: u8) {
        self.entries[self.next_index] = BlockingEntry {
            capsule,
            phases_left: phase_count,
        };
        self.next_index = (self.next_index + 1) % BLOCKING_CACHE_CAPACITY;
    }

    /// Age every live entry by one pass.
    pub fn decay(&mut self) {
        for entry in &mut self.entries {
            entry.phases_left = entry.phases_left.saturating_sub(1);
        }
    }

    /// True if any live entry overlaps the firing line.
    pub fn is_blocking(&self, firing_line: &Capsule) -> bool {
        self.live_entries().any(|entry| entry.capsule.intersects(firing_line))
    }

    pub fn live_entries(&self) -> impl Iterator<Item = &BlockingEntry> {
        self.entries.iter().filter(|entry| entry.is_live())
    }

    pub fn live_count(&self) -> usize {
        self.live_entries().count()
    }

    pub fn entries(&self) -> &[BlockingEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn body_at(x: f32) -> Capsule {
        Capsule::new(Vec3::new(x, 0.0, 0.4), Vec3::new(x, 0.0, 1.4), 0.4)
    }

    fn line() -> Capsule {
        Capsule::new(Vec3::new(0.0, 0.0, 1.5), Vec3::new(10.0, 0.0, 1.5), 0.1)
    }

    #[test]
    fn test_insert_blocks_until_expired() {
        let mut cache = BlockingCache::default();
        cache.insert(body_at(5.0), 3);
        assert!(cache.is_blocking(&line()));

        cache.decay();
        cache.decay();
        assert!(cache.is_blocking(&line()));

        cache.decay();
        assert_eq!(cache.live_count(), 0);
        assert!(!cache.is_blocking(&line()), "expired entries never block");
    }

    #[test]
    fn test_decay_never_underflows() {
        let mut cache = BlockingCache::default();
        cache.insert(body_at(5.0), 1);
        for _ in 0..5 {
            cache.decay();
        }
        assert!(cache.entries().iter().all(|e| e.phases_left == 0));
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut cache = BlockingCache::default();
        cache.insert(body_at(5.0), 9);
        for i in 0..BLOCKING_CACHE_CAPACITY {
            // Far off the firing line
            cache.insert(body_at(100.0 + i as f32), 9);
        }
        assert_eq!(cache.live_count(), BLOCKING_CACHE_CAPACITY);
        assert!(!cache.is_blocking(&line()), "first entry was overwritten");
    }

    #[test]
    fn test_remaining_life_bounded_by_phase_count() {
        let phase_count = 9;
        let mut cache = BlockingCache::default();
        for pass in 0..40 {
            cache.decay();
            if pass % 3 == 0 {
                cache.insert(body_at(pass as f32), phase_count);
            }
            assert!(cache.entries().iter().all(|e| e.phases_left <= phase_count));
        }
    }
}
