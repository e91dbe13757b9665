//! Uniform sampling without replacement over a shrinking index universe.
//!
//! `RemovableSampler` hands out uniformly random indices from `[0, n)` and
//! lets callers permanently retire individual indices. Removal is soft: a
//! retired index is only evicted from physical storage when a draw or an
//! emptiness check happens to land on it, which keeps every operation
//! amortized O(1) over the sampler's lifetime.

use std::collections::{HashMap, HashSet};

use crate::random::RandomSource;

/// A copy-on-write view of the range `[0, n)`.
///
/// Reads of untouched slots return the slot's own index; writes land in an
/// overlay map; `pop` shrinks the logical length. Creating one is O(1)
/// regardless of `n`.
#[derive(Debug, Clone)]
struct LazyRange {
    length: usize,
    overlay: HashMap<usize, usize>,
}

impl LazyRange {
    fn new(length: usize) -> Self {
        LazyRange {
            length,
            overlay: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.length
    }

    fn get(&self, i: usize) -> usize {
        debug_assert!(i < self.length);
        self.overlay.get(&i).copied().unwrap_or(i)
    }

    fn set(&mut self, i: usize, value: usize) {
        debug_assert!(i < self.length);
        self.overlay.insert(i, value);
    }

    fn pop(&mut self) -> usize {
        debug_assert!(self.length > 0);
        let last = self.get(self.length - 1);
        self.overlay.remove(&(self.length - 1));
        self.length -= 1;
        last
    }
}

/// Samples uniformly at random from `[0, n)`, with permanent removal of
/// individual values. All operations are amortized O(1).
#[derive(Debug, Clone)]
pub struct RemovableSampler {
    values: LazyRange,
    removed: Option<HashSet<usize>>,
}

impl RemovableSampler {
    /// A sampler over the universe `[0, n)`.
    pub fn new(n: usize) -> Self {
        RemovableSampler {
            values: LazyRange::new(n),
            removed: None,
        }
    }

    /// True iff no live value remains.
    ///
    /// Takes `&mut self`: when the removed set has grown as large as the
    /// physical storage, trailing removed entries are compacted away until
    /// a live value is found or the storage empties.
    pub fn is_empty(&mut self) -> bool {
        if self.values.len() == 0 {
            return true;
        }
        let removed = match self.removed.as_mut() {
            None => return false,
            Some(removed) => removed,
        };
        if removed.len() < self.values.len() {
            return false;
        }
        while self.values.len() > 0 {
            if !removed.contains(&self.values.get(self.values.len() - 1)) {
                return false;
            }
            let evicted = self.values.pop();
            removed.remove(&evicted);
        }
        true
    }

    /// Returns a uniformly random value among those still live.
    ///
    /// Draws an index into physical storage; a hit on a soft-removed entry
    /// evicts it permanently (swap with the last entry, shrink by one) and
    /// retries. Only the distribution over live values is guaranteed —
    /// physical storage order is not stable across calls.
    ///
    /// Panics if the sampler is physically empty; callers check
    /// [`is_empty`](Self::is_empty) first.
    pub fn sample<R: RandomSource + ?Sized>(&mut self, random: &mut R) -> usize {
        loop {
            assert!(
                self.values.len() > 0,
                "sample called on an empty RemovableSampler"
            );
            let i = random.randrange(0, self.values.len());
            let v = self.values.get(i);
            let removed = match self.removed.as_mut() {
                Some(removed) if removed.contains(&v) => removed,
                _ => return v,
            };
            removed.remove(&v);
            let j = self.values.len() - 1;
            if i != j {
                let w = self.values.get(j);
                self.values.set(i, w);
            }
            self.values.pop();
        }
    }

    /// Permanently removes `value` from the universe.
    ///
    /// Idempotent, and makes no attempt to validate that `value` was ever
    /// present.
    pub fn remove(&mut self, value: usize) {
        self.removed
            .get_or_insert_with(HashSet::new)
            .insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_universe_is_empty_from_the_start() {
        let mut sampler = RemovableSampler::new(0);
        assert!(sampler.is_empty());
    }

    #[test]
    #[should_panic(expected = "empty RemovableSampler")]
    fn sampling_an_empty_sampler_panics() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        RemovableSampler::new(0).sample(&mut rng);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut sampler = RemovableSampler::new(3);
        sampler.remove(1);
        sampler.remove(1);
        sampler.remove(0);
        sampler.remove(2);
        assert!(sampler.is_empty());
    }

    #[test]
    fn removing_unknown_values_is_a_no_op() {
        let mut sampler = RemovableSampler::new(2);
        sampler.remove(100);
        sampler.remove(0);
        sampler.remove(1);
        // The phantom removal must not mask real emptiness, nor count
        // against the live universe beforehand.
        assert!(sampler.is_empty());
    }

    #[test]
    fn last_survivor_is_always_returned() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for survivor in 0..5 {
            let mut sampler = RemovableSampler::new(5);
            for v in 0..5 {
                if v != survivor {
                    sampler.remove(v);
                }
            }
            for _ in 0..10 {
                assert_eq!(sampler.sample(&mut rng), survivor);
            }
            assert!(!sampler.is_empty());
        }
    }

    proptest! {
        #[test]
        fn sample_is_in_range_without_removal(n in 1usize..100, seed: u64) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut sampler = RemovableSampler::new(n);
            let v = sampler.sample(&mut rng);
            prop_assert!(v < n);
        }

        #[test]
        fn sample_never_returns_removed(
            n in 2usize..100,
            removed in proptest::collection::hash_set(0usize..100, 1..20),
            repeats in 1usize..10,
            seed: u64,
        ) {
            let removed: std::collections::HashSet<usize> =
                removed.into_iter().filter(|&v| v < n).collect();
            prop_assume!(removed.len() < n);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut sampler = RemovableSampler::new(n);
            for &v in &removed {
                sampler.remove(v);
            }
            for _ in 0..repeats {
                let v = sampler.sample(&mut rng);
                prop_assert!(v < n);
                prop_assert!(!removed.contains(&v));
            }
        }

        #[test]
        fn empty_only_once_everything_is_removed(
            order in (1usize..60)
                .prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        ) {
            let mut sampler = RemovableSampler::new(order.len());
            for &v in &order {
                prop_assert!(!sampler.is_empty());
                sampler.remove(v);
            }
            prop_assert!(sampler.is_empty());
        }

        #[test]
        fn interleaved_draws_and_removals_converge(
            n in 1usize..40,
            seed: u64,
        ) {
            // Remove whatever gets sampled; after n draws nothing is left.
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut sampler = RemovableSampler::new(n);
            let mut seen = std::collections::HashSet::new();
            for _ in 0..n {
                prop_assert!(!sampler.is_empty());
                let v = sampler.sample(&mut rng);
                prop_assert!(seen.insert(v), "value {} drawn twice", v);
                sampler.remove(v);
            }
            prop_assert!(sampler.is_empty());
        }
    }
}
