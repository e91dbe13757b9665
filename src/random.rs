//! The randomness capability injected into every walk.
//!
//! The search core never owns an RNG. Each `step` (and each `sample`
//! underneath it) receives a source of uniform integers, so replaying the
//! same draw sequence against the same tree state reproduces the walk
//! exactly.

use rand::Rng;

/// A source of uniformly distributed integers.
///
/// This is the only thing the search core knows about randomness. Any
/// `rand::Rng` works via the blanket impl; tests can hand in a scripted
/// source instead.
pub trait RandomSource {
    /// Returns a uniformly distributed integer in `[lo, hi)`.
    ///
    /// Callers guarantee `lo < hi`.
    fn randrange(&mut self, lo: usize, hi: usize) -> usize;
}

impl<R: Rng> RandomSource for R {
    fn randrange(&mut self, lo: usize, hi: usize) -> usize {
        self.gen_range(lo..hi)
    }
}
