//! Exhaustive-without-replacement random search over trees of choice
//! points.
//!
//! A [`ChoiceTree`] is walked one randomized decision sequence at a time:
//! a driver makes nested choices ("which character", "which list length")
//! through a [`Chooser`], each drawn uniformly among the options not yet
//! retired at that point. Committed walks prune branches proven dead, so
//! no (sub)path is ever revisited and repeated stepping exhausts the whole
//! tree in finite time. This is the exploration core underneath a
//! property-based test-case generator; the values being chosen between
//! are entirely the caller's business.
//!
//! ```
//! use choicetree::ChoiceTree;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut tree = ChoiceTree::new();
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let mut seen = Vec::new();
//! while !tree.is_exhausted() {
//!     let seen = &mut seen;
//!     tree.step(&mut rng, |chooser| {
//!         let v = *chooser.choose(&[1, 2, 3])?;
//!         seen.push(v);
//!         Ok(())
//!     });
//! }
//! seen.sort_unstable();
//! assert_eq!(seen, vec![1, 2, 3]);
//! ```

pub mod choicetree;
pub mod random;
pub mod sampler;

pub use crate::choicetree::{ChoiceTree, Chooser, DeadBranch};
pub use crate::random::RandomSource;
pub use crate::sampler::RemovableSampler;
