//! The persistent tree of choice points and the per-walk machinery that
//! explores it.
//!
//! A [`ChoiceTree`] records every decision sequence that drivers have
//! performed against it. Each call to [`ChoiceTree::step`] runs one walk:
//! the driver makes a series of nested choices through a [`Chooser`], each
//! drawn without replacement at that node, and when the walk commits, the
//! branches it has proven dead are pruned bottom-up. Repeated stepping
//! therefore never revisits a fully explored (sub)path and is guaranteed
//! to exhaust the whole tree in finite time.
//!
//! Nodes live in an id-addressed arena owned by the tree. A walk's trail
//! holds node ids, never references, so pruning a subtree is a single
//! child-map detach plus returning the slot to a free list.

use std::collections::HashMap;
use std::fmt;

use crate::random::RandomSource;
use crate::sampler::RemovableSampler;

/// Signal that no admissible candidate remained at the current choice
/// point. Terminates the walk early; drivers propagate it with `?` and
/// [`ChoiceTree::step`] absorbs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadBranch;

impl fmt::Display for DeadBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no admissible candidate remained at this choice point")
    }
}

impl std::error::Error for DeadBranch {}

type NodeId = usize;

/// Lifecycle of a single choice point.
///
/// `Unset` until the first `choose` reaches the node, then `Active` with a
/// sampler over the candidate indices, then `Exhausted` once the walk that
/// ended here (or the pruning pass) retires it. `Exhausted` reads as empty
/// unconditionally, with no sampler allocated behind it.
#[derive(Debug)]
enum NodeState {
    Unset,
    Active(RemovableSampler),
    Exhausted,
}

#[derive(Debug)]
struct TreeNode {
    state: NodeState,
    children: HashMap<usize, NodeId>,
}

impl Default for TreeNode {
    fn default() -> Self {
        TreeNode {
            state: NodeState::Unset,
            children: HashMap::new(),
        }
    }
}

/// A persistent tree of choice points, explored one randomized walk at a
/// time, without replacement.
#[derive(Debug)]
pub struct ChoiceTree {
    nodes: Vec<TreeNode>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl Default for ChoiceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceTree {
    pub fn new() -> Self {
        ChoiceTree {
            nodes: vec![TreeNode::default()],
            free: Vec::new(),
            root: 0,
        }
    }

    /// True iff every decision sequence has been explored.
    ///
    /// Takes `&mut self` because answering may compact the root sampler's
    /// storage.
    pub fn is_exhausted(&mut self) -> bool {
        self.node_exhausted(self.root)
    }

    /// Number of resident nodes. Pruning keeps this bounded by the
    /// unexplored frontier; after full exhaustion only the root remains.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Runs one walk of the tree.
    ///
    /// The driver receives a fresh [`Chooser`] and makes any number of
    /// nested choices, propagating [`DeadBranch`] with `?`. A dead branch
    /// ends the walk early but the walk still commits; the walk's pruning
    /// always runs before `step` returns. Panics from the driver propagate
    /// uncaught, and no cleanup is promised for them.
    ///
    /// Panics if the tree is already exhausted.
    pub fn step<R, F>(&mut self, random: &mut R, driver: F)
    where
        R: RandomSource,
        F: FnOnce(&mut Chooser<'_>) -> Result<(), DeadBranch>,
    {
        assert!(
            !self.is_exhausted(),
            "step called on an exhausted choice tree"
        );
        let root = self.root;
        let mut chooser = Chooser {
            tree: self,
            random,
            trail: vec![root],
            choices: Vec::new(),
        };
        if driver(&mut chooser).is_err() {
            log::trace!(
                "walk ended on a dead branch at depth {}",
                chooser.choices.len()
            );
        }
        chooser.finish();
    }

    /// True iff `id` has no live choice left. `Unset` nodes are not
    /// exhausted: nothing has been tried there yet.
    fn node_exhausted(&mut self, id: NodeId) -> bool {
        match &mut self.nodes[id].state {
            NodeState::Unset => false,
            NodeState::Active(sampler) => sampler.is_empty(),
            NodeState::Exhausted => true,
        }
    }

    /// Get-or-insert the child reached by choosing `index` at `parent`.
    fn child(&mut self, parent: NodeId, index: usize) -> NodeId {
        if let Some(&id) = self.nodes[parent].children.get(&index) {
            return id;
        }
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.nodes.push(TreeNode::default());
                self.nodes.len() - 1
            }
        };
        self.nodes[parent].children.insert(index, id);
        id
    }

    /// Return a detached node's slots to the free list. The node may
    /// still hold descendants from walks that went deeper before a
    /// shallower walk retired it, so the whole detached chain is
    /// reclaimed, iteratively rather than by recursion.
    fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let node = std::mem::take(&mut self.nodes[id]);
            pending.extend(node.children.into_values());
            self.free.push(id);
        }
    }
}

/// Drives one walk of a [`ChoiceTree`]. Created by [`ChoiceTree::step`]
/// and discarded when the walk commits.
pub struct Chooser<'a> {
    tree: &'a mut ChoiceTree,
    random: &'a mut dyn RandomSource,
    /// Nodes visited so far, root first. One longer than `choices` at all
    /// times during an active walk.
    trail: Vec<NodeId>,
    /// Index picked at each trail node.
    choices: Vec<usize>,
}

impl<'a> Chooser<'a> {
    /// Picks one of `values` uniformly at random among those not yet
    /// retired at the current choice point, advancing the walk one level
    /// deeper.
    ///
    /// The candidate list's length must be the same on every walk that
    /// reaches this node.
    pub fn choose<'v, T>(&mut self, values: &'v [T]) -> Result<&'v T, DeadBranch> {
        self.choose_where(values, |_| true)
    }

    /// Like [`choose`](Self::choose), but only values satisfying
    /// `condition` are admissible. A rejected index is retired at this
    /// node for every future walk, regardless of what condition those
    /// walks supply. An empty candidate list is a dead branch outright.
    pub fn choose_where<'v, T, C>(
        &mut self,
        values: &'v [T],
        condition: C,
    ) -> Result<&'v T, DeadBranch>
    where
        C: Fn(&T) -> bool,
    {
        debug_assert_eq!(self.trail.len(), self.choices.len() + 1);
        let node = *self.trail.last().expect("trail is never empty");
        if let NodeState::Unset = self.tree.nodes[node].state {
            self.tree.nodes[node].state =
                NodeState::Active(RemovableSampler::new(values.len()));
        }
        loop {
            let i = match &mut self.tree.nodes[node].state {
                NodeState::Active(sampler) => {
                    if sampler.is_empty() {
                        return Err(DeadBranch);
                    }
                    sampler.sample(&mut *self.random)
                }
                _ => unreachable!("trail nodes always hold a live sampler"),
            };
            if condition(&values[i]) {
                self.choices.push(i);
                let child = self.tree.child(node, i);
                self.trail.push(child);
                return Ok(&values[i]);
            }
            match &mut self.tree.nodes[node].state {
                NodeState::Active(sampler) => sampler.remove(i),
                _ => unreachable!("trail nodes always hold a live sampler"),
            }
        }
    }

    /// Commits the walk: retires the deepest node reached, then walks the
    /// trail back up, detaching every node whose subtree has become fully
    /// exhausted, stopping at the first ancestor that still has live
    /// choices (or at the root).
    fn finish(mut self) {
        debug_assert_eq!(self.trail.len(), self.choices.len() + 1);
        let deepest = *self.trail.last().expect("trail is never empty");
        self.tree.nodes[deepest].state = NodeState::Exhausted;
        while self.trail.len() > 1 && {
            let last = *self.trail.last().expect("trail is never empty");
            self.tree.node_exhausted(last)
        } {
            let dead = self.trail.pop().expect("trail has at least two nodes");
            debug_assert_eq!(self.trail.len(), self.choices.len());
            let index = self.choices.pop().expect("one choice per popped node");
            let parent = *self.trail.last().expect("trail is never empty");
            match &mut self.tree.nodes[parent].state {
                NodeState::Active(sampler) => sampler.remove(index),
                _ => unreachable!("every visited parent has a sampler"),
            }
            let detached = self.tree.nodes[parent].children.remove(&index);
            debug_assert_eq!(detached, Some(dead));
            self.tree.release(dead);
            log::trace!(
                "pruned exhausted branch {} at depth {}",
                index,
                self.choices.len()
            );
        }
    }
}
