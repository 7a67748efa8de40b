//! Trie node types.
//!
//! A node is either a branch owning its children, or a leaf holding the
//! counter of one complete address. Leaves only ever appear at depth 15 (the
//! sixteenth address byte) and branches only above it, so every root-to-leaf
//! path has exactly [`ADDRESS_LEN`](crate::addr::ADDRESS_LEN) edges.

use std::collections::BTreeMap;

/// Children of a branch, keyed by address byte.
///
/// Iteration is in ascending byte order, which both enumeration and the
/// encoder rely on.
pub type Children = BTreeMap<u8, Node>;

/// Depth of the leaf level (the last address byte).
pub const LEAF_LEVEL: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An internal node at depth 0..=14.
    Branch(Children),
    /// A complete address and its accumulated counter.
    Leaf(u64),
}

impl Node {
    #[inline]
    pub(crate) fn empty_branch() -> Self {
        Node::Branch(Children::new())
    }

    /// Fresh node for the given depth.
    #[inline]
    pub(crate) fn for_level(level: usize, counter: u64) -> Self {
        if level == LEAF_LEVEL {
            Node::Leaf(counter)
        } else {
            Node::empty_branch()
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Counter of a leaf, `None` for branches.
    #[inline]
    pub fn counter(&self) -> Option<u64> {
        match self {
            Node::Leaf(counter) => Some(*counter),
            Node::Branch(_) => None,
        }
    }

    #[inline]
    pub fn children(&self) -> Option<&Children> {
        match self {
            Node::Branch(children) => Some(children),
            Node::Leaf(_) => None,
        }
    }
}
