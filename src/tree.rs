//! The 16-level address trie.

use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;

use crate::addr::{is_v4_path, Address, ADDRESS_LEN};
use crate::error::Result;
use crate::node::{Children, Node};

/// Default cap on entries returned by [`IpTree::to_map_default`].
pub const DEFAULT_MAP_VALUE_LIMIT: usize = 1_000_000;

/// Per-tree settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on entries produced by [`IpTree::to_map_default`].
    pub map_value_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_value_limit: DEFAULT_MAP_VALUE_LIMIT,
        }
    }
}

/// Address occurrence counters stored in a byte trie.
///
/// Every address is 16 bytes (IPv4 uses the v4-in-v6 form), one byte per
/// level. Leaves carry the counter; branches only route.
#[derive(Clone, PartialEq, Eq)]
pub struct IpTree {
    root: Children,
    /// Number of leaves.
    len: usize,
    config: Config,
}

impl IpTree {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            root: Children::new(),
            len: 0,
            config,
        }
    }

    /// Wrap an already-built root, recounting its leaves.
    pub(crate) fn from_root(root: Children, config: Config) -> Self {
        let mut tree = Self { root, len: 0, config };
        tree.len = tree.iter().count();
        tree
    }

    /// Build a tree from address text and counters.
    ///
    /// Entries whose address does not parse are skipped.
    pub fn parse<I, K>(src: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut tree = Self::new();
        for (text, delta) in src {
            let text = text.as_ref();
            match text.parse::<Address>() {
                Ok(address) => {
                    tree.insert(address, delta);
                }
                Err(_) => tracing::debug!(address = text, "skipping unparseable address"),
            }
        }
        tree
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of distinct addresses.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add `delta` to the counter of `address`.
    ///
    /// Returns `true` if the address was not in the tree before.
    pub fn insert(&mut self, address: impl Into<Address>, delta: u64) -> bool {
        let key = address.into().octets();
        let (prefix, last) = key.split_at(ADDRESS_LEN - 1);

        let mut children = &mut self.root;
        for &b in prefix {
            children = match children.entry(b).or_insert_with(Node::empty_branch) {
                Node::Branch(next) => next,
                Node::Leaf(_) => unreachable!("leaf above the last address byte"),
            };
        }

        match children.entry(last[0]) {
            Entry::Vacant(slot) => {
                slot.insert(Node::Leaf(delta));
                self.len += 1;
                true
            }
            Entry::Occupied(mut slot) => {
                if let Node::Leaf(counter) = slot.get_mut() {
                    *counter = counter.saturating_add(delta);
                }
                false
            }
        }
    }

    /// Count one occurrence of `address`.
    #[inline]
    pub fn append(&mut self, address: impl Into<Address>) -> bool {
        self.insert(address, 1)
    }

    pub fn insert_text(&mut self, text: &str, delta: u64) -> Result<bool> {
        let address: Address = text.parse()?;
        Ok(self.insert(address, delta))
    }

    pub fn append_text(&mut self, text: &str) -> Result<bool> {
        self.insert_text(text, 1)
    }

    /// Remove `address`, returning its counter if it was present.
    ///
    /// Branches left without children are pruned on the way back up.
    pub fn remove(&mut self, address: impl Into<Address>) -> Option<u64> {
        let key = address.into().octets();
        let removed = remove_in(&mut self.root, &key)?;
        self.len -= 1;
        Some(removed)
    }

    pub fn remove_text(&mut self, text: &str) -> Result<Option<u64>> {
        let address: Address = text.parse()?;
        Ok(self.remove(address))
    }

    pub fn get(&self, address: impl Into<Address>) -> Option<u64> {
        let key = address.into().octets();
        let (prefix, last) = key.split_at(ADDRESS_LEN - 1);

        let mut children = &self.root;
        for b in prefix {
            children = children.get(b)?.children()?;
        }
        children.get(&last[0])?.counter()
    }

    #[inline]
    pub fn contains(&self, address: impl Into<Address>) -> bool {
        self.get(address).is_some()
    }

    /// Leaf totals split as `(ipv4, ipv6)`.
    pub fn stat(&self) -> (usize, usize) {
        self.iter().fold((0, 0), |(v4, v6), (address, _)| {
            if is_v4_path(address.as_bytes()) {
                (v4 + 1, v6)
            } else {
                (v4, v6 + 1)
            }
        })
    }

    /// Number of addresses, found by walking every leaf.
    pub fn count(&self) -> usize {
        let (v4, v6) = self.stat();
        v4 + v6
    }

    pub fn ipv4_count(&self) -> usize {
        self.stat().0
    }

    pub fn ipv6_count(&self) -> usize {
        self.stat().1
    }

    /// Render at most `limit` addresses and their counters.
    ///
    /// Addresses are taken in ascending byte order, so a truncated map always
    /// holds the lowest `limit` addresses.
    pub fn to_map(&self, limit: usize) -> BTreeMap<String, u64> {
        self.iter()
            .take(limit)
            .map(|(address, counter)| (address.to_string(), counter))
            .collect()
    }

    /// [`to_map`](Self::to_map) bounded by this tree's configured limit.
    pub fn to_map_default(&self) -> BTreeMap<String, u64> {
        self.to_map(self.config.map_value_limit)
    }

    /// Visit every branch with a non-empty child map, depth first.
    ///
    /// The callback receives the byte path from the root to the branch and its
    /// children. Siblings are visited in ascending byte order. Leaves are only
    /// seen as entries of their parent's map.
    pub fn for_each_branch<F>(&self, mut f: F)
    where
        F: FnMut(&[u8], &Children),
    {
        let mut path = Vec::with_capacity(ADDRESS_LEN);
        visit_branches(&self.root, &mut path, &mut f);
    }

    /// Addresses and counters in ascending address order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![self.root.iter()],
            path: [0; ADDRESS_LEN],
        }
    }
}

fn remove_in(children: &mut Children, key: &[u8]) -> Option<u64> {
    let (&b, rest) = key.split_first()?;
    if rest.is_empty() {
        if !children.get(&b).is_some_and(Node::is_leaf) {
            return None;
        }
        return children.remove(&b).and_then(|leaf| leaf.counter());
    }

    let Some(Node::Branch(next)) = children.get_mut(&b) else {
        return None;
    };
    let removed = remove_in(next, rest)?;
    if next.is_empty() {
        children.remove(&b);
        tracing::trace!(depth = ADDRESS_LEN - key.len(), "pruned empty branch");
    }
    Some(removed)
}

fn visit_branches<F>(children: &Children, path: &mut Vec<u8>, f: &mut F)
where
    F: FnMut(&[u8], &Children),
{
    if children.is_empty() {
        return;
    }
    f(path, children);
    for (&b, node) in children {
        if let Node::Branch(next) = node {
            path.push(b);
            visit_branches(next, path, f);
            path.pop();
        }
    }
}

impl Default for IpTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IpTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(address, counter)| (address.to_string(), counter)))
            .finish()
    }
}

impl<A: Into<Address>> FromIterator<(A, u64)> for IpTree {
    fn from_iter<T: IntoIterator<Item = (A, u64)>>(iter: T) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<A: Into<Address>> Extend<(A, u64)> for IpTree {
    fn extend<T: IntoIterator<Item = (A, u64)>>(&mut self, iter: T) {
        for (address, delta) in iter {
            self.insert(address, delta);
        }
    }
}

/// Depth-first leaf iterator; see [`IpTree::iter`].
pub struct Iter<'a> {
    stack: Vec<btree_map::Iter<'a, u8, Node>>,
    path: [u8; ADDRESS_LEN],
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Address, u64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let Some((&b, node)) = self.stack[depth].next() else {
                self.stack.pop();
                continue;
            };
            self.path[depth] = b;
            match node {
                Node::Leaf(counter) => return Some((Address::from_octets(self.path), *counter)),
                Node::Branch(children) => self.stack.push(children.iter()),
            }
        }
    }
}

impl<'a> IntoIterator for &'a IpTree {
    type Item = (Address, u64);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
