//! Optional lock-wrapped tree for callers that share one across threads.
//!
//! [`IpTree`] itself is single-threaded and does no locking of its own. Callers
//! own the locking policy: wrap the tree however suits them, or use this type
//! when one `RwLock` around the whole tree is enough. Every method takes the
//! lock for that one call only, so a sequence of calls is not atomic. Take a
//! [`SharedIpTree::snapshot`] or use `into_inner` when a consistent view is
//! needed.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::addr::Address;
use crate::error::Result;
use crate::tree::{Config, IpTree};

pub struct SharedIpTree {
    inner: RwLock<IpTree>,
}

impl SharedIpTree {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::from_tree(IpTree::with_config(config))
    }

    pub fn from_tree(tree: IpTree) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    /// Decode hex text into a shared tree.
    pub fn decode(text: &str) -> Result<Self> {
        IpTree::decode(text).map(Self::from_tree)
    }

    pub fn insert(&self, address: impl Into<Address>, delta: u64) -> bool {
        self.inner.write().insert(address, delta)
    }

    pub fn append(&self, address: impl Into<Address>) -> bool {
        self.inner.write().append(address)
    }

    pub fn append_text(&self, text: &str) -> Result<bool> {
        let address: Address = text.parse()?;
        Ok(self.append(address))
    }

    pub fn remove(&self, address: impl Into<Address>) -> Option<u64> {
        self.inner.write().remove(address)
    }

    pub fn remove_text(&self, text: &str) -> Result<Option<u64>> {
        let address: Address = text.parse()?;
        Ok(self.remove(address))
    }

    pub fn get(&self, address: impl Into<Address>) -> Option<u64> {
        self.inner.read().get(address)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self) -> usize {
        self.inner.read().count()
    }

    pub fn ipv4_count(&self) -> usize {
        self.inner.read().ipv4_count()
    }

    pub fn ipv6_count(&self) -> usize {
        self.inner.read().ipv6_count()
    }

    pub fn to_map(&self, limit: usize) -> BTreeMap<String, u64> {
        self.inner.read().to_map(limit)
    }

    pub fn encode(&self) -> String {
        self.inner.read().encode()
    }

    /// Copy of the current tree.
    pub fn snapshot(&self) -> IpTree {
        self.inner.read().clone()
    }

    pub fn into_inner(self) -> IpTree {
        self.inner.into_inner()
    }
}

impl Default for SharedIpTree {
    fn default() -> Self {
        Self::new()
    }
}

impl From<IpTree> for SharedIpTree {
    fn from(tree: IpTree) -> Self {
        Self::from_tree(tree)
    }
}
