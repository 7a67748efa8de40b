use smallvec::SmallVec;

use super::{split_flag, MAGIC};
use crate::addr::ADDRESS_LEN;
use crate::error::{Error, MalformedKind, Result};
use crate::node::{Children, Node, LEAF_LEVEL};
use crate::tree::{Config, IpTree};
use crate::varint::decode_varint;

/// Bytes path from the root to the branch being filled.
type PathStack = SmallVec<[u8; ADDRESS_LEN]>;

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[inline]
    fn has_remaining(&self) -> bool {
        self.pos < self.buf.len()
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self.buf.get(self.pos).ok_or(Error::Malformed(MalformedKind::Truncated {
            offset: self.pos,
            needed: 1,
        }))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_varint(&mut self) -> Result<u64> {
        let (value, n) = decode_varint(&self.buf[self.pos..]).map_err(|err| match err {
            Error::Malformed(MalformedKind::Truncated { needed, .. }) => {
                Error::Malformed(MalformedKind::Truncated {
                    offset: self.pos,
                    needed,
                })
            }
            other => other,
        })?;
        self.pos += n;
        Ok(value)
    }
}

/// Rebuild a tree from the block stream described in the [module docs](super).
///
/// Either the whole stream is accepted or an error is returned; no partially
/// built tree escapes.
pub fn decode_bytes(bytes: &[u8]) -> Result<IpTree> {
    decode_bytes_with_config(bytes, Config::default())
}

pub(crate) fn decode_bytes_with_config(bytes: &[u8], config: Config) -> Result<IpTree> {
    let _span = tracing::debug_span!("ipcount_decode", bytes = bytes.len()).entered();

    let result = decode_root(bytes).map(|(root, blocks)| {
        let tree = IpTree::from_root(root, config);
        tracing::debug!(blocks, leaves = tree.len(), "decoded tree");
        tree
    });
    if let Err(err) = &result {
        tracing::debug!(%err, "failed to decode tree");
    }
    result
}

fn decode_root(bytes: &[u8]) -> Result<(Children, usize)> {
    if bytes.len() < MAGIC.len() {
        return Err(Error::Malformed(MalformedKind::TooShort { len: bytes.len() }));
    }
    if bytes[..2] != MAGIC {
        return Err(Error::Malformed(MalformedKind::BadMagic([bytes[0], bytes[1]])));
    }

    let mut cur = Cursor { buf: bytes, pos: MAGIC.len() };
    let mut root = Children::new();
    let mut path = PathStack::new();
    let mut entries: Vec<(u8, u64)> = Vec::new();
    let mut blocks = 0usize;

    while cur.has_remaining() {
        let (level, is_leaf) = split_flag(cur.read_u8()?);
        if is_leaf != (level as usize == LEAF_LEVEL) {
            return Err(Error::Malformed(MalformedKind::LeafFlagMismatch { level }));
        }

        if level == 0 {
            path.clear();
        } else {
            let parent = cur.read_u8()?;
            let depth = level as usize;
            if depth > path.len() + 1 {
                return Err(Error::Malformed(MalformedKind::LevelOutOfOrder {
                    level,
                    depth: path.len(),
                }));
            }
            // Ascend to the grandparent, keeping a slot for this block's parent.
            path.truncate(depth - 1);
            path.push(parent);
        }

        // Only a wrapped 256-child branch is ever written with a count of 0.
        let count = cur.read_u8()?;
        if count == 0 {
            return Err(Error::Malformed(MalformedKind::EmptyBlock { level }));
        }
        entries.clear();
        for _ in 0..count {
            let b = cur.read_u8()?;
            let counter = if is_leaf { cur.read_varint()? } else { 0 };
            entries.push((b, counter));
        }

        let depth = path.len();
        let children = locate(&mut root, &path)?;
        *children = entries
            .iter()
            .map(|&(b, counter)| (b, Node::for_level(depth, counter)))
            .collect();
        blocks += 1;
    }

    // Every branch entry must have been filled by a later block.
    let mut path = Vec::with_capacity(ADDRESS_LEN);
    if let Some(dangling) = find_empty_branch(&root, &mut path) {
        return Err(Error::Malformed(MalformedKind::DanglingBranch { path: dangling }));
    }

    Ok((root, blocks))
}

/// Path to the first branch below the root that has no children.
fn find_empty_branch(children: &Children, path: &mut Vec<u8>) -> Option<Vec<u8>> {
    for (&b, node) in children {
        if let Node::Branch(next) = node {
            path.push(b);
            if next.is_empty() {
                return Some(path.clone());
            }
            if let Some(found) = find_empty_branch(next, path) {
                return Some(found);
            }
            path.pop();
        }
    }
    None
}

/// Walk `path` from the root to an existing branch.
fn locate<'a>(root: &'a mut Children, path: &[u8]) -> Result<&'a mut Children> {
    let mut children = root;
    for b in path {
        children = match children.get_mut(b) {
            Some(Node::Branch(next)) => next,
            _ => return Err(Error::UnknownParentPath(path.to_vec())),
        };
    }
    Ok(children)
}
