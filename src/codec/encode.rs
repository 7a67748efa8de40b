use super::{flag_byte, MAGIC};
use crate::node::{Node, LEAF_LEVEL};
use crate::tree::IpTree;
use crate::varint::write_varint;

/// Flatten `tree` into the block stream described in the [module docs](super).
pub fn encode_bytes(tree: &IpTree) -> Vec<u8> {
    let _span = tracing::debug_span!("ipcount_encode", leaves = tree.len()).entered();

    let mut out = Vec::with_capacity(MAGIC.len() + tree.len() * 4);
    out.extend_from_slice(&MAGIC);

    let mut blocks = 0usize;
    tree.for_each_branch(|path, children| {
        let level = path.len();
        let is_leaf = level == LEAF_LEVEL;

        out.push(flag_byte(level as u8, is_leaf));
        if let Some(&parent) = path.last() {
            out.push(parent);
        }

        if children.len() > u8::MAX as usize {
            tracing::warn!(?path, "branch has 256 children; count byte wraps to 0");
        }
        out.push(children.len() as u8);

        for (&b, node) in children {
            out.push(b);
            if is_leaf {
                write_varint(node.counter().unwrap_or_default(), &mut out);
            }
        }
        blocks += 1;
    });

    tracing::debug!(blocks, bytes = out.len(), "encoded tree");
    out
}
