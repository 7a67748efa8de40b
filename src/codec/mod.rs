//! Binary codec for [`IpTree`].
//!
//! # Layout
//!
//! ```text
//! [magic "SL"][block]*
//!
//! block := [flag][parent?][count][entry]*count
//! flag  := level << 4 | 0x08 if the entries are leaves
//! entry := [byte][varint counter, leaf blocks only]
//! ```
//!
//! One block is written per non-empty branch, in the order of
//! [`IpTree::for_each_branch`]. `level` is the length of the path from the
//! root to the branch; the parent byte (the last byte of that path) is omitted
//! for the root. The stream is not self-describing: the decoder rebuilds each
//! branch's path from the sequence of levels alone.
//!
//! The count byte cannot express 256 children. A branch with every possible
//! child byte is written with a count of 0, which the decoder rejects as an
//! empty block. A stream must also fill every branch entry it declares: one
//! that ends with an unfilled branch is rejected as dangling.
//!
//! At the text boundary the bytes travel as lowercase hex.

mod decode;
mod encode;

pub use decode::decode_bytes;
pub use encode::encode_bytes;

use crate::error::Result;
use crate::tree::{Config, IpTree};

/// Stream signature, ASCII `SL`.
pub const MAGIC: [u8; 2] = [0x53, 0x4C];

/// Flag bit marking a block whose entries are leaves.
pub const LEAF_FLAG: u8 = 0x08;

#[inline]
pub(crate) fn flag_byte(level: u8, is_leaf: bool) -> u8 {
    let mut flag = level << 4;
    if is_leaf {
        flag |= LEAF_FLAG;
    }
    flag
}

#[inline]
pub(crate) fn split_flag(flag: u8) -> (u8, bool) {
    (flag >> 4, flag & LEAF_FLAG != 0)
}

/// Encode `tree` as hex text.
pub fn encode(tree: &IpTree) -> String {
    hex::encode(encode_bytes(tree))
}

/// Decode hex text produced by [`encode`].
pub fn decode(text: &str) -> Result<IpTree> {
    decode_with_config(text, Config::default())
}

pub fn decode_with_config(text: &str, config: Config) -> Result<IpTree> {
    let bytes = hex::decode(text).map_err(|err| {
        tracing::debug!(%err, text_len = text.len(), "rejecting tree text");
        err
    })?;
    decode::decode_bytes_with_config(&bytes, config)
}

impl IpTree {
    /// See [`encode`].
    pub fn encode(&self) -> String {
        encode(self)
    }

    /// See [`decode`].
    pub fn decode(text: &str) -> Result<Self> {
        decode(text)
    }
}
