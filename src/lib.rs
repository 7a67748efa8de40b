//! # ipcount
//!
//! Per-address occurrence counters for IPv4 and IPv6, stored in a 16-level
//! byte trie, with a compact binary codec for shipping a tree as text.
//!
//! Every address is unified to 16 bytes (IPv4 uses the v4-in-v6 form), and
//! each byte is one trie level. Leaves at the last level hold the counters.
//!
//! ## Example
//!
//! ```rust
//! use ipcount::IpTree;
//!
//! let mut tree = IpTree::new();
//! tree.insert_text("192.168.1.2", 13).unwrap();
//! tree.insert_text("::1", 17).unwrap();
//! assert!(!tree.append_text("192.168.1.2").unwrap());
//!
//! let text = tree.encode();
//! let copy = IpTree::decode(&text).unwrap();
//!
//! let map = copy.to_map(100);
//! assert_eq!(map["192.168.1.2"], 14);
//! assert_eq!(map["0000:0000:0000:0000:0000:0000:0000:0001"], 17);
//! assert_eq!((copy.ipv4_count(), copy.ipv6_count()), (1, 1));
//! ```

#![warn(clippy::all)]

pub mod addr;
pub mod codec;
pub mod error;
pub mod node;
pub mod shared;
pub mod tree;
pub mod varint;

pub use addr::Address;
pub use codec::{decode, encode};
pub use error::{Error, MalformedKind, Result};
pub use shared::SharedIpTree;
pub use tree::{Config, IpTree};

#[cfg(test)]
mod proptests;
