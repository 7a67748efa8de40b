//! Error types for address handling and the tree codec.

use thiserror::Error;

/// Why an encoded stream was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedKind {
    /// Transport text is not valid hexadecimal (odd length or bad digit).
    InvalidHex,
    /// Stream is shorter than the 2-byte magic.
    TooShort { len: usize },
    /// First two bytes are not `SL`.
    BadMagic([u8; 2]),
    /// Stream ended while `needed` more bytes were expected at `offset`.
    Truncated { offset: usize, needed: usize },
    /// A block skipped a level relative to the current ancestor path.
    LevelOutOfOrder { level: u8, depth: usize },
    /// The leaf bit of a flag byte disagrees with its level.
    LeafFlagMismatch { level: u8 },
    /// A block declared zero entries. Encoders only produce this when a
    /// branch with 256 children wraps the count byte.
    EmptyBlock { level: u8 },
    /// The stream ended with a branch that no block ever filled.
    DanglingBranch { path: Vec<u8> },
}

impl std::fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHex => write!(f, "invalid hex text"),
            Self::TooShort { len } => write!(f, "stream too short ({} bytes, need >= 2)", len),
            Self::BadMagic(head) => write!(f, "invalid magic bytes {:02x?} (expected SL)", head),
            Self::Truncated { offset, needed } => {
                write!(f, "unexpected end of stream at offset {} ({} more bytes needed)", offset, needed)
            }
            Self::LevelOutOfOrder { level, depth } => {
                write!(f, "block at level {} cannot follow ancestor path of depth {}", level, depth)
            }
            Self::LeafFlagMismatch { level } => {
                write!(f, "leaf flag does not match block level {}", level)
            }
            Self::EmptyBlock { level } => write!(f, "block at level {} has no entries", level),
            Self::DanglingBranch { path } => {
                write!(f, "branch {:02x?} has no children at end of stream", path)
            }
        }
    }
}

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum Error {
    /// Single-address text did not parse as an IPv4 or IPv6 address.
    #[error("not a valid IP: {0}")]
    InvalidAddress(String),

    /// Encoded stream or its hex text could not be decoded.
    #[error("malformed stream: {0}")]
    Malformed(MalformedKind),

    /// A block referenced an ancestor path no earlier block established.
    #[error("unknown parent path: {0:?}")]
    UnknownParentPath(Vec<u8>),
}

impl From<hex::FromHexError> for Error {
    fn from(_: hex::FromHexError) -> Self {
        Error::Malformed(MalformedKind::InvalidHex)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
