//! Unified 16-byte addresses.
//!
//! IPv4 addresses are stored in their v4-in-v6 form: ten zero bytes, then
//! `0xFF 0xFF`, then the four address bytes. Anything without that prefix is
//! treated as IPv6.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::Error;

/// Number of bytes (and trie levels) in an address.
pub const ADDRESS_LEN: usize = 16;

/// Prefix marking an address as originally IPv4.
pub const V4_IN_V6_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff];

/// A 16-byte address, one byte per trie level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn from_octets(octets: [u8; ADDRESS_LEN]) -> Self {
        Self(octets)
    }

    #[inline]
    pub const fn octets(&self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    #[inline]
    pub fn is_ipv4(&self) -> bool {
        is_v4_path(&self.0)
    }

    pub fn to_ip(&self) -> IpAddr {
        if self.is_ipv4() {
            IpAddr::V4(Ipv4Addr::new(self.0[12], self.0[13], self.0[14], self.0[15]))
        } else {
            IpAddr::V6(Ipv6Addr::from(self.0))
        }
    }
}

/// Classify a full 16-byte path by the v4-in-v6 prefix.
#[inline]
pub(crate) fn is_v4_path(bytes: &[u8; ADDRESS_LEN]) -> bool {
    bytes[..12] == V4_IN_V6_PREFIX
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip.to_ipv6_mapped().octets())
    }
}

impl From<Ipv6Addr> for Address {
    fn from(ip: Ipv6Addr) -> Self {
        Self(ip.octets())
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(octets: [u8; ADDRESS_LEN]) -> Self {
        Self(octets)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IpAddr>()
            .map(Address::from)
            .map_err(|_| Error::InvalidAddress(s.to_string()))
    }
}

/// Dotted quad for v4, eight zero-padded hex groups for v6.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        if self.is_ipv4() {
            return write!(f, "{}.{}.{}.{}", b[12], b[13], b[14], b[15]);
        }
        for (i, pair) in b.chunks_exact(2).enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}{:02x}", pair[0], pair[1])?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}
