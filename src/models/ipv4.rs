//! IPv4 address codec and CIDR block arithmetic.
//!
//! Provides [`Cidr`] for representing an IPv4 block with its prefix length,
//! along with the dotted-quad codec used by every other module. All bit
//! arithmetic is done on `u32`, so the top octet never sign-extends.

use super::CidrError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 prefix (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Netmask bits for a prefix length already known to be in range.
fn mask_bits(len: u8) -> u32 {
    u32::MAX
        .checked_shl(u32::from(MAX_LENGTH.saturating_sub(len)))
        .unwrap_or(0)
}

/// Parse dotted-quad text into an address.
///
/// Exactly four `.`-separated decimal segments in 0..=255 are required.
/// Leading zeros are accepted (`010.0.0.1` is `10.0.0.1`); signs, spaces
/// and empty segments are not. Callers trim user input first.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, CidrError> {
    let segments: Vec<&str> = text.split('.').collect();
    if segments.len() != 4 {
        return Err(CidrError::InvalidAddress(text.to_string()));
    }

    let mut bits: u32 = 0;
    for segment in segments {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CidrError::InvalidAddress(text.to_string()));
        }
        let octet: u8 = segment
            .parse()
            .map_err(|_| CidrError::InvalidAddress(text.to_string()))?;
        bits = (bits << 8) | u32::from(octet);
    }

    Ok(Ipv4Addr::from(bits))
}

/// Format a 32-bit address value as canonical dotted-quad text.
pub fn format_ipv4(bits: u32) -> String {
    Ipv4Addr::from(bits).to_string()
}

/// IPv4 block in CIDR notation.
///
/// The base address is kept as written; only its top `mask` bits take part
/// in range computations, so `10.0.0.5/24` covers `10.0.0.0..=10.0.0.255`.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Cidr {
    addr: Ipv4Addr,
    mask: u8,
}

impl Cidr {
    /// Build a block from an address and a prefix length in 0..=32.
    pub fn new(addr: Ipv4Addr, mask: u8) -> Result<Cidr, CidrError> {
        if mask > MAX_LENGTH {
            return Err(CidrError::InvalidCidr(format!("{addr}/{mask}")));
        }
        Ok(Cidr { addr, mask })
    }

    /// Parse a CIDR string (e.g. "10.0.0.0/24").
    pub fn parse(addr_cidr: &str) -> Result<Cidr, CidrError> {
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| CidrError::InvalidCidr(format!("missing '/' in {addr_cidr}")))?;

        let addr = parse_ipv4(addr)
            .map_err(|_| CidrError::InvalidCidr(format!("invalid base address in {addr_cidr}")))?;

        if mask.is_empty() || !mask.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CidrError::InvalidCidr(format!(
                "invalid prefix length in {addr_cidr}"
            )));
        }
        let mask: u8 = mask
            .parse()
            .map_err(|_| CidrError::InvalidCidr(format!("prefix out of range in {addr_cidr}")))?;

        Cidr::new(addr, mask)
    }

    /// The base address as given.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// The prefix length.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// The netmask as u32.
    pub fn netmask(&self) -> u32 {
        mask_bits(self.mask)
    }

    /// Get the lowest (network) address in the block.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & self.netmask())
    }

    /// Get the highest (broadcast) address in the block.
    pub fn hi(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.lo()) | !self.netmask())
    }

    /// Inclusive `(start, end)` range covered by the block.
    pub fn range(&self) -> (Ipv4Addr, Ipv4Addr) {
        (self.lo(), self.hi())
    }

    /// Number of addresses in the block (2^32 for /0, hence u64).
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask)
    }

    /// Check if an IP address is contained within this block.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = self.netmask();
        (u32::from(ip) & mask) == (u32::from(self.addr) & mask)
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cidr::parse(s)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl Serialize for Cidr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D>(deserializer: D) -> Result<Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cidr::parse(&s).map_err(de::Error::custom)
    }
}
