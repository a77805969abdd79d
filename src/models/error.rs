//! Typed errors for address and CIDR handling.

use thiserror::Error;

/// Errors raised by the address codec, CIDR parsing and the allocation helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidrError {
    /// Malformed dotted-quad text.
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    /// Malformed base address, missing `/` or prefix outside 0..=32.
    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),

    /// A request whose size relationship cannot be satisfied.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Two ranges intersect without one nesting inside the other.
    #[error("ranges {a} and {b} overlap without nesting")]
    UnalignedOverlap { a: String, b: String },
}
