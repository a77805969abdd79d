//! Topology snapshot access.
//!
//! - [`cache`] - Reading scan results saved as JSON

mod cache;

pub use cache::{parse_topology, read_topology};
