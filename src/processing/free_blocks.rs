//! Finding free CIDR blocks inside a parent scope.
//!
//! Candidates are generated by stepping the block index upward from the
//! start of the scope. When a candidate hits an occupied range the cursor
//! jumps to the first aligned block past it, which yields the same sequence
//! as testing every slot but skips runs that cannot be free.

use crate::config;
use crate::models::{Cidr, CidrError, MAX_LENGTH};
use std::net::Ipv4Addr;

/// Enumerate free blocks of `/required_prefix` inside `scope`.
///
/// Returns blocks in ascending address order that are fully inside `scope`
/// and overlap none of `occupied`, stopping after `limit` results or after
/// `scan_cap` candidate slots, whichever comes first. The order of
/// `occupied` does not affect the result.
///
/// # Examples
/// ```
/// use gcp_network_planner::models::Cidr;
/// use gcp_network_planner::processing::find_free_blocks;
/// let scope = Cidr::parse("10.0.0.0/8").unwrap();
/// let free = find_free_blocks(&scope, 24, &[], 3).unwrap();
/// let free: Vec<String> = free.iter().map(|c| c.to_string()).collect();
/// assert_eq!(free, ["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24"]);
/// ```
pub fn find_free_blocks(
    scope: &Cidr,
    required_prefix: u8,
    occupied: &[Cidr],
    limit: usize,
) -> Result<Vec<Cidr>, CidrError> {
    find_free_blocks_capped(scope, required_prefix, occupied, limit, config::MAX_CANDIDATE_SCAN)
}

/// [`find_free_blocks`] with an explicit bound on examined candidate slots.
pub fn find_free_blocks_capped(
    scope: &Cidr,
    required_prefix: u8,
    occupied: &[Cidr],
    limit: usize,
    scan_cap: u64,
) -> Result<Vec<Cidr>, CidrError> {
    if required_prefix > MAX_LENGTH {
        return Err(CidrError::InvalidRequest(format!(
            "prefix length /{required_prefix} is longer than /{MAX_LENGTH}"
        )));
    }
    if required_prefix < scope.mask() {
        return Err(CidrError::InvalidRequest(format!(
            "a /{required_prefix} block does not fit inside {scope}"
        )));
    }

    // u64 so that the end of 255.255.255.255 does not wrap
    let mut taken: Vec<(u64, u64)> = occupied
        .iter()
        .map(|c| (u64::from(u32::from(c.lo())), u64::from(u32::from(c.hi()))))
        .collect();
    taken.sort_unstable();

    let block_size = 1u64 << (MAX_LENGTH - required_prefix);
    let scope_end = u64::from(u32::from(scope.hi())) + 1;
    let mut cursor = u64::from(u32::from(scope.lo()));
    let mut scanned: u64 = 0;
    let mut found = Vec::new();

    while cursor < scope_end && found.len() < limit {
        if scanned >= scan_cap {
            log::warn!(
                "Free block search in {scope} for /{required_prefix} stopped after {scanned} candidates ({} found)",
                found.len()
            );
            break;
        }
        scanned += 1;

        let candidate_end = cursor + block_size - 1;
        let blocker = taken
            .iter()
            .find(|(lo, hi)| *lo <= candidate_end && cursor <= *hi);

        match blocker {
            Some((_, hi)) => {
                let next = align_up(hi + 1, block_size);
                cursor = next.max(cursor + block_size);
            }
            None => {
                // cursor < 2^32 here, so the cast is lossless
                let block = Cidr::new(Ipv4Addr::from(cursor as u32), required_prefix)?;
                found.push(block);
                cursor += block_size;
            }
        }
    }

    log::debug!(
        "Free block search in {scope} for /{required_prefix}: {} found, {scanned} scanned",
        found.len()
    );
    Ok(found)
}

fn align_up(value: u64, block_size: u64) -> u64 {
    value.div_ceil(block_size) * block_size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(s: &str) -> Cidr {
        Cidr::parse(s).unwrap()
    }

    fn to_strings(blocks: &[Cidr]) -> Vec<String> {
        blocks.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_free_blocks_empty_scope() {
        let free = find_free_blocks(&cidr("10.0.0.0/8"), 24, &[], 3).unwrap();
        assert_eq!(to_strings(&free), ["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24"]);
    }

    #[test]
    fn test_free_blocks_fully_occupied() {
        let free = find_free_blocks(&cidr("10.0.0.0/24"), 24, &[cidr("10.0.0.0/24")], 5).unwrap();
        assert!(free.is_empty());
    }

    #[test]
    fn test_free_blocks_skip_occupied() {
        let occupied = [cidr("10.0.1.0/24"), cidr("10.0.0.0/25"), cidr("10.0.4.0/22")];
        let free = find_free_blocks(&cidr("10.0.0.0/16"), 24, &occupied, 4).unwrap();
        assert_eq!(
            to_strings(&free),
            ["10.0.2.0/24", "10.0.3.0/24", "10.0.8.0/24", "10.0.9.0/24"]
        );
    }

    #[test]
    fn test_free_blocks_small_occupied_inside_candidate() {
        // a /28 anywhere inside a /24 makes that /24 unusable
        let occupied = [cidr("10.0.0.200/28")];
        let free = find_free_blocks(&cidr("10.0.0.0/22"), 24, &occupied, 10).unwrap();
        assert_eq!(to_strings(&free), ["10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]);
    }

    #[test]
    fn test_free_blocks_occupied_covering_scope() {
        let free = find_free_blocks(&cidr("10.1.0.0/16"), 24, &[cidr("10.0.0.0/8")], 5).unwrap();
        assert!(free.is_empty());
    }

    #[test]
    fn test_free_blocks_order_independent() {
        let mut occupied = vec![
            cidr("10.0.3.0/24"),
            cidr("10.0.0.0/24"),
            cidr("10.0.6.0/23"),
            cidr("10.0.1.128/26"),
        ];
        let first = find_free_blocks(&cidr("10.0.0.0/20"), 24, &occupied, 8).unwrap();
        occupied.reverse();
        let second = find_free_blocks(&cidr("10.0.0.0/20"), 24, &occupied, 8).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            to_strings(&first),
            [
                "10.0.2.0/24", "10.0.4.0/24", "10.0.5.0/24", "10.0.8.0/24", "10.0.9.0/24",
                "10.0.10.0/24", "10.0.11.0/24", "10.0.12.0/24"
            ]
        );
    }

    #[test]
    fn test_free_blocks_unaligned_scope_base() {
        // scope base has host bits set; search starts at the masked start
        let free = find_free_blocks(&cidr("192.168.7.99/24"), 26, &[], 10).unwrap();
        assert_eq!(
            to_strings(&free),
            ["192.168.7.0/26", "192.168.7.64/26", "192.168.7.128/26", "192.168.7.192/26"]
        );
    }

    #[test]
    fn test_free_blocks_top_of_address_space() {
        let free = find_free_blocks(&cidr("255.255.255.0/24"), 25, &[], 10).unwrap();
        assert_eq!(to_strings(&free), ["255.255.255.0/25", "255.255.255.128/25"]);

        let free = find_free_blocks(&cidr("0.0.0.0/0"), 0, &[], 10).unwrap();
        assert_eq!(to_strings(&free), ["0.0.0.0/0"]);
    }

    #[test]
    fn test_free_blocks_invalid_request() {
        assert!(matches!(
            find_free_blocks(&cidr("10.0.0.0/16"), 8, &[], 5),
            Err(CidrError::InvalidRequest(_))
        ));
        assert!(matches!(
            find_free_blocks(&cidr("10.0.0.0/16"), 33, &[], 5),
            Err(CidrError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_free_blocks_limit_and_cap() {
        assert!(find_free_blocks(&cidr("10.0.0.0/8"), 24, &[], 0).unwrap().is_empty());

        let free = find_free_blocks_capped(&cidr("10.0.0.0/8"), 32, &[], 1_000, 10).unwrap();
        assert_eq!(free.len(), 10);
        assert_eq!(free[9].to_string(), "10.0.0.9/32");
    }

    #[test]
    fn test_free_blocks_is_deterministic() {
        let occupied = [cidr("172.16.0.0/20"), cidr("172.16.32.0/19")];
        let scope = cidr("172.16.0.0/12");
        let runs: Vec<Vec<Cidr>> = (0..3)
            .map(|_| find_free_blocks(&scope, 20, &occupied, 6).unwrap())
            .collect();
        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[1], runs[2]);
        assert_eq!(runs[0][0].to_string(), "172.16.16.0/20");
        assert_eq!(runs[0][1].to_string(), "172.16.64.0/20");
    }
}
