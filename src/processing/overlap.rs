//! CIDR overlap classification and conflict detection.
//!
//! Conflict detection fails loud: a range that cannot be parsed is an error,
//! never a silent "no conflict".

use crate::models::{Cidr, CidrError, SubnetRef};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// How range A relates to range B.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OverlapKind {
    /// Disjoint ranges.
    #[serde(rename = "none")]
    NoOverlap,
    /// Identical ranges.
    #[serde(rename = "exact")]
    Equal,
    /// A is a superset of B.
    Contains,
    /// A is a subset of B.
    ContainedBy,
    /// Intersecting without nesting; only reachable with non-CIDR ranges.
    Partial,
}

impl OverlapKind {
    /// The same relation seen from the other side.
    pub fn mirror(self) -> OverlapKind {
        match self {
            OverlapKind::Contains => OverlapKind::ContainedBy,
            OverlapKind::ContainedBy => OverlapKind::Contains,
            other => other,
        }
    }
}

/// Classify two inclusive `(start, end)` ranges.
pub fn classify_ranges(a: (Ipv4Addr, Ipv4Addr), b: (Ipv4Addr, Ipv4Addr)) -> OverlapKind {
    let (s_a, e_a) = (u32::from(a.0), u32::from(a.1));
    let (s_b, e_b) = (u32::from(b.0), u32::from(b.1));

    if e_a < s_b || e_b < s_a {
        OverlapKind::NoOverlap
    } else if s_a == s_b && e_a == e_b {
        OverlapKind::Equal
    } else if s_a <= s_b && e_b <= e_a {
        OverlapKind::Contains
    } else if s_b <= s_a && e_a <= e_b {
        OverlapKind::ContainedBy
    } else {
        OverlapKind::Partial
    }
}

/// Classify how block `a` relates to block `b`.
///
/// # Examples
/// ```
/// use gcp_network_planner::models::Cidr;
/// use gcp_network_planner::processing::{overlap, OverlapKind};
/// let a = Cidr::parse("10.0.0.0/16").unwrap();
/// let b = Cidr::parse("10.0.4.0/24").unwrap();
/// assert_eq!(overlap(&a, &b), OverlapKind::Contains);
/// assert_eq!(overlap(&b, &a), OverlapKind::ContainedBy);
/// ```
pub fn overlap(a: &Cidr, b: &Cidr) -> OverlapKind {
    classify_ranges(a.range(), b.range())
}

/// An existing range that overlaps a checked CIDR.
///
/// `meta` is whatever the caller attached to the range and is carried
/// through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConflictRecord<M> {
    pub conflicting_cidr: Cidr,
    /// Relation of the checked CIDR to `conflicting_cidr`.
    pub overlap_type: OverlapKind,
    #[serde(flatten)]
    pub meta: M,
}

/// Check `input` against every candidate range.
///
/// Candidates are `(cidr text, metadata)` pairs. Any candidate that does not
/// parse aborts the check with [`CidrError::InvalidCidr`], and a
/// [`OverlapKind::Partial`] result is reported as
/// [`CidrError::UnalignedOverlap`].
pub fn detect_conflicts<'a, M, I>(input: &Cidr, candidates: I) -> Result<Vec<ConflictRecord<M>>, CidrError>
where
    I: IntoIterator<Item = (&'a str, M)>,
{
    let mut conflicts = Vec::new();

    for (cidr_text, meta) in candidates {
        let existing = Cidr::parse(cidr_text)?;
        let overlap_type = overlap(input, &existing);
        log::trace!("{input} vs {existing}: {overlap_type:?}");

        match overlap_type {
            OverlapKind::NoOverlap => {}
            OverlapKind::Partial => {
                return Err(CidrError::UnalignedOverlap {
                    a: input.to_string(),
                    b: existing.to_string(),
                })
            }
            _ => conflicts.push(ConflictRecord {
                conflicting_cidr: existing,
                overlap_type,
                meta,
            }),
        }
    }

    Ok(conflicts)
}

/// Log topology conflicts as warnings.
pub fn log_conflicts(input: &Cidr, conflicts: &[ConflictRecord<SubnetRef>]) {
    if conflicts.is_empty() {
        log::info!("No conflicts found for {input}.");
        return;
    }

    log::warn!("Found {} conflict(s) for {input}:", conflicts.len());
    for conflict in conflicts {
        log::warn!(
            "  - {} ({:?}) subnet '{}', VPC '{}', project '{}', region {}",
            conflict.conflicting_cidr,
            conflict.overlap_type,
            conflict.meta.subnet_name,
            conflict.meta.vpc_name,
            conflict.meta.project_id,
            conflict.meta.region
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(s: &str) -> Cidr {
        Cidr::parse(s).unwrap()
    }

    #[test]
    fn test_overlap_kinds() {
        assert_eq!(overlap(&cidr("10.0.0.0/24"), &cidr("10.0.1.0/24")), OverlapKind::NoOverlap);
        assert_eq!(overlap(&cidr("10.0.0.0/24"), &cidr("10.0.0.0/24")), OverlapKind::Equal);
        assert_eq!(overlap(&cidr("10.0.0.0/8"), &cidr("10.200.3.0/24")), OverlapKind::Contains);
        assert_eq!(overlap(&cidr("10.200.3.0/24"), &cidr("10.0.0.0/8")), OverlapKind::ContainedBy);
        assert_eq!(overlap(&cidr("0.0.0.0/0"), &cidr("255.255.255.255/32")), OverlapKind::Contains);
    }

    #[test]
    fn test_overlap_uses_masked_base() {
        // host bits are ignored
        assert_eq!(overlap(&cidr("10.0.0.9/24"), &cidr("10.0.0.0/24")), OverlapKind::Equal);
        assert_eq!(overlap(&cidr("10.0.0.255/25"), &cidr("10.0.0.0/25")), OverlapKind::NoOverlap);
    }

    #[test]
    fn test_overlap_is_mirrored() {
        let blocks = [
            "10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24", "10.2.0.0/16", "192.168.0.0/16", "0.0.0.0/0",
            "10.1.2.128/25",
        ];
        for a in blocks {
            for b in blocks {
                let (a, b) = (cidr(a), cidr(b));
                let ab = overlap(&a, &b);
                assert_eq!(ab.mirror(), overlap(&b, &a), "{a} vs {b}");
                assert_eq!(ab == OverlapKind::Equal, a.range() == b.range());
                assert_ne!(ab, OverlapKind::Partial);
            }
        }
    }

    #[test]
    fn test_classify_partial_ranges() {
        let a = (Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 0, 9));
        let b = (Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 20));
        assert_eq!(classify_ranges(a, b), OverlapKind::Partial);
        assert_eq!(classify_ranges(b, a), OverlapKind::Partial);
    }

    #[test]
    fn test_overlap_kind_wire_names() {
        assert_eq!(serde_json::to_string(&OverlapKind::Equal).unwrap(), "\"exact\"");
        assert_eq!(serde_json::to_string(&OverlapKind::ContainedBy).unwrap(), "\"contained_by\"");
        assert_eq!(serde_json::to_string(&OverlapKind::NoOverlap).unwrap(), "\"none\"");
    }

    #[test]
    fn test_detect_conflicts_carries_meta() {
        let input = cidr("10.0.0.0/16");
        let candidates = vec![("10.0.5.0/24", "a"), ("10.1.0.0/16", "b"), ("10.0.0.0/8", "c")];
        let conflicts = detect_conflicts(&input, candidates).unwrap();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].meta, "a");
        assert_eq!(conflicts[0].overlap_type, OverlapKind::Contains);
        assert_eq!(conflicts[1].meta, "c");
        assert_eq!(conflicts[1].overlap_type, OverlapKind::ContainedBy);
    }

    #[test]
    fn test_detect_conflicts_fails_on_bad_range() {
        let input = cidr("10.0.0.0/16");
        let candidates = vec![("10.0.5.0/24", 1), ("not-a-cidr", 2)];
        assert!(matches!(
            detect_conflicts(&input, candidates),
            Err(CidrError::InvalidCidr(_))
        ));
    }
}
