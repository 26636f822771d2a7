//! Version ordering for the download list.
//!
//! This is a best-effort numeric comparison, not semantic-versioning
//! precedence. Each `.`/`-` separated segment is reduced to its digits, so a
//! pre-release tag like `rc2` compares as `2` and `1.0.0-beta` equals
//! `1.0.0`. Unusual version strings can tie or misorder; the download list
//! only needs "newest first" for well-formed releases.

use std::cmp::Ordering;

/// Numeric sort key for a version string.
///
/// Splits on `.` and `-`, keeps only ASCII digits of each part and parses
/// them. Parts without digits become 0; digit runs too long for `u64`
/// saturate.
pub fn semver_key(version: &str) -> Vec<u64> {
    version
        .split(|c| c == '.' || c == '-')
        .map(segment_value)
        .collect()
}

fn segment_value(part: &str) -> u64 {
    let digits: String = part.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(u64::MAX)
    }
}

/// Compare two versions segment by segment, padding the shorter with zeros.
pub fn semver_compare(a: &str, b: &str) -> Ordering {
    let ka = semver_key(a);
    let kb = semver_key(b);
    let len = ka.len().max(kb.len());

    (0..len)
        .map(|i| {
            let x = ka.get(i).copied().unwrap_or(0);
            let y = kb.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// A version is a pre-release when it carries a `-` suffix.
pub fn is_prerelease(version: &str) -> bool {
    version.contains('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_key() {
        assert_eq!(semver_key("1.2.3"), vec![1, 2, 3]);
        assert_eq!(semver_key("0.0.5-beta"), vec![0, 0, 5, 0]);
        assert_eq!(semver_key("1.0.0-rc1"), vec![1, 0, 0, 1]);
        assert_eq!(semver_key("v2.x.10"), vec![2, 0, 10]);
        assert_eq!(semver_key(""), vec![0]);
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(semver_compare("1.10.0", "1.2.0"), Ordering::Greater);
        assert_eq!(semver_compare("1.2.0", "1.10.0"), Ordering::Less);
    }

    #[test]
    fn test_missing_segments_are_zero() {
        assert_eq!(semver_compare("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(semver_compare("1.2", "1.2.3.4"), Ordering::Less);
        assert_eq!(semver_compare("1.2.3.4", "1.2"), Ordering::Greater);
        assert_eq!(semver_compare("1.2.0.0", "1.2"), Ordering::Equal);
    }

    #[test]
    fn test_prerelease_heuristic() {
        // rc2 collapses to 2 and outranks rc1
        assert_eq!(semver_compare("1.0.0-rc2", "1.0.0-rc1"), Ordering::Greater);
        // beta has no digits and ties with the release
        assert_eq!(semver_compare("1.0.0-beta", "1.0.0"), Ordering::Equal);
        assert_eq!(semver_compare("0.0.5-beta", "0.0.4"), Ordering::Greater);
    }

    #[test]
    fn test_oversized_segment_saturates() {
        assert_eq!(semver_key("99999999999999999999999"), vec![u64::MAX]);
        assert_eq!(
            semver_compare("99999999999999999999999", "18446744073709551614"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_is_prerelease() {
        assert!(is_prerelease("0.0.5-beta"));
        assert!(!is_prerelease("0.0.4"));
    }
}
