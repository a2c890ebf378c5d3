//! Firmware version comparison.
//!
//! Hub firmware strings are dotted numeric tuples (`"2.0.7.9"`).  Missing
//! or non-numeric components count as zero, so an empty string compares as
//! the oldest possible firmware.

use std::cmp::Ordering;

fn components(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

/// Compare two firmware version strings component-wise.
pub fn compare(a: &str, b: &str) -> Ordering {
    let (a, b) = (components(a), components(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// `true` when `version` is equal to or newer than `minimum`.
pub fn is_at_least(version: &str, minimum: &str) -> bool {
    compare(version, minimum) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_wise_not_lexical() {
        assert!(is_at_least("2.0.10.0", "2.0.9.7"));
        assert!(!is_at_least("2.0.7.8", "2.0.7.9"));
    }

    #[test]
    fn equal_versions_are_at_least() {
        assert!(is_at_least("2.0.7.9", "2.0.7.9"));
        assert_eq!(compare("1.0", "1.0.0.0"), Ordering::Equal);
    }

    #[test]
    fn empty_is_oldest() {
        assert!(!is_at_least("", "0.0.0.1"));
        assert!(is_at_least("", ""));
    }
}
