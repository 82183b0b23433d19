//! Firefox version string helpers
//!
//! Version strings look like `139.0`, `128.0.3` or `140.0b3`. The engine
//! only needs the major number (for `[FF<N>+]` claims) and the floored
//! numeric value (for the "one release apart" gate); the CLI additionally
//! warns when the versions of a diff look swapped.

use regex::Regex;
use std::sync::OnceLock;

static VERSION_PARTS: OnceLock<Regex> = OnceLock::new();

/// The two versions of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPair {
    pub old: String,
    pub new: String,
}

impl VersionPair {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Major number of the newer version
    pub fn new_major(&self) -> Option<u32> {
        major_version(&self.new)
    }

    /// Whether the two versions are exactly one release apart
    pub fn one_release_apart(&self) -> bool {
        is_unit_difference_one(&self.old, &self.new)
    }

    /// The versions of the pair, each listed once
    pub fn distinct(&self) -> Vec<&str> {
        if self.old == self.new {
            vec![self.old.as_str()]
        } else {
            vec![self.old.as_str(), self.new.as_str()]
        }
    }
}

/// Leading integer of a version string (`"140.0b3"` gives 140)
///
/// ```rust
/// use ffdiff::major_version;
///
/// assert_eq!(major_version("140.0b3"), Some(140));
/// assert_eq!(major_version("nightly"), None);
/// ```
pub fn major_version(version: &str) -> Option<u32> {
    let trimmed = version.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// Longest numeric prefix of a string read as a float (`NaN` if none)
fn parse_float_prefix(text: &str) -> f64 {
    let bytes = text.trim_start().as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
        }
        if has_digits || frac > end + 1 {
            has_digits = true;
            end = frac;
        }
    }
    if !has_digits {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }

    std::str::from_utf8(&bytes[..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(f64::NAN)
}

/// Whether the floored numeric values of two versions differ by exactly one
///
/// ```rust
/// use ffdiff::is_unit_difference_one;
///
/// assert!(is_unit_difference_one("139.3", "140.0"));
/// assert!(!is_unit_difference_one("139.0", "141.0"));
/// ```
pub fn is_unit_difference_one(a: &str, b: &str) -> bool {
    let unit_a = parse_float_prefix(a).floor();
    let unit_b = parse_float_prefix(b).floor();
    (unit_a - unit_b).abs() == 1.0
}

/// Whether a string starts with `<digits>.<digit>`, the minimal shape of a
/// release version
pub fn starts_with_number_dot_number(text: &str) -> bool {
    let Some(dot) = text.find('.') else {
        return false;
    };
    if dot == 0 || !text[..dot].bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    text.as_bytes()
        .get(dot + 1)
        .is_some_and(|b| b.is_ascii_digit())
}

/// Numeric dot-separated parts and optional beta number of a version
fn version_parts(version: &str) -> (Vec<u64>, Option<u64>) {
    let re = VERSION_PARTS
        .get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)*)(?:b(\d+))?").expect("valid regex"));
    let Some(captures) = re.captures(version.trim()) else {
        return (Vec::new(), None);
    };

    let parts = captures[1]
        .split('.')
        .map(|p| p.parse().unwrap_or(u64::MAX))
        .collect();
    let beta = captures.get(2).and_then(|b| b.as_str().parse().ok());
    (parts, beta)
}

/// Whether `old` looks newer than `new`
///
/// Numeric parts are compared left to right, missing parts counting as 0.
/// When all numeric parts are equal, a beta suffix on `old` with none on
/// `new`, or a higher beta number on `old`, means `old` is newer.
///
/// ```rust
/// use ffdiff::is_version_newer;
///
/// assert!(is_version_newer("140.0", "139.0"));
/// assert!(!is_version_newer("139.0", "140.0"));
/// assert!(is_version_newer("140.0b5", "140.0b3"));
/// ```
pub fn is_version_newer(old: &str, new: &str) -> bool {
    let (old_parts, old_beta) = version_parts(old);
    let (new_parts, new_beta) = version_parts(new);

    let len = old_parts.len().max(new_parts.len());
    for i in 0..len {
        let a = old_parts.get(i).copied().unwrap_or(0);
        let b = new_parts.get(i).copied().unwrap_or(0);
        if a != b {
            return a > b;
        }
    }

    match (old_beta, new_beta) {
        (Some(_), None) => true,
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_versions() {
        assert_eq!(VersionPair::new("139.0", "140.0").distinct(), vec!["139.0", "140.0"]);
        assert_eq!(VersionPair::new("140.0", "140.0").distinct(), vec!["140.0"]);
    }

    #[test]
    fn test_unit_difference_one() {
        assert!(is_unit_difference_one("139.3", "140.0"));
        assert!(is_unit_difference_one("140.0", "139.9"));
        assert!(!is_unit_difference_one("139.3", "139.8"));
        assert!(!is_unit_difference_one("139.3", "141.0"));
        assert!(is_unit_difference_one("100", "101"));
        assert!(is_unit_difference_one("101", "100"));
    }

    #[test]
    fn test_unit_difference_negative_and_decimals() {
        assert!(is_unit_difference_one("-2.5", "-1.2"));
        assert!(!is_unit_difference_one("-3.0", "-1.0"));
        assert!(is_unit_difference_one("5.99", "6.01"));
        assert!(!is_unit_difference_one("10.1", "10.9"));
        assert!(!is_unit_difference_one("-1.5", "0.5"));
        assert!(is_unit_difference_one("-0.5", "0.5"));
    }

    #[test]
    fn test_unit_difference_with_suffixes() {
        assert!(is_unit_difference_one("139.0b9", "140.0"));
        assert!(is_unit_difference_one("139.0.1", "140.0"));
        assert!(!is_unit_difference_one("nightly", "140.0"));
    }

    #[test]
    fn test_starts_with_number_dot_number() {
        assert!(starts_with_number_dot_number("1.0"));
        assert!(starts_with_number_dot_number("10.5.3"));
        assert!(starts_with_number_dot_number("0.1"));
        assert!(starts_with_number_dot_number("140.0b3"));
        assert!(!starts_with_number_dot_number("123"));
        assert!(!starts_with_number_dot_number("a.2"));
        assert!(!starts_with_number_dot_number(".2"));
        assert!(!starts_with_number_dot_number("1a.2"));
        assert!(!starts_with_number_dot_number("1.a"));
        assert!(!starts_with_number_dot_number("2.."));
        assert!(!starts_with_number_dot_number(""));
        assert!(!starts_with_number_dot_number("1..2"));
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("139.0"), Some(139));
        assert_eq!(major_version("128.0.3"), Some(128));
        assert_eq!(major_version("140"), Some(140));
        assert_eq!(major_version(""), None);
    }

    #[test]
    fn test_is_version_newer_numeric() {
        assert!(is_version_newer("128.0.1", "128.0"));
        assert!(!is_version_newer("128.0", "128.0.1"));
        assert!(!is_version_newer("128.0", "128.0"));
        assert!(is_version_newer("100.0", "99.0"));
    }

    #[test]
    fn test_is_version_newer_beta() {
        assert!(is_version_newer("140.0b3", "140.0"));
        assert!(!is_version_newer("140.0", "140.0b3"));
        assert!(is_version_newer("140.0b10", "140.0b9"));
        assert!(!is_version_newer("140.0b2", "140.0b9"));
        assert!(!is_version_newer("139.0b9", "140.0"));
    }

    #[test]
    fn test_version_pair() {
        let pair = VersionPair::new("139.0", "140.0");
        assert_eq!(pair.new_major(), Some(140));
        assert!(pair.one_release_apart());
        assert!(!VersionPair::new("139.0", "141.0").one_release_apart());
    }
}
