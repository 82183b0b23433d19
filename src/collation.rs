//! Locale-aware ordering of preference keys
//!
//! Reports list keys in the order a root-locale collator would: case is
//! ignored at first, punctuation sorts before digits and digits before
//! letters, and punctuation follows the root order (`_` before `-` before
//! `.`). Ties are broken by case (lowercase first) and finally by the
//! raw code points, so two distinct keys never compare equal.

use std::cmp::Ordering;

/// Compare two keys the way reports order them
///
/// ```rust
/// use ffdiff::locale_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(locale_cmp("Browser.x", "browser.y"), Ordering::Less);
/// assert_eq!(locale_cmp("a_b", "a1"), Ordering::Less);
/// assert_eq!(locale_cmp("a", "A"), Ordering::Less);
/// ```
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary(a, b)
        .then_with(|| tertiary(a, b))
        .then_with(|| a.cmp(b))
}

/// ASCII punctuation and symbols in root collation order
const PUNCTUATION_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Primary weight of a lowercased character
///
/// Whitespace sorts first, then the ASCII punctuation of
/// [`PUNCTUATION_ORDER`], then any other symbol, digits and letters.
fn weight(c: char) -> (u8, u32) {
    if c.is_alphabetic() {
        (4, c as u32)
    } else if c.is_numeric() {
        (3, c as u32)
    } else if c.is_whitespace() {
        (0, c as u32)
    } else if let Some(rank) = PUNCTUATION_ORDER.find(c) {
        (1, rank as u32)
    } else {
        (2, c as u32)
    }
}

fn primary(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().flat_map(char::to_lowercase);
    let mut right = b.chars().flat_map(char::to_lowercase);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = weight(x).cmp(&weight(y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

// Lowercase sorts before uppercase at the first position where case differs.
fn tertiary(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) if y.is_uppercase() => return Ordering::Less,
            (false, true) if x.is_uppercase() => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_primary() {
        assert_eq!(locale_cmp("Zeta", "alpha"), Ordering::Greater);
        assert_eq!(locale_cmp("alpha", "Beta"), Ordering::Less);
    }

    #[test]
    fn test_punctuation_before_digits_before_letters() {
        assert_eq!(locale_cmp("a.b", "a1"), Ordering::Less);
        assert_eq!(locale_cmp("a1", "ab"), Ordering::Less);
        assert_eq!(locale_cmp("a-b", "aa"), Ordering::Less);
    }

    #[test]
    fn test_punctuation_root_order() {
        assert_eq!(locale_cmp("a_b", "a-b"), Ordering::Less);
        assert_eq!(locale_cmp("a-b", "a.b"), Ordering::Less);
        assert_eq!(locale_cmp("a_b", "a.b"), Ordering::Less);
        assert_eq!(locale_cmp("a.b", "a$b"), Ordering::Less);
        assert_eq!(locale_cmp("a b", "a_b"), Ordering::Less);

        let mut keys = vec!["media.ice.default.x", "media.ice.default_address_only"];
        keys.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(keys, vec!["media.ice.default_address_only", "media.ice.default.x"]);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(locale_cmp("browser", "browser.tabs"), Ordering::Less);
    }

    #[test]
    fn test_distinct_keys_never_equal() {
        assert_ne!(locale_cmp("a", "A"), Ordering::Equal);
        assert_eq!(locale_cmp("a", "A"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_sort_keys() {
        let mut keys = vec!["network.b", "Network.a", "network.A", "browser.z", "app.1"];
        keys.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(
            keys,
            vec!["app.1", "browser.z", "network.A", "Network.a", "network.b"]
        );
    }
}
