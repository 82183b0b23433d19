//! Core data types shared by the parser, the diff engine and the reports

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A scalar preference value as exposed by the default branch
///
/// Values of different variants never compare equal: `"1"` and `1` are
/// distinct, and so are `1` and `true`.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    /// String value (char prefs)
    String(String),
    /// Numeric value (int prefs, or decimals written in user.js)
    Number(f64),
    /// Boolean value
    Bool(bool),
}

impl PrefValue {
    /// Build a numeric value from an integer
    pub fn int(n: i64) -> Self {
        PrefValue::Number(n as f64)
    }

    /// Build a string value
    pub fn string(s: impl Into<String>) -> Self {
        PrefValue::String(s.into())
    }

    /// Whether this value is a number that failed to parse
    pub fn is_nan(&self) -> bool {
        matches!(self, PrefValue::Number(n) if n.is_nan())
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::String(s) => f.write_str(s),
            PrefValue::Number(n) => write!(f, "{}", n),
            PrefValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Serialized as the bare JSON scalar; integral numbers are written without a
/// fractional part, the way the default branch reports int prefs.
impl Serialize for PrefValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PrefValue::String(s) => serializer.serialize_str(s),
            PrefValue::Bool(b) => serializer.serialize_bool(*b),
            PrefValue::Number(n) => match self.as_i64() {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
        }
    }
}

impl From<bool> for PrefValue {
    fn from(b: bool) -> Self {
        PrefValue::Bool(b)
    }
}

impl From<i64> for PrefValue {
    fn from(n: i64) -> Self {
        PrefValue::int(n)
    }
}

impl From<i32> for PrefValue {
    fn from(n: i32) -> Self {
        PrefValue::Number(n as f64)
    }
}

impl From<f64> for PrefValue {
    fn from(n: f64) -> Self {
        PrefValue::Number(n)
    }
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        PrefValue::String(s.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(s: String) -> Self {
        PrefValue::String(s)
    }
}

/// Convenience accessors for [`PrefValue`]
///
/// ```rust
/// use ffdiff::{PrefValue, PrefValueExt};
///
/// let value = PrefValue::Bool(true);
/// assert_eq!(value.as_bool(), Some(true));
/// assert_eq!(value.as_str(), None);
/// ```
pub trait PrefValueExt {
    /// Returns the boolean if this is a `Bool`
    fn as_bool(&self) -> Option<bool>;
    /// Returns the string slice if this is a `String`
    fn as_str(&self) -> Option<&str>;
    /// Returns the number as an integer if it has no fractional part
    fn as_i64(&self) -> Option<i64>;
}

impl PrefValueExt for PrefValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            PrefValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 => {
                Some(*n as i64)
            }
            _ => None,
        }
    }
}

/// A single preference key with its value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefEntry {
    /// Dotted preference name (e.g., "browser.startup.homepage")
    pub key: String,
    /// Preference value
    pub value: PrefValue,
}

impl PrefEntry {
    pub fn new(key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A preference present in both registries with a different value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedPref {
    pub key: String,
    /// Value in the older registry
    pub value: PrefValue,
    /// Value in the newer registry
    pub new_value: PrefValue,
}

/// Snapshot of the default-branch preferences of one browser build
///
/// Keys are unique. A registry is built once (through [`FromIterator`]) and
/// is read-only afterwards; when the source yields the same key twice, the
/// last value wins.
///
/// ```rust
/// use ffdiff::{PrefValue, Registry};
///
/// let registry: Registry = [
///     ("browser.tabs.warnOnClose", PrefValue::Bool(false)),
///     ("browser.tabs.warnOnClose", PrefValue::Bool(true)),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(registry.len(), 1);
/// assert_eq!(registry.get("browser.tabs.warnOnClose"), Some(&PrefValue::Bool(true)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    prefs: HashMap<String, PrefValue>,
}

impl Registry {
    pub fn get(&self, key: &str) -> Option<&PrefValue> {
        self.prefs.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.prefs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.prefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefs.is_empty()
    }

    /// Iterate over entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PrefValue)> {
        self.prefs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All entries, sorted by key with [`crate::locale_cmp`]
    pub fn sorted_entries(&self) -> Vec<PrefEntry> {
        let mut entries: Vec<PrefEntry> = self
            .prefs
            .iter()
            .map(|(key, value)| PrefEntry::new(key.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| crate::collation::locale_cmp(&a.key, &b.key));
        entries
    }
}

impl<K, V> FromIterator<(K, V)> for Registry
where
    K: Into<String>,
    V: Into<PrefValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Registry {
            prefs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl FromIterator<PrefEntry> for Registry {
    fn from_iter<I: IntoIterator<Item = PrefEntry>>(iter: I) -> Self {
        iter.into_iter().map(|e| (e.key, e.value)).collect()
    }
}

/// The `[DEFAULT: value FF<N>+]` part of an annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultAnnotation {
    /// The value the registry default is expected to have
    pub value: PrefValue,
    /// First version the expectation applies to; `None` means always
    pub version: Option<u32>,
}

/// One `user_pref(...)` statement from a user.js file with its annotations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedPref {
    pub key: String,
    /// The literal value assigned in user.js
    pub value: PrefValue,
    /// From `[FF<N>+]`
    pub version_added: Option<u32>,
    /// From `[FF<N>-]`
    pub version_removed: Option<u32>,
    /// From `[CUSTOM PREF]`
    pub custom: bool,
    /// From `[HIDDEN PREF]`
    pub hidden: bool,
    /// From `[DEFAULT: ...]`
    pub default: Option<DefaultAnnotation>,
}

impl AnnotatedPref {
    /// A bare annotation with no markers
    pub fn new(key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            version_added: None,
            version_removed: None,
            custom: false,
            hidden: false,
            default: None,
        }
    }
}

/// A Firefox installation found on disk
#[derive(Debug, Clone, Serialize)]
pub struct FirefoxInstallation {
    /// Firefox version string (e.g., "128.0")
    pub version: String,
    /// Installation directory
    pub path: std::path::PathBuf,
    /// Whether greprefs.js was found
    pub has_greprefs: bool,
    /// Whether omni.ja was found
    pub has_omni_ja: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_type_values_are_not_equal() {
        assert_ne!(PrefValue::string("1"), PrefValue::int(1));
        assert_ne!(PrefValue::int(1), PrefValue::Bool(true));
        assert_eq!(PrefValue::int(1), PrefValue::Number(1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(PrefValue::int(100).to_string(), "100");
        assert_eq!(PrefValue::Number(1.5).to_string(), "1.5");
        assert_eq!(PrefValue::Bool(false).to_string(), "false");
        assert_eq!(PrefValue::string("abc").to_string(), "abc");
    }

    #[test]
    fn test_serialize_untagged() {
        let json = serde_json::to_string(&PrefEntry::new("a", 5)).unwrap();
        assert_eq!(json, r#"{"key":"a","value":5}"#);
        let json = serde_json::to_string(&PrefValue::Number(0.5)).unwrap();
        assert_eq!(json, "0.5");
        let json = serde_json::to_string(&PrefValue::string("x")).unwrap();
        assert_eq!(json, r#""x""#);
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(PrefValue::int(42).as_i64(), Some(42));
        assert_eq!(PrefValue::Number(2.5).as_i64(), None);
        assert_eq!(PrefValue::Number(f64::NAN).as_i64(), None);
        assert!(PrefValue::Number(f64::NAN).is_nan());
    }

    #[test]
    fn test_sorted_entries() {
        let registry: Registry = [("b", 1), ("a", 2), ("C", 3)].into_iter().collect();
        let keys: Vec<String> = registry.sorted_entries().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a", "b", "C"]);
    }
}
